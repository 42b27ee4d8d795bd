use pretty_assertions::assert_eq;

use super::RingBuffer;

#[test]
fn reads_return_min_of_writes_and_cap_in_order() {
    let ring: RingBuffer<u32> = RingBuffer::new(3);
    for n in 0..5 {
        ring.push(n);
    }
    assert_eq!(ring.snapshot_newest_first(0), vec![4, 3, 2]);
    assert_eq!(ring.snapshot_chronological(), vec![2, 3, 4]);
    assert_eq!(ring.len(), 3);
    assert_eq!(ring.total_written(), 5);
    assert_eq!(ring.dropped(), 2);
}

#[test]
fn empty_buffer_returns_empty_slice() {
    let ring: RingBuffer<u32> = RingBuffer::new(4);
    assert!(ring.snapshot_newest_first(10).is_empty());
    assert!(ring.snapshot_chronological().is_empty());
    assert!(ring.is_empty());
}

#[test]
fn limit_truncates_from_the_newest_end() {
    let ring: RingBuffer<u32> = RingBuffer::new(10);
    ring.extend(0..6);
    assert_eq!(ring.snapshot_newest_first(2), vec![5, 4]);
}

#[test]
fn extend_reports_batch_size_and_drops_oldest() {
    let ring: RingBuffer<u32> = RingBuffer::new(2);
    assert_eq!(ring.extend(0..4), 4);
    assert_eq!(ring.snapshot_chronological(), vec![2, 3]);
    assert_eq!(ring.dropped(), 2);
}

#[test]
fn clear_preserves_monotone_counters() {
    let ring: RingBuffer<u32> = RingBuffer::new(2);
    ring.extend(0..3);
    ring.clear();
    assert!(ring.is_empty());
    assert_eq!(ring.total_written(), 3);
    assert_eq!(ring.dropped(), 1);
}

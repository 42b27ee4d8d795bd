use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use gasoline_protocol::CommandResult;
use gasoline_protocol::CommandStatus;

use super::AwaitOutcome;
use super::CommandQueue;
use super::QueueConfig;
use super::QueueError;

fn fast_queue() -> CommandQueue {
    CommandQueue::new(QueueConfig {
        max_depth: 3,
        late_result_ttl: Duration::from_secs(5),
        default_timeout: Duration::from_millis(100),
    })
}

#[tokio::test]
async fn complete_before_deadline_delivers_payload() {
    let queue = fast_queue();
    let ticket = queue
        .enqueue("click", json!({"selector": "#go"}), None, None)
        .expect("enqueue");
    let id = ticket.correlation_id.clone();

    queue.complete(CommandResult::complete(id, json!({"clicked": true}), 8));

    match queue.await_result(ticket).await {
        AwaitOutcome::Result(result) => {
            assert_eq!(result.status, CommandStatus::Complete);
            assert_eq!(result.payload, json!({"clicked": true}));
        }
        other => panic!("expected result, got {other:?}"),
    }
    assert_eq!(queue.depth(), 0);
}

#[tokio::test]
async fn await_times_out_when_nothing_answers() {
    let queue = fast_queue();
    let ticket = queue
        .enqueue("click", json!({"selector": "#nope"}), None, None)
        .expect("enqueue");
    let id = ticket.correlation_id.clone();

    assert_eq!(queue.await_result(ticket).await, AwaitOutcome::TimedOut);
    // The timeout records a selector failure and releases the slot.
    assert_eq!(
        queue.selector_failure("#nope"),
        Some(CommandStatus::Timeout)
    );
    assert_eq!(queue.depth(), 0);

    // A result arriving after the timeout is shelved, not delivered.
    queue.complete(CommandResult::complete(id.clone(), json!({}), 5000));
    assert!(queue.late_result(&id).is_some());
    assert!(queue.late_result(&id).is_none()); // consumed
}

#[tokio::test]
async fn completion_racing_a_dropped_receiver_is_shelved() {
    let queue = fast_queue();
    let ticket = queue.enqueue("click", json!({}), None, None).expect("enqueue");
    let id = ticket.correlation_id.clone();

    // The awaiter gave up (receiver dropped) but the waiter entry is still
    // registered; the completion must land on the late shelf, not vanish.
    drop(ticket);
    queue.complete(CommandResult::complete(id.clone(), json!({"late": true}), 7));

    let recovered = queue.late_result(&id).expect("shelved");
    assert_eq!(recovered.payload, json!({"late": true}));
}

#[tokio::test]
async fn take_next_is_fifo_and_client_scoped() {
    let queue = fast_queue();
    let _a = queue
        .enqueue("click", json!({}), Some("ext-1".to_string()), None)
        .expect("enqueue a");
    let _b = queue
        .enqueue("navigate", json!({}), None, None)
        .expect("enqueue b");

    // ext-2 only sees the broadcast command.
    let cmd = queue.take_next("ext-2").expect("broadcast visible");
    assert_eq!(cmd.tool, "navigate");

    // ext-1 gets its targeted command, oldest first.
    let cmd = queue.take_next("ext-1").expect("targeted visible");
    assert_eq!(cmd.tool, "click");

    // Everything is dispatched now.
    assert!(queue.take_next("ext-1").is_none());
}

#[tokio::test]
async fn duplicate_complete_first_wins() {
    let queue = fast_queue();
    let ticket = queue.enqueue("click", json!({}), None, None).expect("enqueue");
    let id = ticket.correlation_id.clone();

    queue.complete(CommandResult::complete(id.clone(), json!({"n": 1}), 3));
    queue.complete(CommandResult::complete(id.clone(), json!({"n": 2}), 4));

    match queue.await_result(ticket).await {
        AwaitOutcome::Result(result) => assert_eq!(result.payload, json!({"n": 1})),
        other => panic!("expected first result, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_unblocks_waiter_and_discards_completion() {
    let queue = fast_queue();
    let ticket = queue.enqueue("click", json!({}), None, None).expect("enqueue");
    let id = ticket.correlation_id.clone();

    queue.cancel(&id);
    assert_eq!(queue.await_result(ticket).await, AwaitOutcome::Cancelled);

    queue.complete(CommandResult::complete(id.clone(), json!({}), 9));
    assert!(queue.late_result(&id).is_some());
}

#[tokio::test]
async fn enqueue_fails_when_full_or_closed() {
    let queue = fast_queue();
    let _tickets: Vec<_> = (0..3)
        .map(|_| queue.enqueue("click", json!({}), None, None).expect("fits"))
        .collect();
    assert_eq!(
        queue.enqueue("click", json!({}), None, None).unwrap_err(),
        QueueError::Full { depth: 3 }
    );

    queue.close();
    assert_eq!(
        queue.enqueue("click", json!({}), None, None).unwrap_err(),
        QueueError::Closed
    );
}

#[tokio::test]
async fn close_cancels_outstanding_waiters() {
    let queue = fast_queue();
    let ticket = queue.enqueue("click", json!({}), None, None).expect("enqueue");
    queue.close();
    assert_eq!(queue.await_result(ticket).await, AwaitOutcome::Cancelled);
}

#[tokio::test]
async fn expired_entries_are_pruned_on_poll() {
    let queue = fast_queue();
    let _ticket = queue
        .enqueue(
            "click",
            json!({"selector": "#slow"}),
            None,
            Some(Duration::from_millis(10)),
        )
        .expect("enqueue");

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(queue.take_next("ext-1").is_none());
    assert_eq!(
        queue.selector_failure("#slow"),
        Some(CommandStatus::Expired)
    );
    assert_eq!(queue.depth(), 0);
}

#[tokio::test]
async fn successful_complete_clears_selector_failure() {
    let queue = fast_queue();
    let ticket = queue
        .enqueue("click", json!({"selector": "#btn"}), None, None)
        .expect("enqueue");
    assert_eq!(queue.await_result(ticket).await, AwaitOutcome::TimedOut);
    assert!(queue.selector_failure("#btn").is_some());

    let ticket = queue
        .enqueue("click", json!({"selector": "#btn"}), None, None)
        .expect("enqueue again");
    let id = ticket.correlation_id.clone();
    queue.complete(CommandResult::complete(id, json!({}), 20));
    assert!(matches!(
        queue.await_result(ticket).await,
        AwaitOutcome::Result(_)
    ));
    assert!(queue.selector_failure("#btn").is_none());
}

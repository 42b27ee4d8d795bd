use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use gasoline_protocol::AnnotationDetail;
use gasoline_protocol::AnnotationSession;

use super::AnnotationStore;
use super::StoreConfig;
use super::WaitOutcome;

fn session(tab_id: &str, timestamp: i64) -> AnnotationSession {
    AnnotationSession {
        tab_id: tab_id.to_string(),
        page_url: format!("http://localhost/{tab_id}"),
        screenshot_path: "/tmp/shot.png".to_string(),
        annotations: Vec::new(),
        timestamp,
    }
}

fn detail(correlation_id: &str) -> AnnotationDetail {
    AnnotationDetail {
        correlation_id: correlation_id.into(),
        selector: "#target".to_string(),
        tag: "button".to_string(),
        classes: vec!["primary".to_string()],
        id: None,
        computed_styles: serde_json::Map::new(),
        a11y_flags: Vec::new(),
        parent_selector: None,
        bounding_rect: Default::default(),
    }
}

#[test]
fn newest_session_per_tab_wins() {
    let store = AnnotationStore::default();
    store.store_session(session("tab-1", 100));
    store.store_session(session("tab-1", 200));

    let got = store.get_session("tab-1").expect("present");
    assert_eq!(got.timestamp, 200);
    assert_eq!(store.session_count(), 1);
}

#[test]
fn latest_session_is_by_highest_timestamp() {
    let store = AnnotationStore::default();
    store.store_session(session("a", 100));
    store.store_session(session("b", 300));
    store.store_session(session("c", 200));
    assert_eq!(store.get_latest_session().expect("present").tab_id, "b");
}

#[test]
fn eviction_drops_the_oldest_timestamp() {
    let store = AnnotationStore::default();
    // 101 distinct tabs; tab 10 (oldest timestamp) gets evicted.
    for n in 10..111 {
        store.store_session(session(&format!("tab-{n}"), n));
    }
    assert_eq!(store.session_count(), 100);
    assert!(store.get_session("tab-10").is_none());
    assert!(store.get_session("tab-110").is_some());
}

#[test]
fn named_sessions_preserve_page_order() {
    let store = AnnotationStore::default();
    store.append_to_named_session("qa-review", session("t1", 100));
    store.append_to_named_session("qa-review", session("t2", 200));

    let named = store.get_named_session("qa-review").expect("present");
    assert_eq!(named.pages.len(), 2);
    assert_eq!(named.pages[0].tab_id, "t1");
    assert_eq!(named.pages[1].tab_id, "t2");

    assert!(store.clear_named_session("qa-review"));
    assert!(store.get_named_session("qa-review").is_none());
    assert!(!store.clear_named_session("qa-review"));
}

#[test]
fn list_named_is_sorted() {
    let store = AnnotationStore::default();
    store.append_to_named_session("zeta", session("t", 1));
    store.append_to_named_session("alpha", session("t", 2));
    assert_eq!(store.list_named_sessions(), vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn wait_skips_stale_sessions() {
    let store = Arc::new(AnnotationStore::default());
    store.store_session(session("tab-1", 1));
    store.mark_draw_started();

    // The pre-existing session is older than the watermark, so the wait
    // must block until a fresh one arrives.
    let waiter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.wait_for_session(Duration::from_secs(2)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fresh = session("tab-1", chrono::Utc::now().timestamp_millis() + 1000);
    let fresh_ts = fresh.timestamp;
    store.store_session(fresh);

    match waiter.await.expect("join") {
        WaitOutcome::Session(s) => assert_eq!(s.timestamp, fresh_ts),
        other => panic!("expected session, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_times_out_without_sessions() {
    let store = AnnotationStore::default();
    store.mark_draw_started();
    assert_eq!(
        store.wait_for_session(Duration::from_millis(30)).await,
        WaitOutcome::TimedOut
    );
}

#[tokio::test]
async fn close_unblocks_waiters_and_stays_writable() {
    let store = Arc::new(AnnotationStore::default());
    store.mark_draw_started();

    let waiter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.wait_for_session(Duration::from_secs(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.close();
    store.close(); // idempotent
    assert_eq!(waiter.await.expect("join"), WaitOutcome::Closed);

    // Writes after close must not panic.
    store.store_session(session("tab-9", 999));
    assert!(store.get_session("tab-9").is_some());
}

#[tokio::test]
async fn wait_for_named_session_sees_new_pages_only() {
    let store = Arc::new(AnnotationStore::default());
    store.append_to_named_session("run", session("t1", 1));

    let waiter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .wait_for_named_session("run", Duration::from_secs(2))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.append_to_named_session("run", session("t2", 2));

    match waiter.await.expect("join") {
        WaitOutcome::Session(s) => assert_eq!(s.tab_id, "t2"),
        other => panic!("expected session, got {other:?}"),
    }
}

#[test]
fn details_expire_by_ttl() {
    let store = AnnotationStore::new(StoreConfig {
        session_cap: 100,
        detail_ttl: Duration::from_millis(0),
    });
    store.store_detail(detail("anno_1_x"));
    assert!(store.get_detail(&"anno_1_x".into()).is_none());
    assert_eq!(store.gc_expired_details(), 1);
}

#[test]
fn details_resolve_before_ttl() {
    let store = AnnotationStore::default();
    store.store_detail(detail("anno_2_y"));
    let got = store.get_detail(&"anno_2_y".into()).expect("fresh");
    assert_eq!(got.selector, "#target");
    assert_eq!(store.gc_expired_details(), 0);
}

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serial_test::serial;

use super::DaemonLock;
use super::LaunchOptions;
use super::LifecycleError;
use super::lock_path;
use super::pid_alive;
use super::pid_path;
use super::prepare_launch;
use super::read_lock;
use super::read_pid_file;
use super::resolve_state_dir;
use super::write_ownership;

fn write_lock(dir: &std::path::Path, lock: &DaemonLock) {
    std::fs::create_dir_all(dir).expect("mkdir");
    std::fs::write(
        lock_path(dir),
        serde_json::to_vec(lock).expect("serializable"),
    )
    .expect("write lock");
}

/// A pid that cannot be a live process (beyond the default pid_max).
const DEAD_PID: u32 = 3_999_999;

#[test]
#[serial]
fn explicit_state_dir_wins_over_env() {
    // SAFETY: serialized test, no concurrent env readers.
    unsafe { std::env::set_var("GASOLINE_STATE_DIR", "/tmp/gasoline-env") };
    assert_eq!(
        resolve_state_dir(Some(PathBuf::from("/tmp/explicit"))),
        PathBuf::from("/tmp/explicit")
    );
    assert_eq!(
        resolve_state_dir(None),
        PathBuf::from("/tmp/gasoline-env")
    );
    unsafe { std::env::remove_var("GASOLINE_STATE_DIR") };
}

#[test]
fn own_pid_is_alive_and_bogus_pid_is_not() {
    assert!(pid_alive(std::process::id()));
    assert!(!pid_alive(DEAD_PID));
    assert!(!pid_alive(0));
}

#[test]
fn ownership_files_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_ownership(dir.path(), 7890).expect("write");

    assert_eq!(read_pid_file(dir.path(), 7890), Some(std::process::id()));
    let lock = read_lock(dir.path()).expect("lock");
    assert_eq!(lock.pid, std::process::id());
    assert_eq!(lock.port, 7890);
    assert_eq!(lock.version, crate::VERSION);

    super::remove_ownership(dir.path(), 7890);
    assert!(read_lock(dir.path()).is_none());
    assert!(read_pid_file(dir.path(), 7890).is_none());
}

#[tokio::test]
async fn stale_lock_is_cleaned_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_lock(
        dir.path(),
        &DaemonLock {
            pid: DEAD_PID,
            port: 7890,
            state_dir: dir.path().to_string_lossy().into_owned(),
            version: "0.0.1".to_string(),
        },
    );

    let opts = LaunchOptions {
        port: 7891,
        state_dir: Some(dir.path().to_path_buf()),
        parallel: false,
    };
    prepare_launch(&opts, dir.path()).await.expect("launch ok");
    assert!(read_lock(dir.path()).is_none());
}

#[tokio::test]
async fn parallel_against_live_daemon_requires_isolated_state_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Use our own (alive) pid as the fake running daemon.
    write_lock(
        dir.path(),
        &DaemonLock {
            pid: std::process::id(),
            port: 7890,
            state_dir: dir.path().to_string_lossy().into_owned(),
            version: "0.0.1".to_string(),
        },
    );

    let opts = LaunchOptions {
        port: 7891,
        state_dir: None,
        parallel: true,
    };
    let err = prepare_launch(&opts, dir.path())
        .await
        .expect_err("must refuse");
    assert!(matches!(
        err,
        LifecycleError::ParallelNeedsIsolatedStateDir { .. }
    ));
}

#[tokio::test]
async fn takeover_refuses_on_ownership_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_lock(
        dir.path(),
        &DaemonLock {
            pid: std::process::id(),
            port: 7890,
            state_dir: dir.path().to_string_lossy().into_owned(),
            version: "0.0.1".to_string(),
        },
    );
    // A pid file that disagrees with the lock.
    std::fs::write(pid_path(dir.path(), 7890), "12345\n").expect("write pid");

    let opts = LaunchOptions {
        port: 7891,
        state_dir: Some(dir.path().to_path_buf()),
        parallel: false,
    };
    let err = prepare_launch(&opts, dir.path())
        .await
        .expect_err("must refuse");
    assert!(matches!(err, LifecycleError::OwnershipMismatch { .. }));
}

use ef_store::{LockManager, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn at_most_one_caller_inside_a_resource() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(LockManager::with_timeout(
        dir.path(),
        Duration::from_secs(5),
    ));

    let inside = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        let inside = Arc::clone(&inside);
        let peak = Arc::clone(&peak);
        handles.push(std::thread::spawn(move || {
            manager
                .with_resource("run-1.configure", || {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(40));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn contender_times_out_while_resource_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(LockManager::with_timeout(
        dir.path(),
        Duration::from_millis(120),
    ));

    let blocker = {
        let manager = Arc::clone(&manager);
        std::thread::spawn(move || {
            manager
                .with_resource("run-2.run", || {
                    std::thread::sleep(Duration::from_millis(600));
                })
                .unwrap();
        })
    };

    // Give the blocker time to take the lock.
    std::thread::sleep(Duration::from_millis(100));
    let err = manager.with_resource("run-2.run", || ()).unwrap_err();
    assert!(matches!(err, StoreError::LockTimeout { .. }));
    blocker.join().unwrap();
}

#[test]
fn different_resources_do_not_contend() {
    let dir = tempfile::tempdir().unwrap();
    let manager = LockManager::with_timeout(dir.path(), Duration::from_millis(200));

    manager
        .with_resource("run-3.baseline", || {
            // A different run's stage lock is independent.
            manager.with_resource("run-4.baseline", || ()).unwrap();
        })
        .unwrap();
}

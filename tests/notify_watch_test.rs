//! File watching against the real file system.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use livevar::{NotifyWatchService, Registry, WatchService};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_change_reaches_subscriber() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("live_vars.json");
    fs::write(&path, "{}").unwrap();

    let service = NotifyWatchService::new(20);
    let (tx, rx) = unbounded();
    service
        .subscribe(
            &path,
            Arc::new(move |changed: &Path| {
                let _ = tx.send(changed.to_path_buf());
            }),
        )
        .unwrap();
    assert!(service.is_running());
    assert_eq!(service.subscription_count(), 1);

    thread::sleep(Duration::from_millis(100));
    fs::write(&path, r#"{ "disk": { "radius": "1" } }"#).unwrap();

    let changed = rx.recv_timeout(WAIT).expect("change notification");
    assert_eq!(changed, path.canonicalize().unwrap());

    service.unsubscribe(&path);
    assert_eq!(service.subscription_count(), 0);
    thread::sleep(Duration::from_millis(100));
    while rx.try_recv().is_ok() {}

    fs::write(&path, r#"{ "disk": { "radius": "2" } }"#).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}

#[test]
fn test_subscribe_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let service = NotifyWatchService::new(20);

    let result = service.subscribe(&temp_dir.path().join("absent.json"), Arc::new(|_: &Path| {}));
    assert!(result.is_err());
    assert!(!service.is_running());
}

#[test]
fn test_registry_reloads_edited_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("live_vars.json");

    let registry = Registry::with_watch(Arc::new(NotifyWatchService::new(20)));
    registry.set_filepath(&path).unwrap();
    let radius = registry.var(12.5_f32, "radius", "disk");
    registry.save().unwrap();

    thread::sleep(Duration::from_millis(100));
    fs::write(&path, r#"{ "disk": { "radius": "7.0" } }"#).unwrap();

    let deadline = Instant::now() + WAIT;
    while radius.get() != 7.0 && Instant::now() < deadline {
        registry.process_reloads().unwrap();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(radius.get(), 7.0);
}

#[test]
fn test_concurrent_subscribe_and_unsubscribe() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..8)
        .map(|i| {
            let dir = temp_dir.path().join(format!("dir{i}"));
            fs::create_dir(&dir).unwrap();
            let path = dir.join("live_vars.json");
            fs::write(&path, "{}").unwrap();
            path
        })
        .collect();

    let service = Arc::new(NotifyWatchService::new(20));
    let (done_tx, done_rx) = unbounded();

    for reversed in [false, true] {
        let service = service.clone();
        let done_tx = done_tx.clone();
        let mut order = paths.clone();
        if reversed {
            order.reverse();
        }
        thread::spawn(move || {
            for _ in 0..100 {
                for path in &order {
                    service.subscribe(path, Arc::new(|_: &Path| {})).unwrap();
                }
                for path in order.iter().rev() {
                    service.unsubscribe(path);
                }
            }
            let _ = done_tx.send(());
        });
    }

    for _ in 0..2 {
        done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("workers finished");
    }
    assert_eq!(service.subscription_count(), 0);
    assert_eq!(service.watched_dir_count(), 0);
}

#[test]
fn test_moving_away_from_deleted_file() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.json");
    let second = temp_dir.path().join("second.json");

    let service = Arc::new(NotifyWatchService::new(20));
    let registry = Registry::with_watch(service.clone());
    registry.set_filepath(&first).unwrap();
    assert_eq!(service.subscription_count(), 1);

    fs::remove_file(&first).unwrap();
    registry.set_filepath(&second).unwrap();

    assert_eq!(service.subscription_count(), 1);
    assert_eq!(service.watched_dir_count(), 1);

    registry.unwatch();
    assert_eq!(service.subscription_count(), 0);
    assert_eq!(service.watched_dir_count(), 0);
}

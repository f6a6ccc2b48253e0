//! Compute-once caching under concurrent access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use confcache::cache::DocumentCache;
use confcache::{ConfigError, Document};
use serde_json::json;

mod common;
use common::Fixture;

#[test]
fn test_concurrent_lookups_parse_once() {
    let cache = Arc::new(DocumentCache::new());
    let parses = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let parses = Arc::clone(&parses);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_compute("app.json", || {
                        parses.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok::<_, ()>(Document::from_value(json!({"v": 1})))
                    })
                    .unwrap()
            })
        })
        .collect();

    let docs: Vec<Arc<Document>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(parses.load(Ordering::SeqCst), 1);
    assert!(docs.iter().all(|doc| Arc::ptr_eq(doc, &docs[0])));
}

#[test]
fn test_handle_threads_share_one_document() {
    let fixture = Fixture::new();
    fixture.write("app.json", r#"{"v": 1}"#);
    let handle = Arc::new(common::handle(&[&fixture]));
    let barrier = Arc::new(Barrier::new(4));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                handle.document_of("app.json").unwrap()
            })
        })
        .collect();

    let docs: Vec<Arc<Document>> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert!(docs.iter().all(|doc| Arc::ptr_eq(doc, &docs[0])));
}

#[test]
fn test_slow_key_does_not_block_other_keys() {
    let cache = Arc::new(DocumentCache::new());
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let slow = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            cache
                .get_or_compute("slow", || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok::<_, ()>(Document::from_value(json!("slow")))
                })
                .unwrap()
        })
    };

    started_rx.recv().unwrap();
    let fast = cache
        .get_or_compute("fast", || Ok::<_, ()>(Document::from_value(json!("fast"))))
        .unwrap();
    assert_eq!(fast.root(), &json!("fast"));
    assert!(cache.contains("fast"));
    assert!(!cache.contains("slow"));

    release_tx.send(()).unwrap();
    slow.join().unwrap();
    assert!(cache.contains("slow"));
}

#[test]
fn test_failed_parse_is_not_cached() {
    let fixture = Fixture::new();
    fixture.write("app.json", r#"{"v": "#);
    let handle = common::handle(&[&fixture]);

    let err = handle.document_of("app.json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("app.json"));
    assert!(!handle.is_cached("app.json"));

    fixture.write("app.json", r#"{"v": 2}"#);
    assert_eq!(handle.document_of("app.json").unwrap().get_int("v"), 2);
    assert!(handle.is_cached("app.json"));
}

#[test]
fn test_missing_file_is_not_cached() {
    let fixture = Fixture::new();
    let handle = common::handle(&[&fixture]);
    assert!(handle.document_of("late.toml").unwrap_err().is_not_available());

    fixture.write("late.toml", "ready = true");
    assert!(handle.document_of("late.toml").unwrap().get_bool("ready"));
}

#[test]
fn test_set_path_during_load_discards_stale_result() {
    let cache = DocumentCache::new();
    let stale = cache
        .get_or_compute("config.toml", || {
            // A path switch lands while the old document is being built.
            cache.clear();
            Ok::<_, ()>(Document::from_value(json!({"root": "old"})))
        })
        .unwrap();
    assert_eq!(stale.get_string("root"), "old");
    assert!(!cache.contains("config.toml"));
}

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn cache(capacity: usize, ttl: Option<Duration>) -> SingleFlightCache<String, usize> {
    SingleFlightCache::new("test", capacity, ttl)
}

async fn build_counted(counter: &AtomicUsize, value: usize) -> Result<usize, String> {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(value)
}

#[tokio::test]
async fn test_second_call_is_a_hit() {
    let cache = cache(4, None);
    let builds = AtomicUsize::new(0);

    let first = cache
        .get_or_build("a".to_string(), || build_counted(&builds, 1))
        .await
        .unwrap();
    let second = cache
        .get_or_build("a".to_string(), || build_counted(&builds, 2))
        .await
        .unwrap();

    assert_eq!((first, second), (1, 1));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_build_once() {
    let cache = Arc::new(cache(4, None));
    let builds = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let builds = Arc::clone(&builds);
            tokio::spawn(async move {
                cache
                    .get_or_build("shared".to_string(), || async {
                        builds.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(7)
                    })
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 7);
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_build_is_retried() {
    let cache = cache(4, None);

    let err = cache
        .get_or_build("a".to_string(), || async { Err::<usize, _>("down".to_string()) })
        .await
        .unwrap_err();
    assert_eq!(err, "down");
    assert!(cache.is_empty());

    let value = cache
        .get_or_build("a".to_string(), || async { Ok::<_, String>(3) })
        .await
        .unwrap();
    assert_eq!(value, 3);
}

#[tokio::test]
async fn test_expired_entry_is_rebuilt() {
    let cache = cache(4, Some(Duration::from_millis(20)));
    let builds = AtomicUsize::new(0);

    cache
        .get_or_build("a".to_string(), || build_counted(&builds, 1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let value = cache
        .get_or_build("a".to_string(), || build_counted(&builds, 2))
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_capacity_evicts_least_recently_used() {
    let cache = cache(2, None);
    let builds = AtomicUsize::new(0);

    for key in ["a", "b", "a", "c"] {
        cache
            .get_or_build(key.to_string(), || build_counted(&builds, 0))
            .await
            .unwrap();
    }
    assert_eq!(cache.len(), 2);
    assert_eq!(builds.load(Ordering::SeqCst), 3);

    // "b" was evicted by "c"
    cache
        .get_or_build("b".to_string(), || build_counted(&builds, 0))
        .await
        .unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_invalidate_and_clear() {
    let cache = cache(4, None);
    for key in ["a", "b"] {
        cache
            .get_or_build(key.to_string(), || async { Ok::<_, String>(1) })
            .await
            .unwrap();
    }

    assert!(cache.invalidate(&"a".to_string()));
    assert!(!cache.invalidate(&"a".to_string()));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_zero_capacity_holds_one_entry() {
    let cache = cache(0, None);
    assert!(cache.is_empty());
}

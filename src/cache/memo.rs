//! Coalescing memoization for async operations.
//!
//! [`Memo`] combines concurrent requests with the same key into a single
//! operation and keeps the successful result for the lifetime of the memo.
//! When several tasks ask for the same key at once, one executes the
//! operation while the others wait for its result.
//!
//! # Failures
//!
//! A failure is delivered to every caller that was waiting on that attempt,
//! then forgotten: the next request for the key starts a fresh attempt.
//!
//! # Cancellation
//!
//! If the task running the operation is cancelled, the next waiter takes
//! over and runs its own operation.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

type Slot<V, E> = Arc<OnceCell<Result<V, E>>>;

/// Typed, coalescing, never-evicting async cache.
///
/// # Example
///
/// ```
/// use gitoverlay::cache::Memo;
///
/// # tokio_test_block_on(async {
/// let memo: Memo<String, u32, String> = Memo::new();
/// let first = memo.get_or_compute("k".to_string(), || async { Ok(1) }).await;
/// let second = memo.get_or_compute("k".to_string(), || async { Ok(2) }).await;
/// assert_eq!(first, Ok(1));
/// assert_eq!(second, Ok(1));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct Memo<K, V, E> {
    slots: Mutex<HashMap<K, Slot<V, E>>>,
}

impl<K, V, E> Memo<K, V, E>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the memoized result for `key`, computing it with `f` if no
    /// attempt is stored or in flight.
    pub async fn get_or_compute<F, Fut>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = Arc::clone(self.lock().entry(key.clone()).or_default());

        let result = slot.get_or_init(f).await.clone();

        if result.is_err() {
            let mut slots = self.lock();
            if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                slots.remove(&key);
            }
        }

        result
    }

    /// Number of keys with a stored or in-flight attempt.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V, E>>> {
        // Slots are only inserted or removed whole, so a poisoned map is
        // still consistent.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K, V, E> Default for Memo<K, V, E>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn single_call() {
        let memo: Memo<String, i32, ()> = Memo::new();

        let result = memo.get_or_compute("key".to_string(), || async { Ok(42) }).await;

        assert_eq!(result, Ok(42));
        assert_eq!(memo.len(), 1);
        let again = memo.get_or_compute("key".to_string(), || async { Ok(7) }).await;
        assert_eq!(again, Ok(42));
    }

    #[tokio::test]
    async fn concurrent_same_key_runs_once() {
        let memo: Arc<Memo<String, i32, ()>> = Arc::new(Memo::new());
        let call_count = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..5 {
            let memo = Arc::clone(&memo);
            let call_count = Arc::clone(&call_count);

            handles.push(tokio::spawn(async move {
                memo.get_or_compute("same-key".to_string(), || async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(50)).await;
                    Ok(42)
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sequential_same_key_is_memoized() {
        let memo: Memo<String, i32, ()> = Memo::new();
        let call_count = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let call_count = Arc::clone(&call_count);
            let result = memo
                .get_or_compute("key".to_string(), || async move {
                    Ok(call_count.fetch_add(1, Ordering::SeqCst) as i32)
                })
                .await;
            assert_eq!(result, Ok(0));
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_are_independent() {
        let memo: Memo<u8, u8, ()> = Memo::new();

        assert_eq!(memo.get_or_compute(1, || async { Ok(10) }).await, Ok(10));
        assert_eq!(memo.get_or_compute(2, || async { Ok(20) }).await, Ok(20));
        assert_eq!(memo.len(), 2);
    }

    #[tokio::test]
    async fn error_reaches_all_waiters_then_is_forgotten() {
        let memo: Arc<Memo<String, i32, String>> = Arc::new(Memo::new());
        let call_count = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..3 {
            let memo = Arc::clone(&memo);
            let call_count = Arc::clone(&call_count);
            handles.push(tokio::spawn(async move {
                memo.get_or_compute("key".to_string(), || async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(50)).await;
                    Err("shared error".to_string())
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err("shared error".to_string()));
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(memo.is_empty());

        let retried = memo
            .get_or_compute("key".to_string(), || async { Ok(7) })
            .await;
        assert_eq!(retried, Ok(7));
    }
}

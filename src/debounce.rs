//! Generic value debouncer.
//!
//! `update` restarts the delay on every call; the callback only runs once the
//! value has been stable for the whole delay. Built on abortable tokio tasks,
//! so a rapid re-invocation simply cancels the sleeping predecessor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    delay: Duration,
    on_stable: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, on_stable: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            on_stable: Arc::new(on_stable),
            pending: Mutex::new(None),
        }
    }

    /// Feed a new value, restarting the stability window.
    pub fn update(&self, value: T) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let delay = self.delay;
        let callback = Arc::clone(&self.on_stable);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(value);
        }));
    }

    /// Drop any value still waiting out its delay.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().unwrap().take() {
            previous.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(previous) = self.pending.lock().unwrap().take() {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_only_last_value_fires() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));

        let debouncer = {
            let fired = Arc::clone(&fired);
            let count = Arc::clone(&count);
            Debouncer::new(Duration::from_millis(400), move |value: String| {
                fired.lock().unwrap().push(value);
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        debouncer.update("1".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.update("1.".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.update("1.5".to_string());

        // Not yet stable for the full delay.
        tokio::time::sleep(Duration::from_millis(399)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(fired.lock().unwrap().as_slice(), ["1.5".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_delivery() {
        let count = Arc::new(AtomicUsize::new(0));
        let debouncer = {
            let count = Arc::clone(&count);
            Debouncer::new(Duration::from_millis(200), move |_: u32| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        debouncer.update(7);
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}

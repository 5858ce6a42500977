//! Trailing-edge debounce on a Tokio task.

use std::time::Duration;

use tokio::sync::mpsc;

/// Coalesces bursts of [`trigger`](Debouncer::trigger) calls into a single
/// trailing call of the action, made with the last value once `delay` has
/// passed without a new trigger.
///
/// Each trigger restarts the quiet period. Dropping the handle does not
/// cancel a pending call; it still fires after the delay.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the timer task. Must be called from within a Tokio runtime.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, delay, action));
        Self { tx }
    }

    pub fn trigger(&self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::debug!("debounce task has stopped; dropping trigger");
        }
    }
}

async fn run<T, F>(mut rx: mpsc::UnboundedReceiver<T>, delay: Duration, action: F)
where
    F: Fn(T),
{
    while let Some(mut latest) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(value) => latest = value,
                    None => {
                        tokio::time::sleep(delay).await;
                        action(latest);
                        return;
                    }
                },
                () = tokio::time::sleep(delay) => break,
            }
        }
        action(latest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_with_last_value() {
        let (calls, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(800), action);

        for v in 1..=5 {
            debouncer.trigger(v);
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(calls.lock().unwrap().is_empty(), "fired during the burst");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*calls.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_triggers_fire_separately() {
        let (calls, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(800), action);

        debouncer.trigger(1);
        tokio::time::sleep(Duration::from_millis(900)).await;
        debouncer.trigger(2);
        tokio::time::sleep(Duration::from_millis(900)).await;

        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_still_fires_pending_call() {
        let (calls, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(800), action);

        debouncer.trigger(9);
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(900)).await;

        assert_eq!(*calls.lock().unwrap(), vec![9]);
    }
}

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Propagates a value only after it has stopped changing for `delay`.
///
/// Every `set` restarts the single pending timer. Subscribers see the settled
/// value; intermediate values are never published. Must be created inside a
/// tokio runtime.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: Arc<watch::Sender<T>>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(initial.clone());
        let (output, _) = watch::channel(initial);
        let output = Arc::new(output);
        let publisher = Arc::clone(&output);

        let task = tokio::spawn(async move {
            while input_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => break,
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }

                let settled = input_rx.borrow_and_update().clone();
                publish(&publisher, settled);
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    /// Record a new value and restart the timer.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Publish `value` immediately, bypassing the timer.
    pub fn flush(&self, value: T) {
        self.input.send_replace(value.clone());
        publish(&self.output, value);
    }

    /// The last settled value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }
}

fn publish<T: PartialEq>(sender: &watch::Sender<T>, value: T) {
    sender.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

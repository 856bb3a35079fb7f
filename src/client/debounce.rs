use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A single pending timer. Scheduling replaces whatever was pending, and
/// the timer is cancelled on drop, so it never outlives its owner.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` after the delay unless rescheduled or cancelled first.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            action();
        }));
    }

    /// Returns true if a timer was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = fired.clone();
        let make = move || {
            let fired = handle.clone();
            Box::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (fired, make)
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_restarts_the_delay() {
        let (fired, action) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for _ in 0..5 {
            debouncer.schedule(action());
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(450)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_pending_timer() {
        let (fired, action) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.schedule(action());

        drop(debouncer);
        sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_whether_anything_was_waiting() {
        let (_fired, action) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        assert!(!debouncer.cancel());
        debouncer.schedule(action());
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
    }
}

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Restartable single-shot timer. At most one expiry is pending at a time.
///
/// Each arming gets a new generation number which is handed to the callback,
/// so an expiry that raced with a cancellation can still be recognised as
/// outdated by [`Debouncer::settle`].
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Cancel any pending expiry and arm a new one. `fire` runs on a spawned
    /// task once the delay has passed without another call to `schedule` or
    /// `cancel`.
    pub fn schedule<F>(&mut self, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let deadline = Instant::now() + self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            fire(generation);
        }));
        generation
    }

    /// Abort the pending expiry. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Accept an expiry. Only the latest armed generation is accepted, and
    /// only once.
    pub fn settle(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

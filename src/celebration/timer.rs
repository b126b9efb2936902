use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Zero-argument completion callback. Two callbacks are the same callback
/// when they point at the same allocation.
pub type Callback = Rc<dyn Fn()>;

pub fn same_callback(a: &Callback, b: &Callback) -> bool {
    Rc::ptr_eq(a, b)
}

/// One-shot timer driven by the caller's frame clock.
///
/// The timer owns its callback until it expires. Dropping it is the only way
/// to cancel, and a dropped timer can never fire, so whoever owns the timer
/// gets cancel-before-fire for free.
pub struct CompletionTimer {
    delay: Duration,
    elapsed: Duration,
    callback: Option<Callback>,
}

impl CompletionTimer {
    pub fn new(delay: Duration, callback: Callback) -> Self {
        Self {
            delay,
            elapsed: Duration::ZERO,
            callback: Some(callback),
        }
    }

    /// Advances the clock and hands back the callback on the step that
    /// reaches the deadline. Every later call returns `None`.
    pub fn advance(&mut self, dt: Duration) -> Option<Callback> {
        self.callback.as_ref()?;

        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.delay {
            self.callback.take()
        } else {
            None
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining(&self) -> Duration {
        self.delay.saturating_sub(self.elapsed)
    }

    pub fn is_pending(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for CompletionTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTimer")
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("pending", &self.is_pending())
            .finish()
    }
}

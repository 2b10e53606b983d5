use std::time::Duration;

/// Pacing applied after each provider call that missed the search cache.
///
/// Cache hits never reach the throttle, so quota usage and waiting both scale
/// with distinct queries rather than with defects.
pub trait Throttle {
    fn after_provider_call(&mut self);
}

/// Sleeps a fixed interval after every uncached call. The wait completes
/// before the next defect is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Throttle for FixedDelay {
    fn after_provider_call(&mut self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

/// For tests and zero-delay configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

impl Throttle for NoDelay {
    fn after_provider_call(&mut self) {}
}

impl<T: Throttle + ?Sized> Throttle for &mut T {
    fn after_provider_call(&mut self) {
        (**self).after_provider_call();
    }
}

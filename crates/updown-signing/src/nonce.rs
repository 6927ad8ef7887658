//! Monotonic nonce source for signed actions.
//!
//! The exchange requires nonces to be unique and roughly track wall-clock
//! milliseconds. A CAS loop guarantees strict monotonic increase even when
//! the local clock stalls or regresses.

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64
    }
}

/// Issues strictly increasing, time-tracking nonces.
pub struct NonceSource<C: Clock> {
    counter: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceSource<C> {
    pub fn new(clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            counter: AtomicU64::new(now),
            clock,
        }
    }

    /// Next nonce: `max(last + 1, now_ms)`.
    pub fn next(&self) -> u64 {
        let target = self.clock.now_ms();

        loop {
            let current = self.counter.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(target);

            match self.counter.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }
}

impl NonceSource<SystemClock> {
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct MockClock {
        time_ms: AtomicU64,
    }

    impl MockClock {
        fn new(initial_ms: u64) -> Self {
            Self {
                time_ms: AtomicU64::new(initial_ms),
            }
        }

        fn set(&self, time_ms: u64) {
            self.time_ms.store(time_ms, Ordering::Release);
        }
    }

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            self.time_ms.load(Ordering::Acquire)
        }
    }

    impl Clock for Arc<MockClock> {
        fn now_ms(&self) -> u64 {
            self.time_ms.load(Ordering::Acquire)
        }
    }

    const BASE_TIME: u64 = 1_700_000_000_000;

    #[test]
    fn test_monotonic_increase() {
        let source = NonceSource::new(MockClock::new(BASE_TIME));

        let mut prev = 0u64;
        for _ in 0..1000 {
            let nonce = source.next();
            assert!(nonce > prev, "nonce must be strictly increasing");
            prev = nonce;
        }
    }

    #[test]
    fn test_clock_regression_no_decrease() {
        let source = NonceSource::new(MockClock::new(BASE_TIME));

        let n1 = source.next();
        source.clock.set(BASE_TIME - 10_000);
        let n2 = source.next();

        assert!(n2 > n1, "nonce must not decrease when clock regresses");
    }

    #[test]
    fn test_concurrent_no_duplicates() {
        let clock = Arc::new(MockClock::new(BASE_TIME));
        let source = Arc::new(NonceSource::new(Arc::clone(&clock)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = Arc::clone(&source);
                thread::spawn(move || (0..1000).map(|_| source.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        all.sort_unstable();
        let len = all.len();
        all.dedup();
        assert_eq!(all.len(), len, "all nonces must be unique across threads");
    }

    #[test]
    fn test_tracks_clock() {
        let source = NonceSource::new(MockClock::new(BASE_TIME));
        let _ = source.next();

        source.clock.set(BASE_TIME + 60_000);
        let n = source.next();
        assert!(n >= BASE_TIME + 60_000);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mutual exclusion between sync and address import.
///
/// At most one guard exists at a time; it releases on drop, so every
/// exit path (success, error, panic) clears the flag.
pub struct BusyFlag {
    flag: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)) }
    }

    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: self.flag.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.try_acquire().is_none());
        assert!(flag.is_busy());

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn released_on_panic() {
        let flag = BusyFlag::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = flag.try_acquire().unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!flag.is_busy());
    }
}

//! Single-fire gate for work attached to recurring events.

use std::sync::atomic::{AtomicBool, Ordering};

/// Opens exactly once.
///
/// The first [`OneShot::try_fire`] returns `true`; every later call returns
/// `false`.
#[derive(Debug, Default)]
pub struct OneShot {
    fired: AtomicBool,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set the latch, returning whether this call opened it.
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fires_once() {
        let latch = OneShot::new();
        assert!(!latch.has_fired());
        assert!(latch.try_fire());
        assert!(latch.has_fired());
        assert!(!latch.try_fire());
        assert!(!latch.try_fire());
    }

    #[test]
    fn test_single_winner_across_threads() {
        let latch = Arc::new(OneShot::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || latch.try_fire())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}

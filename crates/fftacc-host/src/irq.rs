//! Interrupt latch
//!
//! `IrqLatch` is the host's view of an accelerator's interrupt line. The
//! accelerator owns a [`LatchLine`] (the write end) while clients keep the
//! latch to check the current level and count raised edges.

use fftacc_core::IrqLine;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct LatchState {
    level: AtomicBool,
    edges: AtomicU32,
}

/// Shared interrupt level and edge counter
#[derive(Debug, Clone, Default)]
pub struct IrqLatch {
    state: Arc<LatchState>,
}

impl IrqLatch {
    /// Create a latch with the line low and no edges counted
    pub fn new() -> Self {
        Self::default()
    }

    /// Write end to hand to the accelerator
    pub fn line(&self) -> LatchLine {
        LatchLine {
            state: Arc::clone(&self.state),
        }
    }

    /// Current line level
    pub fn asserted(&self) -> bool {
        self.state.level.load(Ordering::Acquire)
    }

    /// Number of low-to-high transitions seen so far
    pub fn edges(&self) -> u32 {
        self.state.edges.load(Ordering::Acquire)
    }

    /// Return the edge count and reset it to zero
    pub fn take_edges(&self) -> u32 {
        self.state.edges.swap(0, Ordering::AcqRel)
    }
}

/// Write end of an [`IrqLatch`]
#[derive(Debug)]
pub struct LatchLine {
    state: Arc<LatchState>,
}

impl IrqLine for LatchLine {
    fn set_level(&mut self, asserted: bool) {
        let previous = self.state.level.swap(asserted, Ordering::AcqRel);
        if asserted && !previous {
            self.state.edges.fetch_add(1, Ordering::AcqRel);
            log::trace!("irq raised");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_rising_edges() {
        let latch = IrqLatch::new();
        let mut line = latch.line();

        line.set_level(true);
        line.set_level(true);
        assert!(latch.asserted());
        assert_eq!(latch.edges(), 1);

        line.set_level(false);
        assert!(!latch.asserted());
        line.set_level(true);
        assert_eq!(latch.take_edges(), 2);
        assert_eq!(latch.edges(), 0);
    }
}

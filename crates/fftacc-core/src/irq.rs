//! Interrupt line collaborator
//!
//! The accelerator drives a level-sensitive line: it goes high when IEN is
//! set and a write causes any of SCPLT/PCPLT/FULL/EMPTY to become set, and
//! drops again when STATUS is read. Only level changes are forwarded, so a
//! sink sees exactly one `true` per completion.

/// Receiver of interrupt line level changes
pub trait IrqLine {
    /// Called with the new level whenever it changes
    fn set_level(&mut self, asserted: bool);
}

/// Line that is not wired to anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn set_level(&mut self, _asserted: bool) {}
}

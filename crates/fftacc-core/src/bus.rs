//! Register bus abstraction
//!
//! A `RegisterBus` is anything that answers 32-bit reads and writes at byte
//! offsets: the in-process [`crate::Accelerator`] model, or a mapped BAR of
//! real hardware. Host-side sequences in [`crate::protocol`] are written
//! against this trait only.
//!
//! Reads take `&mut self` because STATUS is clear-on-read.

use crate::error::Result;
use crate::regs::Register;

/// 32-bit register access at byte offsets
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read32(&mut self, offset: u32) -> Result<u32>;

    /// Write `value` to the register at `offset`
    fn write32(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Offset at which `reg` is decoded on this bus
    ///
    /// Defaults to the byte-addressed layout.
    fn offset_of(&self, reg: Register) -> u32 {
        reg.byte_offset()
    }

    /// Read a register by name
    fn read_reg(&mut self, reg: Register) -> Result<u32> {
        let offset = self.offset_of(reg);
        self.read32(offset)
    }

    /// Write a register by name
    fn write_reg(&mut self, reg: Register, value: u32) -> Result<()> {
        let offset = self.offset_of(reg);
        self.write32(offset, value)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read32(&mut self, offset: u32) -> Result<u32> {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: u32, value: u32) -> Result<()> {
        (**self).write32(offset, value)
    }

    fn offset_of(&self, reg: Register) -> u32 {
        (**self).offset_of(reg)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read32(&mut self, offset: u32) -> Result<u32> {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: u32, value: u32) -> Result<()> {
        (**self).write32(offset, value)
    }

    fn offset_of(&self, reg: Register) -> u32 {
        (**self).offset_of(reg)
    }
}

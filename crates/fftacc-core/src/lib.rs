//! fftacc-core - Register-level model of the FFT accelerator
//!
//! This crate holds the one authoritative implementation of the accelerator's
//! register protocol and of the magnitude-spectrum engine it drives. Both the
//! simulated device and any host-side test client go through it.
//!
//! # Layout
//!
//! - [`regs`] - register map, CTRL/STATUS bitfields, CFG0 field helpers
//! - [`codec`] - DATAIN unpacking and DATAOUT packing for 32/16-bit modes
//! - [`transform`] - bit reversal, radix-2 butterflies, magnitude, rescale
//! - [`device`] - the [`Accelerator`] state machine behind the six registers
//! - [`bus`] - the [`RegisterBus`] trait clients use to reach a register file
//! - [`protocol`] - register sequences a host driver issues (reset, load, ...)
//! - [`irq`] - the interrupt line collaborator
//!
//! # Example
//!
//! ```ignore
//! use fftacc_core::{protocol, Accelerator, AcceleratorConfig, SampleMode};
//!
//! let mut acc = Accelerator::new(AcceleratorConfig::default());
//! let poll = protocol::PollConfig::default();
//! let samples: Vec<i32> = (0..16).map(|k| if k % 2 == 0 { 1500 } else { 500 }).collect();
//! let spectrum = protocol::run_session(&mut acc, SampleMode::Bits32, &samples, &poll)?;
//! assert_eq!(spectrum.len(), 8);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bus;
pub mod codec;
pub mod device;
pub mod error;
pub mod irq;
pub mod protocol;
pub mod regs;
pub mod transform;

pub use bus::RegisterBus;
pub use device::{
    AccessPolicy, Accelerator, AcceleratorConfig, AddressMode, OverflowPolicy, Phase,
    RegisterSnapshot,
};
pub use error::{Error, Result};
pub use irq::IrqLine;
pub use regs::{Ctrl, Register, SampleMode, Status};

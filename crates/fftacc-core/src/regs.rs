//! Register map and bitfield definitions
//!
//! The accelerator exposes six 32-bit registers. Offsets are byte addresses
//! with 4-byte alignment; the device model variant that decodes word indices
//! is handled by [`crate::device::AddressMode`].
//!
//! | Offset | Name    | Access |
//! |--------|---------|--------|
//! | 0x00   | DEVID   | R      |
//! | 0x04   | CTRL    | R/W    |
//! | 0x08   | CFG0    | R/W    |
//! | 0x0C   | DATAIN  | W      |
//! | 0x10   | DATAOUT | R      |
//! | 0x14   | STATUS  | R (clear-on-read except FULL/EMPTY) |

use crate::error::{Error, Result};
use bitflags::bitflags;

/// Number of registers in the file
pub const REGISTER_COUNT: usize = 6;

/// Identifier returned by DEVID unless configured otherwise
pub const DEFAULT_DEVICE_ID: u32 = 0xCAFE_AFFE;

/// Capacity of the sample buffer
pub const MAX_SAMPLES: u16 = 2048;

/// Smallest transform length
pub const MIN_SAMPLES: u16 = 16;

/// CFG0 bit selecting 16-bit sample packing
pub const CFG0_SMODE: u32 = 1 << 0;
/// CFG0 NSAMPLES selector field
pub const CFG0_NSAMPLES_MASK: u32 = 0x0000_000E;
/// Shift of the NSAMPLES selector field
pub const CFG0_NSAMPLES_SHIFT: u32 = 1;

/// Logical register names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Constant device identifier
    DevId = 0,
    /// Enable bits and momentary triggers
    Ctrl = 1,
    /// Sample mode and sample count selector
    Cfg0 = 2,
    /// Sample input latch
    DataIn = 3,
    /// Result output latch
    DataOut = 4,
    /// Status word, clear-on-read for edge bits
    Status = 5,
}

impl Register {
    /// All registers in address order
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::DevId,
        Self::Ctrl,
        Self::Cfg0,
        Self::DataIn,
        Self::DataOut,
        Self::Status,
    ];

    /// Word index of this register (0..=5)
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Byte offset of this register
    pub const fn byte_offset(self) -> u32 {
        self.index() * 4
    }

    /// Look a register up by word index
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::DevId),
            1 => Some(Self::Ctrl),
            2 => Some(Self::Cfg0),
            3 => Some(Self::DataIn),
            4 => Some(Self::DataOut),
            5 => Some(Self::Status),
            _ => None,
        }
    }

    /// Whether a read returns meaningful data
    pub const fn is_readable(self) -> bool {
        !matches!(self, Self::DataIn)
    }

    /// Whether a write has any effect
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::Ctrl | Self::Cfg0 | Self::DataIn)
    }

    /// Datasheet name
    pub const fn name(self) -> &'static str {
        match self {
            Self::DevId => "DEVID",
            Self::Ctrl => "CTRL",
            Self::Cfg0 => "CFG0",
            Self::DataIn => "DATAIN",
            Self::DataOut => "DATAOUT",
            Self::Status => "STATUS",
        }
    }

    /// Parse a datasheet name (case-insensitive, `ID` accepted for DEVID)
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ID" => Some(Self::DevId),
            _ => Self::ALL.into_iter().find(|r| r.name() == upper),
        }
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// CTRL register bits
    ///
    /// EN and IEN are stored; SAM and PRC are momentary triggers that are
    /// acted upon during the write and never read back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Ctrl: u32 {
        /// Enable: ingestion mode when set, drain mode when clear
        const EN  = 1 << 0;
        /// Interrupt enable
        const IEN = 1 << 1;
        /// Trigger one ingestion or drain step
        const SAM = 1 << 2;
        /// Trigger the transform
        const PRC = 1 << 3;

        /// Bits that persist in the register
        const STORED = Self::EN.bits() | Self::IEN.bits();
    }
}

bitflags! {
    /// STATUS register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// Ready for a new ingestion cycle
        const READY = 1 << 0;
        /// Sample (ingest or drain) step complete
        const SCPLT = 1 << 1;
        /// Process complete
        const PCPLT = 1 << 2;
        /// Ingestion buffer full
        const FULL  = 1 << 3;
        /// All results drained
        const EMPTY = 1 << 4;

        /// Bits that survive a STATUS read
        const STICKY = Self::FULL.bits() | Self::EMPTY.bits();
        /// Bits that raise the interrupt line when IEN is set
        const IRQ_SOURCES = Self::SCPLT.bits()
            | Self::PCPLT.bits()
            | Self::FULL.bits()
            | Self::EMPTY.bits();
    }
}

impl Default for Ctrl {
    fn default() -> Self {
        Ctrl::empty()
    }
}

/// Sample packing selected by CFG0.SMODE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SampleMode {
    /// SMODE clear: one 32-bit sample per DATAIN write
    #[default]
    Bits32,
    /// SMODE set: two 16-bit samples per DATAIN write
    Bits16,
}

impl SampleMode {
    /// Decode from a CFG0 value
    pub const fn from_cfg(cfg: u32) -> Self {
        if cfg & CFG0_SMODE != 0 {
            Self::Bits16
        } else {
            Self::Bits32
        }
    }

    /// Value of the SMODE bit for this mode
    pub const fn smode_bit(self) -> u32 {
        match self {
            Self::Bits32 => 0,
            Self::Bits16 => 1,
        }
    }

    /// Number of buffer slots one DATAIN write fills
    pub const fn samples_per_word(self) -> u16 {
        match self {
            Self::Bits32 => 1,
            Self::Bits16 => 2,
        }
    }

    /// Upper end of the rescaled output range, `2^(SMODE + 4)`
    pub const fn output_scale(self) -> u32 {
        1 << (self.smode_bit() + 4)
    }

    /// Value every bin takes when the spectrum is flat, `2^(SMODE + 4 - 1)`
    pub const fn mid_scale(self) -> u32 {
        1 << (self.smode_bit() + 3)
    }

    /// Sample width in bits
    pub const fn width(self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits16 => 16,
        }
    }
}

/// Check that a transform length is a power of two in 16..=2048
pub fn validate_sample_count(count: u32) -> Result<u16> {
    if count.is_power_of_two() && (MIN_SAMPLES as u32..=MAX_SAMPLES as u32).contains(&count) {
        Ok(count as u16)
    } else {
        Err(Error::UnsupportedSampleCount(count))
    }
}

/// Derive `n_samples` from a CFG0 value: `2^(NSAMPLES + 4)`
pub fn n_samples_from_cfg(cfg: u32) -> Result<u16> {
    let selector = (cfg & CFG0_NSAMPLES_MASK) >> CFG0_NSAMPLES_SHIFT;
    let count = 1u32
        .checked_shl(selector + 4)
        .ok_or(Error::UnsupportedSampleCount(u32::MAX))?;
    validate_sample_count(count)
}

/// Build a CFG0 value for the given mode and sample count
pub fn encode_cfg(mode: SampleMode, n_samples: u32) -> Result<u32> {
    let count = validate_sample_count(n_samples)?;
    let selector = count.trailing_zeros() - 4;
    Ok((selector << CFG0_NSAMPLES_SHIFT) | mode.smode_bit())
}

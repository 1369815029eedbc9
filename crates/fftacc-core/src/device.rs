//! Accelerator register file and protocol state machine
//!
//! [`Accelerator`] owns the six registers, the sample buffer and the two
//! progress cursors. Every state change happens inside [`Accelerator::write`]
//! or the clear-on-read path of [`Accelerator::read`]; a request is validated
//! before anything is mutated, so a returned error leaves the state exactly as
//! it was.
//!
//! A CTRL write is processed in three steps:
//!
//! 1. EN and IEN are latched (SAM and PRC are never stored).
//! 2. SAM performs one ingestion step when EN is set, or one drain step when
//!    EN is clear. Otherwise PRC runs the transform over `n_samples` entries.
//! 3. Reset pass: with EN set the drain cursor returns to 0 and EMPTY drops;
//!    with EN clear the ingestion cursor returns to 0, FULL drops and READY
//!    is asserted.

use crate::codec;
use crate::error::{Error, Result};
use crate::irq::IrqLine;
use crate::regs::{
    n_samples_from_cfg, Ctrl, Register, SampleMode, Status, DEFAULT_DEVICE_ID, MAX_SAMPLES,
};
use crate::transform;

/// How invalid register accesses are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AccessPolicy {
    /// Unmapped, misaligned or wrong-direction accesses return an error
    #[default]
    Strict,
    /// Legacy behavior: such reads return 0 and such writes are ignored
    Permissive,
}

/// What a SAM trigger past the cursor bound does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverflowPolicy {
    /// Return [`Error::OverCapacity`]
    #[default]
    Error,
    /// Leave every cursor and status bit untouched
    Ignore,
}

/// How bus offsets map onto registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AddressMode {
    /// Byte offsets 0x00, 0x04, ... 0x14 (PCI BAR layout)
    #[default]
    Byte,
    /// Word indices 0..=5 (platform device-model layout)
    Word,
}

/// Per-instance configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratorConfig {
    /// Value returned by DEVID
    pub device_id: u32,
    /// Invalid access handling
    pub access: AccessPolicy,
    /// Cursor overflow handling
    pub overflow: OverflowPolicy,
    /// Offset decoding
    pub addressing: AddressMode,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            access: AccessPolicy::default(),
            overflow: OverflowPolicy::default(),
            addressing: AddressMode::default(),
        }
    }
}

/// Protocol phase, derived from EN and the cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// EN clear, nothing drained yet (also before CFG0 is written)
    Idle,
    /// EN set, ingestion cursor below `n_samples`
    Ingesting,
    /// EN set, all samples loaded
    ReadyToProcess,
    /// EN clear, drain in progress
    Draining,
    /// EN clear, all `n_samples / 2` results drained
    Drained,
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Ingesting => write!(f, "ingesting"),
            Phase::ReadyToProcess => write!(f, "ready-to-process"),
            Phase::Draining => write!(f, "draining"),
            Phase::Drained => write!(f, "drained"),
        }
    }
}

/// Side-effect free copy of the register file and cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// DEVID
    pub device_id: u32,
    /// CTRL (EN/IEN only)
    pub ctrl: u32,
    /// CFG0
    pub cfg: u32,
    /// Last DATAIN write
    pub datain: u32,
    /// DATAOUT
    pub dataout: u32,
    /// STATUS, not cleared by taking the snapshot
    pub status: u32,
    /// Ingestion cursor
    pub sample_index: u16,
    /// Drain cursor
    pub result_index: u16,
    /// Configured transform length
    pub n_samples: Option<u16>,
    /// Current phase
    pub phase: Phase,
    /// Interrupt line level
    pub irq_asserted: bool,
}

/// Work selected by a CTRL write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Ingest,
    Drain,
    Process,
    Skip,
}

/// Simulated FFT accelerator
pub struct Accelerator {
    config: AcceleratorConfig,
    ctrl: Ctrl,
    cfg: u32,
    datain: u32,
    dataout: u32,
    status: Status,
    /// Input staging and in-place output
    buffer: Vec<u32>,
    sample_index: u16,
    result_index: u16,
    /// `None` until CFG0 is written
    n_samples: Option<u16>,
    irq_level: bool,
    irq: Option<Box<dyn IrqLine + Send>>,
}

impl Accelerator {
    /// Create an accelerator in the reset state
    pub fn new(config: AcceleratorConfig) -> Self {
        Self {
            config,
            ctrl: Ctrl::empty(),
            cfg: 0,
            datain: 0,
            dataout: 0,
            status: Status::READY,
            buffer: vec![0; MAX_SAMPLES as usize],
            sample_index: 0,
            result_index: 0,
            n_samples: None,
            irq_level: false,
            irq: None,
        }
    }

    /// Create an accelerator with the default configuration
    pub fn new_default() -> Self {
        Self::new(AcceleratorConfig::default())
    }

    /// Wire an interrupt line
    pub fn attach_irq(&mut self, line: Box<dyn IrqLine + Send>) {
        self.irq = Some(line);
    }

    /// Return to the reset state: CTRL cleared, cursors at 0, STATUS = READY
    ///
    /// CFG0 keeps its value.
    pub fn reset(&mut self) {
        self.ctrl = Ctrl::empty();
        self.sample_index = 0;
        self.result_index = 0;
        self.status = Status::READY;
        self.set_irq_level(false);
        log::debug!("accelerator 0x{:08X}: reset", self.config.device_id);
    }

    /// Get the configuration
    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    /// Transform length selected by CFG0, if written
    pub fn n_samples(&self) -> Option<u16> {
        self.n_samples
    }

    /// Ingestion cursor
    pub fn sample_index(&self) -> u16 {
        self.sample_index
    }

    /// Drain cursor
    pub fn result_index(&self) -> u16 {
        self.result_index
    }

    /// Sample mode selected by CFG0
    pub fn sample_mode(&self) -> SampleMode {
        SampleMode::from_cfg(self.cfg)
    }

    /// Level of the interrupt line
    pub fn irq_asserted(&self) -> bool {
        self.irq_level
    }

    /// The active part of the sample buffer (`n_samples` entries)
    pub fn samples(&self) -> &[u32] {
        &self.buffer[..self.n_samples.unwrap_or(0) as usize]
    }

    /// Current protocol phase
    pub fn phase(&self) -> Phase {
        let Some(n) = self.n_samples else {
            return Phase::Idle;
        };

        if self.ctrl.contains(Ctrl::EN) {
            if self.sample_index >= n {
                Phase::ReadyToProcess
            } else {
                Phase::Ingesting
            }
        } else if self.result_index >= n / 2 {
            Phase::Drained
        } else if self.result_index > 0 {
            Phase::Draining
        } else {
            Phase::Idle
        }
    }

    /// Copy out every register without triggering clear-on-read
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            device_id: self.config.device_id,
            ctrl: self.ctrl.bits(),
            cfg: self.cfg,
            datain: self.datain,
            dataout: self.dataout,
            status: self.status.bits(),
            sample_index: self.sample_index,
            result_index: self.result_index,
            n_samples: self.n_samples,
            phase: self.phase(),
            irq_asserted: self.irq_level,
        }
    }

    /// Map a bus offset to a register
    pub fn decode(&self, offset: u32) -> Result<Register> {
        let index = match self.config.addressing {
            AddressMode::Byte => {
                if offset % 4 != 0 {
                    return Err(Error::InvalidOffset { offset });
                }
                offset / 4
            }
            AddressMode::Word => offset,
        };
        Register::from_index(index).ok_or(Error::InvalidOffset { offset })
    }

    /// Bus offset of `reg` under this instance's addressing mode
    pub fn offset_of(&self, reg: Register) -> u32 {
        match self.config.addressing {
            AddressMode::Byte => reg.byte_offset(),
            AddressMode::Word => reg.index(),
        }
    }

    /// Read the register at `offset`
    pub fn read(&mut self, offset: u32) -> Result<u32> {
        match self.decode(offset) {
            Ok(reg) => self.read_register(reg),
            Err(e) => self.tolerate(e).map(|()| 0),
        }
    }

    /// Write `value` to the register at `offset`
    pub fn write(&mut self, offset: u32, value: u32) -> Result<()> {
        match self.decode(offset) {
            Ok(reg) => self.write_register(reg, value),
            Err(e) => self.tolerate(e),
        }
    }

    /// Read a register by name
    pub fn read_register(&mut self, reg: Register) -> Result<u32> {
        match reg {
            Register::DevId => Ok(self.config.device_id),
            Register::Ctrl => Ok(self.ctrl.bits()),
            Register::Cfg0 => Ok(self.cfg),
            Register::DataOut => Ok(self.dataout),
            Register::Status => Ok(self.read_status()),
            Register::DataIn => self
                .tolerate(Error::AccessDenied {
                    offset: self.offset_of(reg),
                })
                .map(|()| 0),
        }
    }

    /// Write a register by name
    pub fn write_register(&mut self, reg: Register, value: u32) -> Result<()> {
        match reg {
            Register::Ctrl => self.write_ctrl(value),
            Register::Cfg0 => self.write_cfg(value),
            Register::DataIn => {
                self.datain = value;
                Ok(())
            }
            Register::DevId | Register::DataOut | Register::Status => {
                self.tolerate(Error::AccessDenied {
                    offset: self.offset_of(reg),
                })
            }
        }
    }

    /// Swallow an addressing error in permissive mode
    fn tolerate(&self, err: Error) -> Result<()> {
        match self.config.access {
            AccessPolicy::Strict => Err(err),
            AccessPolicy::Permissive => {
                log::warn!("accelerator 0x{:08X}: ignoring {}", self.config.device_id, err);
                Ok(())
            }
        }
    }

    fn read_status(&mut self) -> u32 {
        let word = self.status.bits();
        self.status &= Status::STICKY;
        self.set_irq_level(false);
        word
    }

    fn require_configured(&self) -> Result<u16> {
        self.n_samples.ok_or(Error::NotConfigured)
    }

    fn overflow(&self, index: u16, limit: u16) -> Result<Step> {
        match self.config.overflow {
            OverflowPolicy::Error => Err(Error::OverCapacity { index, limit }),
            OverflowPolicy::Ignore => {
                log::debug!("SAM at cursor {}/{} ignored", index, limit);
                Ok(Step::Skip)
            }
        }
    }

    /// Decide what a CTRL write will do, without side effects
    fn plan(&self, request: Ctrl) -> Result<Option<Step>> {
        if request.contains(Ctrl::SAM) {
            let n = self.require_configured()?;
            let step = if request.contains(Ctrl::EN) {
                let width = self.sample_mode().samples_per_word();
                if self.sample_index + width > n {
                    self.overflow(self.sample_index, n)?
                } else {
                    Step::Ingest
                }
            } else {
                let limit = n / 2;
                if self.result_index >= limit {
                    self.overflow(self.result_index, limit)?
                } else {
                    Step::Drain
                }
            };
            Ok(Some(step))
        } else if request.contains(Ctrl::PRC) {
            self.require_configured()?;
            Ok(Some(Step::Process))
        } else {
            Ok(None)
        }
    }

    fn write_ctrl(&mut self, value: u32) -> Result<()> {
        let request = Ctrl::from_bits_truncate(value);
        let step = self.plan(request)?;
        let before = self.status;

        self.ctrl = request & Ctrl::STORED;

        match step {
            Some(Step::Ingest) => self.ingest(),
            Some(Step::Drain) => self.drain(),
            Some(Step::Process) => self.process()?,
            Some(Step::Skip) | None => {}
        }

        if self.ctrl.contains(Ctrl::EN) {
            self.result_index = 0;
            self.status.remove(Status::EMPTY);
        } else {
            self.sample_index = 0;
            self.status.remove(Status::FULL);
            self.status.insert(Status::READY);
        }

        self.raise_irq_if_needed(before);
        Ok(())
    }

    fn ingest(&mut self) {
        let n = self.n_samples.unwrap_or(0);
        let unpacked = codec::unpack_datain(self.sample_mode(), self.datain);
        let written = codec::store(&mut self.buffer, self.sample_index as usize, unpacked);
        self.sample_index += written as u16;
        self.status.insert(Status::SCPLT);

        log::debug!(
            "ingest 0x{:08X}: cursor {}/{}",
            self.datain,
            self.sample_index,
            n
        );
        if self.sample_index == n {
            self.status.insert(Status::FULL);
            log::info!("All {} samples loaded, ready to process", n);
        }
    }

    fn drain(&mut self) {
        let limit = self.n_samples.unwrap_or(0) / 2;
        let result = self.buffer[self.result_index as usize];
        self.dataout = codec::encode_dataout(self.sample_mode(), result);
        self.result_index += 1;
        self.status.insert(Status::SCPLT);

        log::debug!(
            "drain 0x{:08X}: cursor {}/{}",
            self.dataout,
            self.result_index,
            limit
        );
        if self.result_index == limit {
            self.status.insert(Status::EMPTY);
            log::info!("All {} results drained", limit);
        }
    }

    fn process(&mut self) -> Result<()> {
        let n = self.require_configured()? as usize;
        if self.sample_index as usize != n {
            log::warn!(
                "processing with {} of {} samples loaded",
                self.sample_index,
                n
            );
        }
        let mode = self.sample_mode();
        transform::magnitude_spectrum(&mut self.buffer[..n], mode)?;
        self.status.insert(Status::PCPLT);
        log::debug!("process complete over {} samples", n);
        Ok(())
    }

    /// In-flight means ingestion started, or drain started and not finished
    fn session_in_progress(&self) -> bool {
        let limit = self.n_samples.unwrap_or(0) / 2;
        self.sample_index > 0 || (self.result_index > 0 && self.result_index < limit)
    }

    fn write_cfg(&mut self, value: u32) -> Result<()> {
        let n = n_samples_from_cfg(value)?;

        if self.session_in_progress() {
            match self.config.access {
                AccessPolicy::Strict => return Err(Error::SessionInProgress),
                AccessPolicy::Permissive => log::warn!(
                    "CFG0 rewritten mid-session (cursors {}/{}), restarting cursors",
                    self.sample_index,
                    self.result_index
                ),
            }
        }

        // Cursors always restart so they stay within the new sample count
        self.sample_index = 0;
        self.result_index = 0;
        self.cfg = value;
        self.n_samples = Some(n);
        log::debug!(
            "configured: {} samples, {}-bit mode",
            n,
            self.sample_mode().width()
        );
        Ok(())
    }

    fn raise_irq_if_needed(&mut self, before: Status) {
        let newly_set = self.status.difference(before) & Status::IRQ_SOURCES;
        if self.ctrl.contains(Ctrl::IEN) && !newly_set.is_empty() {
            self.set_irq_level(true);
        }
    }

    fn set_irq_level(&mut self, asserted: bool) {
        if self.irq_level == asserted {
            return;
        }
        self.irq_level = asserted;
        if let Some(line) = self.irq.as_mut() {
            line.set_level(asserted);
        }
    }
}

impl crate::bus::RegisterBus for Accelerator {
    fn read32(&mut self, offset: u32) -> Result<u32> {
        self.read(offset)
    }

    fn write32(&mut self, offset: u32, value: u32) -> Result<()> {
        self.write(offset, value)
    }

    fn offset_of(&self, reg: Register) -> u32 {
        Accelerator::offset_of(self, reg)
    }
}

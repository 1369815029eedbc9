//! Host-side register sequences
//!
//! These are the operations a driver issues against the register file: reset,
//! configure, load one sample word, process, read one result. Each waiting
//! step polls STATUS a bounded number of times. Because STATUS is
//! clear-on-read, the bits seen across polls are accumulated and returned.

use crate::bus::RegisterBus;
use crate::codec;
use crate::error::{Error, Result};
use crate::regs::{
    encode_cfg, validate_sample_count, Ctrl, Register, SampleMode, Status, CFG0_NSAMPLES_MASK,
    CFG0_SMODE,
};

/// Default number of STATUS polls before giving up
pub const DEFAULT_MAX_POLLS: u32 = 1000;

/// STATUS polling bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PollConfig {
    /// Maximum STATUS reads per wait
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

/// Read DEVID
pub fn read_id<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<u32> {
    bus.read_reg(Register::DevId)
}

/// Read (and thereby clear) STATUS
pub fn read_status<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<Status> {
    bus.read_reg(Register::Status).map(Status::from_bits_truncate)
}

/// Read CTRL
pub fn read_ctrl<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<Ctrl> {
    bus.read_reg(Register::Ctrl).map(Ctrl::from_bits_truncate)
}

/// Poll STATUS until every bit of `mask` has been observed
///
/// Returns the union of all bits seen.
pub fn wait_for<B: RegisterBus + ?Sized>(
    bus: &mut B,
    mask: Status,
    poll: &PollConfig,
) -> Result<Status> {
    let mut seen = Status::empty();
    for _ in 0..poll.max_polls {
        seen |= read_status(bus)?;
        if seen.contains(mask) {
            return Ok(seen);
        }
    }
    log::debug!(
        "gave up after {} polls, saw {:?}, wanted {:?}",
        poll.max_polls,
        seen,
        mask
    );
    Err(Error::Timeout {
        waiting_for: mask.bits(),
    })
}

/// Set or clear a single CTRL field with a read-modify-write
///
/// Setting SAM or PRC fires the trigger with the currently stored EN/IEN.
pub fn set_ctrl_field<B: RegisterBus + ?Sized>(bus: &mut B, field: Ctrl, on: bool) -> Result<()> {
    let mut ctrl = read_ctrl(bus)?;
    ctrl.set(field, on);
    bus.write_reg(Register::Ctrl, ctrl.bits())
}

/// Change CFG0.SMODE, keeping NSAMPLES
pub fn set_sample_mode<B: RegisterBus + ?Sized>(bus: &mut B, mode: SampleMode) -> Result<()> {
    let cfg = bus.read_reg(Register::Cfg0)?;
    bus.write_reg(Register::Cfg0, (cfg & !CFG0_SMODE) | mode.smode_bit())
}

/// Change CFG0.NSAMPLES, keeping SMODE
pub fn set_sample_count<B: RegisterBus + ?Sized>(bus: &mut B, n_samples: u32) -> Result<()> {
    let cfg = bus.read_reg(Register::Cfg0)?;
    let nsamples = encode_cfg(SampleMode::Bits32, n_samples)?;
    bus.write_reg(Register::Cfg0, (cfg & !CFG0_NSAMPLES_MASK) | nsamples)
}

/// Return both cursors to 0 and wait for READY
///
/// EN is pulsed so that the drain cursor restarts too.
pub fn reset<B: RegisterBus + ?Sized>(bus: &mut B, poll: &PollConfig) -> Result<()> {
    bus.write_reg(Register::Ctrl, Ctrl::EN.bits())?;
    bus.write_reg(Register::Ctrl, 0)?;
    wait_for(bus, Status::READY, poll)?;
    Ok(())
}

/// Write CFG0 for `mode` and `n_samples`
pub fn configure<B: RegisterBus + ?Sized>(
    bus: &mut B,
    mode: SampleMode,
    n_samples: u32,
) -> Result<()> {
    let cfg = encode_cfg(mode, n_samples)?;
    bus.write_reg(Register::Cfg0, cfg)
}

/// Enter ingestion mode
pub fn enable<B: RegisterBus + ?Sized>(bus: &mut B, interrupts: bool) -> Result<()> {
    let mut ctrl = Ctrl::EN;
    ctrl.set(Ctrl::IEN, interrupts);
    bus.write_reg(Register::Ctrl, ctrl.bits())
}

/// Load one DATAIN word and wait for SCPLT
///
/// The returned status tells the caller whether FULL was reached.
pub fn load_sample<B: RegisterBus + ?Sized>(
    bus: &mut B,
    word: u32,
    poll: &PollConfig,
) -> Result<Status> {
    let ctrl = read_ctrl(bus)? | Ctrl::EN;
    bus.write_reg(Register::DataIn, word)?;
    bus.write_reg(Register::Ctrl, (ctrl | Ctrl::SAM).bits())?;
    wait_for(bus, Status::SCPLT, poll)
}

/// Trigger the transform and wait for PCPLT
pub fn process<B: RegisterBus + ?Sized>(bus: &mut B, poll: &PollConfig) -> Result<()> {
    let ctrl = read_ctrl(bus)? | Ctrl::EN;
    bus.write_reg(Register::Ctrl, (ctrl | Ctrl::PRC).bits())?;
    wait_for(bus, Status::PCPLT, poll)?;
    Ok(())
}

/// Drain one result: clear EN, trigger SAM, wait for SCPLT, read DATAOUT
pub fn read_result<B: RegisterBus + ?Sized>(bus: &mut B, poll: &PollConfig) -> Result<u32> {
    let ctrl = read_ctrl(bus)? - Ctrl::EN;
    bus.write_reg(Register::Ctrl, (ctrl | Ctrl::SAM).bits())?;
    wait_for(bus, Status::SCPLT, poll)?;
    bus.read_reg(Register::DataOut)
}

/// Run a complete session and return the `n / 2` drained results
///
/// `samples.len()` selects the transform length. In 16-bit mode each sample
/// is truncated to its low 16 bits.
pub fn run_session<B: RegisterBus + ?Sized>(
    bus: &mut B,
    mode: SampleMode,
    samples: &[i32],
    poll: &PollConfig,
) -> Result<Vec<u32>> {
    let n = validate_sample_count(samples.len() as u32)?;

    reset(bus, poll)?;
    configure(bus, mode, n as u32)?;
    enable(bus, false)?;

    let words = codec::encode_samples(mode, samples);
    let mut full = false;
    for word in &words {
        full = load_sample(bus, *word, poll)?.contains(Status::FULL);
    }
    if !full {
        // FULL is sticky, so a late STATUS read still shows it
        full = read_status(bus)?.contains(Status::FULL);
    }
    if !full {
        log::warn!("FULL not reported after {} words", words.len());
    }
    log::info!("loaded {} samples ({}-bit)", n, mode.width());

    process(bus, poll)?;

    let mut results = Vec::with_capacity(n as usize / 2);
    for _ in 0..n / 2 {
        results.push(read_result(bus, poll)?);
    }
    log::info!("drained {} results", results.len());
    Ok(results)
}

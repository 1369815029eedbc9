//! Session and direct transform commands

use crate::cli::WaveArgs;
use crate::signal::{self, WaveSpec};
use fftacc_core::regs::{encode_cfg, validate_sample_count};
use fftacc_core::{codec, transform, Ctrl, Register, SampleMode, Status};
use fftacc_host::{AcceleratorHandle, Request};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Load samples from a file, or generate them
fn load_input(
    input: Option<&Path>,
    wave: &WaveArgs,
) -> Result<Vec<i32>, Box<dyn std::error::Error>> {
    match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let samples = signal::parse_samples(&text)?;
            log::info!("Read {} samples from {}", samples.len(), path.display());
            Ok(samples)
        }
        None => {
            let samples = signal::generate(&WaveSpec::from(wave));
            log::info!(
                "Generated {} samples ({:?} Hz at {} Hz)",
                samples.len(),
                wave.freq,
                wave.rate
            );
            Ok(samples)
        }
    }
}

/// Buffer contents the device holds after loading `samples` in `mode`
///
/// 16-bit mode keeps only the low halfword of each sample, sign-extended.
fn device_words(samples: &[i32], mode: SampleMode) -> Vec<u32> {
    match mode {
        SampleMode::Bits32 => samples.iter().map(|&s| s as u32).collect(),
        SampleMode::Bits16 => samples.iter().map(|&s| s as i16 as i32 as u32).collect(),
    }
}

fn emit(values: &[u32], output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let text = signal::format_spectrum(values);
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {} bins to {}", values.len(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn progress_bar(len: u64, what: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:8} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );
    pb.set_message(what.to_string());
    Ok(pb)
}

/// Run one load/process/drain session through the driver requests
pub fn cmd_run(
    handle: &AcceleratorHandle,
    input: Option<&Path>,
    mode: SampleMode,
    output: Option<&Path>,
    check: bool,
    wave: &WaveArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let samples = load_input(input, wave)?;
    let n = validate_sample_count(samples.len() as u32)?;
    let words = codec::encode_samples(mode, &samples);

    let mut session = handle.open_session()?;
    session.execute(Request::Reset)?;
    session.execute(Request::Configure(encode_cfg(mode, n as u32)?))?;
    session.execute(Request::Set(Register::Ctrl, Ctrl::EN.bits()))?;

    let pb = progress_bar(words.len() as u64, "load")?;
    let mut full = false;
    for word in &words {
        if let Some(status) = session.execute(Request::LoadSample(*word))?.status() {
            full = status.contains(Status::FULL);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    if !full {
        log::warn!("Device did not report FULL after {} words", words.len());
    }

    session.execute(Request::Process)?;
    log::info!("Processed {} samples ({}-bit mode)", n, mode.width());

    let pb = progress_bar(n as u64 / 2, "drain")?;
    let mut spectrum = Vec::with_capacity(n as usize / 2);
    for _ in 0..n / 2 {
        if let Some(v) = session.execute(Request::ReadResult)?.value() {
            spectrum.push(v);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    drop(session);

    if let Some(latch) = handle.irq() {
        println!("Interrupts raised: {}", latch.take_edges());
    }

    if check {
        let mut expected = device_words(&samples, mode);
        transform::magnitude_spectrum(&mut expected, mode)?;
        let expected: Vec<u32> = expected[..spectrum.len()]
            .iter()
            .map(|&v| codec::encode_dataout(mode, v))
            .collect();
        if expected != spectrum {
            return Err("session output differs from the direct engine run".into());
        }
        println!("Session output matches the direct engine run");
    }

    emit(&spectrum, output)
}

/// Run the transform engine on a sample file and print all `n / 2` bins
pub fn cmd_transform(
    input: &Path,
    mode: SampleMode,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(input)?;
    let samples = signal::parse_samples(&text)?;
    let mut buffer = device_words(&samples, mode);
    transform::magnitude_spectrum(&mut buffer, mode)?;
    buffer.truncate(buffer.len() / 2);
    emit(&buffer, output)
}

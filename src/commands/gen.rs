//! Waveform generation command

use crate::cli::WaveArgs;
use crate::signal::{format_c_array, generate, WaveSpec};
use std::path::Path;

impl From<&WaveArgs> for WaveSpec {
    fn from(args: &WaveArgs) -> Self {
        Self {
            frequencies: args.freq.clone(),
            sample_rate: args.rate,
            count: args.count,
        }
    }
}

/// Write a generated waveform as a C array
pub fn cmd_gen(
    wave: &WaveArgs,
    name: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if wave.rate <= 0.0 {
        return Err("sample rate must be positive".into());
    }
    let samples = generate(&WaveSpec::from(wave));
    let text = format_c_array(name, &samples);

    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {} samples to {}", samples.len(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

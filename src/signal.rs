//! Test waveforms and sample files
//!
//! Sample files hold integers separated by commas or whitespace. They may be
//! wrapped in a C initializer, which is what `gen` writes:
//!
//! ```text
//! static int wave_samples[] = {
//! 127, 140, 152, ...
//! };
//! ```

use std::f64::consts::PI;
use std::fmt::Write as _;

/// Largest value a generated sample takes
pub const WAVE_MAX: i32 = 255;

/// Parameters of a composed-sine test signal
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSpec {
    /// Component frequencies in Hz, each with unit amplitude
    pub frequencies: Vec<f64>,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Number of samples
    pub count: usize,
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            frequencies: vec![300.0, 550.0],
            sample_rate: 10_000.0,
            count: 1024,
        }
    }
}

/// Sum the sine components and rescale into `0..=WAVE_MAX`, rounding
pub fn generate(spec: &WaveSpec) -> Vec<i32> {
    let raw: Vec<f64> = (0..spec.count)
        .map(|i| {
            let t = i as f64 / spec.sample_rate;
            spec.frequencies
                .iter()
                .map(|f| (2.0 * PI * f * t).sin())
                .sum()
        })
        .collect();

    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    raw.iter()
        .map(|&v| {
            if span > 0.0 {
                ((v - min) / span * WAVE_MAX as f64).round() as i32
            } else {
                0
            }
        })
        .collect()
}

/// Parse a sample file
///
/// Anything up to the first `{` and from the following `}` is ignored when
/// braces are present.
pub fn parse_samples(text: &str) -> Result<Vec<i32>, String> {
    let body = match text.find('{') {
        Some(start) => {
            let rest = &text[start + 1..];
            let end = rest.find('}').ok_or("unterminated '{' in sample file")?;
            &rest[..end]
        }
        None => text,
    };

    body.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            let parsed = match tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
                Some(hex) => u32::from_str_radix(hex, 16).map(|v| v as i32),
                None => tok.parse::<i32>(),
            };
            parsed.map_err(|e| format!("invalid sample '{}': {}", tok, e))
        })
        .collect()
}

/// Format samples as a C `static int` initializer named `name`
pub fn format_c_array(name: &str, samples: &[i32]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "static int {}[] = {{", name);
    for (i, line) in samples.chunks(16).enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        let items: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        out.push_str(&items.join(", "));
    }
    out.push_str("\n};\n");
    out
}

/// Format results one per line as `bin value`
pub fn format_spectrum(values: &[u32]) -> String {
    let mut out = String::new();
    for (bin, v) in values.iter().enumerate() {
        let _ = writeln!(out, "{:5} {}", bin, v);
    }
    out
}

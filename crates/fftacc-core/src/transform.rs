//! Magnitude-spectrum engine
//!
//! Radix-2 decimation-in-time Cooley-Tukey over a real input:
//!
//! 1. bit-reversal permutation of the real part (imaginary starts at zero)
//! 2. `log2(N)` butterfly stages with twiddles `W[k] = exp(-2*pi*i*k/N)`,
//!    `k < N/2`, generated by angle addition from `W[1]`
//! 3. magnitude `sqrt(re^2 + im^2)`, truncated toward zero
//! 4. min-max rescale into `[0, 2^(SMODE + 4)]`, truncated toward zero; a
//!    flat spectrum becomes `2^(SMODE + 3)` everywhere
//!
//! Samples are interpreted as two's-complement `i32`. The result replaces the
//! input in place; all `N` bins are written even though only the first `N/2`
//! are drained.

use crate::error::Result;
use crate::regs::{validate_sample_count, SampleMode};

/// Reverse the low `bits` bits of `index`
pub fn bit_reverse_index(index: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    index.reverse_bits() >> (usize::BITS - bits)
}

/// Reorder `values` so that element `i` lands at `bit_reverse_index(i)`
///
/// `values.len()` must be a power of two.
pub fn bit_reverse_permute<T>(values: &mut [T]) {
    let bits = values.len().trailing_zeros();
    for i in 0..values.len() {
        let j = bit_reverse_index(i, bits);
        if j > i {
            values.swap(i, j);
        }
    }
}

/// Twiddle factors `W[k]` for `k` in `0..n/2`, as `(re, im)` pairs
pub fn twiddle_factors(n: usize) -> Vec<(f64, f64)> {
    let half = n / 2;
    let mut w = Vec::with_capacity(half);
    w.push((1.0, 0.0));
    if half < 2 {
        return w;
    }

    let angle = -2.0 * core::f64::consts::PI / n as f64;
    let (w1r, w1i) = (angle.cos(), angle.sin());
    w.push((w1r, w1i));
    for k in 2..half {
        let (pr, pi) = w[k - 1];
        w.push((w1r * pr - w1i * pi, w1i * pr + w1r * pi));
    }
    w
}

/// Run the butterfly network in place on bit-reversed input
fn butterflies(re: &mut [f64], im: &mut [f64], twiddles: &[(f64, f64)]) {
    let n = re.len();
    let mut half = 1;
    let mut stride = n / 2;

    while half < n {
        for i in 0..n {
            if i & half != 0 {
                continue;
            }
            let (wr, wi) = twiddles[(i * stride) % (half * stride)];
            let (ar, ai) = (re[i], im[i]);
            let (br, bi) = (re[i + half], im[i + half]);

            let tr = wr * br - wi * bi;
            let ti = wr * bi + wi * br;

            re[i] = ar + tr;
            im[i] = ai + ti;
            re[i + half] = ar - tr;
            im[i + half] = ai - ti;
        }
        half *= 2;
        stride /= 2;
    }
}

/// Complex DFT of a real sequence, returned as `(re, im)` vectors
///
/// `samples.len()` must be a power of two in 16..=2048.
pub fn complex_spectrum(samples: &[i32]) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = validate_sample_count(samples.len() as u32)? as usize;

    let mut re: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let mut im = vec![0.0; n];

    bit_reverse_permute(&mut re);
    butterflies(&mut re, &mut im, &twiddle_factors(n));

    Ok((re, im))
}

/// Rescale magnitudes into `[0, mode.output_scale()]`
///
/// Magnitudes stay 64-bit up to this point; only the scaled values are
/// narrowed.
pub fn rescale(magnitudes: &[u64], mode: SampleMode) -> Vec<u32> {
    let (Some(&min), Some(&max)) = (magnitudes.iter().min(), magnitudes.iter().max()) else {
        return Vec::new();
    };

    if min == max {
        return vec![mode.mid_scale(); magnitudes.len()];
    }

    let span = (max - min) as f64;
    let scale = mode.output_scale() as f64;
    magnitudes
        .iter()
        .map(|&m| ((m - min) as f64 / span * scale) as u32)
        .collect()
}

/// Replace `buffer` (raw sample words) with its rescaled magnitude spectrum
pub fn magnitude_spectrum(buffer: &mut [u32], mode: SampleMode) -> Result<()> {
    let samples: Vec<i32> = buffer.iter().map(|&w| w as i32).collect();
    let (re, im) = complex_spectrum(&samples)?;

    let magnitudes: Vec<u64> = re
        .iter()
        .zip(im.iter())
        .map(|(r, i)| (r * r + i * i).sqrt() as u64)
        .collect();
    buffer.copy_from_slice(&rescale(&magnitudes, mode));

    log::trace!("transform: {} bins, scale {}", buffer.len(), mode.output_scale());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn words(samples: &[i32]) -> Vec<u32> {
        samples.iter().map(|&s| s as u32).collect()
    }

    #[test]
    fn test_bit_reverse_index() {
        assert_eq!(bit_reverse_index(0, 4), 0);
        assert_eq!(bit_reverse_index(1, 4), 8);
        assert_eq!(bit_reverse_index(3, 4), 12);
        assert_eq!(bit_reverse_index(6, 4), 6);
        assert_eq!(bit_reverse_index(1, 11), 1024);
    }

    #[test]
    fn test_bit_reverse_permute() {
        let mut v: Vec<usize> = (0..16).collect();
        bit_reverse_permute(&mut v);
        assert_eq!(
            v,
            vec![0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15]
        );
        // Applying it twice restores the order
        bit_reverse_permute(&mut v);
        assert_eq!(v, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_twiddles_match_direct_evaluation() {
        let n = 2048;
        let w = twiddle_factors(n);
        assert_eq!(w.len(), n / 2);
        for (k, &(r, i)) in w.iter().enumerate() {
            let a = -2.0 * core::f64::consts::PI * k as f64 / n as f64;
            assert!((r - a.cos()).abs() < 1e-9, "re mismatch at {}", k);
            assert!((i - a.sin()).abs() < 1e-9, "im mismatch at {}", k);
        }
    }

    #[test]
    fn test_matches_naive_dft() {
        let n = 64;
        // Deterministic pseudo-random input
        let mut x = 12345u32;
        let samples: Vec<i32> = (0..n)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12345);
                ((x >> 16) % 2001) as i32 - 1000
            })
            .collect();

        let (re, im) = complex_spectrum(&samples).unwrap();
        for k in 0..n {
            let (mut dr, mut di) = (0.0f64, 0.0f64);
            for (t, &s) in samples.iter().enumerate() {
                let a = -2.0 * core::f64::consts::PI * (k * t) as f64 / n as f64;
                dr += s as f64 * a.cos();
                di += s as f64 * a.sin();
            }
            assert!((re[k] - dr).abs() < 1e-6, "re bin {}", k);
            assert!((im[k] - di).abs() < 1e-6, "im bin {}", k);
        }
    }

    #[test]
    fn test_dc_and_nyquist_exact() {
        // 1000 + 500 * (-1)^k: DC = 16000, bin 8 = 8000, everything else 0
        let samples: Vec<i32> = (0..16).map(|k| if k % 2 == 0 { 1500 } else { 500 }).collect();
        let mut buf = words(&samples);
        magnitude_spectrum(&mut buf, SampleMode::Bits32).unwrap();

        let mut expected = vec![0u32; 16];
        expected[0] = 16;
        expected[8] = 8;
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_single_bin_sinusoid() {
        let samples: Vec<i32> = (0..16)
            .map(|k| (1000.0 * (2.0 * core::f64::consts::PI * k as f64 / 16.0).sin()).round() as i32)
            .collect();
        let mut buf = words(&samples);
        magnitude_spectrum(&mut buf, SampleMode::Bits32).unwrap();

        // Peaks at bin 1 and its mirror bin 15, everything else at the floor
        assert!(buf[1] >= 15, "bin 1 = {}", buf[1]);
        assert!(buf[15] >= 15, "bin 15 = {}", buf[15]);
        assert!(buf[1] == 16 || buf[15] == 16);
        for (k, &v) in buf.iter().enumerate() {
            if k != 1 && k != 15 {
                assert_eq!(v, 0, "bin {}", k);
            }
            assert!(v <= SampleMode::Bits32.output_scale());
        }
    }

    #[test]
    fn test_flat_spectrum_is_mid_scale() {
        // An impulse has equal magnitude in every bin
        let mut impulse = vec![0u32; 32];
        impulse[0] = 1000;
        magnitude_spectrum(&mut impulse, SampleMode::Bits32).unwrap();
        assert!(impulse.iter().all(|&v| v == 8));

        let mut zeros = vec![0u32; 16];
        magnitude_spectrum(&mut zeros, SampleMode::Bits16).unwrap();
        assert!(zeros.iter().all(|&v| v == 16));
    }

    #[test]
    fn test_constant_input_is_dc_only() {
        let mut buf = vec![5u32; 16];
        magnitude_spectrum(&mut buf, SampleMode::Bits32).unwrap();
        assert_eq!(buf[0], 16);
        assert!(buf[1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_16bit_scale() {
        let samples: Vec<i32> = (0..16).map(|k| if k % 2 == 0 { 1500 } else { 500 }).collect();
        let mut buf = words(&samples);
        magnitude_spectrum(&mut buf, SampleMode::Bits16).unwrap();
        assert_eq!(buf[0], 32);
        assert_eq!(buf[8], 16);
    }

    #[test]
    fn test_negative_samples_are_signed() {
        // -1000 everywhere: |DC| = 16000 regardless of sign
        let mut buf = words(&[-1000; 16]);
        magnitude_spectrum(&mut buf, SampleMode::Bits32).unwrap();
        assert_eq!(buf[0], 16);
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let mut short = vec![0u32; 8];
        assert_eq!(
            magnitude_spectrum(&mut short, SampleMode::Bits32),
            Err(Error::UnsupportedSampleCount(8))
        );
        let mut odd = vec![0u32; 48];
        assert_eq!(
            magnitude_spectrum(&mut odd, SampleMode::Bits32),
            Err(Error::UnsupportedSampleCount(48))
        );
    }

    #[test]
    fn test_rescale_truncates() {
        let v = rescale(&[0, 1, 2, 3], SampleMode::Bits32);
        // 1/3 * 16 = 5.33, 2/3 * 16 = 10.67
        assert_eq!(v, vec![0, 5, 10, 16]);
        assert_eq!(rescale(&[7, 7], SampleMode::Bits16), vec![16, 16]);
        assert!(rescale(&[], SampleMode::Bits32).is_empty());
    }

    #[test]
    fn test_magnitudes_above_u32_range() {
        // DC is 12 * i32::MAX and Nyquist 4 * i32::MAX, both beyond u32
        let samples: Vec<i32> = (0..16)
            .map(|k| if k % 2 == 0 { i32::MAX } else { i32::MAX / 2 })
            .collect();
        let mut buf = words(&samples);
        magnitude_spectrum(&mut buf, SampleMode::Bits32).unwrap();

        assert_eq!(buf[0], 16);
        assert_eq!(buf[8], 5);
        for (k, &v) in buf.iter().enumerate() {
            if k != 0 && k != 8 {
                assert_eq!(v, 0, "bin {}", k);
            }
        }
    }
}

//! DATAIN/DATAOUT sample codec
//!
//! In 32-bit mode one DATAIN word is one sample. In 16-bit mode the low
//! halfword is the first sample and the high halfword the second; both are
//! sign-extended into the 32-bit buffer slot.
//!
//! Drain always produces one result per step. In 16-bit mode the result sits
//! in the low halfword of DATAOUT and the high halfword reads as zero.

use crate::regs::SampleMode;

/// Mask of the low (first) halfword of a packed DATAIN word
pub const DATAIN_LOW_MASK: u32 = 0x0000_FFFF;
/// Mask of the high (second) halfword of a packed DATAIN word
pub const DATAIN_HIGH_MASK: u32 = 0xFFFF_0000;
/// Shift of the high halfword
pub const DATAIN_HIGH_SHIFT: u32 = 16;

/// Buffer slots produced by one DATAIN word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unpacked {
    /// 32-bit mode
    One(u32),
    /// 16-bit mode: (low halfword, high halfword)
    Two(u32, u32),
}

fn sign_extend_halfword(half: u32) -> u32 {
    half as u16 as i16 as i32 as u32
}

/// Split a DATAIN word into buffer slots
pub fn unpack_datain(mode: SampleMode, word: u32) -> Unpacked {
    match mode {
        SampleMode::Bits32 => Unpacked::One(word),
        SampleMode::Bits16 => {
            let low = sign_extend_halfword(word & DATAIN_LOW_MASK);
            let high = sign_extend_halfword((word & DATAIN_HIGH_MASK) >> DATAIN_HIGH_SHIFT);
            Unpacked::Two(low, high)
        }
    }
}

/// Store an unpacked word at `index`, returning the number of slots written
///
/// The caller has already checked that room for every slot of `unpacked` at `index`.
pub fn store(buffer: &mut [u32], index: usize, unpacked: Unpacked) -> usize {
    match unpacked {
        Unpacked::One(sample) => {
            buffer[index] = sample;
            1
        }
        Unpacked::Two(low, high) => {
            buffer[index] = low;
            buffer[index + 1] = high;
            2
        }
    }
}

/// Pack two signed 16-bit samples into one DATAIN word (host side)
pub fn pack_pair(first: i16, second: i16) -> u32 {
    (first as u16 as u32) | ((second as u16 as u32) << DATAIN_HIGH_SHIFT)
}

/// Encode a host sample sequence into DATAIN words for `mode`
///
/// In 16-bit mode samples are truncated to their low 16 bits; an odd
/// trailing sample is paired with zero.
pub fn encode_samples(mode: SampleMode, samples: &[i32]) -> Vec<u32> {
    match mode {
        SampleMode::Bits32 => samples.iter().map(|&s| s as u32).collect(),
        SampleMode::Bits16 => samples
            .chunks(2)
            .map(|pair| {
                let first = pair[0] as i16;
                let second = pair.get(1).copied().unwrap_or(0) as i16;
                pack_pair(first, second)
            })
            .collect(),
    }
}

/// Value presented on DATAOUT for one result
pub fn encode_dataout(mode: SampleMode, result: u32) -> u32 {
    match mode {
        SampleMode::Bits32 => result,
        SampleMode::Bits16 => result & DATAIN_LOW_MASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_32bit() {
        assert_eq!(
            unpack_datain(SampleMode::Bits32, 0x1234_5678),
            Unpacked::One(0x1234_5678)
        );
    }

    #[test]
    fn test_unpack_16bit_low_first() {
        // low = 3, high = -2
        let word = 0xFFFE_0003;
        assert_eq!(
            unpack_datain(SampleMode::Bits16, word),
            Unpacked::Two(3, (-2i32) as u32)
        );
    }

    #[test]
    fn test_pack_pair_is_inverse_of_unpack() {
        let word = pack_pair(-1000, 1000);
        assert_eq!(word, 0x03E8_FC18);
        assert_eq!(
            unpack_datain(SampleMode::Bits16, word),
            Unpacked::Two((-1000i32) as u32, 1000)
        );
    }

    #[test]
    fn test_store_advances() {
        let mut buf = [0u32; 4];
        assert_eq!(store(&mut buf, 0, Unpacked::One(7)), 1);
        assert_eq!(store(&mut buf, 1, Unpacked::Two(8, 9)), 2);
        assert_eq!(buf, [7, 8, 9, 0]);
    }

    #[test]
    fn test_encode_samples() {
        assert_eq!(
            encode_samples(SampleMode::Bits32, &[1, -1]),
            vec![1, 0xFFFF_FFFF]
        );
        assert_eq!(
            encode_samples(SampleMode::Bits16, &[1, 2, 3]),
            vec![0x0002_0001, 0x0000_0003]
        );
    }

    #[test]
    fn test_dataout_16bit_uses_low_halfword() {
        assert_eq!(encode_dataout(SampleMode::Bits16, 0x0001_0020), 0x0020);
        assert_eq!(encode_dataout(SampleMode::Bits32, 0x0001_0020), 0x0001_0020);
    }
}

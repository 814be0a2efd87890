
//! Reversible sample transformations of the reference codestream.
//! All arithmetic happens in `i64`, such that the transformed
//! values of 32-bit samples can never overflow while encoding.

use crate::error::{Error, Result};


/// The reversible color transform of JPEG 2000, applied to one pixel.
/// Returns the luma and the two chroma differences.
#[inline]
pub fn forward_color_transform(red: i64, green: i64, blue: i64) -> (i64, i64, i64) {
    let luma = (red + 2 * green + blue).div_euclid(4);
    (luma, blue - green, red - green)
}

/// Reconstruct red, green, and blue from the output of `forward_color_transform`.
/// Wraps instead of overflowing, as the input may come from a corrupt file.
#[inline]
pub fn inverse_color_transform(luma: i64, blue_difference: i64, red_difference: i64) -> (i64, i64, i64) {
    let green = luma.wrapping_sub(blue_difference.wrapping_add(red_difference).div_euclid(4));
    (red_difference.wrapping_add(green), green, blue_difference.wrapping_add(green))
}


/// Map signed numbers to unsigned numbers such that small magnitudes stay small.
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of `zigzag_encode`.
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}


/// Append the LEB128 representation of the number.
pub fn write_varint(output: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        output.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }

    output.push(value as u8);
}

/// Read a LEB128 number and advance the slice.
pub fn read_varint(read: &mut &[u8]) -> Result<u64> {
    let mut value = 0_u64;
    let mut shift = 0;

    loop {
        let (&byte, rest) = read.split_first()
            .ok_or_else(|| Error::invalid("codestream sample data too short"))?;

        *read = rest;

        if shift > 63 || (shift == 63 && byte > 1) {
            return Err(Error::invalid("codestream sample too large"));
        }

        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 { return Ok(value); }

        shift += 7;
    }
}


/// Write each sample as the difference to its left neighbour.
/// The first sample of a line is predicted as zero.
pub fn write_line_differences(output: &mut Vec<u8>, line: impl Iterator<Item = i64>) {
    let mut previous = 0_i64;

    for sample in line {
        write_varint(output, zigzag_encode(sample - previous));
        previous = sample;
    }
}

/// Inverse of `write_line_differences`, filling the whole `line`.
pub fn read_line_differences(read: &mut &[u8], line: &mut [i64]) -> Result<()> {
    let mut previous = 0_i64;

    for sample in line {
        previous = previous.wrapping_add(zigzag_decode(read_varint(read)?));
        *sample = previous;
    }

    Ok(())
}

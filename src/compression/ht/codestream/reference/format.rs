
//! Marker segments of the reference codestream.
//! Modelled after JPEG 2000 main headers: every segment starts with a
//! two byte marker, followed by a two byte length that includes the length field itself.

use smallvec::SmallVec;

use crate::error::{Error, Result, UnitResult, usize_to_u8, usize_to_u16, usize_to_u32, u32_to_usize, u16_to_usize};
use crate::io::{Data, Read, Write};
use crate::math::{Vec2, floor_log_2};
use super::super::{ComponentParameters, CodingParameters, SizeParameters};


/// Start of codestream.
pub const SOC: u16 = 0xFF4F;

/// Image and component size segment.
pub const SIZ: u16 = 0xFF51;

/// Coding style segment.
pub const COD: u16 = 0xFF52;

/// Start of the compressed sample data.
pub const SOD: u16 = 0xFF93;

/// End of codestream.
pub const EOC: u16 = 0xFFD9;


/// Number of bytes of the size segment, including marker and length.
pub fn size_segment_byte_size(component_count: usize) -> usize {
    u16::BYTE_SIZE * 2 // marker, length
        + u32::BYTE_SIZE * 8 // offset, extent, tile offset, tile size
        + u16::BYTE_SIZE // component count
        + component_count * 4
}

/// Write the image and component geometry.
pub fn write_size_segment(write: &mut impl Write, siz: &SizeParameters) -> UnitResult {
    let length = size_segment_byte_size(siz.components.len()) - u16::BYTE_SIZE;

    SIZ.write(write)?;
    usize_to_u16(length, "too many components")?.write(write)?;

    for value in [ siz.image_offset, siz.image_extent, siz.tile_offset, siz.tile_size ] {
        usize_to_u32(value.x(), "image too large")?.write(write)?;
        usize_to_u32(value.y(), "image too large")?.write(write)?;
    }

    usize_to_u16(siz.components.len(), "too many components")?.write(write)?;

    for component in &siz.components {
        // like the jpeg 2000 `Ssiz` byte: precision minus one, sign in the highest bit
        let signed_bit = if component.is_signed { 0x80 } else { 0 };
        (signed_bit | (component.bit_depth - 1)).write(write)?;

        usize_to_u8(component.sampling.x(), "component sampling larger than 255")?.write(write)?;
        usize_to_u8(component.sampling.y(), "component sampling larger than 255")?.write(write)?;
        u8::from(component.nonlinear).write(write)?;
    }

    Ok(())
}

/// Read the image and component geometry. The marker has already been consumed.
pub fn read_size_segment(read: &mut impl Read) -> Result<SizeParameters> {
    fn read_vec2(read: &mut impl Read) -> Result<Vec2<usize>> {
        let x = u32_to_usize(u32::read(read)?);
        let y = u32_to_usize(u32::read(read)?);
        Ok(Vec2(x, y))
    }

    let length = u16_to_usize(u16::read(read)?);

    let image_offset = read_vec2(read)?;
    let image_extent = read_vec2(read)?;
    let tile_offset = read_vec2(read)?;
    let tile_size = read_vec2(read)?;

    let component_count = u16_to_usize(u16::read(read)?);
    if length != size_segment_byte_size(component_count) - u16::BYTE_SIZE {
        return Err(Error::invalid("codestream size segment length"));
    }

    let components = (0 .. component_count).map(|_| {
        let precision = u8::read(read)?;
        let sampling_x = u8::read(read)?;
        let sampling_y = u8::read(read)?;

        let nonlinear = match u8::read(read)? {
            0 => false,
            1 => true,
            _ => return Err(Error::invalid("codestream component non-linearity flag")),
        };

        Ok(ComponentParameters {
            bit_depth: (precision & 0x7F) + 1,
            is_signed: precision & 0x80 != 0,
            sampling: Vec2(usize::from(sampling_x), usize::from(sampling_y)),
            nonlinear,
        })
    }).collect::<Result<SmallVec<_>>>()?;

    Ok(SizeParameters { image_offset, image_extent, tile_offset, tile_size, components })
}


const COD_LENGTH: u16 = 2 + 5;

/// Write the transformation and coding options.
pub fn write_coding_segment(write: &mut impl Write, cod: &CodingParameters) -> UnitResult {
    COD.write(write)?;
    COD_LENGTH.write(write)?;

    u8::from(cod.reversible).write(write)?;
    u8::from(cod.color_transform).write(write)?;
    cod.decomposition_levels.write(write)?;

    // like the jpeg 2000 code block exponents, offset by two
    usize_to_u8(floor_log_2(usize_to_u32(cod.block_size.x(), "code block size")?) as usize - 2, "code block size")?.write(write)?;
    usize_to_u8(floor_log_2(usize_to_u32(cod.block_size.y(), "code block size")?) as usize - 2, "code block size")?.write(write)?;

    Ok(())
}

/// Read the transformation and coding options. The marker has already been consumed.
pub fn read_coding_segment(read: &mut impl Read) -> Result<CodingParameters> {
    fn read_flag(read: &mut impl Read) -> Result<bool> {
        match u8::read(read)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::invalid("codestream coding flag")),
        }
    }

    if u16::read(read)? != COD_LENGTH {
        return Err(Error::invalid("codestream coding segment length"));
    }

    let reversible = read_flag(read)?;
    let color_transform = read_flag(read)?;
    let decomposition_levels = u8::read(read)?;

    let block_exponent_x = u8::read(read)?;
    let block_exponent_y = u8::read(read)?;

    if block_exponent_x > 8 || block_exponent_y > 8 {
        return Err(Error::invalid("codestream code block size"));
    }

    Ok(CodingParameters {
        reversible, color_transform, decomposition_levels,
        block_size: Vec2(1 << (block_exponent_x + 2), 1 << (block_exponent_y + 2)),
    })
}

/// Skip a segment of unknown type. The marker has already been consumed.
pub fn skip_segment(read: &mut &[u8]) -> UnitResult {
    let length = u16_to_usize(u16::read(read)?);

    let content_length = length.checked_sub(u16::BYTE_SIZE)
        .ok_or_else(|| Error::invalid("codestream segment length"))?;

    if content_length > read.len() {
        return Err(Error::invalid("codestream segment length"));
    }

    *read = &read[content_length ..];
    Ok(())
}

/// Write the compressed sample data, prefixed with its marker and 32-bit length.
pub fn write_data_segment(write: &mut impl Write, data: &[u8]) -> UnitResult {
    SOD.write(write)?;
    usize_to_u32(data.len(), "compressed codestream too large")?.write(write)?;
    write.write_all(data)?;
    Ok(())
}

/// Read the compressed sample data. The marker has already been consumed.
pub fn read_data_segment<'d>(read: &mut &'d [u8]) -> Result<&'d [u8]> {
    let length = u32_to_usize(u32::read(read)?);

    if length > read.len() {
        return Err(Error::invalid("codestream data length"));
    }

    let (data, rest) = read.split_at(length);
    *read = rest;
    Ok(data)
}

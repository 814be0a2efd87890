
//! Moves samples between the packed pixel buffer and the lines of the codestream engine.
//! Samples are copied bit by bit, never converted numerically.

use std::ops::Range;

use lebe::io::{ReadEndian, WriteEndian};

use crate::error::{usize_to_i32, UnitResult};
use crate::math::mod_p;
use crate::meta::attribute::{IntegerBounds, SampleType};
use super::ChunkChannel;
use super::channel_map::ChannelMap;


/// One line of one channel in the packed pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLine<'c> {

    /// The codestream component that this line belongs to.
    pub component: usize,

    /// The channel of that component.
    pub channel: &'c ChunkChannel,

    /// Where the samples of this line are located in the packed pixel buffer.
    pub bytes: Range<usize>,
}

/// All lines of the chunk, in the order the codestream engine exchanges them.
///
/// Interleaved chunks visit every component of each row before the next row.
/// Planar chunks visit every row of a component before the next component,
/// skipping rows without samples of that component.
pub fn packed_lines<'c>(section: IntegerBounds, channels: &'c [ChunkChannel], map: &'c ChannelMap)
    -> Box<dyn 'c + Iterator<Item = PackedLine<'c>>>
{
    let components = map.components().iter().enumerate()
        .map(move |(component, mapped)| (component, mapped, &channels[mapped.file_index]));

    if map.is_planar() {
        Box::new(components.flat_map(move |(component, mapped, channel)| {
            let bytes_per_line = channel.bytes_per_line();
            let sampling_y = usize_to_i32(channel.sampling.y());

            (0 .. section.size.height())
                .filter(move |&y| mod_p(section.position.y() + usize_to_i32(y), sampling_y) == 0)
                .enumerate()
                .map(move |(row, _)| {
                    let start = mapped.plane_offset + row * bytes_per_line;
                    PackedLine { component, channel, bytes: start .. start + bytes_per_line }
                })
        }))
    }

    else {
        let bytes_per_line = map.bytes_per_line();
        let components: Vec<_> = components.collect();

        Box::new((0 .. section.size.height()).flat_map(move |y| {
            components.clone().into_iter().map(move |(component, mapped, channel)| {
                let start = y * bytes_per_line + mapped.raster_line_offset;
                PackedLine { component, channel, bytes: start .. start + channel.bytes_per_line() }
            })
        }))
    }
}


/// Read the native-endian samples of one line into codestream samples.
/// Half floats are sign-extended from their bits, all other types are reinterpreted.
pub fn gather_line(sample_type: SampleType, mut bytes: &[u8], samples: &mut [i32]) -> UnitResult {
    debug_assert_eq!(bytes.len(), samples.len() * sample_type.bytes_per_sample(), "line byte size mismatch");

    match sample_type {
        SampleType::F16 => for sample in samples {
            let bits: i16 = bytes.read_from_native_endian()?;
            *sample = i32::from(bits);
        },

        SampleType::F32 | SampleType::U32 => {
            bytes.read_from_native_endian_into(samples)?;
        },
    }

    Ok(())
}

/// Write codestream samples into the native-endian samples of one line.
/// Half floats keep the lower 16 bits, all other types are reinterpreted.
pub fn scatter_line(sample_type: SampleType, samples: &[i32], mut bytes: &mut [u8]) -> UnitResult {
    debug_assert_eq!(bytes.len(), samples.len() * sample_type.bytes_per_sample(), "line byte size mismatch");

    match sample_type {
        SampleType::F16 => for &sample in samples {
            bytes.write_as_native_endian(&(sample as i16))?;
        },

        SampleType::F32 | SampleType::U32 => {
            bytes.write_as_native_endian(samples)?;
        },
    }

    Ok(())
}


//! Streams the lines of the codestream engine into the packed pixels of a chunk.

use crate::compression::Bytes;
use crate::error::{Error, UnitResult};
use crate::meta::attribute::IntegerBounds;
use super::ChunkChannel;
use super::channel_map::ChannelMap;
use super::codestream::CodestreamDecoder;
use super::messages::MessageHandler;
use super::samples::{packed_lines, scatter_line, PackedLine};


/// Decompress the codestream of a chunk into the packed pixel buffer.
pub fn decode_codestream<'r, D: CodestreamDecoder<'r>>(
    codestream: Bytes<'r>, messages: &'r dyn MessageHandler,
    section: IntegerBounds, channels: &[ChunkChannel], map: &ChannelMap,
    pixels: &mut [u8],
) -> UnitResult
{
    let mut decoder = D::from_bytes(codestream, messages);
    decoder.read_headers()?;

    validate_geometry(&decoder, section, channels, map)?;

    decoder.set_planar(map.is_planar());
    decoder.create()?;

    for PackedLine { component, channel, bytes } in packed_lines(section, channels, map) {
        let line = decoder.pull()?;

        if line.component != component {
            return Err(Error::incompatible("codestream engine delivered a component out of sequence"));
        }

        if line.samples.len() != channel.resolution.width() {
            return Err(Error::incompatible("codestream line width does not match the channel"));
        }

        scatter_line(channel.sample_type, line.samples, &mut pixels[bytes])?;
    }

    Ok(())
}

/// Check that the codestream describes exactly the channels of the chunk.
fn validate_geometry<'r>(
    decoder: &impl CodestreamDecoder<'r>, section: IntegerBounds,
    channels: &[ChunkChannel], map: &ChannelMap
) -> UnitResult
{
    let siz = decoder.siz();

    if siz.components.len() != map.len() {
        return Err(Error::incompatible("codestream component count does not match the chunk channels"));
    }

    if siz.image_size() != section.size {
        return Err(Error::incompatible("codestream image size does not match the chunk"));
    }

    for (index, mapped) in map.components().iter().enumerate() {
        let channel = &channels[mapped.file_index];

        if siz.components[index].sampling != channel.sampling {
            return Err(Error::incompatible("codestream component sampling does not match the channel"));
        }

        if siz.component_size(index) != channel.resolution {
            return Err(Error::incompatible("codestream component size does not match the channel"));
        }
    }

    Ok(())
}

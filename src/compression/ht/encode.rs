
//! Streams the packed pixels of a chunk into the codestream engine.

use crate::compression::ByteVec;
use crate::error::{Error, Result};
use crate::math::{least_common_multiple, Vec2};
use crate::meta::attribute::{IntegerBounds, SampleType};
use super::{ChunkChannel, EncodeRequest};
use super::channel_map::ChannelMap;
use super::codestream::{CodestreamEncoder, ComponentParameters, LineMut, SizeParameters};
use super::samples::{gather_line, packed_lines, PackedLine};


/// Compress all present channels of the chunk into a codestream.
pub fn encode_codestream<'r, E: CodestreamEncoder<'r>>(
    request: &EncodeRequest<'r>, channels: &[ChunkChannel], map: &ChannelMap
) -> Result<ByteVec>
{
    let mut encoder = E::new(request.messages);
    encoder.set_planar(map.is_planar());

    *encoder.access_siz() = size_parameters(request.section, channels, map)?;

    let cod = encoder.access_cod();
    cod.reversible = true;
    cod.block_size = request.options.block_size;
    cod.decomposition_levels = request.options.decomposition_levels;
    cod.color_transform = request.options.allow_color_transform && map.is_rgb() && !map.is_planar();

    encoder.write_headers(ByteVec::with_capacity(request.uncompressed.len() / 2))?;

    let mut commit_previous = false;

    for PackedLine { component, channel, bytes } in packed_lines(request.section, channels, map) {
        let line = expect_line(encoder.exchange(commit_previous)?, component, channel.resolution.width())?;
        gather_line(channel.sample_type, &request.uncompressed[bytes], line.samples)?;
        commit_previous = true;
    }

    if encoder.exchange(commit_previous)?.is_some() {
        return Err(Error::incompatible("codestream engine requested more lines than the chunk contains"));
    }

    encoder.flush()?;
    Ok(encoder.into_output())
}

/// The codestream geometry of a chunk.
///
/// The image offset is the chunk origin, reduced modulo the sampling factors of all channels.
/// This keeps the origin on the same sampling grid, so that every component
/// has exactly the samples of its channel, while all coordinates stay positive.
pub fn size_parameters(section: IntegerBounds, channels: &[ChunkChannel], map: &ChannelMap) -> Result<SizeParameters> {
    let present = || map.components().iter().map(|mapped| &channels[mapped.file_index]);

    let sampling_period = present().try_fold(Vec2(1_usize, 1_usize), |period, channel| Some(Vec2(
        least_common_multiple(period.x(), channel.sampling.x())?,
        least_common_multiple(period.y(), channel.sampling.y())?,
    ))).ok_or_else(|| Error::unsupported("sampling factors of the chunk are too large"))?;

    let period_x = i64::try_from(sampling_period.x()).map_err(|_| Error::unsupported("sampling period"))?;
    let period_y = i64::try_from(sampling_period.y()).map_err(|_| Error::unsupported("sampling period"))?;

    // both remainders are smaller than a positive i64 period
    let image_offset = Vec2(
        i64::from(section.position.x()).rem_euclid(period_x) as usize,
        i64::from(section.position.y()).rem_euclid(period_y) as usize,
    );

    let image_extent = image_offset + section.size;

    let mut siz = SizeParameters {
        image_offset, image_extent,
        tile_offset: Vec2(0, 0),
        tile_size: image_extent,
        components: Default::default(),
    };

    siz.set_num_components(map.len());

    for (index, channel) in present().enumerate() {
        siz.set_component(index, component_parameters(channel))?;
    }

    Ok(siz)
}

/// The sample format of a channel, as a codestream component.
pub fn component_parameters(channel: &ChunkChannel) -> ComponentParameters {
    ComponentParameters {
        sampling: channel.sampling,
        bit_depth: match channel.sample_type { SampleType::F16 => 16, SampleType::F32 | SampleType::U32 => 32 },
        is_signed: channel.sample_type != SampleType::U32,
        nonlinear: channel.sample_type.is_float(),
    }
}

fn expect_line(line: Option<LineMut<'_>>, component: usize, width: usize) -> Result<LineMut<'_>> {
    let line = line.ok_or_else(|| Error::incompatible("codestream engine requested fewer lines than the chunk contains"))?;

    if line.component != component {
        return Err(Error::incompatible("codestream engine requested a component out of sequence"));
    }

    if line.samples.len() != width {
        return Err(Error::incompatible("codestream line width does not match the channel"));
    }

    Ok(line)
}

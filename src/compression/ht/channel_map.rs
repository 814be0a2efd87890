
//! Assigns the channels of a chunk to the components of a codestream.

use smallvec::SmallVec;

use crate::error::{Error, Result};
use super::ChunkChannel;


/// The correspondence between codestream components and the channels of a chunk.
/// Only contains channels that have samples in the chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {

    /// One entry per codestream component, in codestream order.
    components: SmallVec<[MappedChannel; 5]>,

    /// Whether the first three components are red, green, and blue,
    /// with equal sample types and without sub-sampling.
    is_rgb: bool,

    /// Whether any channel is sub-sampled.
    is_planar: bool,

    /// The bytes of all channels in one interleaved line.
    bytes_per_line: usize,
}

/// A codestream component and the location of its channel in the packed pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedChannel {

    /// The index of the channel in the channel list of the file.
    pub file_index: usize,

    /// The byte offset of the first sample of this channel within an interleaved line.
    pub raster_line_offset: usize,

    /// The byte offset of the first sample of this channel in planar layout.
    pub plane_offset: usize,
}


impl ChannelMap {

    /// Map all channels with samples in this chunk.
    /// Red, green, and blue come first if all of them are present without sub-sampling,
    /// otherwise components are in file order.
    pub fn new(channels: &[ChunkChannel]) -> Self {
        let present = || channels.iter().enumerate().filter(|(_, channel)| channel.is_present());

        let find_unsampled = |name: &str| present()
            .find(|(_, channel)| channel.name.eq(name) && !channel.is_subsampled())
            .map(|(index, _)| index);

        let rgb = match (find_unsampled("R"), find_unsampled("G"), find_unsampled("B")) {
            (Some(r), Some(g), Some(b)) => Some([r, g, b]),
            _ => None,
        };

        let is_rgb = rgb.map_or(false, |[r, g, b]| {
            channels[r].sample_type == channels[g].sample_type
                && channels[g].sample_type == channels[b].sample_type
        });

        // all offsets follow the file order
        let mut raster_line_offset = 0;
        let mut plane_offset = 0;

        let file_order: SmallVec<[MappedChannel; 5]> = present()
            .map(|(file_index, channel)| {
                let mapped = MappedChannel { file_index, raster_line_offset, plane_offset };
                raster_line_offset += channel.bytes_per_line();
                plane_offset += channel.byte_size();
                mapped
            })
            .collect();

        let components = match rgb {
            None => file_order,
            Some(rgb) => {
                let first = rgb.iter()
                    .filter_map(|&index| file_order.iter().find(|mapped| mapped.file_index == index));

                let rest = file_order.iter()
                    .filter(|mapped| !rgb.contains(&mapped.file_index));

                first.chain(rest).copied().collect()
            }
        };

        ChannelMap {
            is_planar: present().any(|(_, channel)| channel.is_subsampled()),
            bytes_per_line: raster_line_offset,
            components,
            is_rgb,
        }
    }

    /// Rebuild the map from the file channel index of each component, as stored in a chunk header.
    /// The indices must name every channel with samples in this chunk exactly once.
    pub fn from_file_indices(channels: &[ChunkChannel], file_indices: &[usize]) -> Result<Self> {
        let file_order = Self::new(channels);

        if file_indices.len() != file_order.len() {
            return Err(Error::invalid("chunk channel count does not match the channels with samples"));
        }

        let mut used: SmallVec<[bool; 8]> = smallvec![false; channels.len()];

        let components = file_indices.iter().map(|&file_index| {
            let mapped = file_order.components.iter()
                .find(|mapped| mapped.file_index == file_index)
                .ok_or_else(|| Error::invalid("chunk channel index"))?;

            if std::mem::replace(&mut used[file_index], true) {
                return Err(Error::invalid("duplicate chunk channel index"));
            }

            Ok(*mapped)
        }).collect::<Result<SmallVec<[MappedChannel; 5]>>>()?;

        let is_rgb = file_order.is_rgb && components.len() >= 3 && (0 .. 3)
            .all(|index| channels[components[index].file_index].name.eq(["R", "G", "B"][index]));

        Ok(ChannelMap { components, is_rgb, .. file_order })
    }

    /// One entry per codestream component, in codestream order.
    pub fn components(&self) -> &[MappedChannel] {
        &self.components
    }

    /// The file channel index of each component.
    pub fn file_indices(&self) -> impl '_ + Iterator<Item = usize> {
        self.components.iter().map(|mapped| mapped.file_index)
    }

    /// The number of codestream components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the chunk has no samples at all.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether the first three components can use the color transform.
    pub fn is_rgb(&self) -> bool {
        self.is_rgb
    }

    /// Whether the chunk uses planar layout because a channel is sub-sampled.
    pub fn is_planar(&self) -> bool {
        self.is_planar
    }

    /// The number of bytes of one line of all channels in interleaved layout.
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }
}


//! Builds packed pixel buffers for the integration tests.

#![allow(dead_code)]

use exr_ht::prelude::*;

/// Create a channel list from names, sample types and sampling rates.
pub fn channels(descriptions: &[(&str, SampleType, (usize, usize))]) -> ChannelList {
    ChannelList::new(descriptions.iter()
        .map(|&(name, sample_type, sampling)| ChannelDescription::named(name, sample_type).with_sampling(sampling))
        .collect())
}

/// Whether the packed buffer of the section stores each channel in its own block.
pub fn is_planar(channels: &ChannelList, section: IntegerBounds) -> bool {
    channels.list.iter().any(|channel| {
        channel.subsampled_resolution(section).area() > 0 && channel.sampling != Vec2(1, 1)
    })
}

/// Pack the samples of all channels like the host library does.
/// The closure receives the channel index and the sample coordinates within the channel,
/// and returns the bits of the sample. Half floats use the lower 16 bits.
pub fn pack(channels: &ChannelList, section: IntegerBounds, bits: impl Fn(usize, usize, usize) -> u32) -> Vec<u8> {
    let resolutions: Vec<Vec2<usize>> = channels.list.iter()
        .map(|channel| channel.subsampled_resolution(section))
        .collect();

    let present: Vec<usize> = (0 .. channels.list.len())
        .filter(|&index| resolutions[index].area() > 0)
        .collect();

    let mut bytes = Vec::new();

    let mut push = |channel: usize, x: usize, y: usize| {
        let value = bits(channel, x, y);

        match channels.list[channel].sample_type {
            SampleType::F16 => bytes.extend_from_slice(&(value as u16).to_ne_bytes()),
            SampleType::F32 | SampleType::U32 => bytes.extend_from_slice(&value.to_ne_bytes()),
        }
    };

    if is_planar(channels, section) {
        for &channel in &present {
            for y in 0 .. resolutions[channel].height() {
                for x in 0 .. resolutions[channel].width() {
                    push(channel, x, y);
                }
            }
        }
    }

    else {
        for y in 0 .. section.size.height() {
            for &channel in &present {
                for x in 0 .. resolutions[channel].width() {
                    push(channel, x, y);
                }
            }
        }
    }

    bytes
}

/// Slowly varying samples that compress well, for every sample type.
pub fn smooth(channels: &ChannelList) -> impl '_ + Fn(usize, usize, usize) -> u32 {
    move |channel, x, y| {
        let value = (channel + 1) as f32 * 0.25 + (x / 4) as f32 * 0.125 + (y / 2) as f32 * 0.0625;

        match channels.list[channel].sample_type {
            SampleType::F16 => u32::from(f16::from_f32(value).to_bits()),
            SampleType::F32 => value.to_bits(),
            SampleType::U32 => (channel * 1000 + x + y * 3) as u32,
        }
    }
}

/// Compress the pixels and return the bytes that a file would store,
/// which are the pixels themselves if compression did not reduce the size.
pub fn store(channels: &ChannelList, section: IntegerBounds, pixels: &[u8], options: EncodingOptions) -> (StoredChunk, Vec<u8>) {
    let mut compressed = vec![0; pixels.len()];

    let request = EncodeRequest::new(channels, section, pixels)
        .with_options(options).with_messages(&IgnoreMessages);

    let stored = apply(request, &mut compressed).unwrap();

    match stored {
        StoredChunk::Compressed(size) => {
            compressed.truncate(size);
            (stored, compressed)
        },

        StoredChunk::Uncompressed(size) => {
            assert_eq!(size, pixels.len());
            (stored, pixels.to_vec())
        },
    }
}

/// Decompress the stored bytes of a chunk.
pub fn load(channels: &ChannelList, section: IntegerBounds, stored: &[u8], packed_size: usize) -> Result<Vec<u8>> {
    let mut pixels = vec![0; packed_size];
    undo(DecodeRequest::new(channels, section, stored).with_messages(&IgnoreMessages), &mut pixels)?;
    Ok(pixels)
}

/// Compress the pixels, check that the codestream was used, and decompress them again.
pub fn roundtrip(channels: &ChannelList, section: IntegerBounds, pixels: &[u8], options: EncodingOptions) -> Vec<u8> {
    let (stored, bytes) = store(channels, section, pixels, options);
    assert!(matches!(stored, StoredChunk::Compressed(size) if size < pixels.len()), "not compressed: {:?}", stored);

    load(channels, section, &bytes, pixels.len()).unwrap()
}


//! The HTJ2K compression method. Maps the channels of a chunk to the components of a
//! JPEG 2000 codestream, and prefixes the codestream with a header that stores this mapping.
//!
//! Compressed chunk layout:
//! - chunk header, see `header`
//! - codestream, produced by the engine selected at build time, see `codestream`

pub mod channel_map;
pub mod codestream;
pub mod header;
pub mod messages;

mod decode;
mod encode;
mod samples;

use smallvec::SmallVec;

use crate::compression::{ByteVec, Bytes};
use crate::error::{Error, Result, UnitResult};
use crate::math::Vec2;
use crate::meta::attribute::{ChannelList, IntegerBounds, SampleType, Text};
use self::channel_map::ChannelMap;
use self::codestream::{CodestreamDecoder, CodestreamEncoder, DefaultDecoder, DefaultEncoder};
use self::messages::{MessageHandler, TracingMessages};


/// A channel of the file, resolved against the pixel section of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkChannel {

    /// The index of this channel in the channel list of the file.
    pub file_index: usize,

    /// The name of the channel.
    pub name: Text,

    /// The type of each sample.
    pub sample_type: SampleType,

    /// One sample per `sampling` pixels along each axis.
    pub sampling: Vec2<usize>,

    /// The number of samples of this channel inside the chunk.
    /// Zero if no pixel of the chunk has a sample of this channel.
    pub resolution: Vec2<usize>,
}

/// Options for compressing chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {

    /// The size of the code blocks of the codestream.
    pub block_size: Vec2<usize>,

    /// The number of wavelet decomposition levels.
    pub decomposition_levels: u8,

    /// Decorrelate red, green, and blue if a chunk contains
    /// all three with the same sample type and without sub-sampling.
    pub allow_color_transform: bool,
}

/// Everything needed to compress one chunk.
#[derive(Clone, Copy)]
pub struct EncodeRequest<'r> {

    /// All channels of the file, in file order.
    pub channels: &'r ChannelList,

    /// The pixels that the chunk covers.
    pub section: IntegerBounds,

    /// The packed native-endian pixel buffer of the chunk.
    pub uncompressed: Bytes<'r>,

    /// How to compress.
    pub options: EncodingOptions,

    /// Receives the diagnostics of the codestream engine.
    pub messages: &'r dyn MessageHandler,
}

/// Everything needed to decompress one chunk.
#[derive(Clone, Copy)]
pub struct DecodeRequest<'r> {

    /// All channels of the file, in file order.
    pub channels: &'r ChannelList,

    /// The pixels that the chunk covers.
    pub section: IntegerBounds,

    /// The chunk as stored in the file.
    pub compressed: Bytes<'r>,

    /// Receives the diagnostics of the codestream engine.
    pub messages: &'r dyn MessageHandler,
}

/// How a compressed chunk must be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoredChunk {

    /// The first bytes of the output buffer contain the compressed chunk.
    Compressed(usize),

    /// Compression did not reduce the size.
    /// The caller stores the uncompressed pixel buffer, which has this many bytes, instead.
    Uncompressed(usize),
}


impl Default for EncodingOptions {
    fn default() -> Self {
        EncodingOptions {
            block_size: Vec2(128, 32),
            decomposition_levels: 5,
            allow_color_transform: true,
        }
    }
}

impl ChunkChannel {

    /// Whether any pixel of the chunk has a sample of this channel.
    pub fn is_present(&self) -> bool {
        self.resolution.width() > 0 && self.resolution.height() > 0
    }

    /// Whether this channel has fewer samples than pixels.
    pub fn is_subsampled(&self) -> bool {
        self.sampling != Vec2(1, 1)
    }

    /// The bytes of one line of this channel.
    pub fn bytes_per_line(&self) -> usize {
        self.resolution.width() * self.sample_type.bytes_per_sample()
    }

    /// The bytes of all samples of this channel in the chunk.
    pub fn byte_size(&self) -> usize {
        self.bytes_per_line() * self.resolution.height()
    }
}

impl<'r> EncodeRequest<'r> {

    /// Compress with default options, and report engine diagnostics to `tracing`.
    pub fn new(channels: &'r ChannelList, section: IntegerBounds, uncompressed: Bytes<'r>) -> Self {
        EncodeRequest {
            channels, section, uncompressed,
            options: EncodingOptions::default(),
            messages: &TracingMessages,
        }
    }

    /// Replace the compression options.
    pub fn with_options(self, options: EncodingOptions) -> Self {
        EncodeRequest { options, ..self }
    }

    /// Report engine diagnostics to the specified handler.
    pub fn with_messages(self, messages: &'r dyn MessageHandler) -> Self {
        EncodeRequest { messages, ..self }
    }
}

impl<'r> DecodeRequest<'r> {

    /// Report engine diagnostics to `tracing`.
    pub fn new(channels: &'r ChannelList, section: IntegerBounds, compressed: Bytes<'r>) -> Self {
        DecodeRequest { channels, section, compressed, messages: &TracingMessages }
    }

    /// Report engine diagnostics to the specified handler.
    pub fn with_messages(self, messages: &'r dyn MessageHandler) -> Self {
        DecodeRequest { messages, ..self }
    }
}

impl StoredChunk {

    /// The number of bytes that are stored in the file.
    pub fn byte_size(self) -> usize {
        match self {
            StoredChunk::Compressed(size) | StoredChunk::Uncompressed(size) => size,
        }
    }
}

impl std::fmt::Debug for EncodeRequest<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("EncodeRequest")
            .field("channels", self.channels).field("section", &self.section)
            .field("byte_count", &self.uncompressed.len()).field("options", &self.options)
            .finish()
    }
}

impl std::fmt::Debug for DecodeRequest<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DecodeRequest")
            .field("channels", self.channels).field("section", &self.section)
            .field("byte_count", &self.compressed.len())
            .finish()
    }
}


/// Resolve all channels of the file against the pixel section of a chunk.
pub fn resolve_channels(channels: &ChannelList, section: IntegerBounds) -> Result<SmallVec<[ChunkChannel; 5]>> {
    channels.validate()?;
    section.validate()?;

    Ok(channels.list.iter().enumerate()
        .map(|(file_index, channel)| ChunkChannel {
            file_index,
            name: channel.name.clone(),
            sample_type: channel.sample_type,
            sampling: channel.sampling,
            resolution: channel.subsampled_resolution(section),
        })
        .collect())
}

/// The number of bytes of the packed pixel buffer of a chunk.
pub fn packed_byte_size(channels: &[ChunkChannel]) -> usize {
    channels.iter().map(ChunkChannel::byte_size).sum()
}


/// Compress a chunk with the codestream engine selected at build time.
/// The output buffer must be at least as large as the uncompressed pixel buffer.
pub fn apply<'r>(request: EncodeRequest<'r>, compressed: &mut [u8]) -> Result<StoredChunk> {
    apply_with::<DefaultEncoder<'r>>(request, compressed)
}

/// Decompress a chunk with the codestream engine selected at build time.
/// The output buffer must have exactly the size of the packed pixel buffer.
pub fn undo<'r>(request: DecodeRequest<'r>, uncompressed: &mut [u8]) -> UnitResult {
    undo_with::<DefaultDecoder<'r>>(request, uncompressed)
}

/// Compress a chunk with the specified codestream engine.
///
/// Returns `StoredChunk::Uncompressed` without touching the output buffer
/// if the compressed chunk would not be smaller than the pixels.
pub fn apply_with<'r, E: CodestreamEncoder<'r>>(request: EncodeRequest<'r>, compressed: &mut [u8]) -> Result<StoredChunk> {
    let channels = resolve_channels(request.channels, request.section)?;
    let packed_size = packed_byte_size(&channels);

    if request.uncompressed.len() != packed_size {
        return Err(Error::invalid("pixel buffer size does not match the channels of the chunk"));
    }

    if compressed.len() < packed_size {
        return Err(Error::out_of_space(packed_size, compressed.len()));
    }

    let map = ChannelMap::new(&channels);
    let header_size = header::header_byte_size(map.len());

    if map.is_empty() || header_size >= packed_size {
        tracing::debug!(packed_size, "chunk too small for compression");
        return Ok(StoredChunk::Uncompressed(packed_size));
    }

    let codestream = encode::encode_codestream::<E>(&request, &channels, &map)?;
    let compressed_size = header_size + codestream.len();

    tracing::debug!(
        components = map.len(), planar = map.is_planar(), rgb = map.is_rgb(),
        packed_size, compressed_size, "compressed chunk"
    );

    if compressed_size >= packed_size || compressed_size > compressed.len() {
        return Ok(StoredChunk::Uncompressed(packed_size));
    }

    let written = header::write_header(compressed, &map)?;
    debug_assert_eq!(written, header_size, "chunk header size mismatch");

    compressed[header_size .. compressed_size].copy_from_slice(&codestream);
    Ok(StoredChunk::Compressed(compressed_size))
}

/// Decompress a chunk with the specified codestream engine.
///
/// A stored chunk that is exactly as large as the pixels is copied without decompression.
pub fn undo_with<'r, D: CodestreamDecoder<'r>>(request: DecodeRequest<'r>, uncompressed: &mut [u8]) -> UnitResult {
    let channels = resolve_channels(request.channels, request.section)?;
    let packed_size = packed_byte_size(&channels);

    if uncompressed.len() != packed_size {
        return Err(Error::invalid("pixel buffer size does not match the channels of the chunk"));
    }

    if request.compressed.len() == packed_size {
        uncompressed.copy_from_slice(request.compressed);
        return Ok(());
    }

    let (header_size, file_indices) = header::read_header(request.compressed)?;
    let map = ChannelMap::from_file_indices(&channels, &file_indices)?;

    tracing::debug!(
        components = map.len(), planar = map.is_planar(),
        compressed_size = request.compressed.len(), packed_size, "decompressing chunk"
    );

    let codestream = &request.compressed[header_size ..];
    decode::decode_codestream::<D>(codestream, request.messages, request.section, &channels, &map, uncompressed)
}

/// Compress a chunk into a new byte vector, which is either the compressed chunk
/// or a copy of the pixels if compression did not reduce the size.
pub fn compress_to_vec(request: EncodeRequest<'_>) -> Result<ByteVec> {
    let mut compressed = vec![0; request.uncompressed.len()];

    match apply(request, &mut compressed)? {
        StoredChunk::Compressed(size) => {
            compressed.truncate(size);
            Ok(compressed)
        },

        StoredChunk::Uncompressed(_) => Ok(request.uncompressed.to_vec()),
    }
}


//! Contains the compression attribute definition
//! and methods to compress and decompress data.

pub mod ht;

use crate::meta::attribute::{ChannelList, IntegerBounds, SampleType};
use crate::error::{Result, Error};
use self::ht::{DecodeRequest, EncodeRequest};


/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];

/// Specifies which compression method to use.
/// Use uncompressed data for fastest loading and writing speeds.
/// Use HTJ2K compression for small, lossless files.
///
/// The codestream inside an HTJ2K chunk is produced by the codestream engine selected
/// with cargo features. The default `reference-codestream` engine writes a lossless
/// format of its own, which only this crate can read. Other HTJ2K readers cannot decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {

    /// Store uncompressed values.
    /// Produces large files that can be read and written very quickly.
    Uncompressed,

    /// High-Throughput JPEG 2000 chunk layout for blocks of 32 scan lines.
    /// The codestream format depends on the selected engine, see `Compression`.
    /// Each chunk carries a small header that maps channels to codestream components.
    /// Red, green, and blue are decorrelated if possible.
    /// This compression method is lossless.
    HTJ2K32,

    /// Like `HTJ2K32`, with the same engine, but compresses blocks of 256 scan lines,
    /// which is slightly smaller and faster to decode for full frames.
    /// This compression method is lossless.
    HTJ2K256,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} compression", match self {
            Compression::Uncompressed => "no",
            Compression::HTJ2K32 => "htj2k block",
            Compression::HTJ2K256 => "htj2k large block",
        })
    }
}


impl Compression {

    /// Compress the image section of bytes.
    /// Returns the uncompressed bytes if compression does not reduce the size.
    pub fn compress_image_section(self, channels: &ChannelList, uncompressed_native_endian: ByteVec, pixel_section: IntegerBounds) -> Result<ByteVec> {
        use self::Compression::*;

        match self {
            Uncompressed => Ok(uncompressed_native_endian),

            HTJ2K32 | HTJ2K256 => {
                let request = EncodeRequest::new(channels, pixel_section, &uncompressed_native_endian);
                ht::compress_to_vec(request).map_err(|error| self.wrap_error(error))
            },
        }
    }

    /// Decompress the image section of bytes.
    pub fn decompress_image_section(self, channels: &ChannelList, compressed: ByteVec, pixel_section: IntegerBounds) -> Result<ByteVec> {
        let chunk_channels = ht::resolve_channels(channels, pixel_section)?;
        let expected_byte_size = ht::packed_byte_size(&chunk_channels);

        // note: always true where self == Uncompressed
        if compressed.len() == expected_byte_size {
            // the compressed data was larger than the raw data, so the small raw data has been written
            return Ok(compressed);
        }

        use self::Compression::*;
        match self {
            Uncompressed => Err(Error::invalid("uncompressed chunk byte size")),

            HTJ2K32 | HTJ2K256 => {
                let mut uncompressed = vec![0; expected_byte_size];

                ht::undo(DecodeRequest::new(channels, pixel_section, &compressed), &mut uncompressed)
                    .map_err(|error| self.wrap_error(error))?;

                Ok(uncompressed)
            },
        }
    }

    /// Add the compression method to messages of malformed data.
    fn wrap_error(self, error: Error) -> Error {
        match error {
            Error::Invalid(message) => Error::invalid(format!("compressed {:?} data ({})", self, message)),
            error => error,
        }
    }

    /// For scan line images and deep scan line images, one or more scan lines may be
    /// stored together as a scan line block. The number of scan lines per block
    /// depends on how the pixel data are compressed.
    pub fn scan_lines_per_block(self) -> usize {
        use self::Compression::*;
        match self {
            Uncompressed => 1,
            HTJ2K32      => 32,
            HTJ2K256     => 256,
        }
    }

    /// Deep data can only be stored without compression.
    pub fn supports_deep_data(self) -> bool {
        matches!(self, Compression::Uncompressed)
    }

    /// Most compression methods will reconstruct the exact pixel bytes,
    /// but some might throw away unimportant data for specific types of samples.
    pub fn is_lossless_for(self, _sample_type: SampleType) -> bool {
        true
    }

    /// Whether some pixel bytes may be reconstructed differently.
    pub fn may_loose_data(self) -> bool {
        false
    }
}

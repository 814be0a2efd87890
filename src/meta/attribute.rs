
//! Contains the channel meta data that describes the pixels of a chunk.
//! Only the attributes that the compression of a chunk depends on are defined here.

use smallvec::SmallVec;
use half::f16;

use crate::error::{Error, UnitResult};
use crate::math::{Vec2, sample_count};


/// A channel name. Each byte is one latin-1 character.
#[derive(Clone, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct Text {
    bytes: SmallVec<[u8; 24]>,
}

/// The pixels that a chunk covers, in absolute pixel coordinates.
/// Positions may be negative, as data windows may start anywhere.
#[derive(Clone, Copy, Debug, Eq, Hash, Default, PartialEq)]
pub struct IntegerBounds {

    /// The top left pixel of the section, included if the size is not zero.
    pub position: Vec2<i32>,

    /// The number of pixel columns and rows, extending to the right and downwards.
    pub size: Vec2<usize>,
}

/// All channels of a file, in the order of the file.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelList {

    /// The channels in this list, in file order.
    pub list: SmallVec<[ChannelDescription; 5]>,
}

/// Describes the samples of a single channel, but does not contain them.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelDescription {

    /// `R`, `G`, and `B` are treated as color channels if none of them is sub-sampled.
    pub name: Text,

    /// U32, F16 or F32.
    pub sample_type: SampleType,

    /// A channel has one sample per `sampling` pixels, along each axis.
    /// Only pixels whose absolute coordinate is divisible by the sampling rate have a sample.
    pub sampling: Vec2<usize>,
}

/// The type of samples in this channel.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Hash)]
pub enum SampleType {

    /// This channel contains 32-bit unsigned int values.
    U32,

    /// This channel contains 16-bit float values.
    F16,

    /// This channel contains 32-bit float values.
    F32,
}


impl Text {

    /// Create a `Text` from an `str` reference.
    /// Returns `None` if this string contains characters outside of latin-1.
    pub fn new_or_none(string: impl AsRef<str>) -> Option<Self> {
        string.as_ref().chars()
            .map(|character| u8::try_from(u32::from(character)).ok())
            .collect::<Option<SmallVec<_>>>()
            .map(|bytes| Text { bytes })
    }

    /// Iterate over the characters of this text without allocating.
    pub fn chars(&self) -> impl '_ + Iterator<Item = char> {
        self.bytes.iter().map(|&byte| char::from(byte))
    }

    /// Compare with a plain `&str`, case sensitive.
    pub fn eq(&self, string: &str) -> bool {
        string.chars().eq(self.chars())
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        Text::eq(self, other)
    }
}

impl<'s> From<&'s str> for Text {

    /// Panics if the string contains characters outside of latin-1.
    fn from(string: &'s str) -> Self {
        Self::new_or_none(string).expect("channel name contains unsupported characters")
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Text(\"{}\")", self)
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        self.chars().try_for_each(|character| formatter.write_char(character))
    }
}


impl ChannelList {

    /// Does not validate channel order or names.
    pub fn new(channels: SmallVec<[ChannelDescription; 5]>) -> Self {
        ChannelList { list: channels }
    }

    /// Check if all channels are valid.
    pub fn validate(&self) -> UnitResult {
        if self.list.is_empty() {
            return Err(Error::invalid("at least one channel is required"));
        }

        self.list.iter().try_for_each(ChannelDescription::validate)
    }
}

impl IntegerBounds {

    /// Create a section with the specified size that starts at zero.
    pub fn from_dimensions(size: impl Into<Vec2<usize>>) -> Self {
        Self::new(Vec2(0, 0), size)
    }

    /// Create a section with a size and an origin pixel.
    pub fn new(position: impl Into<Vec2<i32>>, size: impl Into<Vec2<usize>>) -> Self {
        Self { position: position.into(), size: size.into() }
    }

    /// The first pixel after the section along each axis.
    pub fn end(self) -> Vec2<i64> {
        Vec2(
            i64::from(self.position.x()) + self.size.width() as i64,
            i64::from(self.position.y()) + self.size.height() as i64,
        )
    }

    /// Check that all pixels of the section have coordinates
    /// strictly between `-(i32::MAX / 2)` and `i32::MAX / 2`.
    pub fn validate(&self) -> UnitResult {
        let limit = i64::from(i32::MAX / 2);

        let fits = |coordinate: i64| coordinate > -limit && coordinate < limit;
        let end = self.end();

        let size_fits = self.size.width() < limit as usize && self.size.height() < limit as usize;

        if !size_fits || !fits(i64::from(self.position.x())) || !fits(i64::from(self.position.y())) || !fits(end.x()) || !fits(end.y()) {
            return Err(Error::invalid("pixel section exceeding integer maximum"));
        }

        Ok(())
    }
}

impl SampleType {

    /// How many bytes a single sample takes up.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleType::F16 => std::mem::size_of::<f16>(),
            SampleType::F32 => std::mem::size_of::<f32>(),
            SampleType::U32 => std::mem::size_of::<u32>(),
        }
    }

    /// Whether the bits of this sample type are interpreted as a floating point number.
    pub fn is_float(&self) -> bool {
        match self {
            SampleType::F16 | SampleType::F32 => true,
            SampleType::U32 => false,
        }
    }
}

impl ChannelDescription {

    /// Create a new channel with a sampling rate of (1,1).
    pub fn named(name: impl Into<Text>, sample_type: SampleType) -> Self {
        Self { name: name.into(), sample_type, sampling: Vec2(1, 1) }
    }

    /// Replace the sampling rate of this channel.
    pub fn with_sampling(self, sampling: impl Into<Vec2<usize>>) -> Self {
        Self { sampling: sampling.into(), ..self }
    }

    /// Whether this channel has fewer samples than pixels along any axis.
    pub fn is_subsampled(&self) -> bool {
        self.sampling != Vec2(1, 1)
    }

    /// The number of samples this channel contains within the specified section of pixels.
    /// Depends on the position of the section, not only on its size.
    pub fn subsampled_resolution(&self, section: IntegerBounds) -> Vec2<usize> {
        Vec2(
            sample_count(section.position.x(), section.size.width(), self.sampling.x()),
            sample_count(section.position.y(), section.size.height(), self.sampling.y()),
        )
    }

    /// The number of bytes the samples of this channel occupy within the specified section of pixels.
    pub fn byte_size_for_pixel_section(&self, section: IntegerBounds) -> usize {
        self.subsampled_resolution(section).area() * self.sample_type.bytes_per_sample()
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        if self.sampling.x() == 0 || self.sampling.y() == 0 {
            return Err(Error::invalid("zero sampling factor"));
        }

        if self.sampling.x() > u8::MAX as usize || self.sampling.y() > u8::MAX as usize {
            return Err(Error::unsupported("channel sampling factor larger than 255"));
        }

        Ok(())
    }
}

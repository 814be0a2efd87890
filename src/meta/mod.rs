
//! Describes the channels of a chunk of pixels.
//! The file header, attribute system and offset tables belong to the surrounding library.

pub mod attribute;

pub use attribute::{ChannelDescription, ChannelList, IntegerBounds, SampleType, Text};

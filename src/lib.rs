
//! Compresses and decompresses the pixel chunks of OpenEXR files
//! with High-Throughput JPEG 2000 codestreams.
//!
//! The `compression::ht` module maps the channels of a chunk to codestream components,
//! stores that mapping in a small header in front of the codestream,
//! and streams the samples through the codestream engine selected at build time.
//! Every call works on exactly one chunk and shares no state with other calls,
//! so chunks can be processed on any number of threads.
//!
//! The default `reference-codestream` engine is lossless but not interoperable:
//! its codestreams can only be decoded by this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod compression;
pub mod meta;
pub mod error;

#[macro_use]
extern crate smallvec;


/// Export the most important items.
pub mod prelude {

    // main exports
    pub use crate::compression::Compression;
    pub use crate::compression::ht::{
        apply, undo, apply_with, undo_with,
        EncodeRequest, DecodeRequest, EncodingOptions, StoredChunk,
    };

    // secondary data types
    pub use crate::compression::ht::messages::{MessageHandler, MessageLevel, TracingMessages, IgnoreMessages};
    pub use crate::meta::attribute::{ChannelDescription, ChannelList, IntegerBounds, SampleType, Text};
    pub use crate::math::Vec2;
    pub use crate::error::{Error, Result};

    // re-export external stuff
    pub use half::f16;
}

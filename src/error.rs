
//! Error type definitions.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::error;
use std::fmt;
use std::io::ErrorKind;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;


/// A result that may contain an exr-ht error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains an exr-ht error.
pub type UnitResult = Result<()>;


/// An error that may happen while compressing or decompressing a chunk.
/// Distinguishes between damaged data, exhausted buffers,
/// broken engine contracts and unsupported configurations.
#[derive(Debug)]
pub enum Error {

    /// The contents of the chunk are not supported by
    /// this specific implementation of the codec bridge.
    NotSupported(Cow<'static, str>),

    /// The compressed chunk or the pixel buffer is malformed,
    /// for example a wrong header magic number or a channel count
    /// that does not match the channels of the chunk.
    Invalid(Cow<'static, str>),

    /// The codestream engine broke its contract, for example by
    /// delivering lines of components out of sequence, or by
    /// reporting dimensions that differ from the chunk.
    /// This indicates an engine version or configuration mismatch and is never retried.
    Incompatible(Cow<'static, str>),

    /// The output buffer cannot hold the data. Nothing has been written.
    OutOfSpace {

        /// The number of bytes that would have been necessary.
        required: usize,

        /// The number of bytes that the buffer offered.
        available: usize,
    },

    /// The underlying in-memory byte stream could not be read or written.
    Io(IoError),
}


impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }

    /// Create an error of the variant `Incompatible`.
    pub(crate) fn incompatible(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Incompatible(message.into())
    }

    /// Create an error of the variant `OutOfSpace`.
    pub(crate) fn out_of_space(required: usize, available: usize) -> Self {
        Error::OutOfSpace { required, available }
    }
}

/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::invalid("reference to missing bytes")
        }
        else {
            Error::Io(error)
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(formatter),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
            Error::Incompatible(message) => write!(formatter, "incompatible codestream: {}", message),
            Error::OutOfSpace { required, available } => write!(
                formatter, "buffer too small: {} bytes required, {} bytes available",
                required, available
            ),
        }
    }
}


/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_u8(value: usize, error_message: &'static str) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::unsupported(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_u16(value: usize, error_message: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::unsupported(error_message))
}

/// Return error on invalid range.
#[inline]
pub(crate) fn usize_to_u32(value: usize, error_message: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::unsupported(error_message))
}

/// Panics for values larger than the address space.
#[inline]
pub(crate) fn u32_to_usize(value: u32) -> usize {
    usize::try_from(value).expect("(u32 as usize) overflowed")
}

/// Panics for values larger than the address space.
#[inline]
pub(crate) fn u16_to_usize(value: u16) -> usize {
    usize::from(value)
}

/// Panics for too large values.
#[inline]
pub(crate) fn usize_to_i32(value: usize) -> i32 {
    i32::try_from(value).expect("(usize as i32) overflowed")
}

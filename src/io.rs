
//! Specialized binary input and output.
//! Uses the error handling for this crate.
//! All multi-byte values of chunk headers and codestream markers are big-endian.

pub use ::std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::{Result, UnitResult};


/// Keep track of what byte we are at.
/// Used to report how many bytes have been produced so far.
#[derive(Debug)]
pub struct Tracking<T> {

    /// Do not expose to prevent writing without updating position
    inner: T,

    position: usize,
}

impl<T: Write> Write for Tracking<T> {
    fn write(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
        let count = self.inner.write(buffer)?;
        self.position += count;
        Ok(count)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<T> Tracking<T> {

    /// Start counting at zero.
    pub fn new(inner: T) -> Self {
        Tracking { inner, position: 0 }
    }

    /// Current number of bytes written or read.
    pub fn byte_position(&self) -> usize {
        self.position
    }

    /// Stop tracking and return the wrapped value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}


/// Generic trait that defines common binary operations such as reading and writing for this type.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this value occupies in a byte stream.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a big-endian value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Write this value to the writer, as big-endian bytes.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the writer.
    #[inline]
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult {
        for value in slice {
            value.clone().write(write)?;
        }

        Ok(())
    }
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_big_endian()?)
            }

            #[inline]
            fn write(self, write: &mut impl Write) -> Result<()> {
                write.write_as_big_endian(&self)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
implement_data_for_primitive!(u32);


//! The header that precedes the codestream in every compressed chunk.
//!
//! Layout, all numbers big-endian:
//! - `u16` magic number `0x4854` ("HT")
//! - `u32` length of the payload that follows
//! - payload:
//!     - `u16` number of components
//!     - for each component, the `u16` index of the file channel
//!     - any number of opaque bytes
//!
//! The codestream immediately follows the payload.

use smallvec::SmallVec;

use crate::error::{Error, Result, usize_to_u16, usize_to_u32, u16_to_usize, u32_to_usize};
use crate::io::Data;
use super::channel_map::ChannelMap;


/// The first two bytes of every chunk header.
pub const MAGIC: u16 = 0x4854;

/// The number of bytes before the payload.
const PREFIX_BYTE_SIZE: usize = u16::BYTE_SIZE + u32::BYTE_SIZE;


/// The number of bytes the header of a chunk with this many components occupies.
pub fn header_byte_size(component_count: usize) -> usize {
    PREFIX_BYTE_SIZE + payload_byte_size(component_count)
}

fn payload_byte_size(component_count: usize) -> usize {
    u16::BYTE_SIZE * (1 + component_count)
}

/// Write the header into the start of the buffer.
/// Returns the number of bytes written.
/// Nothing is written if the buffer is too small.
pub fn write_header(buffer: &mut [u8], map: &ChannelMap) -> Result<usize> {
    let byte_size = header_byte_size(map.len());

    if buffer.len() < byte_size {
        return Err(Error::out_of_space(byte_size, buffer.len()));
    }

    let component_count = usize_to_u16(map.len(), "more than 65535 channels in a chunk")?;
    let file_indices = map.file_indices()
        .map(|index| usize_to_u16(index, "channel index larger than 65535"))
        .collect::<Result<SmallVec<[u16; 5]>>>()?;

    let mut write = &mut buffer[.. byte_size];
    MAGIC.write(&mut write)?;
    usize_to_u32(payload_byte_size(map.len()), "chunk header too large")?.write(&mut write)?;
    component_count.write(&mut write)?;
    u16::write_slice(&mut write, &file_indices)?;

    debug_assert!(write.is_empty(), "header byte size mismatch");
    Ok(byte_size)
}

/// Read the header from the start of the buffer.
/// Returns the number of bytes of the header, and the file channel index of each component.
pub fn read_header(buffer: &[u8]) -> Result<(usize, SmallVec<[usize; 5]>)> {
    let mut read = buffer;

    if u16::read(&mut read)? != MAGIC {
        return Err(Error::invalid("chunk header magic number"));
    }

    let payload_byte_size = u32_to_usize(u32::read(&mut read)?);
    if payload_byte_size > read.len() {
        return Err(Error::invalid("chunk header payload length"));
    }

    let mut payload = &read[.. payload_byte_size];
    let component_count = u16_to_usize(u16::read(&mut payload)?);

    if component_count * u16::BYTE_SIZE > payload.len() {
        return Err(Error::invalid("chunk header channel count"));
    }

    let file_indices = (0 .. component_count)
        .map(|_| u16::read(&mut payload).map(u16_to_usize))
        .collect::<Result<SmallVec<_>>>()?;

    // the remaining payload bytes are opaque
    Ok((PREFIX_BYTE_SIZE + payload_byte_size, file_indices))
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::ht::ChunkChannel;
    use crate::meta::attribute::SampleType;

    fn map(names: &[&str]) -> ChannelMap {
        let channels: Vec<ChunkChannel> = names.iter().enumerate()
            .map(|(file_index, &name)| ChunkChannel {
                file_index, name: name.into(),
                sample_type: SampleType::F16,
                sampling: (1, 1).into(),
                resolution: (8, 8).into(),
            })
            .collect();

        ChannelMap::new(&channels)
    }

    #[test]
    fn byte_layout(){
        let map = map(&[ "B", "G", "R" ]);

        let mut buffer = [0_u8; 16];
        assert_eq!(write_header(&mut buffer, &map).unwrap(), 14);

        assert_eq!(&buffer[.. 14], &[
            0x48, 0x54, // magic
            0, 0, 0, 8, // payload length
            0, 3, // channel count
            0, 2, 0, 1, 0, 0, // red, green, blue
        ]);

        let (length, file_indices) = read_header(&buffer).unwrap();
        assert_eq!(length, 14);
        assert_eq!(file_indices.as_slice(), &[ 2, 1, 0 ]);
    }

    #[test]
    fn roundtrip_channel_counts(){
        for names in [ &[ "Y" ][..], &[ "R", "G", "B" ][..], &[ "a", "R", "b", "c", "G", "d", "B", "e" ][..] ] {
            let map = map(names);
            let mut buffer = vec![0; header_byte_size(names.len())];

            let written = write_header(&mut buffer, &map).unwrap();
            assert_eq!(written, 6 + 2 + 2 * names.len());

            let (length, file_indices) = read_header(&buffer).unwrap();
            assert_eq!(length, written);
            assert!(file_indices.iter().copied().eq(map.file_indices()));
        }
    }

    #[test]
    fn insufficient_capacity_writes_nothing(){
        let map = map(&[ "A", "B", "C", "D" ]);
        let mut buffer = vec![0xAB; header_byte_size(4) - 1];

        assert!(matches!(
            write_header(&mut buffer, &map),
            Err(Error::OutOfSpace { required: 16, available: 15 })
        ));

        assert!(buffer.iter().all(|&byte| byte == 0xAB));
    }

    #[test]
    fn opaque_payload_bytes_are_skipped(){
        let bytes = [ 0x48, 0x54, 0, 0, 0, 7, 0, 1, 0, 4, 0xDE, 0xAD, 0xBE, 0xFF ];
        let (length, file_indices) = read_header(&bytes).unwrap();

        assert_eq!(length, 13);
        assert_eq!(file_indices.as_slice(), &[ 4 ]);
    }

    #[test]
    fn malformed_headers(){
        let wrong_magic = [ 0x54, 0x48, 0, 0, 0, 4, 0, 1, 0, 0 ];
        assert!(matches!(read_header(&wrong_magic), Err(Error::Invalid(_))));

        let payload_too_long = [ 0x48, 0x54, 0, 0, 0, 9, 0, 1, 0, 0 ];
        assert!(matches!(read_header(&payload_too_long), Err(Error::Invalid(_))));

        let count_too_large = [ 0x48, 0x54, 0, 0, 0, 4, 0, 2, 0, 0 ];
        assert!(matches!(read_header(&count_too_large), Err(Error::Invalid(_))));

        for length in 0 .. 10 {
            assert!(read_header(&wrong_magic[.. length]).is_err());
        }
    }
}

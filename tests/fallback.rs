
//! Chunks that cannot be compressed are stored as raw pixels.

extern crate exr_ht;
use exr_ht::prelude::*;
use exr_ht::compression::ht::compress_to_vec;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

mod common;
use common::*;


fn noise(byte_count: usize, seed: u64) -> Vec<u8> {
    let mut random = StdRng::seed_from_u64(seed);
    let mut bytes = vec![0_u8; byte_count];
    random.fill(&mut bytes[..]);
    bytes
}

#[test]
fn incompressible_pixels_are_stored_raw(){
    let channels = channels(&[ ("Z", SampleType::F32, (1, 1)), ("id", SampleType::U32, (1, 1)) ]);
    let section = IntegerBounds::new((0, 0), (64, 32));
    let pixels = noise(64 * 32 * 8, 1);

    // the output buffer must stay untouched
    let mut compressed = vec![0xAA; pixels.len() + 100];
    let stored = apply(EncodeRequest::new(&channels, section, &pixels), &mut compressed).unwrap();

    assert_eq!(stored, StoredChunk::Uncompressed(pixels.len()));
    assert_eq!(stored.byte_size(), pixels.len());
    assert!(compressed.iter().all(|&byte| byte == 0xAA));

    let mut decompressed = vec![0; pixels.len()];
    undo(DecodeRequest::new(&channels, section, &pixels), &mut decompressed).unwrap();
    assert_eq!(decompressed, pixels);
}

#[test]
fn compress_to_vec_returns_pixels(){
    let channels = channels(&[ ("R", SampleType::F16, (1, 1)), ("G", SampleType::F16, (1, 1)), ("B", SampleType::F16, (1, 1)) ]);
    let section = IntegerBounds::new((-5, 3), (30, 20));
    let pixels = noise(30 * 20 * 6, 2);

    assert_eq!(compress_to_vec(EncodeRequest::new(&channels, section, &pixels)).unwrap(), pixels);

    let compressed = Compression::HTJ2K32.compress_image_section(&channels, pixels.clone(), section).unwrap();
    assert_eq!(compressed, pixels);

    let decompressed = Compression::HTJ2K32.decompress_image_section(&channels, compressed, section).unwrap();
    assert_eq!(decompressed, pixels);
}

#[test]
fn tiny_chunks_skip_the_codestream(){
    // the chunk header alone would be as large as the pixels
    let channels = channels(&[ ("Y", SampleType::F16, (1, 1)) ]);
    let section = IntegerBounds::new((7, 7), (5, 1));
    let pixels = [ 0_u8; 10 ];

    let mut compressed = [ 0_u8; 10 ];
    assert_eq!(apply(EncodeRequest::new(&channels, section, &pixels), &mut compressed).unwrap(), StoredChunk::Uncompressed(10));

    let section = IntegerBounds::new((7, 7), (6, 1));
    let pixels = [ 0_u8; 12 ];
    let mut compressed = [ 0_u8; 12 ];
    let stored = apply(EncodeRequest::new(&channels, section, &pixels), &mut compressed).unwrap();
    assert_eq!(stored, StoredChunk::Uncompressed(12), "header and codestream exceed the pixels");
}

#[test]
fn chunks_without_samples(){
    let channels = channels(&[ ("BY", SampleType::F16, (2, 2)), ("RY", SampleType::F16, (2, 2)) ]);
    let section = IntegerBounds::new((1, 1), (1, 1));

    let stored = apply(EncodeRequest::new(&channels, section, &[]), &mut []).unwrap();
    assert_eq!(stored, StoredChunk::Uncompressed(0));

    undo(DecodeRequest::new(&channels, section, &[]), &mut []).unwrap();
}

#[test]
fn small_output_buffers_are_rejected(){
    let channels = channels(&[ ("Y", SampleType::U32, (1, 1)) ]);
    let section = IntegerBounds::new((0, 0), (64, 16));
    let pixels = pack(&channels, section, smooth(&channels));

    let mut compressed = vec![0x55; pixels.len() - 1];
    let result = apply(EncodeRequest::new(&channels, section, &pixels), &mut compressed);

    assert!(matches!(result, Err(Error::OutOfSpace { required, available }) if required == pixels.len() && available == pixels.len() - 1));
    assert!(compressed.iter().all(|&byte| byte == 0x55));
}

#[test]
fn mismatched_pixel_buffers_are_rejected(){
    let channels = channels(&[ ("Y", SampleType::F16, (1, 1)), ("C", SampleType::F16, (1, 2)) ]);
    let section = IntegerBounds::new((0, 1), (8, 4));

    // luminance 8x4, chroma 8x2
    let pixels = vec![ 0_u8; (8 * 4 + 8 * 2) * 2 ];
    let mut compressed = vec![ 0_u8; 1024 ];
    assert!(apply(EncodeRequest::new(&channels, section, &pixels), &mut compressed).is_ok());

    let too_many = vec![ 0_u8; pixels.len() + 2 ];
    assert!(matches!(apply(EncodeRequest::new(&channels, section, &too_many), &mut compressed), Err(Error::Invalid(_))));

    let mut too_few = vec![ 0_u8; pixels.len() - 2 ];
    assert!(matches!(undo(DecodeRequest::new(&channels, section, &pixels), &mut too_few), Err(Error::Invalid(_))));
}

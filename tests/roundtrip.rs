
//! Compress and decompress chunks of all supported channel configurations,
//! and check that every pixel byte survives.

extern crate exr_ht;
use exr_ht::prelude::*;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

mod common;
use common::*;


#[test]
fn all_sample_types_interleaved(){
    let channels = channels(&[
        ("A", SampleType::F16, (1, 1)),
        ("Z", SampleType::F32, (1, 1)),
        ("id", SampleType::U32, (1, 1)),
    ]);

    let section = IntegerBounds::new((0, 0), (64, 32));
    let pixels = pack(&channels, section, smooth(&channels));
    assert_eq!(pixels.len(), 64 * 32 * (2 + 4 + 4));

    assert_eq!(roundtrip(&channels, section, &pixels, EncodingOptions::default()), pixels);
}

#[test]
fn rgb_with_alpha(){
    let channels = channels(&[
        ("B", SampleType::F16, (1, 1)),
        ("A", SampleType::F16, (1, 1)),
        ("R", SampleType::F16, (1, 1)),
        ("G", SampleType::F16, (1, 1)),
    ]);

    let section = IntegerBounds::new((0, 96), (80, 32));
    let pixels = pack(&channels, section, smooth(&channels));

    let (stored, bytes) = store(&channels, section, &pixels, EncodingOptions::default());
    assert!(matches!(stored, StoredChunk::Compressed(_)));

    // red, green, and blue come first, then the remaining channels in file order
    assert_eq!(&bytes[.. 16], &[ 0x48, 0x54, 0, 0, 0, 10, 0, 4, 0, 2, 0, 3, 0, 0, 0, 1 ]);

    assert_eq!(load(&channels, section, &bytes, pixels.len()).unwrap(), pixels);
}

#[test]
fn rgb_of_each_sample_type(){
    for sample_type in [ SampleType::F16, SampleType::F32, SampleType::U32 ] {
        let channels = channels(&[
            ("B", sample_type, (1, 1)),
            ("G", sample_type, (1, 1)),
            ("R", sample_type, (1, 1)),
        ]);

        let section = IntegerBounds::new((-16, 7), (48, 24));
        let pixels = pack(&channels, section, smooth(&channels));

        for allow_color_transform in [ true, false ] {
            let options = EncodingOptions { allow_color_transform, .. EncodingOptions::default() };
            assert_eq!(roundtrip(&channels, section, &pixels, options), pixels, "{:?}", sample_type);
        }
    }
}

#[test]
fn rgb_of_mixed_sample_types(){
    let channels = channels(&[
        ("B", SampleType::F16, (1, 1)),
        ("G", SampleType::F32, (1, 1)),
        ("R", SampleType::F16, (1, 1)),
    ]);

    let section = IntegerBounds::new((0, 0), (64, 16));
    let pixels = pack(&channels, section, smooth(&channels));
    assert_eq!(roundtrip(&channels, section, &pixels, EncodingOptions::default()), pixels);
}

#[test]
fn luminance_chroma_planar(){
    let channels = channels(&[
        ("BY", SampleType::F16, (2, 2)),
        ("RY", SampleType::F16, (2, 2)),
        ("Y", SampleType::F16, (1, 1)),
    ]);

    for position in [ (0, 0), (1, 1), (-3, 17), (6, -5), (-1, -1) ] {
        let section = IntegerBounds::new(position, (64, 31));
        let pixels = pack(&channels, section, smooth(&channels));
        assert!(is_planar(&channels, section));

        assert_eq!(roundtrip(&channels, section, &pixels, EncodingOptions::default()), pixels, "at {:?}", position);
    }
}

#[test]
fn absent_channels_are_skipped(){
    let channels = channels(&[
        ("BY", SampleType::F32, (2, 2)),
        ("RY", SampleType::F32, (2, 2)),
        ("Y", SampleType::F32, (1, 1)),
    ]);

    // a single odd row contains no chroma samples
    let section = IntegerBounds::new((0, 33), (256, 1));
    let pixels = pack(&channels, section, smooth(&channels));
    assert_eq!(pixels.len(), 256 * 4);

    let (stored, bytes) = store(&channels, section, &pixels, EncodingOptions::default());
    assert!(matches!(stored, StoredChunk::Compressed(_)));

    // only the luminance channel is mapped
    assert_eq!(&bytes[6 .. 10], &[ 0, 1, 0, 2 ]);

    assert_eq!(load(&channels, section, &bytes, pixels.len()).unwrap(), pixels);
}

#[test]
fn special_values_survive(){
    let channels = channels(&[
        ("half", SampleType::F16, (1, 1)),
        ("float", SampleType::F32, (1, 1)),
        ("uint", SampleType::U32, (1, 1)),
    ]);

    let special_halves = [ 0x7E01, 0xFC00, 0x7C00, 0x8000, 0x0001, 0xFFFF, 0x8001 ];
    let special_floats = [ 0x7FC0_0001, 0xFF80_0000, 0x7F80_0000, 0x8000_0000, 0x0000_0001, 0xFFFF_FFFF, 0x8000_0001 ];
    let special_integers = [ 0xFFFF_FFFF, 0x8000_0000, 0x7FFF_FFFF, 0, 1, 0xFFFF_FFFE, 0x8000_0001 ];

    let section = IntegerBounds::new((0, 0), (64, 32));

    let pixels = pack(&channels, section, |channel, x, y| {
        let index = x + y * 64;

        if index % 29 != 0 {
            return match channel { 0 => 0x3C00, 1 => 0x3F80_0000, _ => 7 };
        }

        let special = (index / 29) % special_halves.len();
        match channel { 0 => special_halves[special], 1 => special_floats[special], _ => special_integers[special] }
    });

    assert_eq!(roundtrip(&channels, section, &pixels, EncodingOptions::default()), pixels);
}

#[test]
fn coding_options(){
    let channels = channels(&[ ("R", SampleType::F32, (1, 1)), ("G", SampleType::F32, (1, 1)), ("B", SampleType::F32, (1, 1)) ]);
    let section = IntegerBounds::new((5, 5), (40, 40));
    let pixels = pack(&channels, section, smooth(&channels));

    for (block_size, decomposition_levels) in [ ((64, 64), 5), ((4, 4), 0), ((1024, 4), 32), ((32, 128), 1) ] {
        let options = EncodingOptions { block_size: block_size.into(), decomposition_levels, .. EncodingOptions::default() };
        assert_eq!(roundtrip(&channels, section, &pixels, options), pixels, "{:?}", options);
    }

    for block_size in [ (100, 32), (2048, 2), (128, 64) ] {
        let options = EncodingOptions { block_size: block_size.into(), .. EncodingOptions::default() };
        let mut compressed = vec![0; pixels.len()];

        let result = apply(EncodeRequest::new(&channels, section, &pixels).with_options(options), &mut compressed);
        assert!(matches!(result, Err(Error::NotSupported(_))), "{:?}", block_size);
    }
}

#[test]
fn scan_line_blocks(){
    let channels = channels(&[ ("Y", SampleType::F16, (1, 1)), ("C", SampleType::F16, (2, 2)) ]);
    let width = 96;

    for compression in [ Compression::HTJ2K32, Compression::HTJ2K256 ] {
        let lines = compression.scan_lines_per_block();

        for block_index in -2 .. 3 {
            let section = IntegerBounds::new((-7, block_index * lines as i32), (width, lines));
            let pixels = pack(&channels, section, smooth(&channels));

            let compressed = compression.compress_image_section(&channels, pixels.clone(), section).unwrap();
            assert!(compressed.len() < pixels.len(), "{}", compression);

            let decompressed = compression.decompress_image_section(&channels, compressed, section).unwrap();
            assert_eq!(decompressed, pixels);
        }
    }
}

#[test]
fn rgb_first_with_subsampled_alpha(){
    let channels = channels(&[
        ("A", SampleType::F16, (2, 2)),
        ("B", SampleType::F16, (1, 1)),
        ("G", SampleType::F16, (1, 1)),
        ("R", SampleType::F16, (1, 1)),
    ]);

    for position in [ (0, 0), (1, 1), (-3, 5) ] {
        let section = IntegerBounds::new(position, (40, 17));
        assert!(is_planar(&channels, section));

        let pixels = pack(&channels, section, smooth(&channels));
        let (stored, bytes) = store(&channels, section, &pixels, EncodingOptions::default());
        assert!(matches!(stored, StoredChunk::Compressed(_)), "{:?}", section);

        // components are reordered while every channel keeps its own block of samples
        assert_eq!(&bytes[.. 16], &[ 0x48, 0x54, 0, 0, 0, 10, 0, 4, 0, 3, 0, 2, 0, 1, 0, 0 ]);
        assert_eq!(load(&channels, section, &bytes, pixels.len()).unwrap(), pixels, "{:?}", section);
    }

    // a single odd row contains no alpha samples, so the chunk is interleaved
    let section = IntegerBounds::new((0, 1), (40, 1));
    assert!(!is_planar(&channels, section));

    let pixels = pack(&channels, section, smooth(&channels));
    let (_, bytes) = store(&channels, section, &pixels, EncodingOptions::default());
    assert_eq!(load(&channels, section, &bytes, pixels.len()).unwrap(), pixels);
}

#[test]
fn random_sections(){
    let mut random = StdRng::seed_from_u64(0x5eed_cafe);
    let mut compressed_count = 0;

    let configurations = [
        channels(&[ ("Y", SampleType::F16, (1, 1)) ]),
        channels(&[ ("B", SampleType::F32, (1, 1)), ("G", SampleType::F32, (1, 1)), ("R", SampleType::F32, (1, 1)) ]),
        channels(&[ ("A", SampleType::U32, (1, 1)), ("B", SampleType::F16, (1, 1)), ("G", SampleType::F16, (1, 1)), ("R", SampleType::F16, (1, 1)) ]),
        channels(&[ ("BY", SampleType::F16, (2, 2)), ("RY", SampleType::F16, (2, 2)), ("Y", SampleType::F16, (1, 1)) ]),
        channels(&[ ("depth", SampleType::F32, (1, 3)), ("mask", SampleType::U32, (4, 1)), ("Y", SampleType::F16, (1, 1)) ]),
        channels(&[ ("A", SampleType::F16, (2, 2)), ("B", SampleType::F16, (1, 1)), ("G", SampleType::F16, (1, 1)), ("R", SampleType::F16, (1, 1)) ]),
    ];

    for _ in 0 .. 200 {
        let channels = &configurations[random.random_range(0 .. configurations.len())];

        let section = IntegerBounds::new(
            (random.random_range(-100 .. 100_i32), random.random_range(-100 .. 100_i32)),
            (random.random_range(1 .. 90_usize), random.random_range(1 .. 40_usize)),
        );

        let noisy: bool = random.random();
        let noise_seed: u32 = random.random();

        let pixels = pack(channels, section, |channel, x, y| {
            let value = smooth(channels)(channel, x, y);
            if noisy { value ^ (noise_seed.wrapping_mul((x * 31 + y * 17 + channel) as u32 | 1) >> 20) }
            else { value }
        });

        let (stored, bytes) = store(channels, section, &pixels, EncodingOptions::default());
        if let StoredChunk::Compressed(_) = stored { compressed_count += 1; }

        let decompressed = load(channels, section, &bytes, pixels.len()).unwrap();
        assert_eq!(decompressed, pixels, "{:?} {:?}", section, channels);
    }

    assert!(compressed_count > 50, "only {} chunks were compressed", compressed_count);
}

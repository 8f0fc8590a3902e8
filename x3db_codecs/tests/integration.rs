/// Integration tests for the array algorithms, driven through the
/// `ArrayCodec` trait the document engine uses.
use proptest::prelude::*;

use x3db_codecs::{
    algorithm_by_uri, ArrayAlgorithm, FloatArrayCodec, IntegerArrayCodec, DEFAULT_TOLERANCE,
};
use x3db_core::{ArrayCodec, EncodingError, TypedArray};

/// Deterministic pseudo-random sequence from a simple LCG.
fn lcg(seed: u64) -> impl Iterator<Item = u64> {
    let mut state = seed;
    std::iter::repeat_with(move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    })
}

/// Triangle index list over a `width` x `width` vertex grid, `-1` terminated.
fn grid_triangles(width: i32) -> Vec<i32> {
    let mut out = Vec::new();
    for y in 0..width - 1 {
        for x in 0..width - 1 {
            let i = y * width + x;
            out.extend_from_slice(&[i, i + 1, i + width, -1, i + 1, i + width + 1, i + width, -1]);
        }
    }
    out
}

#[test]
fn test_index_list_compresses_well() {
    let indices = grid_triangles(64);
    let codec = IntegerArrayCodec::new();
    let block = codec.encode_ints(&indices).unwrap();
    assert_eq!(block[4], 4, "triangle lists sniff stride 4");
    assert!(
        block.len() * 20 < indices.len() * 4,
        "{} bytes for {} indices",
        block.len(),
        indices.len()
    );
    assert_eq!(codec.decode_ints(&block).unwrap(), indices);
}

#[test]
fn test_random_ints_round_trip() {
    let data: Vec<i32> = lcg(7).take(50_000).map(|r| r as i32).collect();
    let codec = IntegerArrayCodec::new();
    let block = codec.encode_ints(&data).unwrap();
    assert_eq!(codec.decode_ints(&block).unwrap(), data);
}

#[test]
fn test_empty_arrays() {
    let ints = IntegerArrayCodec::new();
    assert_eq!(ints.decode_ints(&ints.encode_ints(&[]).unwrap()).unwrap(), Vec::<i32>::new());
    let floats = FloatArrayCodec::new();
    assert_eq!(
        floats.decode_floats(&floats.encode_floats(&[]).unwrap()).unwrap(),
        Vec::<f32>::new()
    );
}

#[test]
fn test_terrain_within_default_tolerance() {
    let heights: Vec<f32> = lcg(11)
        .take(10_000)
        .enumerate()
        .map(|(i, r)| (i as f32 * 0.01).sin() * 0.5 + (r % 1000) as f32 * 1e-4)
        .collect();
    let codec = FloatArrayCodec::new();
    let block = codec.encode_floats(&heights).unwrap();
    let decoded = codec.decode_floats(&block).unwrap();
    assert_eq!(decoded.len(), heights.len());
    for (a, b) in heights.iter().zip(&decoded) {
        assert!((f64::from(*a) - f64::from(*b)).abs() <= f64::from(DEFAULT_TOLERANCE));
    }
}

#[test]
fn test_non_finite_floats_survive() {
    let data = [0.25f32, f32::INFINITY, f32::NEG_INFINITY, f32::NAN, -7.5];
    let codec = FloatArrayCodec::with_tolerance(0.01).unwrap();
    let decoded = codec.decode_floats(&codec.encode_floats(&data).unwrap()).unwrap();
    assert_eq!(decoded[1], f32::INFINITY);
    assert_eq!(decoded[2], f32::NEG_INFINITY);
    assert_eq!(decoded[3].to_bits(), f32::NAN.to_bits());
    assert!((decoded[4] + 7.5).abs() <= 0.01);
}

#[test]
fn test_truncated_blocks_fail() {
    let ints = ArrayAlgorithm::from(IntegerArrayCodec::new());
    let floats = ArrayAlgorithm::from(FloatArrayCodec::new());
    let int_block = ints.encode(&TypedArray::Int32(grid_triangles(8))).unwrap();
    let float_block = floats
        .encode(&TypedArray::Float32((0..300).map(|i| i as f32 * 0.3).collect()))
        .unwrap();

    for (codec, block) in [(ints, int_block), (floats, float_block)] {
        for cut in [0, 1, 4, 5, block.len() / 2, block.len() - 1] {
            let err = codec.decode(&block[..cut]).unwrap_err();
            assert!(
                matches!(err, EncodingError::Io { .. } | EncodingError::Malformed { .. }),
                "{} cut at {cut}: {err:?}",
                codec.name()
            );
        }
    }
}

#[test]
fn test_dispatch_by_declared_uri() {
    let data = TypedArray::Float32(vec![1.5, -2.25, 1e6]);
    let encoder = ArrayAlgorithm::from(FloatArrayCodec::with_tolerance(0.0).unwrap());
    let block = encoder.encode(&data).unwrap();
    let decoder = algorithm_by_uri(encoder.uri()).unwrap();
    assert_eq!(decoder.decode(&block).unwrap(), data);
}

proptest! {
    #[test]
    fn ints_round_trip_exactly(data in proptest::collection::vec(any::<i32>(), 0..400)) {
        let codec = IntegerArrayCodec::new();
        let block = codec.encode_ints(&data).unwrap();
        prop_assert_eq!(codec.decode_ints(&block).unwrap(), data);
    }

    #[test]
    fn polygon_lists_round_trip(
        stride in 2usize..8,
        polygons in 1usize..60,
        seed in any::<u64>(),
    ) {
        let mut values = lcg(seed).map(|r| (r % 5000) as i32);
        let data: Vec<i32> = (0..polygons * stride)
            .map(|i| if (i + 1) % stride == 0 { -1 } else { values.next().unwrap_or(0) })
            .collect();
        let codec = IntegerArrayCodec::new();
        let block = codec.encode_ints(&data).unwrap();
        prop_assert_eq!(block[4] as usize, stride);
        prop_assert_eq!(codec.decode_ints(&block).unwrap(), data);
    }

    #[test]
    fn floats_stay_within_tolerance(
        data in proptest::collection::vec(-1.0e4f32..1.0e4, 0..300),
        tolerance in prop::sample::select(vec![0.0f32, 1e-6, 1e-3, 0.5]),
    ) {
        let codec = FloatArrayCodec::with_tolerance(tolerance).unwrap();
        let decoded = codec.decode_floats(&codec.encode_floats(&data).unwrap()).unwrap();
        prop_assert_eq!(decoded.len(), data.len());
        for (a, b) in data.iter().zip(&decoded) {
            prop_assert!((f64::from(*a) - f64::from(*b)).abs() <= f64::from(tolerance));
        }
    }
}

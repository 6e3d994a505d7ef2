use half::f16;

use crate::capture_pipeline::common::error::CaptureError;
use crate::capture_pipeline::depth::{
    CoverageMask, DepthNormalizer, FLAT_RANGE_VALUE, MaskMapping, MaskOrientation,
    NormalizerConfig, RawDepthFrame,
};

const COVERED: u8 = 255;
const UNCOVERED: u8 = 0;

fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}

fn visible(frame: &RawDepthFrame) -> Vec<f32> {
    frame.to_f32_packed()
}

#[test]
fn test_two_by_two_scenario() {
    let mut depth = RawDepthFrame::from_f32(2, 2, 4, &[10.0, 20.0, 30.0, 40.0]).unwrap();
    let mask = CoverageMask::filled(2, 2, 2, COVERED);

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!(stats.covered, 4);
    assert_eq!(stats.min, 10.0);
    assert_eq!(stats.max, 40.0);
    let out = visible(&depth);
    assert_close(out[0], 0.0, 1e-3);
    assert_close(out[1], 0.333, 1e-3);
    assert_close(out[2], 0.667, 1e-3);
    assert_close(out[3], 1.0, 1e-3);
}

#[test]
fn test_uncovered_mask_zeroes_everything() {
    let mut depth = RawDepthFrame::from_f32(3, 2, 6, &[1.0, -4.0, 7.5, 100.0, 0.25, 3.0]).unwrap();
    let mask = CoverageMask::filled(3, 2, 3, UNCOVERED);

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!(stats.covered, 0);
    assert_eq!((stats.min, stats.max), (0.0, 1.0));
    assert!(visible(&depth).iter().all(|&v| v == 0.0));
}

#[test]
fn test_flat_covered_range_uses_fallback() {
    let mut depth = RawDepthFrame::from_f32(2, 2, 4, &[5.0, 5.0, 9.0, 5.0]).unwrap();
    let mask = CoverageMask::from_packed(2, 2, vec![COVERED, COVERED, UNCOVERED, COVERED]).unwrap();

    DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    let out = visible(&depth);
    assert_eq!(out, vec![FLAT_RANGE_VALUE, FLAT_RANGE_VALUE, 0.0, FLAT_RANGE_VALUE]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn test_uncovered_pixels_do_not_affect_range() {
    let mut depth = RawDepthFrame::from_f32(4, 1, 8, &[1000.0, 2.0, 4.0, -50.0]).unwrap();
    let mask = CoverageMask::from_packed(4, 1, vec![UNCOVERED, COVERED, COVERED, UNCOVERED]).unwrap();

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!((stats.min, stats.max), (2.0, 4.0));
    assert_eq!(visible(&depth), vec![0.0, 0.0, 1.0, 0.0]);
}

#[test]
fn test_outputs_stay_in_unit_range() {
    let values: Vec<f32> = (0..64).map(|i| ((i * 37) % 23) as f32 * 0.75 - 6.0).collect();
    let mask_data: Vec<u8> = (0..64).map(|i| if i % 3 == 0 { UNCOVERED } else { COVERED }).collect();
    let mut depth = RawDepthFrame::from_f32(8, 8, 16, &values).unwrap();
    let mask = CoverageMask::from_packed(8, 8, mask_data.clone()).unwrap();

    DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    for (value, covered) in visible(&depth).into_iter().zip(mask_data) {
        assert!((0.0..=1.0).contains(&value), "{value} out of range");
        if covered == UNCOVERED {
            assert_eq!(value, 0.0);
        }
    }
}

#[test]
fn test_normalize_is_idempotent() {
    let values = [0.4, 1.7, 2.2, 0.9, 3.1, 1.1, 2.8, 0.5, 1.9];
    let mut depth = RawDepthFrame::from_f32(3, 3, 8, &values).unwrap();
    let mask = CoverageMask::from_packed(
        3,
        3,
        vec![COVERED, COVERED, UNCOVERED, COVERED, COVERED, COVERED, UNCOVERED, COVERED, COVERED],
    )
    .unwrap();
    let normalizer = DepthNormalizer::default();

    normalizer.normalize(&mut depth, &mask).unwrap();
    let first = visible(&depth);
    let stats = normalizer.normalize(&mut depth, &mask).unwrap();
    let second = visible(&depth);

    assert_eq!((stats.min, stats.max), (0.0, 1.0));
    for (a, b) in first.iter().zip(&second) {
        assert_close(*b, *a, 1e-6);
    }
}

#[test]
fn test_row_padding_is_respected() {
    // Rows are 3 samples wide but 8 samples apart.
    let mut depth = RawDepthFrame::from_f32(3, 2, 16, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    for padding in [3usize, 4, 5, 6, 7] {
        depth.data[padding] = f16::from_f32(999.0);
    }
    let mask = CoverageMask::filled(3, 2, 3, COVERED);

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!((stats.min, stats.max), (1.0, 6.0));
    assert_close(depth.get(2, 1).unwrap(), 1.0, 1e-3);
    // Padding is neither read for the range nor rewritten.
    assert_eq!(depth.data[5].to_f32(), 999.0);
}

#[test]
fn test_non_finite_samples_are_treated_as_uncovered() {
    let mut depth = RawDepthFrame::from_f32(3, 1, 6, &[f32::NAN, 2.0, 4.0]).unwrap();
    depth.data[0] = f16::INFINITY;
    let mask = CoverageMask::filled(3, 1, 3, COVERED);

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!(stats.covered, 2);
    assert_eq!(visible(&depth), vec![0.0, 0.0, 1.0]);
}

#[test]
fn test_coverage_threshold_is_exclusive() {
    let mut depth = RawDepthFrame::from_f32(3, 1, 6, &[1.0, 2.0, 3.0]).unwrap();
    let mask = CoverageMask::from_packed(3, 1, vec![100, 101, 200]).unwrap();

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!(stats.covered, 2);
    assert_eq!(visible(&depth), vec![0.0, 0.0, 1.0]);
}

#[test]
fn test_mask_at_higher_resolution_with_padding() {
    // 2x2 depth, 4x4 mask with 6-byte rows; only the top-left 2x2 block of the
    // mask (depth pixel (0, 0)) is uncovered.
    let mut mask = CoverageMask::filled(4, 4, 6, COVERED);
    for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        mask.data[y * 6 + x] = UNCOVERED;
    }
    let mut depth = RawDepthFrame::from_f32(2, 2, 4, &[50.0, 1.0, 2.0, 3.0]).unwrap();

    let stats = DepthNormalizer::default().normalize(&mut depth, &mask).unwrap();

    assert_eq!((stats.min, stats.max), (1.0, 3.0));
    assert_eq!(visible(&depth), vec![0.0, 0.0, 0.5, 1.0]);
}

#[test]
fn test_aligned_mapping_scales_each_axis() {
    let depth = RawDepthFrame::from_f32(640, 480, 1280, &vec![0.0; 640 * 480]).unwrap();
    let mask = CoverageMask::filled(320, 120, 384, COVERED);
    let mapping = MaskMapping::new(&depth, &mask, MaskOrientation::Aligned);

    assert_eq!(mapping.mask_coords(0, 0), (0, 0));
    assert_eq!(mapping.mask_coords(639, 479), (319, 119));
    assert_eq!(mapping.mask_coords(321, 5), (160, 1));
    assert_eq!(mapping.mask_index(321, 5), 384 + 160);
}

#[test]
fn test_rotated_mapping_turns_rows_into_columns() {
    // Landscape 4x2 depth against a portrait 2x4 mask.
    let depth = RawDepthFrame::from_f32(4, 2, 8, &[0.0; 8]).unwrap();
    let mask = CoverageMask::filled(2, 4, 2, COVERED);
    let mapping = MaskMapping::new(&depth, &mask, MaskOrientation::Rotated90);

    // Bottom-left of the depth frame lands in the mask's top-left corner.
    assert_eq!(mapping.mask_coords(0, 1), (0, 0));
    assert_eq!(mapping.mask_coords(0, 0), (1, 0));
    assert_eq!(mapping.mask_coords(3, 1), (0, 3));
    assert_eq!(mapping.mask_coords(3, 0), (1, 3));
}

#[test]
fn test_rotated_mask_normalization() {
    let mut depth = RawDepthFrame::from_f32(2, 1, 4, &[3.0, 7.0]).unwrap();
    // Mask is 1 wide and 2 tall; depth column 0 maps to mask row 0.
    let mask = CoverageMask::from_packed(1, 2, vec![UNCOVERED, COVERED]).unwrap();
    let normalizer = DepthNormalizer::new(
        NormalizerConfig::builder()
            .orientation(MaskOrientation::Rotated90)
            .build(),
    );

    let stats = normalizer.normalize(&mut depth, &mask).unwrap();

    assert_eq!(stats.covered, 1);
    assert_eq!(visible(&depth), vec![0.0, FLAT_RANGE_VALUE]);
}

#[test]
fn test_zero_dimensions_are_rejected() {
    let mut depth = RawDepthFrame {
        width: 0,
        height: 2,
        bytes_per_row: 4,
        data: vec![f16::ONE; 4],
    };
    let mask = CoverageMask::filled(2, 2, 2, COVERED);

    let result = DepthNormalizer::default().normalize(&mut depth, &mask);

    assert!(matches!(result, Err(CaptureError::InvalidDimensions(0, 2))));
}

#[test]
fn test_short_stride_is_rejected() {
    let mut depth = RawDepthFrame {
        width: 4,
        height: 2,
        bytes_per_row: 6,
        data: vec![f16::ONE; 8],
    };
    let mask = CoverageMask::filled(4, 2, 4, COVERED);

    let result = DepthNormalizer::default().normalize(&mut depth, &mask);

    assert!(matches!(
        result,
        Err(CaptureError::StrideTooSmall { bytes_per_row: 6, min: 8 })
    ));
}

#[test]
fn test_misaligned_stride_is_rejected() {
    let mut depth = RawDepthFrame {
        width: 2,
        height: 2,
        bytes_per_row: 5,
        data: vec![f16::ONE; 6],
    };
    let mask = CoverageMask::filled(2, 2, 2, COVERED);

    let result = DepthNormalizer::default().normalize(&mut depth, &mask);

    assert!(matches!(result, Err(CaptureError::MisalignedStride { .. })));
}

#[test]
fn test_short_mask_is_rejected_without_touching_depth() {
    let mut depth = RawDepthFrame::from_f32(2, 2, 4, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let before = depth.clone();
    let mask = CoverageMask {
        width: 2,
        height: 2,
        bytes_per_row: 2,
        data: vec![COVERED; 3],
    };

    let result = DepthNormalizer::default().normalize(&mut depth, &mask);

    assert!(matches!(
        result,
        Err(CaptureError::BufferTooSmall { len: 3, required: 4 })
    ));
    assert_eq!(depth, before);
}

#[test]
fn test_from_le_bytes_reads_half_floats() {
    let mut bytes = Vec::new();
    for value in [1.5f32, -2.0, 0.0, 0.0, 8.0, 0.25, 0.0, 0.0] {
        bytes.extend_from_slice(&f16::from_f32(value).to_le_bytes());
    }

    let depth = RawDepthFrame::from_le_bytes(2, 2, 8, &bytes).unwrap();

    assert_eq!(depth.stride(), 4);
    assert_eq!(depth.get(1, 0), Some(-2.0));
    assert_eq!(depth.get(0, 1), Some(8.0));
    assert_eq!(depth.to_f32_packed(), vec![1.5, -2.0, 8.0, 0.25]);
}

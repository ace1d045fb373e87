use super::*;
use crate::build::geometry::BlockGeometry;
use crate::frame::buffer::BLEED_SENTINEL_RGB;
use crate::vectors::displacement::VectorKind;

fn numbered(w: u32, h: u32) -> Frame {
    let mut f = Frame::allocate(w, h);
    for y in 0..h {
        for x in 0..w {
            f.set_pixel(x, y, [x as u8 + 1, y as u8 + 1, 77]);
        }
    }
    f
}

fn list(kind: VectorKind, v: &[i64]) -> VectorList {
    VectorList::new(kind, v.to_vec())
}

fn builder(block_size: u32, bleed: u32) -> ResidualBuilder {
    ResidualBuilder::new(BlockGeometry::new(block_size, bleed).unwrap()).unwrap()
}

#[test]
fn identical_frames_yield_no_change() {
    let out = builder(4, 1)
        .build(
            &numbered(8, 8),
            &list(VectorKind::Residual, &[]),
            &list(VectorKind::Predictive, &[0, 0, 0, 0]),
        )
        .unwrap();
    assert_eq!(out, ResidualOutput::NoChange);
    assert!(out.frame().is_none());
}

#[test]
fn new_scene_yields_full_copy() {
    let raw = numbered(8, 8);
    let out = builder(4, 1)
        .build(
            &raw,
            &list(VectorKind::Residual, &[]),
            &list(VectorKind::Predictive, &[]),
        )
        .unwrap();
    assert_eq!(out, ResidualOutput::FullCopy(raw));
}

#[test]
fn packs_block_into_grid_cell_with_bleed() {
    let raw = numbered(8, 8);
    // Block (1,1) of the frame goes into canvas cell (0,0).
    let out = builder(4, 1)
        .build(
            &raw,
            &list(VectorKind::Residual, &[1, 1, 0, 0]),
            &list(VectorKind::Predictive, &[]),
        )
        .unwrap();
    let ResidualOutput::PackedCanvas(canvas) = out else {
        panic!("expected packed canvas");
    };
    assert_eq!(canvas.dimensions(), (12, 12));
    // The cell interior starts `bleed` pixels in.
    assert_eq!(canvas.pixel(1, 1), raw.pixel(4, 4));
    assert_eq!(canvas.pixel(4, 4), raw.pixel(7, 7));
    // Bleed carries the neighbouring pixels.
    assert_eq!(canvas.pixel(0, 0), raw.pixel(3, 3));
    // Past the right/bottom edge of the frame the bleed is sentinel.
    assert_eq!(canvas.pixel(5, 5), BLEED_SENTINEL_RGB);
}

#[test]
fn packing_ignores_spatial_position() {
    let raw = numbered(16, 16);
    let out = builder(4, 0)
        .build(
            &raw,
            &list(VectorKind::Residual, &[3, 3, 0, 0, 0, 0, 1, 0]),
            &list(VectorKind::Predictive, &[1, 1, 1, 1]),
        )
        .unwrap();
    let canvas = out.frame().unwrap();
    assert_eq!(canvas.dimensions(), (8, 8));
    assert_eq!(canvas.pixel(0, 0), raw.pixel(12, 12));
    assert_eq!(canvas.pixel(4, 0), raw.pixel(0, 0));
}

#[test]
fn canvas_sides_follow_vector_count() {
    let raw = numbered(64, 64);
    let b = builder(4, 1);
    for (n, cells) in [(1usize, 2u32), (4, 3), (25, 6)] {
        let mut ints = Vec::new();
        let side = cells as i64;
        for i in 0..n as i64 {
            ints.extend_from_slice(&[i % 16, i / 16, i % side, i / side]);
        }
        let out = b
            .build(
                &raw,
                &list(VectorKind::Residual, &ints),
                &list(VectorKind::Predictive, &[]),
            )
            .unwrap();
        assert_eq!(out.frame().unwrap().width(), cells * 6, "n={n}");
    }
}

#[test]
fn malformed_residual_list_is_rejected() {
    let err = builder(4, 1)
        .build(
            &numbered(8, 8),
            &list(VectorKind::Residual, &[1, 1, 0]),
            &list(VectorKind::Predictive, &[]),
        )
        .unwrap_err();
    assert!(matches!(err, DeltaError::MalformedVectorList { .. }));
}

#[test]
fn malformed_predictive_list_is_rejected_for_unchanged_frames() {
    let err = builder(4, 1)
        .build(
            &numbered(8, 8),
            &list(VectorKind::Residual, &[]),
            &list(VectorKind::Predictive, &[0, 0, 0]),
        )
        .unwrap_err();
    assert!(matches!(err, DeltaError::MalformedVectorList { .. }));
}

#[test]
fn block_outside_frame_is_an_error_not_a_panic() {
    let err = builder(4, 1)
        .build(
            &numbered(8, 8),
            &list(VectorKind::Residual, &[5, 5, 0, 0]),
            &list(VectorKind::Predictive, &[]),
        )
        .unwrap_err();
    assert!(matches!(err, DeltaError::Validation(_)));
}

#[test]
fn debug_image_blacks_out_residual_blocks() {
    let raw = numbered(8, 8);
    let img = builder(4, 1)
        .debug_image(&raw, &list(VectorKind::Residual, &[1, 0, 0, 0]))
        .unwrap();
    assert_eq!(img.pixel(5, 2), [0, 0, 0]);
    assert_eq!(img.pixel(1, 1), raw.pixel(1, 1));
}

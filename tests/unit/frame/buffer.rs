use super::*;

fn gradient(w: u32, h: u32) -> Frame {
    let mut f = Frame::allocate(w, h);
    for y in 0..h {
        for x in 0..w {
            f.set_pixel(x, y, [x as u8, y as u8, (x * 7 + y) as u8]);
        }
    }
    f
}

#[test]
fn allocate_is_background_filled() {
    let f = Frame::allocate(3, 2);
    assert_eq!(f.data().len(), 3 * 2 * CHANNELS);
    assert!(f.data().iter().all(|&b| b == 0));
}

#[test]
fn from_rgb8_checks_length() {
    assert!(Frame::from_rgb8(2, 2, vec![0; 12]).is_ok());
    assert!(Frame::from_rgb8(2, 2, vec![0; 11]).is_err());
}

#[test]
fn copy_whole_into_larger_destination_keeps_rest() {
    let src = gradient(4, 3);
    let mut dst = Frame::filled(6, 5, [9, 9, 9]);
    dst.copy_whole(&src);
    assert_eq!(dst.pixel(3, 2), src.pixel(3, 2));
    assert_eq!(dst.pixel(4, 0), [9, 9, 9]);
    assert_eq!(dst.pixel(0, 3), [9, 9, 9]);
}

#[test]
#[should_panic(expected = "copy_whole")]
fn copy_whole_into_smaller_destination_panics() {
    let mut dst = Frame::allocate(2, 2);
    dst.copy_whole(&Frame::allocate(3, 3));
}

#[test]
fn copy_block_moves_exact_window() {
    let src = gradient(8, 8);
    let mut dst = Frame::allocate(8, 8);
    dst.copy_block(&src, 2, 4, 6, 1, 0);
    assert_eq!(dst.pixel(1, 0), src.pixel(4, 6));
    assert_eq!(dst.pixel(2, 1), src.pixel(5, 7));
    assert_eq!(dst.pixel(3, 0), [0, 0, 0]);
    assert_eq!(dst.pixel(0, 0), [0, 0, 0]);
}

#[test]
fn try_copy_block_rejects_overhang_without_writing() {
    let src = gradient(4, 4);
    let mut dst = Frame::filled(4, 4, [1, 1, 1]);
    assert!(!dst.try_copy_block(&src, 2, 3, 0, 0, 0));
    assert!(!dst.try_copy_block(&src, 2, 0, 0, 3, 3));
    assert!(dst.data().iter().all(|&b| b == 1));
}

#[test]
fn bleeded_copy_centers_and_pads_with_sentinel() {
    let src = gradient(3, 2);
    let b = src.bleeded_copy(5);
    assert_eq!(b.dimensions(), (13, 12));
    assert_eq!(b.pixel(5, 5), src.pixel(0, 0));
    assert_eq!(b.pixel(7, 6), src.pixel(2, 1));
    assert_eq!(b.pixel(4, 5), BLEED_SENTINEL_RGB);
    assert_eq!(b.pixel(8, 6), BLEED_SENTINEL_RGB);
    assert_eq!(b.pixel(12, 11), BLEED_SENTINEL_RGB);
}

#[test]
fn map_block_saturates_through_closure() {
    let mut f = Frame::filled(4, 4, [250, 10, 128]);
    assert!(f.map_block(2, 2, 2, |c| c.saturating_add(10)));
    assert_eq!(f.pixel(3, 3), [255, 20, 138]);
    assert_eq!(f.pixel(1, 1), [250, 10, 128]);
    assert!(!f.map_block(2, 3, 3, |c| c));
}

#[test]
fn fill_block_paints_window() {
    let mut f = gradient(4, 4);
    assert!(f.fill_block(2, 0, 0, [0, 0, 0]));
    assert_eq!(f.pixel(1, 1), [0, 0, 0]);
    assert_ne!(f.pixel(2, 2), [0, 0, 0]);
}

use super::*;
use std::path::PathBuf;
use std::time::Duration;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("deltaframe_io_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn checker(w: u32, h: u32) -> Frame {
    let mut f = Frame::allocate(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 200 } else { 30 };
            f.set_pixel(x, y, [v, 255 - v, (x * 10) as u8]);
        }
    }
    f
}

#[test]
fn png_roundtrip_is_lossless() {
    let dir = scratch_dir("png");
    let p = dir.join("nested").join("frame.png");
    let f = checker(9, 7);
    f.save(&p).unwrap();
    assert_eq!(Frame::load(&p).unwrap(), f);
    let left: Vec<_> = std::fs::read_dir(dir.join("nested")).unwrap().collect();
    assert_eq!(left.len(), 1);
}

#[test]
fn staged_save_leaves_nothing_behind_in_either_directory() {
    let dir = scratch_dir("staged");
    let watched = dir.join("watched");
    let staging = dir.join("tmp");
    let p = watched.join("output_000001.png");
    let f = checker(6, 6);
    f.save_staged(&p, DEFAULT_QUALITY, &staging).unwrap();

    assert_eq!(Frame::load(&p).unwrap(), f);
    let names: Vec<_> = std::fs::read_dir(&watched)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("output_000001.png")]);
    assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
}

#[test]
fn staged_names_keep_the_parent_directory() {
    assert_eq!(
        staged_name(Path::new("/ws/merged/merged_000001.png")),
        ".merged-merged_000001.png.partial"
    );
    assert_eq!(staged_name(Path::new("a.png")), ".a.png.partial");
}

#[test]
fn jpeg_save_keeps_dimensions() {
    let dir = scratch_dir("jpeg");
    let p = dir.join("canvas.jpg");
    checker(16, 8).save_with_quality(&p, DEBUG_QUALITY).unwrap();
    assert_eq!(Frame::load(&p).unwrap().dimensions(), (16, 8));
}

#[test]
fn invalid_quality_is_rejected() {
    let dir = scratch_dir("quality");
    assert!(checker(2, 2).save_with_quality(&dir.join("a.jpg"), 0).is_err());
    assert!(checker(2, 2).save_with_quality(&dir.join("a.jpg"), 101).is_err());
}

#[test]
fn garbage_file_is_unreadable_after_retries() {
    let dir = scratch_dir("garbage");
    let p = dir.join("broken.png");
    std::fs::write(&p, b"not a png").unwrap();
    let policy = WaitPolicy {
        poll_interval: Duration::from_millis(2),
        timeout: Some(Duration::from_secs(1)),
        read_retries: 2,
    };
    let c = PipelineController::new();
    let err = Frame::load_waiting(&p, &policy, &c).unwrap_err();
    assert!(matches!(err, DeltaError::UnreadableImage { .. }));
}

#[test]
fn load_waiting_picks_up_late_image() {
    let dir = scratch_dir("late");
    let p = dir.join("late.png");
    let f = checker(4, 4);
    let (wp, wf) = (p.clone(), f.clone());
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        wf.save(&wp).unwrap();
    });
    let policy = WaitPolicy {
        poll_interval: Duration::from_millis(5),
        timeout: Some(Duration::from_secs(5)),
        read_retries: 3,
    };
    let c = PipelineController::new();
    let loaded = Frame::load_waiting(&p, &policy, &c).unwrap();
    writer.join().unwrap();
    assert_eq!(loaded, f);
}

use super::*;
use std::path::PathBuf;
use std::sync::Arc;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("deltaframe_wait_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn fast_policy() -> WaitPolicy {
    WaitPolicy {
        poll_interval: Duration::from_millis(5),
        timeout: Some(Duration::from_secs(5)),
        read_retries: 1,
    }
}

#[test]
fn existing_file_returns_immediately() {
    let dir = scratch_dir("exists");
    let p = dir.join("a.txt");
    std::fs::write(&p, "1 2 3 4").unwrap();
    let c = PipelineController::new();
    wait_for_artifact(&p, &fast_policy(), &c).unwrap();
}

#[test]
fn waits_until_file_appears() {
    let dir = scratch_dir("appears");
    let p = dir.join("late.txt");
    let writer_path = p.clone();
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(40));
        std::fs::write(writer_path, "0 0 1 1").unwrap();
    });
    let c = PipelineController::new();
    let list = read_vector_list_waiting(VectorKind::Residual, &p, &fast_policy(), &c).unwrap();
    writer.join().unwrap();
    assert_eq!(list.values(), &[0, 0, 1, 1]);
}

#[test]
fn timeout_is_reported_with_path() {
    let dir = scratch_dir("timeout");
    let p = dir.join("never.txt");
    let policy = WaitPolicy {
        timeout: Some(Duration::from_millis(20)),
        ..fast_policy()
    };
    let c = PipelineController::new();
    let err = wait_for_artifact(&p, &policy, &c).unwrap_err();
    assert!(matches!(err, DeltaError::ArtifactTimeout { .. }));
    assert!(err.is_clean_stop());
}

#[test]
fn kill_interrupts_wait_within_a_poll() {
    let dir = scratch_dir("kill");
    let p = dir.join("never.txt");
    let c = Arc::new(PipelineController::new());
    let killer = {
        let c = Arc::clone(&c);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            c.kill();
        })
    };
    let policy = WaitPolicy {
        timeout: None,
        ..fast_policy()
    };
    let started = Instant::now();
    let err = wait_for_artifact(&p, &policy, &c).unwrap_err();
    killer.join().unwrap();
    assert!(matches!(err, DeltaError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn dead_controller_cancels_even_when_file_exists() {
    let dir = scratch_dir("dead");
    let p = dir.join("a.txt");
    std::fs::write(&p, "").unwrap();
    let c = PipelineController::new();
    c.kill();
    assert!(matches!(
        wait_for_artifact(&p, &fast_policy(), &c),
        Err(DeltaError::Cancelled)
    ));
}

#[test]
fn list_written_in_two_chunks_is_read_whole() {
    use std::io::Write as _;

    let dir = scratch_dir("chunks");
    let p = dir.join("residual_0.txt");
    let writer_path = p.clone();
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        let mut f = std::fs::File::create(&writer_path).unwrap();
        // The first chunk alone is a well-formed one-vector list.
        f.write_all(b"0 0 1 1").unwrap();
        f.flush().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        f.write_all(b" 2 2 3 3\n").unwrap();
    });
    let policy = WaitPolicy {
        poll_interval: Duration::from_millis(50),
        ..fast_policy()
    };
    let c = PipelineController::new();
    let list = read_vector_list_waiting(VectorKind::Residual, &p, &policy, &c).unwrap();
    writer.join().unwrap();
    assert_eq!(list.values(), &[0, 0, 1, 1, 2, 2, 3, 3]);
}

#[test]
fn ragged_list_is_returned_after_retries() {
    let dir = scratch_dir("ragged");
    let p = dir.join("residual_0.txt");
    std::fs::write(&p, "0 0 1").unwrap();
    let policy = WaitPolicy {
        read_retries: 3,
        ..fast_policy()
    };
    let c = PipelineController::new();
    let list = read_vector_list_waiting(VectorKind::Residual, &p, &policy, &c).unwrap();
    assert_eq!(list.values(), &[0, 0, 1]);
    assert!(matches!(
        list.displacements(),
        Err(DeltaError::MalformedVectorList { .. })
    ));
}

#[test]
fn unparseable_list_fails_after_retries() {
    let dir = scratch_dir("garbage");
    let p = dir.join("residual_0.txt");
    std::fs::write(&p, "0 0 x 1").unwrap();
    let c = PipelineController::new();
    let err = read_vector_list_waiting(VectorKind::Residual, &p, &fast_policy(), &c).unwrap_err();
    assert!(matches!(err, DeltaError::Validation(_)));
}

#[test]
fn old_files_are_stable_without_waiting() {
    let dir = scratch_dir("stable");
    let p = dir.join("a.txt");
    std::fs::write(&p, "1 2 3 4").unwrap();
    let an_hour_ago = std::time::SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
        .write(true)
        .open(&p)
        .unwrap()
        .set_modified(an_hour_ago)
        .unwrap();
    let policy = WaitPolicy {
        poll_interval: Duration::from_secs(2),
        ..fast_policy()
    };
    let started = Instant::now();
    wait_until_stable(&p, &policy, &PipelineController::new()).unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

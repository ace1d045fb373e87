use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DeltaError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(DeltaError::stage("x").to_string().contains("stage error:"));
    assert!(
        DeltaError::malformed("residual", 5, 4)
            .to_string()
            .contains("malformed vector list (residual)")
    );
    assert!(
        DeltaError::unreadable(Path::new("a.png"), "bad header")
            .to_string()
            .contains("unreadable image 'a.png'")
    );
    assert!(
        DeltaError::timeout(Path::new("b.txt"))
            .to_string()
            .contains("timed out waiting for artifact 'b.txt'")
    );
}

#[test]
fn clean_stops_are_cancel_and_timeout_only() {
    assert!(DeltaError::Cancelled.is_clean_stop());
    assert!(DeltaError::timeout(Path::new("x")).is_clean_stop());
    assert!(!DeltaError::malformed("fade", 4, 3).is_clean_stop());
    assert!(!DeltaError::unreadable(Path::new("x"), "eof").is_clean_stop());
    assert!(!DeltaError::validation("x").is_clean_stop());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DeltaError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

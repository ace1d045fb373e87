use super::*;

#[test]
fn groups_of_four_in_insertion_order() {
    let v = parse_vectors(VectorKind::Residual, &[1, 2, 3, 4, 0, 0, 5, 6]).unwrap();
    assert_eq!(
        v,
        vec![
            DisplacementVector::new(1, 2, 3, 4),
            DisplacementVector::new(0, 0, 5, 6)
        ]
    );
}

#[test]
fn empty_list_parses_to_no_vectors() {
    assert!(parse_vectors(VectorKind::Predictive, &[]).unwrap().is_empty());
}

#[test]
fn non_multiple_of_four_is_malformed() {
    let err = parse_vectors(VectorKind::Predictive, &[1, 2, 3]).unwrap_err();
    assert!(matches!(
        err,
        DeltaError::MalformedVectorList {
            kind: "predictive",
            len: 3,
            group: 4
        }
    ));
}

#[test]
fn negative_coordinates_are_rejected() {
    assert!(parse_vectors(VectorKind::Correction, &[0, -1, 0, 0]).is_err());
}

#[test]
fn identity_detection() {
    assert!(DisplacementVector::new(3, 4, 3, 4).is_identity());
    assert!(!DisplacementVector::new(3, 4, 4, 3).is_identity());
}

#[test]
fn fade_groups_by_three() {
    assert_eq!(VectorKind::Fade.group_size(), 3);
    for k in [
        VectorKind::Predictive,
        VectorKind::Residual,
        VectorKind::Correction,
    ] {
        assert_eq!(k.group_size(), 4);
    }
}

use super::*;

#[test]
fn parses_newline_and_comma_separated_integers() {
    let l = VectorList::parse(VectorKind::Residual, "0\n16\n0 0,\r\n32,16, 1 0\n").unwrap();
    assert_eq!(l.values(), &[0, 16, 0, 0, 32, 16, 1, 0]);
    assert_eq!(l.displacements().unwrap().len(), 2);
}

#[test]
fn blank_file_is_an_empty_list() {
    let l = VectorList::parse(VectorKind::Predictive, "\n  \n").unwrap();
    assert!(l.is_empty());
    assert_eq!(l.len(), 0);
}

#[test]
fn garbage_token_is_a_validation_error() {
    let err = VectorList::parse(VectorKind::Fade, "1 2 x").unwrap_err();
    assert!(err.to_string().contains("invalid integer 'x' in fade list"));
}

#[test]
fn groups_honor_kind_group_size() {
    let fade = VectorList::new(VectorKind::Fade, vec![0, 0, 5, 1, 1, -5]);
    let groups: Vec<&[i64]> = fade.groups().unwrap().collect();
    assert_eq!(groups, vec![&[0, 0, 5][..], &[1, 1, -5][..]]);

    let ragged = VectorList::new(VectorKind::Fade, vec![0, 0, 5, 1]);
    assert!(matches!(
        ragged.groups(),
        Err(DeltaError::MalformedVectorList { group: 3, .. })
    ));
}

#[test]
fn read_reports_missing_file_with_path() {
    let err = VectorList::read(VectorKind::Residual, Path::new("/nonexistent/residual_0.txt"))
        .unwrap_err();
    assert!(err.to_string().contains("residual_0.txt"));
}

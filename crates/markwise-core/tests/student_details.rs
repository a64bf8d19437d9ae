use markwise_core::models::student_details::{StudentDetail, StudentField, describe, first_missing};

#[test]
fn fields_parse_from_token_or_label() {
    assert_eq!(
        StudentField::parse("class_grade"),
        Some(StudentField::ClassGrade)
    );
    assert_eq!(
        StudentField::parse("Class/Grade"),
        Some(StudentField::ClassGrade)
    );
    assert_eq!(
        StudentField::parse(" registration number "),
        Some(StudentField::RegistrationNumber)
    );
    assert_eq!(StudentField::parse("shoe size"), None);
}

#[test]
fn every_field_round_trips_through_its_token() {
    for field in StudentField::ALL {
        assert_eq!(StudentField::parse(field.as_str()), Some(field));
        assert_eq!(StudentField::parse(field.label()), Some(field));
    }
}

#[test]
fn first_missing_follows_required_order() {
    let required = [StudentField::Name, StudentField::Phone];
    assert_eq!(first_missing(&required, &[]), Some(StudentField::Name));

    let details = vec![StudentDetail::new(StudentField::Name, "Ada")];
    assert_eq!(
        first_missing(&required, &details),
        Some(StudentField::Phone)
    );

    let details = vec![
        StudentDetail::new(StudentField::Name, "Ada"),
        StudentDetail::new(StudentField::Phone, "  "),
    ];
    assert_eq!(
        first_missing(&required, &details),
        Some(StudentField::Phone)
    );
}

#[test]
fn describe_lists_labels_and_values() {
    let details = vec![
        StudentDetail::new(StudentField::Name, "Ada"),
        StudentDetail::new(StudentField::ClassGrade, "5B"),
    ];
    assert_eq!(describe(&details), "Name: Ada, Class/Grade: 5B");
}

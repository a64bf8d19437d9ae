use std::fmt;

use serde::{Deserialize, Serialize};

/// A piece of information a teacher can require before a student answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentField {
    Name,
    Phone,
    RegistrationNumber,
    Email,
    Gender,
    ClassGrade,
}

impl StudentField {
    pub const ALL: [StudentField; 6] = [
        StudentField::Name,
        StudentField::Phone,
        StudentField::RegistrationNumber,
        StudentField::Email,
        StudentField::Gender,
        StudentField::ClassGrade,
    ];

    /// Stable token used in storage and button ids.
    pub fn as_str(self) -> &'static str {
        match self {
            StudentField::Name => "name",
            StudentField::Phone => "phone",
            StudentField::RegistrationNumber => "registration_number",
            StudentField::Email => "email",
            StudentField::Gender => "gender",
            StudentField::ClassGrade => "class_grade",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StudentField::Name => "Name",
            StudentField::Phone => "Phone",
            StudentField::RegistrationNumber => "Registration Number",
            StudentField::Email => "Email",
            StudentField::Gender => "Gender",
            StudentField::ClassGrade => "Class/Grade",
        }
    }

    /// Accepts the token or the label, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.into_iter().find(|field| {
            field.as_str().eq_ignore_ascii_case(input) || field.label().eq_ignore_ascii_case(input)
        })
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One answered field, stored with the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDetail {
    pub field: StudentField,
    pub value: String,
}

impl StudentDetail {
    pub fn new(field: StudentField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// `Name: Ada, Phone: 555` for display.
pub fn describe(details: &[StudentDetail]) -> String {
    details
        .iter()
        .map(|d| format!("{}: {}", d.field.label(), d.value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Name, Class/Grade` for display.
pub fn describe_fields(fields: &[StudentField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The first required field without a non-blank value, if any.
pub fn first_missing(required: &[StudentField], details: &[StudentDetail]) -> Option<StudentField> {
    required.iter().copied().find(|field| {
        !details
            .iter()
            .any(|d| d.field == *field && !d.value.trim().is_empty())
    })
}

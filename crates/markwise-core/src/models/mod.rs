pub mod assignment;
pub mod grade;
pub mod grading_mode;
pub mod quick_grade;
pub mod student_details;
pub mod submission;
pub mod teacher;

// 📸 Snapshots - the persisted form of the records store
//
// A snapshot is an immutable point-in-time copy that an external store can
// serialize. Field order and types of `EnrollmentRecord` are the
// compatibility contract for the ledger part.

use crate::entities::{Course, Person};
use crate::ledger::Enrollment;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// (student, course, date, grades) - one ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub student_id: String,
    pub course_id: String,
    pub enrolled_on: NaiveDate,
    pub grades: Vec<Decimal>,
}

impl From<&Enrollment> for EnrollmentRecord {
    fn from(enrollment: &Enrollment) -> Self {
        EnrollmentRecord {
            student_id: enrollment.student_id().to_string(),
            course_id: enrollment.course_id().to_string(),
            enrolled_on: enrollment.enrolled_on,
            grades: enrollment.grades().to_vec(),
        }
    }
}

/// Whole application state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Unique snapshot ID
    pub snapshot_id: String,

    /// When this snapshot was taken
    pub taken_at: DateTime<Utc>,

    pub students: Vec<Person>,
    pub instructors: Vec<Person>,
    pub courses: Vec<Course>,
    pub enrollments: Vec<EnrollmentRecord>,
}

impl AppState {
    pub fn new(
        students: Vec<Person>,
        instructors: Vec<Person>,
        courses: Vec<Course>,
        enrollments: Vec<EnrollmentRecord>,
    ) -> Self {
        AppState {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            taken_at: Utc::now(),
            students,
            instructors,
            courses,
            enrollments,
        }
    }

    pub fn grade_count(&self) -> usize {
        self.enrollments.iter().map(|e| e.grades.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
            && self.instructors.is_empty()
            && self.courses.is_empty()
            && self.enrollments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_ids_are_unique() {
        let a = AppState::new(vec![], vec![], vec![], vec![]);
        let b = AppState::new(vec![], vec![], vec![], vec![]);

        assert_ne!(a.snapshot_id, b.snapshot_id);
        assert!(a.is_empty());
    }

    #[test]
    fn test_enrollment_record_field_order() {
        let record = EnrollmentRecord {
            student_id: "EST-001".to_string(),
            course_id: "CS100".to_string(),
            enrolled_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            grades: vec![dec!(9.5), dec!(7)],
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"student_id":"EST-001","course_id":"CS100","enrolled_on":"2024-03-01","grades":["9.5","7"]}"#
        );

        let back: EnrollmentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_grade_count() {
        let state = AppState::new(
            vec![],
            vec![],
            vec![],
            vec![
                EnrollmentRecord {
                    student_id: "A".to_string(),
                    course_id: "X".to_string(),
                    enrolled_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    grades: vec![dec!(1), dec!(2)],
                },
                EnrollmentRecord {
                    student_id: "B".to_string(),
                    course_id: "X".to_string(),
                    enrolled_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    grades: vec![dec!(3)],
                },
            ],
        );
        assert_eq!(state.grade_count(), 3);
        assert!(!state.is_empty());
    }
}

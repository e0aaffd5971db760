// 📚 Course Entity
//
// The course code is the identity. The assigned instructor is referenced by
// identity only; the instructor's lifecycle belongs to its own repository.

use crate::error::Result;
use crate::identity::Identified;
use crate::validation::{ensure_valid, FieldRule, FieldValue, Validate, ValidationRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course code, the identity (e.g. "CS100")
    pub code: String,

    /// Display name (e.g. "Programming I")
    pub name: String,

    /// Credit hours, greater than zero
    pub credits: u32,

    /// Identity of the assigned instructor
    pub instructor_id: String,
}

impl Course {
    pub fn new(code: &str, name: &str, credits: u32, instructor_id: &str) -> Result<Self> {
        let course = Course {
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            credits,
            instructor_id: instructor_id.trim().to_string(),
        };

        ensure_valid(&course)?;
        Ok(course)
    }

    /// Same course with a different instructor (meant to be stored with `upsert`)
    pub fn with_instructor(&self, instructor_id: &str) -> Result<Course> {
        Course::new(&self.code, &self.name, self.credits, instructor_id)
    }
}

impl Identified for Course {
    fn identity(&self) -> &str {
        &self.code
    }
}

impl Validate for Course {
    fn context(&self) -> &'static str {
        "Course"
    }

    fn rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::new("code", ValidationRule::NonEmpty),
            FieldRule::new("name", ValidationRule::NonEmpty),
            FieldRule::new("credits", ValidationRule::Positive),
            FieldRule::new("instructor_id", ValidationRule::NonEmpty),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "code" => Some(FieldValue::Text(&self.code)),
            "name" => Some(FieldValue::Text(&self.name)),
            "credits" => Some(FieldValue::Number(Decimal::from(self.credits))),
            "instructor_id" => Some(FieldValue::Text(&self.instructor_id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} ({} cr.) | Instructor: {}",
            self.code, self.name, self.credits, self.instructor_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordsError;

    #[test]
    fn test_course_creation() {
        let course = Course::new(" CS100 ", "Programming I", 4, "PRO-01").unwrap();
        assert_eq!(course.identity(), "CS100");
        assert_eq!(course.to_string(), "CS100 - Programming I (4 cr.) | Instructor: PRO-01");
    }

    #[test]
    fn test_zero_credits_rejected() {
        let err = Course::new("CS100", "Programming I", 0, "PRO-01").unwrap_err();
        assert!(matches!(err, RecordsError::Validation(ref v) if v.len() == 1 && v[0].field == "credits"));
    }

    #[test]
    fn test_with_instructor_keeps_identity() {
        let course = Course::new("CS100", "Programming I", 4, "PRO-01").unwrap();
        let moved = course.with_instructor("PRO-02").unwrap();

        assert_eq!(moved.code, course.code);
        assert_eq!(moved.instructor_id, "PRO-02");
    }
}

// 🧑‍🎓 Person Entity - one shape for every role
//
// Students and instructors share identity, names, birth date, computed age
// and the common validation core. Role-specific data lives in `Role`, and
// behaviour is chosen by matching on the tag.

use crate::error::Result;
use crate::identity::Identified;
use crate::validation::{
    ensure_valid, years_between, FieldRule, FieldValue, Validate, ValidationRule,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const STUDENT_MIN_AGE: u32 = 15;
pub const INSTRUCTOR_MIN_AGE: u32 = 25;

/// Salary bounds for instructors, inclusive
pub fn salary_range() -> (Decimal, Decimal) {
    (Decimal::new(500, 0), Decimal::new(10_000, 0))
}

// ============================================================================
// CONTRACT TYPE
// ============================================================================

/// How an instructor is hired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    /// Permanent, full workload
    FullTime,
    /// Permanent, reduced workload
    PartTime,
    /// Fixed-term contract
    Temporary,
    /// Paid per service, no contract
    Fees,
}

impl ContractType {
    pub const ALL: [ContractType; 4] = [
        ContractType::FullTime,
        ContractType::PartTime,
        ContractType::Temporary,
        ContractType::Fees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::FullTime => "Full Time",
            ContractType::PartTime => "Part Time",
            ContractType::Temporary => "Temporary",
            ContractType::Fees => "Fees",
        }
    }
}

// ============================================================================
// ROLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Role {
    Student {
        /// Degree programme (e.g. "Systems Engineering")
        career: String,
        /// Registrar's number, free-form (e.g. "ABC-12345")
        enrollment_number: String,
    },
    Instructor {
        /// Owning department
        department: String,
        contract: ContractType,
        /// Monthly base salary, within `salary_range()`
        base_salary: Decimal,
    },
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Student { .. } => "Student",
            Role::Instructor { .. } => "Instructor",
        }
    }

    pub fn min_age(&self) -> u32 {
        match self {
            Role::Student { .. } => STUDENT_MIN_AGE,
            Role::Instructor { .. } => INSTRUCTOR_MIN_AGE,
        }
    }
}

// ============================================================================
// PERSON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identity (e.g. "EST-001", "PRO-01"), case-insensitive
    pub id: String,

    /// Given name, trimmed
    pub first_name: String,

    /// Surname, trimmed; secondary sort key in rankings
    pub last_name: String,

    /// Must not be in the future; age is derived from it
    pub birth_date: NaiveDate,

    /// Student or instructor data
    pub role: Role,
}

impl Person {
    /// Build and validate a student. Text fields are trimmed.
    pub fn student(
        id: &str,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
        career: &str,
        enrollment_number: &str,
    ) -> Result<Self> {
        Self::build(
            id,
            first_name,
            last_name,
            birth_date,
            Role::Student {
                career: career.trim().to_string(),
                enrollment_number: enrollment_number.trim().to_string(),
            },
        )
    }

    /// Build and validate an instructor. Text fields are trimmed.
    pub fn instructor(
        id: &str,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
        department: &str,
        contract: ContractType,
        base_salary: Decimal,
    ) -> Result<Self> {
        Self::build(
            id,
            first_name,
            last_name,
            birth_date,
            Role::Instructor {
                department: department.trim().to_string(),
                contract,
                base_salary,
            },
        )
    }

    fn build(
        id: &str,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
        role: Role,
    ) -> Result<Self> {
        let person = Person {
            id: id.trim().to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            birth_date,
            role,
        };

        ensure_valid(&person)?;
        Ok(person)
    }

    pub fn age_on(&self, today: NaiveDate) -> i32 {
        years_between(self.birth_date, today)
    }

    pub fn age(&self) -> i32 {
        self.age_on(Local::now().date_naive())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_student(&self) -> bool {
        matches!(self.role, Role::Student { .. })
    }

    pub fn is_instructor(&self) -> bool {
        matches!(self.role, Role::Instructor { .. })
    }

    /// Career for students, `None` for instructors
    pub fn career(&self) -> Option<&str> {
        match &self.role {
            Role::Student { career, .. } => Some(career.as_str()),
            Role::Instructor { .. } => None,
        }
    }

    /// Department for instructors, `None` for students
    pub fn department(&self) -> Option<&str> {
        match &self.role {
            Role::Instructor { department, .. } => Some(department.as_str()),
            Role::Student { .. } => None,
        }
    }
}

impl Identified for Person {
    fn identity(&self) -> &str {
        &self.id
    }
}

impl Validate for Person {
    fn context(&self) -> &'static str {
        self.role.name()
    }

    fn rules(&self) -> Vec<FieldRule> {
        let mut rules = vec![
            FieldRule::new("id", ValidationRule::NonEmpty),
            FieldRule::new("first_name", ValidationRule::NonEmpty),
            FieldRule::new("last_name", ValidationRule::NonEmpty),
            FieldRule::new("birth_date", ValidationRule::NotInFuture),
            FieldRule::new("birth_date", ValidationRule::MinAge(self.role.min_age())),
        ];

        match self.role {
            Role::Student { .. } => {
                rules.push(FieldRule::new("career", ValidationRule::NonEmpty));
                rules.push(FieldRule::new("enrollment_number", ValidationRule::NonEmpty));
            }
            Role::Instructor { .. } => {
                let (min, max) = salary_range();
                rules.push(FieldRule::new("department", ValidationRule::NonEmpty));
                rules.push(FieldRule::new("base_salary", ValidationRule::Range { min, max }));
            }
        }

        rules
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match (name, &self.role) {
            ("id", _) => Some(FieldValue::Text(&self.id)),
            ("first_name", _) => Some(FieldValue::Text(&self.first_name)),
            ("last_name", _) => Some(FieldValue::Text(&self.last_name)),
            ("birth_date", _) => Some(FieldValue::Date(self.birth_date)),
            ("career", Role::Student { career, .. }) => Some(FieldValue::Text(career)),
            ("enrollment_number", Role::Student { enrollment_number, .. }) => {
                Some(FieldValue::Text(enrollment_number))
            }
            ("department", Role::Instructor { department, .. }) => {
                Some(FieldValue::Text(department))
            }
            ("base_salary", Role::Instructor { base_salary, .. }) => {
                Some(FieldValue::Number(*base_salary))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} | ID: {} | Born: {} | Age: {}",
            self.role.name(),
            self.full_name(),
            self.id,
            self.birth_date.format("%Y-%m-%d"),
            self.age()
        )?;

        match &self.role {
            Role::Student {
                career,
                enrollment_number,
            } => write!(f, " | Career: {} | Enrollment: {}", career, enrollment_number),
            Role::Instructor {
                department,
                contract,
                base_salary,
            } => write!(
                f,
                " | Dept.: {} | Contract: {} | Salary: {:.2}",
                department,
                contract.as_str(),
                base_salary
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordsError;
    use chrono::Datelike;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_student_creation_trims_fields() {
        let s = Person::student(" EST-001 ", " Ana ", "Mora ", date(2000, 3, 1), " Math ", "ABC-12345")
            .unwrap();

        assert_eq!(s.id, "EST-001");
        assert_eq!(s.full_name(), "Ana Mora");
        assert_eq!(s.career(), Some("Math"));
        assert!(s.is_student());
        assert!(s.department().is_none());
    }

    #[test]
    fn test_student_too_young_rejected() {
        let today = Local::now().date_naive();
        let birth = date(today.year() - 10, 1, 1);

        let err = Person::student("EST-002", "Ana", "Mora", birth, "Math", "X-1").unwrap_err();
        match err {
            RecordsError::Validation(violations) => {
                assert!(violations.iter().any(|v| v.field == "birth_date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_instructor_salary_range() {
        let ok = Person::instructor(
            "PRO-01",
            "Luis",
            "Vega",
            date(1980, 5, 5),
            "Physics",
            ContractType::FullTime,
            dec!(500),
        );
        assert!(ok.is_ok());

        let err = Person::instructor(
            "PRO-02",
            "Luis",
            "Vega",
            date(1980, 5, 5),
            "Physics",
            ContractType::PartTime,
            dec!(10000.01),
        )
        .unwrap_err();
        assert!(matches!(err, RecordsError::Validation(ref v) if v[0].field == "base_salary"));
    }

    #[test]
    fn test_missing_names_collects_all_violations() {
        let err = Person::student("", "", "", date(2000, 1, 1), "", "").unwrap_err();
        match err {
            RecordsError::Validation(violations) => assert_eq!(violations.len(), 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_age_on() {
        let s = Person::student("E", "A", "B", date(2000, 6, 15), "C", "D").unwrap();
        assert_eq!(s.age_on(date(2020, 6, 14)), 19);
        assert_eq!(s.age_on(date(2020, 6, 15)), 20);
    }

    #[test]
    fn test_role_serializes_with_tag() {
        let s = Person::student("E", "A", "B", date(2000, 6, 15), "C", "D").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["role"]["role"], "Student");

        let back: Person = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}

// 📏 Validation Layer - statically declared field rules
//
// Each entity type declares a table of (field, rule) pairs and exposes its
// field values by name. `Validate::validate_on` walks the table and collects
// every violation instead of stopping at the first one.

use crate::error::{RecordsError, Result};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationRule {
    /// Text must contain something other than whitespace
    NonEmpty,
    /// Number strictly greater than zero
    Positive,
    /// Number within the closed range [min, max]
    Range { min: Decimal, max: Decimal },
    /// Date must not be after the reference date
    NotInFuture,
    /// Date (a birth date) must be at least this many years before the reference date
    MinAge(u32),
}

/// One row of an entity's rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: ValidationRule,
}

impl FieldRule {
    pub fn new(field: &'static str, rule: ValidationRule) -> Self {
        FieldRule { field, rule }
    }
}

/// A field value as seen by the rule checker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Decimal),
    Date(NaiveDate),
}

// ============================================================================
// VIOLATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl Violation {
    fn new(context: &str, field: &str, message: impl Into<String>) -> Self {
        Violation {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

/// Whole years elapsed between `birth` and `today`.
pub fn years_between(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

impl ValidationRule {
    /// Check one value; `None` means the rule holds.
    pub fn check(&self, value: FieldValue<'_>, today: NaiveDate) -> Option<String> {
        match (self, value) {
            (ValidationRule::NonEmpty, FieldValue::Text(text)) => {
                text.trim().is_empty().then(|| "Required field is empty".to_string())
            }
            (ValidationRule::Positive, FieldValue::Number(n)) => {
                (n <= Decimal::ZERO).then(|| format!("Must be greater than 0, got {}", n))
            }
            (ValidationRule::Range { min, max }, FieldValue::Number(n)) => (n < *min || n > *max)
                .then(|| format!("Value {} outside the range ({} - {})", n, min, max)),
            (ValidationRule::NotInFuture, FieldValue::Date(date)) => {
                (date > today).then(|| format!("Date {} is in the future", date))
            }
            (ValidationRule::MinAge(min), FieldValue::Date(birth)) => {
                let age = years_between(birth, today);
                (age < *min as i32)
                    .then(|| format!("Minimum age is {} years, current age is {}", min, age))
            }
            (rule, other) => Some(format!("Rule {:?} cannot check value {:?}", rule, other)),
        }
    }
}

// ============================================================================
// VALIDATE TRAIT
// ============================================================================

pub trait Validate {
    /// Label used in violation messages (e.g. "Student")
    fn context(&self) -> &'static str;

    /// The statically declared rule table for this value
    fn rules(&self) -> Vec<FieldRule>;

    /// Field lookup by name; the rule table only names fields this returns
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    fn validate_on(&self, today: NaiveDate) -> Vec<Violation> {
        let context = self.context();
        self.rules()
            .iter()
            .filter_map(|rule| match self.field(rule.field) {
                Some(value) => rule
                    .rule
                    .check(value, today)
                    .map(|message| Violation::new(context, rule.field, message)),
                None => Some(Violation::new(context, rule.field, "Field is not declared")),
            })
            .collect()
    }

    fn validate(&self) -> Vec<Violation> {
        self.validate_on(Local::now().date_naive())
    }
}

/// `Ok` for a clean value, otherwise every violation at once.
pub fn ensure_valid<T: Validate + ?Sized>(value: &T) -> Result<()> {
    let violations = value.validate();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RecordsError::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Sample {
        name: String,
        score: Decimal,
        born: NaiveDate,
    }

    impl Validate for Sample {
        fn context(&self) -> &'static str {
            "Sample"
        }

        fn rules(&self) -> Vec<FieldRule> {
            vec![
                FieldRule::new("name", ValidationRule::NonEmpty),
                FieldRule::new("score", ValidationRule::Range { min: dec!(0), max: dec!(100) }),
                FieldRule::new("born", ValidationRule::MinAge(18)),
            ]
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "name" => Some(FieldValue::Text(&self.name)),
                "score" => Some(FieldValue::Number(self.score)),
                "born" => Some(FieldValue::Date(self.born)),
                _ => None,
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_years_between_respects_birthday() {
        assert_eq!(years_between(date(2000, 6, 15), date(2020, 6, 14)), 19);
        assert_eq!(years_between(date(2000, 6, 15), date(2020, 6, 15)), 20);
    }

    #[test]
    fn test_valid_sample_has_no_violations() {
        let sample = Sample {
            name: "ok".to_string(),
            score: dec!(100),
            born: date(1990, 1, 1),
        };
        assert!(sample.validate_on(date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_collects_every_violation() {
        let sample = Sample {
            name: "  ".to_string(),
            score: dec!(100.01),
            born: date(2010, 1, 1),
        };

        let violations = sample.validate_on(date(2024, 1, 1));
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "score", "born"]);
        assert_eq!(violations[0].to_string(), "[Sample] name: Required field is empty");
    }

    #[test]
    fn test_rule_type_mismatch_is_reported() {
        let message = ValidationRule::Positive.check(FieldValue::Text("x"), date(2024, 1, 1));
        assert!(message.is_some());
    }
}

// 📒 Enrollment Ledger - student × course pairs and their grades
//
// The ledger is the only owner of enrollment records. Students and courses are
// referenced by identity only; their current values always come from their
// repositories, so an upsert there is seen by every enrollment at once.
//
// Rounding is half-away-from-zero at 2 decimals, applied when a grade is
// stored and again when an average is computed.

use crate::entities::{Course, Person};
use crate::error::{RecordsError, Result};
use crate::identity::{identity_key, is_blank, same_identity};
use chrono::{Local, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Average at or above this passes (7.00).
pub const PASSING_GRADE: Decimal = Decimal::from_parts(7, 0, 0, false, 0);
pub const MIN_GRADE: Decimal = Decimal::ZERO;
pub const MAX_GRADE: Decimal = Decimal::TEN;

/// Round to 2 decimal places, midpoints away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounded arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some(round2(sum / Decimal::from(values.len())))
}

// ============================================================================
// ENROLLMENT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    /// No grades recorded yet
    InProgress,
    /// Average >= 7.00
    Passed,
    /// Average < 7.00
    Failed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::InProgress => "InProgress",
            EnrollmentStatus::Passed => "Passed",
            EnrollmentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENROLLMENT
// ============================================================================

/// One student in one course, with grades in recording order.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    student_id: String,
    course_id: String,
    pub enrolled_on: NaiveDate,
    grades: Vec<Decimal>,
}

impl Enrollment {
    fn new(student_id: String, course_id: String, enrolled_on: NaiveDate) -> Self {
        Enrollment {
            student_id,
            course_id,
            enrolled_on,
            grades: Vec::new(),
        }
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn grades(&self) -> &[Decimal] {
        &self.grades
    }

    /// Mean of the grades; exactly 0 when nothing has been graded yet.
    pub fn average(&self) -> Decimal {
        self.graded_average().unwrap_or(Decimal::ZERO)
    }

    /// Mean of the grades, `None` while the grade list is empty.
    pub fn graded_average(&self) -> Option<Decimal> {
        mean(&self.grades)
    }

    pub fn status(&self) -> EnrollmentStatus {
        match self.graded_average() {
            None => EnrollmentStatus::InProgress,
            Some(avg) if avg >= PASSING_GRADE => EnrollmentStatus::Passed,
            Some(_) => EnrollmentStatus::Failed,
        }
    }

    pub fn has_passed(&self) -> bool {
        self.status() == EnrollmentStatus::Passed
    }

    fn matches(&self, student_id: &str, course_id: &str) -> bool {
        same_identity(self.student_id(), student_id) && same_identity(self.course_id(), course_id)
    }
}

impl std::fmt::Display for Enrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | Enrolled: {} | Average: {:.2} | Status: {}",
            self.student_id,
            self.course_id,
            self.enrolled_on.format("%Y-%m-%d"),
            self.average(),
            self.status()
        )
    }
}

fn check_grade(value: Decimal) -> Result<()> {
    if value < MIN_GRADE || value > MAX_GRADE {
        return Err(RecordsError::OutOfRange {
            value,
            min: MIN_GRADE,
            max: MAX_GRADE,
        });
    }
    Ok(())
}

/// One enrollment to replay during a restore.
#[derive(Debug, Clone)]
pub(crate) struct ReplayEntry {
    pub student: Person,
    pub course: Course,
    pub enrolled_on: NaiveDate,
    pub grades: Vec<Decimal>,
}

// ============================================================================
// ENROLLMENT LEDGER
// ============================================================================

pub struct EnrollmentLedger {
    enrollments: RwLock<Vec<Enrollment>>,
}

impl EnrollmentLedger {
    pub fn new() -> Self {
        EnrollmentLedger {
            enrollments: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Enrollment>> {
        self.enrollments.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Enrollment>> {
        self.enrollments.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enroll a student in a course, dated today.
    pub fn enroll(&self, student: &Person, course: &Course) -> Result<Enrollment> {
        self.enroll_on(student, course, Local::now().date_naive())
    }

    /// Enroll with an explicit enrollment date.
    pub fn enroll_on(
        &self,
        student: &Person,
        course: &Course,
        enrolled_on: NaiveDate,
    ) -> Result<Enrollment> {
        if !student.is_student() {
            return Err(RecordsError::RoleMismatch {
                identity: student.id.clone(),
                expected: "student",
            });
        }

        let mut enrollments = self.write();
        if enrollments.iter().any(|e| e.matches(&student.id, &course.code)) {
            tracing::warn!("Duplicate enrollment rejected: {} in {}", student.id, course.code);
            return Err(RecordsError::AlreadyEnrolled {
                student_id: student.id.clone(),
                course_id: course.code.clone(),
            });
        }

        let enrollment = Enrollment::new(student.id.clone(), course.code.clone(), enrolled_on);
        enrollments.push(enrollment.clone());
        tracing::info!("Enrolled {} in {}", student.id, course.code);

        Ok(enrollment)
    }

    /// Append a grade to an existing enrollment. Returns the stored (rounded) value.
    pub fn add_grade(&self, student_id: &str, course_id: &str, value: Decimal) -> Result<Decimal> {
        check_grade(value)?;

        let mut enrollments = self.write();
        let enrollment = enrollments
            .iter_mut()
            .find(|e| e.matches(student_id, course_id))
            .ok_or_else(|| RecordsError::EnrollmentNotFound {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
            })?;

        let stored = round2(value);
        enrollment.grades.push(stored);
        tracing::debug!("Grade {} recorded for {} in {}", stored, student_id, course_id);

        Ok(stored)
    }

    pub fn average_of(enrollment: &Enrollment) -> Decimal {
        enrollment.average()
    }

    pub fn status_of(enrollment: &Enrollment) -> EnrollmentStatus {
        enrollment.status()
    }

    pub fn find(&self, student_id: &str, course_id: &str) -> Option<Enrollment> {
        self.read()
            .iter()
            .find(|e| e.matches(student_id, course_id))
            .cloned()
    }

    /// Every enrollment of one student, in registration order.
    pub fn enrollments_of(&self, student_id: &str) -> Vec<Enrollment> {
        if is_blank(student_id) {
            return Vec::new();
        }

        self.read()
            .iter()
            .filter(|e| same_identity(e.student_id(), student_id))
            .cloned()
            .collect()
    }

    /// Identities of the distinct students enrolled in one course.
    pub fn students_of(&self, course_id: &str) -> Vec<String> {
        if is_blank(course_id) {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        self.read()
            .iter()
            .filter(|e| same_identity(e.course_id(), course_id))
            .filter(|e| seen.insert(identity_key(e.student_id())))
            .map(|e| e.student_id.clone())
            .collect()
    }

    /// Drop every enrollment of a student. Returns how many were dropped.
    pub fn remove_student(&self, student_id: &str) -> usize {
        let mut enrollments = self.write();
        let before = enrollments.len();
        enrollments.retain(|e| !same_identity(e.student_id(), student_id));
        let removed = before - enrollments.len();
        if removed > 0 {
            tracing::info!("Dropped {} enrollments of {}", removed, student_id);
        }
        removed
    }

    /// Point-in-time copy of every enrollment.
    pub fn snapshot(&self) -> Vec<Enrollment> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Replay a batch of enrollments and grades as one step.
    ///
    /// Everything is checked before the first record is stored, so a
    /// rejected batch leaves the ledger as it was.
    pub(crate) fn replay(&self, entries: Vec<ReplayEntry>) -> Result<usize> {
        let mut enrollments = self.write();

        let mut keys: HashSet<(String, String)> = enrollments
            .iter()
            .map(|e| (identity_key(e.student_id()), identity_key(e.course_id())))
            .collect();

        for entry in &entries {
            if !entry.student.is_student() {
                return Err(RecordsError::RoleMismatch {
                    identity: entry.student.id.clone(),
                    expected: "student",
                });
            }
            let key = (identity_key(&entry.student.id), identity_key(&entry.course.code));
            if !keys.insert(key) {
                return Err(RecordsError::AlreadyEnrolled {
                    student_id: entry.student.id.clone(),
                    course_id: entry.course.code.clone(),
                });
            }
            for grade in &entry.grades {
                check_grade(*grade)?;
            }
        }

        let count = entries.len();
        for entry in entries {
            let mut enrollment =
                Enrollment::new(entry.student.id, entry.course.code, entry.enrolled_on);
            enrollment.grades = entry.grades.into_iter().map(round2).collect();
            enrollments.push(enrollment);
        }

        Ok(count)
    }
}

impl Default for EnrollmentLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn student(id: &str, last_name: &str) -> Person {
        Person::student(
            id,
            "Test",
            last_name,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            "Systems",
            "ABC-10000",
        )
        .unwrap()
    }

    fn course(code: &str) -> Course {
        Course::new(code, &format!("Course {}", code), 4, "PRO-01").unwrap()
    }

    #[test]
    fn test_round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(8.235)), dec!(8.24));
        assert_eq!(round2(dec!(8.225)), dec!(8.23));
        assert_eq!(round2(dec!(7.975)), dec!(7.98));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_enroll_creates_empty_enrollment() {
        let ledger = EnrollmentLedger::new();
        let e = ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();

        assert!(e.grades().is_empty());
        assert_eq!(e.enrolled_on, Local::now().date_naive());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_duplicate_enrollment_rejected_case_insensitive() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();

        let err = ledger
            .enroll(&student("s1", "Mora"), &course("c1"))
            .unwrap_err();
        assert!(matches!(err, RecordsError::AlreadyEnrolled { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_instructor_cannot_enroll() {
        let ledger = EnrollmentLedger::new();
        let instructor = Person::instructor(
            "PRO-01",
            "Luis",
            "Vega",
            NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            "Physics",
            crate::entities::ContractType::FullTime,
            dec!(1000),
        )
        .unwrap();

        let err = ledger.enroll(&instructor, &course("C1")).unwrap_err();
        assert!(matches!(err, RecordsError::RoleMismatch { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_grade_bounds() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();

        assert!(ledger.add_grade("S1", "C1", dec!(0)).is_ok());
        assert!(ledger.add_grade("S1", "C1", dec!(10)).is_ok());

        for bad in [dec!(-0.01), dec!(10.01), dec!(11)] {
            let err = ledger.add_grade("S1", "C1", bad).unwrap_err();
            assert!(matches!(err, RecordsError::OutOfRange { .. }));
        }

        assert_eq!(ledger.find("S1", "C1").unwrap().grades(), &[dec!(0), dec!(10)]);
    }

    #[test]
    fn test_out_of_range_checked_before_lookup() {
        let ledger = EnrollmentLedger::new();
        let err = ledger.add_grade("nobody", "nothing", dec!(12)).unwrap_err();
        assert!(matches!(err, RecordsError::OutOfRange { .. }));
    }

    #[test]
    fn test_grade_without_enrollment() {
        let ledger = EnrollmentLedger::new();
        let err = ledger.add_grade("S1", "C1", dec!(5)).unwrap_err();
        assert!(matches!(err, RecordsError::EnrollmentNotFound { .. }));
    }

    #[test]
    fn test_grade_is_stored_rounded() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();

        let stored = ledger.add_grade("s1", "c1", dec!(8.555)).unwrap();
        assert_eq!(stored, dec!(8.56));
    }

    #[test]
    fn test_average_and_status() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();

        let empty = ledger.find("S1", "C1").unwrap();
        assert_eq!(EnrollmentLedger::average_of(&empty), Decimal::ZERO);
        assert!(empty.graded_average().is_none());
        assert_eq!(EnrollmentLedger::status_of(&empty), EnrollmentStatus::InProgress);

        for g in [dec!(9.0), dec!(8.5), dec!(7.2)] {
            ledger.add_grade("S1", "C1", g).unwrap();
        }
        let graded = ledger.find("S1", "C1").unwrap();
        assert_eq!(graded.average(), dec!(8.23));
        assert_eq!(graded.status(), EnrollmentStatus::Passed);
    }

    #[test]
    fn test_passing_boundary() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();
        ledger.enroll(&student("S1", "Mora"), &course("C2")).unwrap();

        ledger.add_grade("S1", "C1", dec!(7.00)).unwrap();
        ledger.add_grade("S1", "C2", dec!(6.99)).unwrap();

        assert_eq!(ledger.find("S1", "C1").unwrap().status(), EnrollmentStatus::Passed);
        assert_eq!(ledger.find("S1", "C2").unwrap().status(), EnrollmentStatus::Failed);
    }

    #[test]
    fn test_lookups_by_axis() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();
        ledger.enroll(&student("S1", "Mora"), &course("C2")).unwrap();
        ledger.enroll(&student("S2", "Vega"), &course("C1")).unwrap();

        assert_eq!(ledger.enrollments_of("s1").len(), 2);
        assert!(ledger.enrollments_of("").is_empty());
        assert!(ledger.enrollments_of("S9").is_empty());

        assert_eq!(ledger.students_of("C1"), vec!["S1", "S2"]);
        assert!(ledger.students_of(" ").is_empty());
    }

    #[test]
    fn test_remove_student_drops_only_their_enrollments() {
        let ledger = EnrollmentLedger::new();
        ledger.enroll(&student("S1", "Mora"), &course("C1")).unwrap();
        ledger.enroll(&student("S1", "Mora"), &course("C2")).unwrap();
        ledger.enroll(&student("S2", "Vega"), &course("C1")).unwrap();

        assert_eq!(ledger.remove_student("s1"), 2);
        assert_eq!(ledger.remove_student("S1"), 0);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.snapshot()[0].student_id(), "S2");
    }

    #[test]
    fn test_display_uses_identities() {
        let ledger = EnrollmentLedger::new();
        let e = ledger
            .enroll_on(
                &student("S1", "Mora"),
                &course("C1"),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            )
            .unwrap();
        assert_eq!(
            e.to_string(),
            "S1 | C1 | Enrolled: 2024-03-01 | Average: 0.00 | Status: InProgress"
        );
    }

    #[test]
    fn test_replay_is_all_or_nothing() {
        let ledger = EnrollmentLedger::new();
        let entry = |s: &str, c: &str, grades: Vec<Decimal>| ReplayEntry {
            student: student(s, "Mora"),
            course: course(c),
            enrolled_on: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            grades,
        };

        let err = ledger
            .replay(vec![entry("S1", "C1", vec![dec!(9)]), entry("S1", "C1", vec![])])
            .unwrap_err();
        assert!(matches!(err, RecordsError::AlreadyEnrolled { .. }));
        assert!(ledger.is_empty());

        let err = ledger
            .replay(vec![entry("S1", "C1", vec![dec!(9)]), entry("S2", "C1", vec![dec!(10.5)])])
            .unwrap_err();
        assert!(matches!(err, RecordsError::OutOfRange { .. }));
        assert!(ledger.is_empty());

        let count = ledger
            .replay(vec![entry("S1", "C1", vec![dec!(9), dec!(8)])])
            .unwrap();
        assert_eq!(count, 1);
        let e = ledger.find("S1", "C1").unwrap();
        assert_eq!(e.enrolled_on, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(e.average(), dec!(8.5));
    }
}

// 🏫 Records Context - the application's single owner of state
//
// Constructed once and passed to whoever needs it. Holds one repository per
// entity kind plus the enrollment ledger, and converts to and from the
// persisted `AppState`.

use crate::analytics::AnalyticsEngine;
use crate::entities::{Course, Person};
use crate::error::{RecordsError, Result};
use crate::identity::same_identity;
use crate::ledger::{Enrollment, EnrollmentLedger, ReplayEntry};
use crate::repository::Repository;
use crate::snapshot::{AppState, EnrollmentRecord};
use crate::validation::ensure_valid;
use rust_decimal::Decimal;

pub struct RecordsContext {
    pub students: Repository<Person>,
    pub instructors: Repository<Person>,
    pub courses: Repository<Course>,
    pub ledger: EnrollmentLedger,
}

impl RecordsContext {
    pub fn new() -> Self {
        RecordsContext {
            students: Repository::new(),
            instructors: Repository::new(),
            courses: Repository::new(),
            ledger: EnrollmentLedger::new(),
        }
    }

    fn admit_student(student: &Person) -> Result<()> {
        if !student.is_student() {
            return Err(RecordsError::RoleMismatch {
                identity: student.id.clone(),
                expected: "student",
            });
        }
        ensure_valid(student)
    }

    fn admit_instructor(instructor: &Person) -> Result<()> {
        if !instructor.is_instructor() {
            return Err(RecordsError::RoleMismatch {
                identity: instructor.id.clone(),
                expected: "instructor",
            });
        }
        ensure_valid(instructor)
    }

    /// Add a student. The value is re-validated, so deserialized or
    /// hand-edited people go through the same rules as constructed ones.
    pub fn add_student(&self, student: Person) -> Result<()> {
        Self::admit_student(&student)?;
        self.students.add(student)
    }

    pub fn add_instructor(&self, instructor: Person) -> Result<()> {
        Self::admit_instructor(&instructor)?;
        self.instructors.add(instructor)
    }

    /// Add a course; its instructor must already be registered.
    pub fn add_course(&self, course: Course) -> Result<()> {
        ensure_valid(&course)?;
        self.require_instructor(&course.instructor_id)?;
        self.courses.add(course)
    }

    /// Replace a registered student in place. Enrollments follow the new
    /// values. Returns the previous value.
    pub fn update_student(&self, student: Person) -> Result<Person> {
        Self::admit_student(&student)?;
        self.require_student(&student.id)?;
        let previous = self.students.upsert(student.clone())?;
        tracing::info!("Student {} updated", student.id);
        previous.ok_or(RecordsError::MissingReference {
            kind: "student",
            identity: student.id,
        })
    }

    /// Replace a registered instructor in place. Returns the previous value.
    pub fn update_instructor(&self, instructor: Person) -> Result<Person> {
        Self::admit_instructor(&instructor)?;
        self.require_instructor(&instructor.id)?;
        let previous = self.instructors.upsert(instructor.clone())?;
        tracing::info!("Instructor {} updated", instructor.id);
        previous.ok_or(RecordsError::MissingReference {
            kind: "instructor",
            identity: instructor.id,
        })
    }

    /// Remove a student together with their enrollments. Returns the number
    /// of enrollments dropped.
    pub fn remove_student(&self, student_id: &str) -> Result<usize> {
        let student = self.require_student(student_id)?;
        let dropped = self.ledger.remove_student(&student.id);
        self.students.remove(&student.id);
        tracing::info!("Student {} removed ({} enrollments dropped)", student.id, dropped);
        Ok(dropped)
    }

    /// Remove an instructor. Rejected while any course is assigned to them.
    pub fn remove_instructor(&self, instructor_id: &str) -> Result<()> {
        let instructor = self.require_instructor(instructor_id)?;
        let assigned = self.courses_of(&instructor.id).len();
        if assigned > 0 {
            return Err(RecordsError::StillReferenced {
                kind: "instructor",
                identity: instructor.id,
                count: assigned,
            });
        }
        self.instructors.remove(&instructor.id);
        tracing::info!("Instructor {} removed", instructor.id);
        Ok(())
    }

    /// Courses currently assigned to an instructor.
    pub fn courses_of(&self, instructor_id: &str) -> Vec<Course> {
        self.courses
            .find(|c| same_identity(&c.instructor_id, instructor_id))
            .collect()
    }

    /// Registered students enrolled in a course.
    pub fn students_of(&self, course_id: &str) -> Vec<Person> {
        self.ledger
            .students_of(course_id)
            .iter()
            .filter_map(|id| self.students.find_by_id(id))
            .collect()
    }

    /// Point a course at another instructor, replacing it in place.
    pub fn assign_instructor(&self, course_code: &str, instructor_id: &str) -> Result<Course> {
        let instructor = self.require_instructor(instructor_id)?;
        let course = self.require_course(course_code)?;

        let updated = course.with_instructor(&instructor.id)?;
        self.courses.upsert(updated.clone())?;
        tracing::info!("Course {} assigned to {}", updated.code, updated.instructor_id);
        Ok(updated)
    }

    fn require_student(&self, student_id: &str) -> Result<Person> {
        self.students
            .find_by_id(student_id)
            .ok_or_else(|| RecordsError::MissingReference {
                kind: "student",
                identity: student_id.to_string(),
            })
    }

    fn require_instructor(&self, instructor_id: &str) -> Result<Person> {
        self.instructors
            .find_by_id(instructor_id)
            .ok_or_else(|| RecordsError::MissingReference {
                kind: "instructor",
                identity: instructor_id.to_string(),
            })
    }

    fn require_course(&self, course_id: &str) -> Result<Course> {
        self.courses
            .find_by_id(course_id)
            .ok_or_else(|| RecordsError::MissingReference {
                kind: "course",
                identity: course_id.to_string(),
            })
    }

    /// Enroll by identities, resolving both sides through the repositories.
    pub fn enroll(&self, student_id: &str, course_id: &str) -> Result<Enrollment> {
        let student = self.require_student(student_id)?;
        let course = self.require_course(course_id)?;
        self.ledger.enroll(&student, &course)
    }

    pub fn add_grade(&self, student_id: &str, course_id: &str, value: Decimal) -> Result<Decimal> {
        self.ledger.add_grade(student_id, course_id, value)
    }

    pub fn analytics(&self) -> AnalyticsEngine<'_> {
        AnalyticsEngine::new(&self.ledger, &self.students, &self.courses)
    }

    // ========================================================================
    // SNAPSHOT EXPORT / RESTORE
    // ========================================================================

    /// Ledger contents as ordered (student, course, date, grades) records.
    pub fn export_ledger(&self) -> Vec<EnrollmentRecord> {
        self.ledger
            .snapshot()
            .iter()
            .map(EnrollmentRecord::from)
            .collect()
    }

    /// Replay exported records into the ledger.
    ///
    /// Students and courses must already be in their repositories. Nothing
    /// is stored unless every record resolves and replays cleanly.
    pub fn restore_ledger(&self, records: &[EnrollmentRecord]) -> Result<usize> {
        let entries = records
            .iter()
            .map(|record| -> Result<ReplayEntry> {
                Ok(ReplayEntry {
                    student: self.require_student(&record.student_id)?,
                    course: self.require_course(&record.course_id)?,
                    enrolled_on: record.enrolled_on,
                    grades: record.grades.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let count = self.ledger.replay(entries)?;
        tracing::info!("Restored {} enrollments", count);
        Ok(count)
    }

    pub fn export_state(&self) -> AppState {
        AppState::new(
            self.students.get_all(),
            self.instructors.get_all(),
            self.courses.get_all(),
            self.export_ledger(),
        )
    }

    /// Build a fresh context from a saved state.
    ///
    /// Every entity is validated as it is admitted, so a tampered or
    /// hand-edited snapshot is rejected rather than loaded.
    pub fn from_state(state: &AppState) -> Result<Self> {
        let ctx = RecordsContext::new();

        for instructor in &state.instructors {
            ctx.add_instructor(instructor.clone())?;
        }
        for student in &state.students {
            ctx.add_student(student.clone())?;
        }
        for course in &state.courses {
            ctx.add_course(course.clone())?;
        }
        ctx.restore_ledger(&state.enrollments)?;

        tracing::info!(
            "Loaded snapshot {}: {} students, {} instructors, {} courses, {} enrollments",
            state.snapshot_id,
            ctx.students.count(),
            ctx.instructors.count(),
            ctx.courses.count(),
            ctx.ledger.len()
        );
        Ok(ctx)
    }
}

impl Default for RecordsContext {
    fn default() -> Self {
        Self::new()
    }
}

// 🌱 Sample data generator
//
// Fills a context with a reproducible data set: 5 instructors, 10 courses,
// 15 students and 30 unique enrollments with 3-4 grades each. The same seed
// always yields the same data.

use crate::context::RecordsContext;
use crate::entities::{ContractType, Course, Person};
use crate::error::{RecordsError, Result};
use crate::identity::identity_key;
use crate::ledger::round2;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 2025;

const INSTRUCTORS: usize = 5;
const COURSES: usize = 10;
const STUDENTS: usize = 15;
const ENROLLMENTS: usize = 30;

const FIRST_NAMES: [&str; 18] = [
    "Ana", "Luis", "María", "Carlos", "Laura", "Jorge", "Sofía", "Pedro", "Elena", "Marco",
    "Paula", "Iván", "Lucía", "Hugo", "Noelia", "Daniel", "Verónica", "Tomás",
];
const LAST_NAMES: [&str; 13] = [
    "Mora", "Vega", "Cruz", "Ibarra", "Suárez", "García", "López", "Ramírez", "Paredes", "Núñez",
    "Rojas", "Castro", "Silva",
];
const CAREERS: [&str; 6] = [
    "Systems Engineering",
    "Industrial Engineering",
    "Mathematics",
    "Business Administration",
    "Accounting",
    "Architecture",
];
const DEPARTMENTS: [&str; 6] = [
    "Computing",
    "Mathematics",
    "Humanities",
    "Physics",
    "Economics",
    "Management",
];
const COURSE_NAMES: [&str; 12] = [
    "Programming I",
    "Programming II",
    "Data Structures",
    "Databases",
    "Networks",
    "Calculus I",
    "Calculus II",
    "Linear Algebra",
    "Statistics",
    "Accounting I",
    "Finance",
    "Physics I",
];

/// What `generate` inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub instructors: usize,
    pub courses: usize,
    pub students: usize,
    pub enrollments: usize,
    pub grades: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instructors: {} | Courses: {} | Students: {} | Enrollments: {} | Grades: {}",
            self.instructors, self.courses, self.students, self.enrollments, self.grades
        )
    }
}

fn random_date(rng: &mut StdRng, min_year: i32, max_year: i32) -> NaiveDate {
    let year = rng.random_range(min_year..=max_year);
    let month = rng.random_range(1..=12);
    // day 28 exists in every month
    let day = rng.random_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn random_letters(rng: &mut StdRng, n: usize) -> String {
    (0..n)
        .map(|_| char::from(b'A' + rng.random_range(0..26u8)))
        .collect()
}

fn course_code(i: usize) -> String {
    let prefix = match i % 3 {
        0 => "CS",
        1 => "MA",
        _ => "AD",
    };
    format!("{}{}", prefix, 100 + i)
}

/// Insert and count; duplicates from a repeated run are skipped.
fn insert_counted(result: Result<()>, counter: &mut usize) -> Result<()> {
    match result {
        Ok(()) => {
            *counter += 1;
            Ok(())
        }
        Err(RecordsError::DuplicateIdentity { identity }) => {
            tracing::debug!("Seed skipped existing {}", identity);
            Ok(())
        }
        Err(other) => Err(other),
    }
}

/// Populate `ctx` with the sample data set for `seed`.
pub fn generate(ctx: &RecordsContext, seed: u64) -> Result<SeedSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut summary = SeedSummary::default();

    // 1) Instructors
    for i in 0..INSTRUCTORS {
        let salary = Decimal::from(rng.random_range(500..=10_000u32));
        let instructor = Person::instructor(
            &format!("PRO-{:02}", i + 1),
            FIRST_NAMES[i % FIRST_NAMES.len()],
            LAST_NAMES[(i + 2) % LAST_NAMES.len()],
            random_date(&mut rng, 1968, 1990),
            DEPARTMENTS[i % DEPARTMENTS.len()],
            ContractType::ALL[i % ContractType::ALL.len()],
            salary,
        )?;
        insert_counted(ctx.add_instructor(instructor), &mut summary.instructors)?;
    }

    // 2) Courses, instructors assigned round-robin
    let instructors = ctx.instructors.get_all();
    for i in 0..COURSES {
        let instructor = &instructors[i % instructors.len()];
        let course = Course::new(
            &course_code(i),
            COURSE_NAMES[i % COURSE_NAMES.len()],
            3 + (i % 3) as u32,
            &instructor.id,
        )?;
        insert_counted(ctx.add_course(course), &mut summary.courses)?;
    }

    // 3) Students
    for i in 0..STUDENTS {
        let enrollment_number = format!(
            "{}-{}",
            random_letters(&mut rng, 3),
            rng.random_range(10_000..100_000u32)
        );
        let student = Person::student(
            &format!("EST-{:03}", i + 1),
            FIRST_NAMES[(i * 3) % FIRST_NAMES.len()],
            LAST_NAMES[(i * 5 + 1) % LAST_NAMES.len()],
            random_date(&mut rng, 1997, 2007),
            CAREERS[(i * 2) % CAREERS.len()],
            &enrollment_number,
        )?;
        insert_counted(ctx.add_student(student), &mut summary.students)?;
    }

    // 4) Unique student/course pairs, each graded 3-4 times
    let students = ctx.students.get_all();
    let courses = ctx.courses.get_all();
    let mut used: HashSet<(String, String)> = ctx
        .ledger
        .snapshot()
        .iter()
        .map(|e| (identity_key(e.student_id()), identity_key(e.course_id())))
        .collect();
    let capacity = students.len() * courses.len();

    while summary.enrollments < ENROLLMENTS && used.len() < capacity {
        let student = &students[rng.random_range(0..students.len())];
        let course = &courses[rng.random_range(0..courses.len())];
        if !used.insert((identity_key(&student.id), identity_key(&course.code))) {
            continue;
        }

        ctx.ledger.enroll(student, course)?;
        summary.enrollments += 1;

        let grade_count = 3 + rng.random_range(0..2);
        for _ in 0..grade_count {
            // 0..=1000 hundredths -> 0.00..=10.00
            let grade = round2(Decimal::new(rng.random_range(0..=1000i64), 2));
            ctx.ledger.add_grade(&student.id, &course.code, grade)?;
            summary.grades += 1;
        }
    }

    tracing::info!("Seeded sample data: {}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_counts() {
        let ctx = RecordsContext::new();
        let summary = generate(&ctx, DEFAULT_SEED).unwrap();

        assert_eq!(summary.instructors, 5);
        assert_eq!(summary.courses, 10);
        assert_eq!(summary.students, 15);
        assert_eq!(summary.enrollments, 30);
        assert!(summary.grades >= 90 && summary.grades <= 120);
        assert_eq!(ctx.ledger.len(), 30);

        for enrollment in ctx.ledger.snapshot() {
            let n = enrollment.grades().len();
            assert!(n == 3 || n == 4);
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = RecordsContext::new();
        let b = RecordsContext::new();
        generate(&a, 7).unwrap();
        generate(&b, 7).unwrap();

        assert_eq!(a.export_ledger(), b.export_ledger());
        assert_eq!(a.students.get_all(), b.students.get_all());
    }

    #[test]
    fn test_second_run_skips_existing_people() {
        let ctx = RecordsContext::new();
        generate(&ctx, DEFAULT_SEED).unwrap();
        let again = generate(&ctx, DEFAULT_SEED).unwrap();

        assert_eq!(again.students, 0);
        assert_eq!(again.instructors, 0);
        assert_eq!(again.courses, 0);
        assert_eq!(again.enrollments, 30);
        assert_eq!(ctx.ledger.len(), 60);
    }
}

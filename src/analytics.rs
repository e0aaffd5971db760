// 📊 Analytics Engine - read-only queries over the enrollment ledger
//
// Every query takes one snapshot of the ledger and of both repositories up
// front and works on those copies, so concurrent writers never produce a
// half-updated aggregate. Enrollments carry identities only; students and
// courses are resolved against the repositories at query time.
//
// Standing of a student = average-of-averages: the mean of the student's
// per-enrollment averages (ungraded enrollments count as 0), rounded.

use crate::entities::{Course, Person};
use crate::identity::{identity_key, Identified};
use crate::ledger::{mean, Enrollment, EnrollmentLedger, EnrollmentStatus, PASSING_GRADE};
use crate::repository::Repository;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Default cut-off for `at_risk`
pub const DEFAULT_RISK_THRESHOLD: Decimal = PASSING_GRADE;

/// Group label used by `stats_by_career` for people without a career
pub const NO_CAREER: &str = "(No career)";

// ============================================================================
// RESULT ROWS
// ============================================================================

/// One student's standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    /// Current repository value of the student
    pub student: Person,

    /// Mean of the per-enrollment averages, rounded to 2 places
    pub average: Decimal,

    /// Enrollments the average was taken over
    pub enrollments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePopularity {
    pub course: Course,

    /// Distinct students enrolled
    pub students: usize,
}

/// Aggregate over one group of students (e.g. one career).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    /// Group label produced by the key function
    pub key: String,

    /// Distinct students in the group
    pub students: usize,

    /// Mean of the students' standings, rounded to 2 places
    pub average: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub course: Course,
    pub grades: Vec<Decimal>,
    pub average: Decimal,
    pub status: EnrollmentStatus,
}

/// Per-student transcript: one line per enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub student: Person,
    pub lines: Vec<ReportLine>,
    pub average: Decimal,
}

impl std::fmt::Display for StudentReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Report for {} (ID: {})",
            self.student.full_name(),
            self.student.id
        )?;
        writeln!(f, "{}", "-".repeat(60))?;
        for line in &self.lines {
            writeln!(
                f,
                "{} - {} | Average: {:.2} | Status: {}",
                line.course.code, line.course.name, line.average, line.status
            )?;
        }
        write!(f, "Overall: {:.2}", self.average)
    }
}

// ============================================================================
// RESOLUTION + GROUPING HELPERS
// ============================================================================

/// An enrollment joined with the current student and course values.
struct Resolved {
    student: Person,
    course: Course,
    enrollment: Enrollment,
}

fn index_by_identity<T: Identified + Clone>(repository: &Repository<T>) -> HashMap<String, T> {
    repository
        .get_all()
        .into_iter()
        .map(|item| (identity_key(item.identity()), item))
        .collect()
}

/// Group resolved rows by student, keeping first-appearance order.
fn student_averages(rows: &[Resolved]) -> Vec<StudentAverage> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Person, Vec<Decimal>)> = Vec::new();

    for row in rows {
        let key = identity_key(row.enrollment.student_id());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((row.student.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row.enrollment.average());
    }

    groups
        .into_iter()
        .map(|(student, averages)| StudentAverage {
            average: mean(&averages).unwrap_or(Decimal::ZERO),
            enrollments: averages.len(),
            student,
        })
        .collect()
}

fn distinct_students(rows: &[Resolved]) -> Vec<Person> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(identity_key(r.enrollment.student_id())))
        .map(|r| r.student.clone())
        .collect()
}

fn distinct_courses(rows: &[Resolved]) -> Vec<Course> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(identity_key(r.enrollment.course_id())))
        .map(|r| r.course.clone())
        .collect()
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

// ============================================================================
// ANALYTICS ENGINE
// ============================================================================

pub struct AnalyticsEngine<'a> {
    ledger: &'a EnrollmentLedger,
    students: &'a Repository<Person>,
    courses: &'a Repository<Course>,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(
        ledger: &'a EnrollmentLedger,
        students: &'a Repository<Person>,
        courses: &'a Repository<Course>,
    ) -> Self {
        AnalyticsEngine {
            ledger,
            students,
            courses,
        }
    }

    /// Ledger snapshot joined with the repositories. Enrollments whose
    /// student or course is no longer registered are left out.
    fn resolved(&self) -> Vec<Resolved> {
        let students = index_by_identity(self.students);
        let courses = index_by_identity(self.courses);

        self.ledger
            .snapshot()
            .into_iter()
            .filter_map(|enrollment| {
                let student = students.get(&identity_key(enrollment.student_id()));
                let course = courses.get(&identity_key(enrollment.course_id()));
                match (student, course) {
                    (Some(student), Some(course)) => Some(Resolved {
                        student: student.clone(),
                        course: course.clone(),
                        enrollment,
                    }),
                    _ => {
                        tracing::debug!(
                            "Skipping unresolved enrollment {} in {}",
                            enrollment.student_id(),
                            enrollment.course_id()
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Every student's average-of-averages, in first-enrollment order.
    pub fn student_standings(&self) -> Vec<StudentAverage> {
        student_averages(&self.resolved())
    }

    /// Best `n` students by average-of-averages; ties by surname.
    pub fn top_students(&self, n: usize) -> Vec<StudentAverage> {
        let mut standings = self.student_standings();
        standings.sort_by(|a, b| {
            b.average
                .cmp(&a.average)
                .then_with(|| a.student.last_name.cmp(&b.student.last_name))
                .then_with(|| identity_key(&a.student.id).cmp(&identity_key(&b.student.id)))
        });
        standings.truncate(n);
        standings
    }

    /// Students whose average-of-averages is strictly below `threshold`.
    pub fn at_risk(&self, threshold: Decimal) -> Vec<StudentAverage> {
        self.student_standings()
            .into_iter()
            .filter(|s| s.average < threshold)
            .collect()
    }

    /// Distinct students per course, most popular first; ties by course name.
    pub fn popular_courses(&self) -> Vec<CoursePopularity> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(Course, HashSet<String>)> = Vec::new();
        for row in self.resolved() {
            let slot = *index
                .entry(identity_key(row.enrollment.course_id()))
                .or_insert_with(|| {
                    groups.push((row.course.clone(), HashSet::new()));
                    groups.len() - 1
                });
            groups[slot]
                .1
                .insert(identity_key(row.enrollment.student_id()));
        }

        let mut popularity: Vec<CoursePopularity> = groups
            .into_iter()
            .map(|(course, students)| CoursePopularity {
                course,
                students: students.len(),
            })
            .collect();

        popularity.sort_by(|a, b| {
            b.students
                .cmp(&a.students)
                .then_with(|| a.course.name.cmp(&b.course.name))
        });
        popularity
    }

    /// Mean of all students' averages; exactly 0 with no enrollments.
    pub fn overall_average(&self) -> Decimal {
        let averages: Vec<Decimal> = self
            .student_standings()
            .into_iter()
            .map(|s| s.average)
            .collect();
        mean(&averages).unwrap_or(Decimal::ZERO)
    }

    /// Count and mean standing per group; best group first, ties by key.
    pub fn stats_by_group<F>(&self, key_fn: F) -> Vec<GroupStats>
    where
        F: Fn(&Person) -> String,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<Decimal>)> = Vec::new();

        for standing in self.student_standings() {
            let key = key_fn(&standing.student);
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(standing.average);
        }

        let mut stats: Vec<GroupStats> = groups
            .into_iter()
            .map(|(key, averages)| GroupStats {
                students: averages.len(),
                average: mean(&averages).unwrap_or(Decimal::ZERO),
                key,
            })
            .collect();

        stats.sort_by(|a, b| b.average.cmp(&a.average).then_with(|| a.key.cmp(&b.key)));
        stats
    }

    pub fn stats_by_career(&self) -> Vec<GroupStats> {
        self.stats_by_group(|p| p.career().unwrap_or(NO_CAREER).to_string())
    }

    /// Enrolled students (distinct) matching `predicate`.
    pub fn search_students<P>(&self, predicate: P) -> impl Iterator<Item = Person>
    where
        P: FnMut(&Person) -> bool,
    {
        distinct_students(&self.resolved()).into_iter().filter(predicate)
    }

    /// Courses with at least one enrollment (distinct) matching `predicate`.
    pub fn search_courses<P>(&self, predicate: P) -> impl Iterator<Item = Course>
    where
        P: FnMut(&Course) -> bool,
    {
        distinct_courses(&self.resolved()).into_iter().filter(predicate)
    }

    /// Enrolled students ordered by a caller key; equal keys keep enrollment order.
    pub fn sort_students<K, F>(&self, key_fn: F, descending: bool) -> Vec<Person>
    where
        K: Ord,
        F: Fn(&Person) -> K,
    {
        let mut students = distinct_students(&self.resolved());
        students.sort_by(|a, b| directed(key_fn(a).cmp(&key_fn(b)), descending));
        students
    }

    /// Enrolled courses ordered by a caller key; equal keys keep enrollment order.
    pub fn sort_courses<K, F>(&self, key_fn: F, descending: bool) -> Vec<Course>
    where
        K: Ord,
        F: Fn(&Course) -> K,
    {
        let mut courses = distinct_courses(&self.resolved());
        courses.sort_by(|a, b| directed(key_fn(a).cmp(&key_fn(b)), descending));
        courses
    }

    /// Transcript for one student, `None` when the student is unknown or
    /// has no enrollments.
    pub fn student_report(&self, student_id: &str) -> Option<StudentReport> {
        let student = self.students.find_by_id(student_id)?;
        let courses = index_by_identity(self.courses);

        let lines: Vec<ReportLine> = self
            .ledger
            .enrollments_of(student_id)
            .iter()
            .filter_map(|e| {
                courses
                    .get(&identity_key(e.course_id()))
                    .map(|course| ReportLine {
                        course: course.clone(),
                        grades: e.grades().to_vec(),
                        average: e.average(),
                        status: e.status(),
                    })
            })
            .collect();
        if lines.is_empty() {
            return None;
        }

        let averages: Vec<Decimal> = lines.iter().map(|l| l.average).collect();
        Some(StudentReport {
            student,
            average: mean(&averages).unwrap_or(Decimal::ZERO),
            lines,
        })
    }
}

use academic_records::config::{RecordsConfig, StorageKind};
use academic_records::logging::init_logger;
use academic_records::{
    seed, ContractType, Course, JsonFileStore, Person, RecordsContext, Role, SnapshotStore,
    SqliteStore,
};
use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "academic-records")]
#[command(about = "In-memory academic records: people, courses, enrollments and grade analytics")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot file (overrides the config)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Snapshot backend: json or sqlite (overrides the config)
    #[arg(long)]
    storage: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the sample data set
    Seed {
        #[arg(long)]
        seed: Option<u64>,
    },
    AddStudent {
        id: String,
        first_name: String,
        last_name: String,
        /// YYYY-MM-DD
        birth_date: NaiveDate,
        career: String,
        enrollment_number: String,
    },
    AddInstructor {
        id: String,
        first_name: String,
        last_name: String,
        /// YYYY-MM-DD
        birth_date: NaiveDate,
        department: String,
        #[arg(value_enum)]
        contract: Contract,
        salary: Decimal,
    },
    /// Change a student; omitted fields keep their current value
    UpdateStudent {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        career: Option<String>,
        #[arg(long)]
        enrollment_number: Option<String>,
    },
    /// Change an instructor; omitted fields keep their current value
    UpdateInstructor {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long, value_enum)]
        contract: Option<Contract>,
        #[arg(long)]
        salary: Option<Decimal>,
    },
    /// Remove a student and their enrollments
    RemoveStudent { id: String },
    /// Remove an instructor with no assigned courses
    RemoveInstructor { id: String },
    /// Show one student, instructor or course by ID
    Show { id: String },
    /// Find people whose name contains the text
    Search { text: String },
    AddCourse {
        code: String,
        name: String,
        credits: u32,
        instructor: String,
    },
    /// Assign a course to another instructor
    Assign { course: String, instructor: String },
    Enroll { student: String, course: String },
    Grade {
        student: String,
        course: String,
        value: Decimal,
    },
    Report {
        #[command(subcommand)]
        kind: ReportKind,
    },
    List {
        #[arg(value_enum)]
        what: ListKind,
    },
}

#[derive(Debug, Subcommand)]
enum ReportKind {
    Top { n: Option<usize> },
    AtRisk { threshold: Option<Decimal> },
    Popular,
    Overall,
    Careers,
    Student { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListKind {
    Students,
    Instructors,
    Courses,
    Enrollments,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Contract {
    FullTime,
    PartTime,
    Temporary,
    Fees,
}

impl From<Contract> for ContractType {
    fn from(contract: Contract) -> Self {
        match contract {
            Contract::FullTime => ContractType::FullTime,
            Contract::PartTime => ContractType::PartTime,
            Contract::Temporary => ContractType::Temporary,
            Contract::Fees => ContractType::Fees,
        }
    }
}

fn open_store(config: &RecordsConfig) -> Result<Box<dyn SnapshotStore>> {
    let store: Box<dyn SnapshotStore> = match config.storage {
        StorageKind::Json => Box::new(JsonFileStore::new(&config.data_file)),
        StorageKind::Sqlite => Box::new(
            SqliteStore::open(&config.data_file)
                .with_context(|| format!("opening {}", config.data_file.display()))?
                .with_history(config.sqlite_history),
        ),
    };
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RecordsConfig::load(cli.config.as_deref())?;
    if let Some(data_file) = cli.data_file.clone() {
        config.data_file = data_file;
    }
    if let Some(storage) = cli.storage.as_deref() {
        config.storage = storage.parse()?;
    }
    config.validate()?;

    init_logger(cli.verbose);
    tracing::debug!("Config: {:?}", config);

    let store = open_store(&config)?;
    let ctx = match store.load()? {
        Some(state) => RecordsContext::from_state(&state).context("restoring saved snapshot")?,
        None => RecordsContext::new(),
    };

    if run(&ctx, &config, cli.command)? {
        store.save(&ctx.export_state())?;
    }

    Ok(())
}

/// Execute one command; returns whether state changed.
fn run(ctx: &RecordsContext, config: &RecordsConfig, command: Command) -> Result<bool> {
    match command {
        Command::Seed { seed } => {
            let summary = seed::generate(ctx, seed.unwrap_or(config.seed))?;
            println!("✓ {}", summary);
            Ok(true)
        }
        Command::AddStudent {
            id,
            first_name,
            last_name,
            birth_date,
            career,
            enrollment_number,
        } => {
            let student = Person::student(
                &id,
                &first_name,
                &last_name,
                birth_date,
                &career,
                &enrollment_number,
            )?;
            ctx.add_student(student.clone())?;
            println!("✓ {}", student);
            Ok(true)
        }
        Command::AddInstructor {
            id,
            first_name,
            last_name,
            birth_date,
            department,
            contract,
            salary,
        } => {
            let instructor = Person::instructor(
                &id,
                &first_name,
                &last_name,
                birth_date,
                &department,
                contract.into(),
                salary,
            )?;
            ctx.add_instructor(instructor.clone())?;
            println!("✓ {}", instructor);
            Ok(true)
        }
        Command::UpdateStudent {
            id,
            first_name,
            last_name,
            birth_date,
            career,
            enrollment_number,
        } => {
            let current = ctx
                .students
                .find_by_id(&id)
                .with_context(|| format!("no student with ID {}", id))?;
            let Role::Student {
                career: current_career,
                enrollment_number: current_number,
            } = &current.role
            else {
                bail!("{} is not a student", current.id);
            };

            let updated = Person::student(
                &current.id,
                first_name.as_deref().unwrap_or(current.first_name.as_str()),
                last_name.as_deref().unwrap_or(current.last_name.as_str()),
                birth_date.unwrap_or(current.birth_date),
                career.as_deref().unwrap_or(current_career.as_str()),
                enrollment_number
                    .as_deref()
                    .unwrap_or(current_number.as_str()),
            )?;
            ctx.update_student(updated.clone())?;
            println!("✓ {}", updated);
            Ok(true)
        }
        Command::UpdateInstructor {
            id,
            first_name,
            last_name,
            birth_date,
            department,
            contract,
            salary,
        } => {
            let current = ctx
                .instructors
                .find_by_id(&id)
                .with_context(|| format!("no instructor with ID {}", id))?;
            let Role::Instructor {
                department: current_department,
                contract: current_contract,
                base_salary,
            } = &current.role
            else {
                bail!("{} is not an instructor", current.id);
            };

            let updated = Person::instructor(
                &current.id,
                first_name.as_deref().unwrap_or(current.first_name.as_str()),
                last_name.as_deref().unwrap_or(current.last_name.as_str()),
                birth_date.unwrap_or(current.birth_date),
                department
                    .as_deref()
                    .unwrap_or(current_department.as_str()),
                contract.map(ContractType::from).unwrap_or(*current_contract),
                salary.unwrap_or(*base_salary),
            )?;
            ctx.update_instructor(updated.clone())?;
            println!("✓ {}", updated);
            Ok(true)
        }
        Command::RemoveStudent { id } => {
            let dropped = ctx.remove_student(&id)?;
            println!("✓ Student {} removed ({} enrollments dropped)", id, dropped);
            Ok(true)
        }
        Command::RemoveInstructor { id } => {
            ctx.remove_instructor(&id)?;
            println!("✓ Instructor {} removed", id);
            Ok(true)
        }
        Command::Show { id } => {
            show(ctx, &id);
            Ok(false)
        }
        Command::Search { text } => {
            let needle = text.to_lowercase();
            let matches = |p: &Person| p.full_name().to_lowercase().contains(&needle);
            let found: Vec<Person> = ctx
                .students
                .find(matches)
                .chain(ctx.instructors.find(matches))
                .collect();
            if found.is_empty() {
                println!("No one matches '{}'.", text);
            }
            found.iter().for_each(|p| println!("{}", p));
            Ok(false)
        }
        Command::AddCourse {
            code,
            name,
            credits,
            instructor,
        } => {
            let course = Course::new(&code, &name, credits, &instructor)?;
            ctx.add_course(course.clone())?;
            println!("✓ {}", course);
            Ok(true)
        }
        Command::Assign { course, instructor } => {
            let course = ctx.assign_instructor(&course, &instructor)?;
            println!("✓ {}", course);
            Ok(true)
        }
        Command::Enroll { student, course } => {
            let enrollment = ctx.enroll(&student, &course)?;
            println!("✓ {}", enrollment);
            Ok(true)
        }
        Command::Grade {
            student,
            course,
            value,
        } => {
            let stored = ctx.add_grade(&student, &course, value)?;
            println!("✓ Grade {:.2} recorded for {} in {}", stored, student, course);
            Ok(true)
        }
        Command::Report { kind } => {
            print_report(ctx, config, kind)?;
            Ok(false)
        }
        Command::List { what } => {
            print_list(ctx, what);
            Ok(false)
        }
    }
}

fn print_report(ctx: &RecordsContext, config: &RecordsConfig, kind: ReportKind) -> Result<()> {
    let analytics = ctx.analytics();

    match kind {
        ReportKind::Top { n } => {
            println!("🏆 Top students");
            for (rank, row) in analytics
                .top_students(n.unwrap_or(config.top_n))
                .iter()
                .enumerate()
            {
                println!(
                    "{:>3}. {:<28} {:<12} {:>6.2}",
                    rank + 1,
                    row.student.full_name(),
                    row.student.id,
                    row.average
                );
            }
        }
        ReportKind::AtRisk { threshold } => {
            let threshold = match threshold {
                Some(t) => t,
                None => config.risk_threshold()?,
            };
            println!("⚠️  Students below {:.2}", threshold);
            for row in analytics.at_risk(threshold) {
                println!(
                    "  {:<28} {:<12} {:>6.2}",
                    row.student.full_name(),
                    row.student.id,
                    row.average
                );
            }
        }
        ReportKind::Popular => {
            println!("📈 Courses by distinct students");
            for row in analytics.popular_courses() {
                println!(
                    "  {:<8} {:<24} {:>4}",
                    row.course.code, row.course.name, row.students
                );
            }
        }
        ReportKind::Overall => {
            println!("📊 Overall average: {:.2}", analytics.overall_average());
        }
        ReportKind::Careers => {
            println!("🎓 Statistics by career");
            for row in analytics.stats_by_career() {
                println!("  {:<28} {:>4} {:>6.2}", row.key, row.students, row.average);
            }
        }
        ReportKind::Student { id } => match analytics.student_report(&id) {
            Some(report) => println!("{}", report),
            None => println!("No enrollments for student {}.", id),
        },
    }

    Ok(())
}

fn show(ctx: &RecordsContext, id: &str) {
    if let Some(student) = ctx.students.find_by_id(id) {
        println!("{}", student);
        match ctx.analytics().student_report(id) {
            Some(report) => println!("{}", report),
            None => println!("No enrollments."),
        }
    } else if let Some(instructor) = ctx.instructors.find_by_id(id) {
        println!("{}", instructor);
        for course in ctx.courses_of(id) {
            println!("  {}", course);
        }
    } else if let Some(course) = ctx.courses.find_by_id(id) {
        println!("{}", course);
        for student in ctx.students_of(id) {
            println!("  {}", student);
        }
    } else {
        println!("No student, instructor or course with ID {}.", id);
    }
}

fn print_list(ctx: &RecordsContext, what: ListKind) {
    match what {
        ListKind::Students => ctx.students.get_all().iter().for_each(|p| println!("{}", p)),
        ListKind::Instructors => ctx
            .instructors
            .get_all()
            .iter()
            .for_each(|p| println!("{}", p)),
        ListKind::Courses => ctx.courses.get_all().iter().for_each(|c| println!("{}", c)),
        ListKind::Enrollments => ctx
            .ledger
            .snapshot()
            .iter()
            .for_each(|e| println!("{}", e)),
    }
}

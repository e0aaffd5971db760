// Academic Records - Core Library
// Exposes all modules for use in the CLI and tests

pub mod analytics;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod repository;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use analytics::{
    AnalyticsEngine, CoursePopularity, GroupStats, ReportLine, StudentAverage, StudentReport,
    DEFAULT_RISK_THRESHOLD,
};
pub use config::{RecordsConfig, StorageKind};
pub use context::RecordsContext;
pub use entities::{ContractType, Course, Person, Role};
pub use error::{RecordsError, Result};
pub use identity::Identified;
pub use ledger::{Enrollment, EnrollmentLedger, EnrollmentStatus, PASSING_GRADE};
pub use repository::Repository;
pub use seed::SeedSummary;
pub use snapshot::{AppState, EnrollmentRecord};
pub use store::{JsonFileStore, SnapshotStore, SqliteStore};
pub use validation::{FieldRule, Validate, ValidationRule, Violation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Entity Models
//
// Each entity has:
// - A stable identity (person id, course code) compared case-insensitively
// - Values that are validated against a static rule table on construction

pub mod course;
pub mod person;

pub use course::Course;
pub use person::{ContractType, Person, Role};

//! Assigns students to timetabled course sections, placing each student at
//! times they prefer wherever seat capacity allows.

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod server;
pub mod solver;

pub use data::{AssignmentInput, AssignmentOutput, TimeSlot};
pub use error::{ConfigurationError, EnrollmentError, ScheduleError};
pub use solver::build_assignment;

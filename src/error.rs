use thiserror::Error;

use crate::data::TimeSlot;

/// Failures of the enrollment primitives. Inside the engine any of these
/// means the engine itself went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error("section {course} {time_slot} is full ({capacity} seats)")]
    CapacityExceeded {
        course: String,
        time_slot: TimeSlot,
        capacity: u32,
    },
    #[error("{student} is already enrolled in {course} {time_slot}")]
    DuplicateEnrollment {
        student: String,
        course: String,
        time_slot: TimeSlot,
    },
    #[error("{student} already holds a section of {course}")]
    CourseAlreadyHeld { student: String, course: String },
    #[error("{student} holds no section of {course} to change out of")]
    NotCurrentlyHeld { student: String, course: String },
}

/// Bad input. The run is aborted before any assignment is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no courses configured")]
    NoCourses,
    #[error("course {0} is configured more than once")]
    DuplicateCourse(String),
    #[error("course {0} has no time slots")]
    ZeroTimeSlots(String),
    #[error("course {0} has no offerings per section")]
    ZeroOfferings(String),
    #[error("course {course} has {count} time slots (at most {max})")]
    TooManyTimeSlots { course: String, count: u32, max: u32 },
    #[error("course {course} has {count} offerings per section (at most {max})")]
    TooManyOfferings { course: String, count: u32, max: u32 },
    #[error("student {0} appears more than once in the roster")]
    DuplicateStudent(String),
    #[error("course {course} has {seats} seats for {required} students")]
    CapacityShortfall {
        course: String,
        seats: u64,
        required: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] EnrollmentError),
}

impl ScheduleError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

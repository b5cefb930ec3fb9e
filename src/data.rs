use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::{EngineOptions, default_courses};

/// Identifier of a time slot. Slots are numbered from 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct TimeSlot(u32);

impl TimeSlot {
    /// Returns `None` for 0, which is never a valid slot id.
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// All slots `1..=count`, ascending.
    pub fn all(count: u32) -> impl Iterator<Item = TimeSlot> {
        (1..=count).map(TimeSlot)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A course offered once per time slot.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSpec {
    pub name: String,
    pub time_slot_count: u32,
    pub capacity_per_offering: u32,
    pub offerings_per_section: u32,
}

/// A student record as it arrives from the tabular source.
///
/// Preferences are kept raw: numbers and numeric strings are accepted,
/// everything else is dropped when the roster is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSpec {
    pub name: String,
    #[serde(default)]
    pub preferences: Vec<Value>,
}

/// The complete input for one assignment run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    #[serde(default = "default_courses")]
    pub courses: Vec<CourseSpec>,
    pub students: Vec<StudentSpec>,
    #[serde(default)]
    pub options: EngineOptions,
}

/// One held section, seen from the student's side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub course: String,
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub name: String,
    /// In course configuration order.
    pub placements: Vec<Placement>,
    /// The working preference list, after any repair.
    pub preferences: Vec<TimeSlot>,
    pub unhappy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    pub unhappy: bool,
}

/// A labelled sub-group of a section, e.g. `3A`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingRoster {
    pub label: String,
    pub members: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRoster {
    pub course: String,
    pub time_slot: TimeSlot,
    pub capacity: u32,
    pub members: Vec<RosterEntry>,
    pub offerings: Vec<OfferingRoster>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WarningKind {
    #[serde(rename_all = "camelCase")]
    TooFewPreferences { supplied: usize, required: usize },
    #[serde(rename_all = "camelCase")]
    OutOfRange { slots: Vec<u32>, time_slot_count: u32 },
}

/// A student whose preferences had to be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub student: String,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::TooFewPreferences { supplied, required } => write!(
                f,
                "{} failed to provide enough selections ({} of {})",
                self.student, supplied, required
            ),
            WarningKind::OutOfRange {
                slots,
                time_slot_count,
            } => write!(
                f,
                "{} provided out of range selections {:?} (valid: 1-{})",
                self.student, slots, time_slot_count
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub greedy_placements: usize,
    pub repair_attempts: usize,
    pub repairs: usize,
    pub fallback_placements: usize,
    pub unhappy_students: usize,
}

/// The final output of the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutput {
    pub processing_order: Vec<TimeSlot>,
    pub students: Vec<StudentAssignment>,
    pub sections: Vec<SectionRoster>,
    pub warnings: Vec<ValidationWarning>,
    pub stats: AssignmentStats,
}

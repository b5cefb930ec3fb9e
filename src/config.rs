//! Server settings and engine options.

use serde::{Deserialize, Serialize};
use std::env;

use crate::data::CourseSpec;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: usize = 100;

/// Upper bound on `timeSlotCount` for any course.
pub const MAX_TIME_SLOTS: u32 = 256;
/// Upper bound on `offeringsPerSection`; offerings are labelled A to Z.
pub const MAX_OFFERINGS_PER_SECTION: u32 = 26;

const DEFAULT_TIME_SLOTS: u32 = 6;
const DEFAULT_CAPACITY_PER_OFFERING: u32 = 7;
const DEFAULT_OFFERINGS_PER_SECTION: u32 = 2;
const DEFAULT_COURSE_NAMES: [&str; 2] = ["Foundary", "Machining"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
}

impl ServerConfig {
    /// Reads `SCHEDULER_ADDR`, falling back to [`DEFAULT_ADDR`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let addr = lookup("SCHEDULER_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        Self { addr }
    }
}

/// How ties in slot demand are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotOrdering {
    /// Ascending `(demand, slot id)`.
    #[default]
    Stable,
    /// Only the first slot reaching each demand value is ranked; the
    /// remaining slots are appended in ascending id order.
    FirstOccurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    pub slot_ordering: SlotOrdering,
    pub max_repair_attempts: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            slot_ordering: SlotOrdering::default(),
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
        }
    }
}

/// Course configuration used when a request does not name any courses.
pub fn default_courses() -> Vec<CourseSpec> {
    DEFAULT_COURSE_NAMES
        .iter()
        .map(|name| CourseSpec {
            name: name.to_string(),
            time_slot_count: DEFAULT_TIME_SLOTS,
            capacity_per_offering: DEFAULT_CAPACITY_PER_OFFERING,
            offerings_per_section: DEFAULT_OFFERINGS_PER_SECTION,
        })
        .collect()
}

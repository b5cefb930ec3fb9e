//! The assignment engine.
//!
//! A run orders the time slots by scarcity, fills sections greedily in that
//! order, repairs what it can by moving already-placed students, and forces
//! whoever is left into the remaining seats.

pub mod fallback;
pub mod greedy;
pub mod ordering;
pub mod strain;

use itertools::Itertools;
use log::info;
use std::time::Instant;

use crate::config::EngineOptions;
use crate::data::{
    AssignmentInput, AssignmentOutput, AssignmentStats, OfferingRoster, Placement, RosterEntry,
    SectionRoster, StudentAssignment, TimeSlot,
};
use crate::error::ScheduleError;
use crate::model::{Roster, Schedule, SectionId, StudentId, validate_courses};

/// Runs the engine over one roster and course configuration.
pub fn build_assignment(input: &AssignmentInput) -> Result<AssignmentOutput, ScheduleError> {
    let start_time = Instant::now();
    validate_courses(&input.courses, input.students.len())?;

    let time_slot_count = Schedule::time_slot_count_of(&input.courses);
    let roster = Roster::from_specs(&input.students, time_slot_count, input.courses.len())?;
    let warnings = roster.warnings().to_vec();
    info!(
        "Assigning {} students to {} courses over {} time slots...",
        roster.len(),
        input.courses.len(),
        time_slot_count
    );

    let mut schedule = Schedule::new(&input.courses, roster)?;
    let (processing_order, stats) = run(&mut schedule, &input.options)?;
    info!(
        "Assignment finished in {:.2?}: {} unhappy students",
        start_time.elapsed(),
        stats.unhappy_students
    );

    Ok(AssignmentOutput {
        processing_order,
        students: student_assignments(&schedule),
        sections: section_rosters(&schedule),
        warnings,
        stats,
    })
}

/// Runs every stage over an already built schedule.
pub fn run(
    schedule: &mut Schedule,
    options: &EngineOptions,
) -> Result<(Vec<TimeSlot>, AssignmentStats), ScheduleError> {
    let order = ordering::processing_order(schedule, options.slot_ordering);
    info!("Processing order: {}", order.iter().join(", "));

    let greedy_placements = greedy::assign(schedule, &order)?;
    info!(
        "Greedy pass placed {} students, {} placements missing",
        greedy_placements,
        schedule.missing_placements()
    );

    let strain = strain::reduce_strain(schedule, options.max_repair_attempts)?;
    info!(
        "Made {} repairs in {} attempts, {} placements missing",
        strain.repairs,
        strain.attempts,
        schedule.missing_placements()
    );

    let fallback_placements = fallback::assign_remaining(schedule)?;
    if fallback_placements > 0 {
        info!("Forced {} placements into remaining seats", fallback_placements);
    }

    let unhappy_students = schedule
        .student_ids()
        .filter(|&id| is_unhappy(schedule, id))
        .count();

    Ok((
        order,
        AssignmentStats {
            greedy_placements,
            repair_attempts: strain.attempts,
            repairs: strain.repairs,
            fallback_placements,
            unhappy_students,
        },
    ))
}

/// Unhappy when any held section is outside what the student asked for.
pub fn is_unhappy(schedule: &Schedule, student: StudentId) -> bool {
    let record = schedule.student(student);
    record
        .assigned_sections()
        .iter()
        .any(|&id| record.is_unhappy_with(schedule.section(id).time_slot()))
}

fn student_assignments(schedule: &Schedule) -> Vec<StudentAssignment> {
    schedule
        .student_ids()
        .map(|id| {
            let student = schedule.student(id);
            let placements = schedule
                .course_ids()
                .filter_map(|course| {
                    schedule.held_section(id, course).map(|section| Placement {
                        course: schedule.course(course).name().to_string(),
                        time_slot: schedule.section(section).time_slot(),
                    })
                })
                .collect();
            StudentAssignment {
                name: student.name().to_string(),
                placements,
                preferences: student.preferences().to_vec(),
                unhappy: is_unhappy(schedule, id),
            }
        })
        .collect()
}

fn roster_entry(schedule: &Schedule, section: SectionId, student: StudentId) -> RosterEntry {
    let record = schedule.student(student);
    RosterEntry {
        name: record.name().to_string(),
        unhappy: record.is_unhappy_with(schedule.section(section).time_slot()),
    }
}

fn section_rosters(schedule: &Schedule) -> Vec<SectionRoster> {
    schedule
        .section_ids()
        .map(|id| {
            let section = schedule.section(id);
            let members: Vec<RosterEntry> = section
                .members()
                .iter()
                .map(|&student| roster_entry(schedule, id, student))
                .collect();
            let per_offering = (section.capacity() / section.offerings()).max(1) as usize;
            // at most 26 offerings, checked by validate_courses
            let offerings = (b'A'..=b'Z')
                .take(section.offerings() as usize)
                .enumerate()
                .map(|(index, letter)| OfferingRoster {
                    label: format!("{}{}", section.time_slot(), char::from(letter)),
                    members: members
                        .iter()
                        .skip(index * per_offering)
                        .take(per_offering)
                        .cloned()
                        .collect(),
                })
                .collect();
            SectionRoster {
                course: schedule.course(section.course()).name().to_string(),
                time_slot: section.time_slot(),
                capacity: section.capacity(),
                members,
                offerings,
            }
        })
        .collect()
}

use log::{debug, trace};
use std::cmp::Reverse;

use crate::data::TimeSlot;
use crate::error::EnrollmentError;
use crate::model::{Schedule, SectionId, Student, StudentId};

/// Priority of a student for `time_slot`: higher when the slot sits early in
/// their list and when the list itself is short.
pub fn priority(student: &Student, time_slot: TimeSlot, order_len: usize) -> i64 {
    let order_len = order_len as i64;
    let rank = student
        .rank_of(time_slot)
        .map_or(order_len, |rank| rank as i64);
    (order_len - rank) + (order_len - student.preferences().len() as i64)
}

/// Fills sections one time slot at a time, following `order`. Returns the
/// number of placements made.
pub fn assign(schedule: &mut Schedule, order: &[TimeSlot]) -> Result<usize, EnrollmentError> {
    let mut placed = 0;
    for &time_slot in order {
        let round = assign_round(schedule, time_slot, order.len())?;
        debug!("slot {}: {} placements", time_slot, round);
        placed += round;
    }
    Ok(placed)
}

fn assign_round(
    schedule: &mut Schedule,
    time_slot: TimeSlot,
    order_len: usize,
) -> Result<usize, EnrollmentError> {
    let mut eligible: Vec<SectionId> = schedule
        .section_ids()
        .filter(|&id| {
            let section = schedule.section(id);
            section.time_slot() == time_slot && !section.is_full()
        })
        .collect();

    let mut candidates: Vec<StudentId> = schedule
        .student_ids()
        .filter(|&id| schedule.student(id).would_consider(time_slot))
        .collect();
    // stable: equal scores keep roster order
    candidates.sort_by_key(|&id| Reverse(priority(schedule.student(id), time_slot, order_len)));

    let mut placed = 0;
    for student in candidates {
        if eligible.is_empty() {
            break;
        }
        let Some(position) = eligible
            .iter()
            .position(|&id| !schedule.holds_course(student, schedule.section(id).course()))
        else {
            continue;
        };
        let section = eligible[position];
        schedule.add_student(section, student)?;
        trace!(
            "{} -> {}",
            schedule.student(student).name(),
            schedule.section_label(section)
        );
        placed += 1;
        if schedule.section(section).is_full() {
            eligible.remove(position);
        }
    }
    Ok(placed)
}

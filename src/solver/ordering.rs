use itertools::Itertools;

use crate::config::SlotOrdering;
use crate::data::TimeSlot;
use crate::model::Schedule;

/// Number of students who would take `time_slot`.
pub fn demand(schedule: &Schedule, time_slot: TimeSlot) -> usize {
    schedule
        .students()
        .iter()
        .filter(|student| student.would_consider(time_slot))
        .count()
}

/// Orders every time slot by ascending demand so the least popular slots
/// are filled first.
pub fn processing_order(schedule: &Schedule, policy: SlotOrdering) -> Vec<TimeSlot> {
    let demands: Vec<(TimeSlot, usize)> = TimeSlot::all(schedule.time_slot_count())
        .map(|slot| (slot, demand(schedule, slot)))
        .collect();

    match policy {
        SlotOrdering::Stable => demands
            .into_iter()
            .sorted_by_key(|&(slot, demand)| (demand, slot))
            .map(|(slot, _)| slot)
            .collect(),
        SlotOrdering::FirstOccurrence => {
            let mut order: Vec<TimeSlot> = demands
                .iter()
                .map(|&(_, demand)| demand)
                .sorted()
                .dedup()
                .filter_map(|wanted| {
                    demands
                        .iter()
                        .find(|&&(_, demand)| demand == wanted)
                        .map(|&(slot, _)| slot)
                })
                .collect();
            let rest: Vec<TimeSlot> = TimeSlot::all(schedule.time_slot_count())
                .filter(|slot| !order.contains(slot))
                .collect();
            order.extend(rest);
            order
        }
    }
}

//! Local search that places students still missing a course.
//!
//! A repair relocates a "fixer" who sits in a section the student wants
//! into an open section of the same course the fixer would also accept,
//! then puts the student in the seat that was freed. The fixer is never
//! moved into a slot where they already hold another course.

use log::debug;

use crate::error::EnrollmentError;
use crate::model::{Schedule, SectionId, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repair {
    pub student: StudentId,
    pub fixer: StudentId,
    pub vacated: SectionId,
    pub destination: SectionId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrainReport {
    pub attempts: usize,
    pub repairs: usize,
}

struct Candidate {
    rank: usize,
    fixer: StudentId,
    vacated: SectionId,
    destination: SectionId,
}

/// Students holding a course that still has an open section whose time
/// they would accept.
pub fn fixer_pool(schedule: &Schedule, open: &[SectionId]) -> Vec<StudentId> {
    schedule
        .student_ids()
        .filter(|&id| {
            let student = schedule.student(id);
            open.iter().any(|&section_id| {
                let section = schedule.section(section_id);
                student.would_consider(section.time_slot())
                    && schedule.holds_course(id, section.course())
            })
        })
        .collect()
}

/// Sections of courses the student lacks, at times they would accept and
/// are not already busy at.
fn wanted_sections(schedule: &Schedule, student: StudentId) -> Vec<SectionId> {
    schedule
        .missing_courses(student)
        .into_iter()
        .flat_map(|course| schedule.course(course).sections().to_vec())
        .filter(|&id| {
            let time_slot = schedule.section(id).time_slot();
            schedule.student(student).would_consider(time_slot)
                && !schedule.is_busy_at(student, time_slot)
        })
        .collect()
}

/// The lowest-ranked relocation among every fixer seated in one of
/// `wanted`. Ties keep the first found.
fn best_swap(
    schedule: &Schedule,
    wanted: &[SectionId],
    fixers: &[StudentId],
    open: &[SectionId],
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for &vacated in wanted {
        let course = schedule.section(vacated).course();
        for &fixer in fixers
            .iter()
            .filter(|&&fixer| schedule.section(vacated).contains(fixer))
        {
            let student = schedule.student(fixer);
            for &destination in open {
                let section = schedule.section(destination);
                if destination == vacated
                    || section.course() != course
                    || !student.would_consider(section.time_slot())
                    || schedule.is_busy_at(fixer, section.time_slot())
                {
                    continue;
                }
                let Some(rank) = student.rank_of(section.time_slot()) else {
                    continue;
                };
                if best.as_ref().is_none_or(|b| rank < b.rank) {
                    best = Some(Candidate {
                        rank,
                        fixer,
                        vacated,
                        destination,
                    });
                }
            }
        }
    }
    best
}

/// Makes at most one repair. `Ok(None)` means no progress was possible.
pub fn try_reduce_strain(schedule: &mut Schedule) -> Result<Option<Repair>, EnrollmentError> {
    let unassigned = schedule.unassigned_students();
    let open = schedule.open_sections();
    let fixers = fixer_pool(schedule, &open);
    if fixers.is_empty() {
        return Ok(None);
    }

    for student in unassigned {
        let wanted = wanted_sections(schedule, student);
        if let Some(candidate) = best_swap(schedule, &wanted, &fixers, &open) {
            schedule.change_section(candidate.fixer, candidate.destination)?;
            schedule.add_student(candidate.vacated, student)?;
            return Ok(Some(Repair {
                student,
                fixer: candidate.fixer,
                vacated: candidate.vacated,
                destination: candidate.destination,
            }));
        }
    }
    Ok(None)
}

/// Repeats [`try_reduce_strain`] until it stalls or `max_attempts` is hit.
pub fn reduce_strain(
    schedule: &mut Schedule,
    max_attempts: usize,
) -> Result<StrainReport, EnrollmentError> {
    let mut report = StrainReport::default();
    while report.attempts < max_attempts {
        report.attempts += 1;
        match try_reduce_strain(schedule)? {
            Some(repair) => {
                report.repairs += 1;
                log_repair(schedule, repair);
            }
            None => break,
        }
    }
    Ok(report)
}

fn log_repair(schedule: &Schedule, repair: Repair) {
    debug!(
        "moved {} from {} to {} to seat {}",
        schedule.student(repair.fixer).name(),
        schedule.section_label(repair.vacated),
        schedule.section_label(repair.destination),
        schedule.student(repair.student).name()
    );
}

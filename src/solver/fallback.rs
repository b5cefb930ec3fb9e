use log::trace;

use crate::error::{ConfigurationError, ScheduleError};
use crate::model::{CourseId, Schedule};

/// Puts every student still missing a course into the first open section
/// of that course, regardless of preference or time conflicts.
///
/// Running out of seats here is reported as a capacity shortfall.
pub fn assign_remaining(schedule: &mut Schedule) -> Result<usize, ScheduleError> {
    let mut placed = 0;
    for student in schedule.unassigned_students() {
        for course in schedule.missing_courses(student) {
            let Some(section) = schedule
                .course(course)
                .sections()
                .iter()
                .copied()
                .find(|&id| !schedule.section(id).is_full())
            else {
                return Err(shortfall(schedule, course).into());
            };
            schedule.add_student(section, student)?;
            trace!(
                "{} forced into {}",
                schedule.student(student).name(),
                schedule.section_label(section)
            );
            placed += 1;
        }
    }
    Ok(placed)
}

fn shortfall(schedule: &Schedule, course: CourseId) -> ConfigurationError {
    let course = schedule.course(course);
    let seats = course
        .sections()
        .iter()
        .map(|&id| u64::from(schedule.section(id).capacity()))
        .sum();
    ConfigurationError::CapacityShortfall {
        course: course.name().to_string(),
        seats,
        required: schedule.students().len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{course, slot, slots};
    use crate::model::{Roster, SectionId, Student, StudentId};

    #[test]
    fn fills_first_open_section_of_each_missing_course() {
        let roster = Roster::from(vec![
            Student::new("Ada", slots(&[2])),
            Student::new("Bo", slots(&[2])),
        ]);
        let mut schedule = Schedule::new(
            &[course("Foundry", 2, 1), course("Machining", 2, 1)],
            roster,
        )
        .unwrap();
        schedule.add_student(SectionId(1), StudentId(0)).unwrap();

        let placed = assign_remaining(&mut schedule).unwrap();
        assert_eq!(placed, 3);
        assert_eq!(schedule.missing_placements(), 0);
        // Ada: Machining 1. Bo: Foundry 1, then Machining 2.
        assert_eq!(schedule.section(SectionId(2)).members(), &[StudentId(0)]);
        assert_eq!(schedule.section(SectionId(0)).members(), &[StudentId(1)]);
        assert_eq!(schedule.section(SectionId(3)).members(), &[StudentId(1)]);
        assert!(schedule.student(StudentId(0)).is_unhappy_with(slot(1)));
    }

    #[test]
    fn exhausted_course_is_a_configuration_error() {
        let roster = Roster::from(vec![
            Student::new("Ada", slots(&[1])),
            Student::new("Bo", slots(&[1])),
            Student::new("Cy", slots(&[1])),
        ]);
        let mut schedule = Schedule::with_sections(&[course("Foundry", 1, 2)], roster).unwrap();
        let err = assign_remaining(&mut schedule).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Configuration(ConfigurationError::CapacityShortfall {
                course: "Foundry".to_string(),
                seats: 2,
                required: 3,
            })
        );
        assert!(err.is_configuration());
    }
}

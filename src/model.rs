//! The model graph of one run: students, courses and their sections.
//!
//! Students and sections refer to each other by index. Only the enrollment
//! primitives on [`Schedule`] change membership, and they always update both
//! sides together.

use itertools::Itertools;
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

use crate::config::{MAX_OFFERINGS_PER_SECTION, MAX_TIME_SLOTS};
use crate::data::{CourseSpec, StudentSpec, TimeSlot, ValidationWarning, WarningKind};
use crate::error::{ConfigurationError, EnrollmentError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseId(pub usize);

#[derive(Debug, Clone)]
pub struct Student {
    name: String,
    preferences: Vec<TimeSlot>,
    preference_set: HashSet<TimeSlot>,
    // What the student actually asked for, before any repair.
    submitted: HashSet<TimeSlot>,
    assigned: Vec<SectionId>,
}

impl Student {
    pub fn new(name: impl Into<String>, preferences: Vec<TimeSlot>) -> Self {
        let preferences: Vec<TimeSlot> = preferences.into_iter().unique().collect();
        let preference_set: HashSet<TimeSlot> = preferences.iter().copied().collect();
        Self {
            name: name.into(),
            submitted: preference_set.clone(),
            preference_set,
            preferences,
            assigned: Vec::new(),
        }
    }

    /// Keeps the in-range entries in order, then appends every missing slot
    /// in ascending order so that all `1..=time_slot_count` are listed.
    fn repaired(name: impl Into<String>, submitted: Vec<TimeSlot>, time_slot_count: u32) -> Self {
        let mut student = Self::new(name, submitted);
        student
            .preferences
            .retain(|slot| slot.get() <= time_slot_count);
        let padding: Vec<TimeSlot> = TimeSlot::all(time_slot_count)
            .filter(|slot| !student.preferences.contains(slot))
            .collect();
        student.preferences.extend(padding);
        student.preference_set = student.preferences.iter().copied().collect();
        student
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn preferences(&self) -> &[TimeSlot] {
        &self.preferences
    }

    pub fn assigned_sections(&self) -> &[SectionId] {
        &self.assigned
    }

    pub fn would_consider(&self, time_slot: TimeSlot) -> bool {
        self.preference_set.contains(&time_slot)
    }

    /// Zero-based position of `time_slot` in the preference list.
    pub fn rank_of(&self, time_slot: TimeSlot) -> Option<usize> {
        self.preferences.iter().position(|&slot| slot == time_slot)
    }

    /// True when `time_slot` is not one the student originally asked for.
    pub fn is_unhappy_with(&self, time_slot: TimeSlot) -> bool {
        !self.submitted.contains(&time_slot)
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    course: CourseId,
    time_slot: TimeSlot,
    capacity: u32,
    offerings: u32,
    members: Vec<StudentId>,
}

impl Section {
    pub fn course(&self) -> CourseId {
        self.course
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn offerings(&self) -> u32 {
        self.offerings
    }

    /// Members in enrollment order.
    pub fn members(&self) -> &[StudentId] {
        &self.members
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity as usize
    }

    pub fn contains(&self, student: StudentId) -> bool {
        self.members.contains(&student)
    }
}

#[derive(Debug, Clone)]
pub struct Course {
    name: String,
    sections: Vec<SectionId>,
}

impl Course {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One section per time slot, ascending.
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }
}

/// All students of a run, with the warnings raised while building it.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
    warnings: Vec<ValidationWarning>,
}

impl Roster {
    /// Builds the roster, repairing preference lists that are too short for
    /// `course_count` courses or that name slots beyond `time_slot_count`.
    pub fn from_specs(
        specs: &[StudentSpec],
        time_slot_count: u32,
        course_count: usize,
    ) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut roster = Roster::default();
        for spec in specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigurationError::DuplicateStudent(spec.name.clone()));
            }
            let preferences = parse_preferences(&spec.preferences);
            let mut flagged = false;
            if preferences.len() < course_count {
                flagged = true;
                roster.warn(ValidationWarning {
                    student: spec.name.clone(),
                    kind: WarningKind::TooFewPreferences {
                        supplied: preferences.len(),
                        required: course_count,
                    },
                });
            }
            let out_of_range: Vec<u32> = preferences
                .iter()
                .map(|slot| slot.get())
                .filter(|&id| id > time_slot_count)
                .collect();
            if !out_of_range.is_empty() {
                flagged = true;
                roster.warn(ValidationWarning {
                    student: spec.name.clone(),
                    kind: WarningKind::OutOfRange {
                        slots: out_of_range,
                        time_slot_count,
                    },
                });
            }
            let student = if flagged {
                Student::repaired(spec.name.clone(), preferences, time_slot_count)
            } else {
                Student::new(spec.name.clone(), preferences)
            };
            roster.students.push(student);
        }
        Ok(roster)
    }

    fn warn(&mut self, warning: ValidationWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

impl From<Vec<Student>> for Roster {
    fn from(students: Vec<Student>) -> Self {
        Self {
            students,
            warnings: Vec::new(),
        }
    }
}

/// Positive integers, as JSON numbers or numeric strings, first occurrence
/// kept. Anything else is dropped.
fn parse_preferences(raw: &[Value]) -> Vec<TimeSlot> {
    raw.iter()
        .filter_map(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        })
        .filter_map(|id| u32::try_from(id).ok())
        .filter_map(TimeSlot::new)
        .unique()
        .collect()
}

/// Checks the course configuration against a roster of `student_count`.
pub fn validate_courses(
    courses: &[CourseSpec],
    student_count: usize,
) -> Result<(), ConfigurationError> {
    if courses.is_empty() {
        return Err(ConfigurationError::NoCourses);
    }
    let mut names = HashSet::new();
    for course in courses {
        if !names.insert(course.name.as_str()) {
            return Err(ConfigurationError::DuplicateCourse(course.name.clone()));
        }
        if course.time_slot_count == 0 {
            return Err(ConfigurationError::ZeroTimeSlots(course.name.clone()));
        }
        if course.time_slot_count > MAX_TIME_SLOTS {
            return Err(ConfigurationError::TooManyTimeSlots {
                course: course.name.clone(),
                count: course.time_slot_count,
                max: MAX_TIME_SLOTS,
            });
        }
        if course.offerings_per_section == 0 {
            return Err(ConfigurationError::ZeroOfferings(course.name.clone()));
        }
        if course.offerings_per_section > MAX_OFFERINGS_PER_SECTION {
            return Err(ConfigurationError::TooManyOfferings {
                course: course.name.clone(),
                count: course.offerings_per_section,
                max: MAX_OFFERINGS_PER_SECTION,
            });
        }
        let seats = u64::from(course.capacity_per_offering)
            .saturating_mul(u64::from(course.offerings_per_section))
            .saturating_mul(u64::from(course.time_slot_count));
        let required = student_count as u64;
        if seats < required {
            return Err(ConfigurationError::CapacityShortfall {
                course: course.name.clone(),
                seats,
                required,
            });
        }
    }
    Ok(())
}

/// The model graph: the roster plus every course and section.
#[derive(Debug, Clone)]
pub struct Schedule {
    students: Vec<Student>,
    courses: Vec<Course>,
    sections: Vec<Section>,
    time_slot_count: u32,
}

impl Schedule {
    /// The number of distinct time slots across all courses.
    pub fn time_slot_count_of(courses: &[CourseSpec]) -> u32 {
        courses
            .iter()
            .map(|course| course.time_slot_count)
            .max()
            .unwrap_or(0)
    }

    /// Creates one section per course and time slot. Every student needs
    /// every course, so each course must seat the whole roster.
    pub fn new(courses: &[CourseSpec], roster: Roster) -> Result<Self, ConfigurationError> {
        validate_courses(courses, roster.len())?;
        Self::with_sections(courses, roster)
    }

    /// Builds the graph without checking that the seats cover the roster.
    pub(crate) fn with_sections(
        courses: &[CourseSpec],
        roster: Roster,
    ) -> Result<Self, ConfigurationError> {
        if courses.is_empty() {
            return Err(ConfigurationError::NoCourses);
        }
        let mut schedule = Self {
            students: roster.students,
            courses: Vec::with_capacity(courses.len()),
            sections: Vec::new(),
            time_slot_count: Self::time_slot_count_of(courses),
        };
        for (index, spec) in courses.iter().enumerate() {
            let capacity = spec
                .capacity_per_offering
                .saturating_mul(spec.offerings_per_section);
            let mut course = Course {
                name: spec.name.clone(),
                sections: Vec::new(),
            };
            for time_slot in TimeSlot::all(spec.time_slot_count) {
                course.sections.push(SectionId(schedule.sections.len()));
                schedule.sections.push(Section {
                    course: CourseId(index),
                    time_slot,
                    capacity,
                    offerings: spec.offerings_per_section,
                    members: Vec::new(),
                });
            }
            schedule.courses.push(course);
        }
        Ok(schedule)
    }

    pub fn time_slot_count(&self) -> u32 {
        self.time_slot_count
    }

    pub fn student(&self, id: StudentId) -> &Student {
        &self.students[id.0]
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    pub fn course(&self, id: CourseId) -> &Course {
        &self.courses[id.0]
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student_ids(&self) -> impl Iterator<Item = StudentId> + use<> {
        (0..self.students.len()).map(StudentId)
    }

    /// Course-major, then ascending time slot.
    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + use<> {
        (0..self.sections.len()).map(SectionId)
    }

    pub fn course_ids(&self) -> impl Iterator<Item = CourseId> + use<> {
        (0..self.courses.len()).map(CourseId)
    }

    pub fn section_label(&self, id: SectionId) -> String {
        let section = self.section(id);
        format!("{} {}", self.course(section.course).name, section.time_slot)
    }

    pub fn held_section(&self, student: StudentId, course: CourseId) -> Option<SectionId> {
        self.student(student)
            .assigned
            .iter()
            .copied()
            .find(|&id| self.section(id).course == course)
    }

    pub fn holds_course(&self, student: StudentId, course: CourseId) -> bool {
        self.held_section(student, course).is_some()
    }

    pub fn is_busy_at(&self, student: StudentId, time_slot: TimeSlot) -> bool {
        self.student(student)
            .assigned
            .iter()
            .any(|&id| self.section(id).time_slot == time_slot)
    }

    /// Courses the student does not hold yet, in configuration order.
    pub fn missing_courses(&self, student: StudentId) -> Vec<CourseId> {
        self.course_ids()
            .filter(|&course| !self.holds_course(student, course))
            .collect()
    }

    /// Students lacking at least one course, in roster order.
    pub fn unassigned_students(&self) -> Vec<StudentId> {
        self.student_ids()
            .filter(|&id| self.student(id).assigned.len() < self.courses.len())
            .collect()
    }

    /// Sections with a free seat, in section order.
    pub fn open_sections(&self) -> Vec<SectionId> {
        self.section_ids()
            .filter(|&id| !self.section(id).is_full())
            .collect()
    }

    /// Total number of (student, course) pairs still unplaced.
    pub fn missing_placements(&self) -> usize {
        let expected = self.courses.len();
        self.students
            .iter()
            .map(|student| expected.saturating_sub(student.assigned.len()))
            .sum()
    }

    pub fn add_student(
        &mut self,
        section_id: SectionId,
        student_id: StudentId,
    ) -> Result<(), EnrollmentError> {
        let section = self.section(section_id);
        if section.is_full() {
            return Err(EnrollmentError::CapacityExceeded {
                course: self.course(section.course).name.clone(),
                time_slot: section.time_slot,
                capacity: section.capacity,
            });
        }
        if section.contains(student_id) {
            return Err(EnrollmentError::DuplicateEnrollment {
                student: self.student(student_id).name.clone(),
                course: self.course(section.course).name.clone(),
                time_slot: section.time_slot,
            });
        }
        if self.holds_course(student_id, section.course) {
            return Err(EnrollmentError::CourseAlreadyHeld {
                student: self.student(student_id).name.clone(),
                course: self.course(section.course).name.clone(),
            });
        }
        self.sections[section_id.0].members.push(student_id);
        self.students[student_id.0].assigned.push(section_id);
        Ok(())
    }

    /// Unlinks both sides. Removing a non-member does nothing.
    pub fn remove_student(&mut self, section_id: SectionId, student_id: StudentId) {
        self.sections[section_id.0]
            .members
            .retain(|&member| member != student_id);
        self.students[student_id.0]
            .assigned
            .retain(|&held| held != section_id);
    }

    /// Moves the student from their current section of `new_section`'s
    /// course into `new_section` and returns the section left behind.
    ///
    /// All checks run before anything is unlinked, so on error the student
    /// still holds their original section.
    pub fn change_section(
        &mut self,
        student_id: StudentId,
        new_section: SectionId,
    ) -> Result<SectionId, EnrollmentError> {
        let course = self.section(new_section).course;
        let Some(old_section) = self.held_section(student_id, course) else {
            return Err(EnrollmentError::NotCurrentlyHeld {
                student: self.student(student_id).name.clone(),
                course: self.course(course).name.clone(),
            });
        };
        if old_section == new_section {
            return Ok(old_section);
        }
        let target = self.section(new_section);
        if target.is_full() {
            return Err(EnrollmentError::CapacityExceeded {
                course: self.course(course).name.clone(),
                time_slot: target.time_slot,
                capacity: target.capacity,
            });
        }
        self.remove_student(old_section, student_id);
        self.add_student(new_section, student_id)?;
        Ok(old_section)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn slot(id: u32) -> TimeSlot {
        TimeSlot::new(id).unwrap()
    }

    pub(crate) fn slots(ids: &[u32]) -> Vec<TimeSlot> {
        ids.iter().map(|&id| slot(id)).collect()
    }

    pub(crate) fn course(name: &str, time_slots: u32, capacity: u32) -> CourseSpec {
        CourseSpec {
            name: name.to_string(),
            time_slot_count: time_slots,
            capacity_per_offering: capacity,
            offerings_per_section: 1,
        }
    }

    pub(crate) fn student_spec(name: &str, preferences: &[u32]) -> StudentSpec {
        StudentSpec {
            name: name.to_string(),
            preferences: preferences.iter().map(|&p| json!(p)).collect(),
        }
    }

    fn small_schedule(capacity: u32) -> Schedule {
        let roster = Roster::from(vec![
            Student::new("Ada", slots(&[1, 2])),
            Student::new("Bo", slots(&[2, 1])),
        ]);
        Schedule::new(
            &[course("Foundry", 2, capacity), course("Machining", 2, capacity)],
            roster,
        )
        .unwrap()
    }

    #[test]
    fn parse_drops_non_numeric_and_non_positive() {
        let raw = vec![json!(3), json!("2"), json!("x"), json!(0), json!(-1), json!(3), json!(1.5)];
        assert_eq!(parse_preferences(&raw), slots(&[3, 2]));
    }

    #[test]
    fn valid_preferences_are_kept_untouched() {
        let roster = Roster::from_specs(&[student_spec("Ada", &[3, 1])], 3, 2).unwrap();
        assert!(roster.warnings().is_empty());
        assert_eq!(roster.students()[0].preferences(), slots(&[3, 1]).as_slice());
    }

    #[test]
    fn too_few_preferences_are_padded() {
        let roster = Roster::from_specs(&[student_spec("Ada", &[2])], 4, 2).unwrap();
        let ada = &roster.students()[0];
        assert_eq!(ada.preferences(), slots(&[2, 1, 3, 4]).as_slice());
        assert!(ada.would_consider(slot(4)));
        assert!(ada.is_unhappy_with(slot(4)));
        assert!(!ada.is_unhappy_with(slot(2)));
        assert_eq!(
            roster.warnings()[0].kind,
            WarningKind::TooFewPreferences {
                supplied: 1,
                required: 2
            }
        );
    }

    #[test]
    fn out_of_range_preferences_are_dropped_and_padded() {
        let roster = Roster::from_specs(&[student_spec("Bo", &[9, 2, 1])], 3, 2).unwrap();
        assert_eq!(roster.students()[0].preferences(), slots(&[2, 1, 3]).as_slice());
        assert_eq!(roster.warnings().len(), 1);
        assert!(matches!(
            &roster.warnings()[0].kind,
            WarningKind::OutOfRange { slots, .. } if slots == &vec![9]
        ));
    }

    #[test]
    fn both_problems_raise_two_warnings() {
        let roster = Roster::from_specs(&[student_spec("Cy", &[7])], 3, 2).unwrap();
        assert_eq!(roster.warnings().len(), 2);
        assert_eq!(roster.students()[0].preferences(), slots(&[1, 2, 3]).as_slice());
    }

    #[test]
    fn duplicate_student_is_rejected() {
        let err = Roster::from_specs(
            &[student_spec("Ada", &[1, 2]), student_spec("Ada", &[2, 1])],
            2,
            1,
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateStudent("Ada".to_string()));
    }

    #[test]
    fn capacity_shortfall_is_detected_up_front() {
        let roster = Roster::from(vec![
            Student::new("Ada", slots(&[1])),
            Student::new("Bo", slots(&[1])),
            Student::new("Cy", slots(&[1])),
        ]);
        let err = Schedule::new(&[course("Foundry", 2, 1)], roster).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::CapacityShortfall {
                course: "Foundry".to_string(),
                seats: 2,
                required: 3
            }
        );
    }

    #[test]
    fn oversized_courses_are_rejected() {
        let mut spec = course("Foundry", MAX_TIME_SLOTS + 1, 1);
        assert_eq!(
            validate_courses(&[spec.clone()], 0),
            Err(ConfigurationError::TooManyTimeSlots {
                course: "Foundry".to_string(),
                count: MAX_TIME_SLOTS + 1,
                max: MAX_TIME_SLOTS,
            })
        );

        spec.time_slot_count = MAX_TIME_SLOTS;
        spec.offerings_per_section = u32::MAX;
        assert!(matches!(
            validate_courses(&[spec.clone()], 0),
            Err(ConfigurationError::TooManyOfferings { count: u32::MAX, .. })
        ));

        spec.offerings_per_section = MAX_OFFERINGS_PER_SECTION;
        assert_eq!(validate_courses(&[spec], 0), Ok(()));
    }

    #[test]
    fn section_capacity_counts_every_offering() {
        let spec = CourseSpec {
            name: "Foundry".to_string(),
            time_slot_count: 2,
            capacity_per_offering: 3,
            offerings_per_section: 2,
        };
        let schedule = Schedule::new(&[spec], Roster::default()).unwrap();
        assert!(schedule.section_ids().all(|id| schedule.section(id).capacity() == 6));
    }

    #[test]
    fn add_student_links_both_sides() {
        let mut schedule = small_schedule(1);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        assert_eq!(schedule.section(SectionId(0)).members(), &[StudentId(0)]);
        assert_eq!(schedule.student(StudentId(0)).assigned_sections(), &[SectionId(0)]);
        assert!(schedule.is_busy_at(StudentId(0), slot(1)));
        assert_eq!(schedule.missing_courses(StudentId(0)), vec![CourseId(1)]);
    }

    #[test]
    fn add_student_rejects_full_duplicate_and_held_course() {
        let mut schedule = small_schedule(1);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        assert!(matches!(
            schedule.add_student(SectionId(0), StudentId(1)),
            Err(EnrollmentError::CapacityExceeded { capacity: 1, .. })
        ));

        let mut schedule = small_schedule(2);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        assert!(matches!(
            schedule.add_student(SectionId(0), StudentId(0)),
            Err(EnrollmentError::DuplicateEnrollment { .. })
        ));
        assert!(matches!(
            schedule.add_student(SectionId(1), StudentId(0)),
            Err(EnrollmentError::CourseAlreadyHeld { .. })
        ));
    }

    #[test]
    fn remove_absent_student_is_a_no_op() {
        let mut schedule = small_schedule(1);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        schedule.remove_student(SectionId(1), StudentId(0));
        schedule.remove_student(SectionId(0), StudentId(1));
        assert_eq!(schedule.section(SectionId(0)).members(), &[StudentId(0)]);

        schedule.remove_student(SectionId(0), StudentId(0));
        assert!(schedule.section(SectionId(0)).members().is_empty());
        assert!(schedule.student(StudentId(0)).assigned_sections().is_empty());
    }

    #[test]
    fn change_section_moves_within_course() {
        let mut schedule = small_schedule(1);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        let left = schedule.change_section(StudentId(0), SectionId(1)).unwrap();
        assert_eq!(left, SectionId(0));
        assert!(schedule.section(SectionId(0)).members().is_empty());
        assert_eq!(schedule.held_section(StudentId(0), CourseId(0)), Some(SectionId(1)));
    }

    #[test]
    fn change_section_requires_held_course() {
        let mut schedule = small_schedule(1);
        assert!(matches!(
            schedule.change_section(StudentId(0), SectionId(2)),
            Err(EnrollmentError::NotCurrentlyHeld { .. })
        ));
    }

    #[test]
    fn failed_change_keeps_original_section() {
        let mut schedule = small_schedule(1);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        schedule.add_student(SectionId(1), StudentId(1)).unwrap();
        assert!(matches!(
            schedule.change_section(StudentId(0), SectionId(1)),
            Err(EnrollmentError::CapacityExceeded { .. })
        ));
        assert_eq!(schedule.held_section(StudentId(0), CourseId(0)), Some(SectionId(0)));
        assert_eq!(schedule.section(SectionId(0)).members(), &[StudentId(0)]);
    }

    #[test]
    fn missing_placements_counts_per_course() {
        let mut schedule = small_schedule(2);
        assert_eq!(schedule.missing_placements(), 4);
        schedule.add_student(SectionId(0), StudentId(0)).unwrap();
        schedule.add_student(SectionId(2), StudentId(0)).unwrap();
        assert_eq!(schedule.missing_placements(), 2);
        assert_eq!(schedule.unassigned_students(), vec![StudentId(1)]);
    }
}

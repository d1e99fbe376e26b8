use crate::models::Course;

/// Teacher value the agenda API uses when nobody is assigned.
pub const UNKNOWN_TEACHER: &str = "N/A";
/// Course type of unsupervised self-study slots.
pub const UNSUPERVISED_KIND: &str = "Libre";

/// Keep only courses worth announcing: a known teacher and not an
/// unsupervised "Libre" slot. Stable: survivors keep their input order.
pub fn filter_courses(raw: Vec<Course>) -> Vec<Course> {
    raw.into_iter()
        .filter(|course| {
            let teacher_missing = matches!(
                course.teacher.as_deref(),
                None | Some("") | Some(UNKNOWN_TEACHER)
            );
            !teacher_missing && course.kind != UNSUPERVISED_KIND
        })
        .collect()
}

/// Canonical ordering for comparison and display: chronological, course
/// name breaking ties. Applied after filtering so deep equality is not
/// sensitive to upstream ordering artifacts.
pub fn canonical_order(mut courses: Vec<Course>) -> Vec<Course> {
    courses.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    courses
}

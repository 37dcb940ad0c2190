//! Display ordering and section-aware reordering.
//!
//! # Responsibility
//! - Partition the canonical collection into Pinned, In-Progress and
//!   Completed sections, each ordered newest first.
//! - Translate flat display indices into `(section, local index)` pairs and
//!   apply single-element moves inside one section.
//!
//! # Invariants
//! - A section the user has not rearranged is sorted by `created_at`
//!   descending; ties keep stored order.
//! - A section marked in `ManualSections` keeps stored order.
//! - A reorder never moves a project across sections, never drops and never
//!   duplicates an element.

use crate::model::project::{Project, Section};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Sections whose stored order is a user arrangement rather than recency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualSections(BTreeSet<Section>);

impl ManualSections {
    pub fn contains(&self, section: Section) -> bool {
        self.0.contains(&section)
    }

    /// Marks `section` as manually arranged. Returns `true` when it was not
    /// marked before.
    pub fn mark(&mut self, section: Section) -> bool {
        self.0.insert(section)
    }

    /// Returns `true` when `section` was marked.
    pub fn unmark(&mut self, section: Section) -> bool {
        self.0.remove(&section)
    }

    /// Returns `true` when any section was marked.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.0.is_empty();
        self.0.clear();
        had_any
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Marked sections in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Section> for ManualSections {
    fn from_iter<I: IntoIterator<Item = Section>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Borrowed three-section view of the collection, in rendering order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSections<'a> {
    pub pinned: Vec<&'a Project>,
    pub in_progress: Vec<&'a Project>,
    pub completed: Vec<&'a Project>,
}

impl<'a> ProjectSections<'a> {
    pub fn get(&self, section: Section) -> &[&'a Project] {
        match section {
            Section::Pinned => &self.pinned,
            Section::InProgress => &self.in_progress,
            Section::Completed => &self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lengths(&self) -> SectionLengths {
        SectionLengths {
            pinned: self.pinned.len(),
            in_progress: self.in_progress.len(),
            completed: self.completed.len(),
        }
    }

    /// Flattened display list: pinned, then in-progress, then completed.
    pub fn flatten(&self) -> Vec<&'a Project> {
        Section::ALL
            .into_iter()
            .flat_map(|section| self.get(section).iter().copied())
            .collect()
    }
}

/// Section sizes used for flat index translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLengths {
    pub pinned: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl SectionLengths {
    pub fn len_of(self, section: Section) -> usize {
        match section {
            Section::Pinned => self.pinned,
            Section::InProgress => self.in_progress,
            Section::Completed => self.completed,
        }
    }

    pub fn total(self) -> usize {
        self.pinned + self.in_progress + self.completed
    }

    /// Flat index of the first element of `section`.
    pub fn offset(self, section: Section) -> usize {
        match section {
            Section::Pinned => 0,
            Section::InProgress => self.pinned,
            Section::Completed => self.pinned + self.in_progress,
        }
    }

    /// Resolves a flat display index to its section, or `None` when the
    /// index is past the end of the list.
    pub fn locate(self, flat_index: usize) -> Option<(Section, usize)> {
        Section::ALL.into_iter().find_map(|section| {
            let offset = self.offset(section);
            let len = self.len_of(section);
            (flat_index >= offset && flat_index < offset + len)
                .then(|| (section, flat_index - offset))
        })
    }
}

/// Resolved single-element move inside one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPlan {
    pub section: Section,
    /// Local source index within `section`.
    pub from: usize,
    /// Local destination index within `section`.
    pub to: usize,
    /// Whether the requested destination lay outside `section`.
    pub clamped: bool,
}

impl ReorderPlan {
    /// Plans a move between flat display indices.
    ///
    /// The destination is clamped into the source section. Returns `None`
    /// when `start_index` does not address an element.
    pub fn resolve(lengths: SectionLengths, start_index: usize, end_index: usize) -> Option<Self> {
        let (section, from) = lengths.locate(start_index)?;
        let offset = lengths.offset(section);
        let last = lengths.len_of(section) - 1;
        let requested = end_index as i64 - offset as i64;
        let to = requested.clamp(0, last as i64) as usize;

        Some(Self {
            section,
            from,
            to,
            clamped: requested != to as i64,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Full display comparator: pinned first, then incomplete, then newest.
pub fn display_cmp(a: &Project, b: &Project) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then(a.completed.cmp(&b.completed))
        .then(b.created_at.cmp(&a.created_at))
}

/// Borrows the collection as three display-ordered sections.
pub fn sections<'a>(projects: &'a [Project], manual: &ManualSections) -> ProjectSections<'a> {
    let mut view = ProjectSections::default();
    for project in projects {
        match project.section() {
            Section::Pinned => view.pinned.push(project),
            Section::InProgress => view.in_progress.push(project),
            Section::Completed => view.completed.push(project),
        }
    }
    for section in Section::ALL {
        if !manual.contains(section) {
            let list = match section {
                Section::Pinned => &mut view.pinned,
                Section::InProgress => &mut view.in_progress,
                Section::Completed => &mut view.completed,
            };
            list.sort_by(|a, b| display_cmp(a, b));
        }
    }
    view
}

/// Applies `plan` to an owned collection and returns the reassembled
/// canonical order (pinned ++ in-progress ++ completed).
///
/// Sections are materialized in display order first, so `plan` indices
/// address what `sections` returned for the same `manual` set.
pub fn apply_reorder(
    projects: Vec<Project>,
    plan: ReorderPlan,
    manual: &ManualSections,
) -> Vec<Project> {
    let total = projects.len();
    let mut pinned = Vec::new();
    let mut in_progress = Vec::new();
    let mut completed = Vec::new();
    for project in projects {
        match project.section() {
            Section::Pinned => pinned.push(project),
            Section::InProgress => in_progress.push(project),
            Section::Completed => completed.push(project),
        }
    }
    for (section, list) in [
        (Section::Pinned, &mut pinned),
        (Section::InProgress, &mut in_progress),
        (Section::Completed, &mut completed),
    ] {
        if !manual.contains(section) {
            list.sort_by(display_cmp);
        }
    }

    let target = match plan.section {
        Section::Pinned => &mut pinned,
        Section::InProgress => &mut in_progress,
        Section::Completed => &mut completed,
    };
    move_element(target, plan.from, plan.to);

    let mut reassembled = Vec::with_capacity(total);
    reassembled.extend(pinned);
    reassembled.extend(in_progress);
    reassembled.extend(completed);
    reassembled
}

/// Removes the element at `from` and reinserts it at `to`.
///
/// Out-of-range indices leave `items` unchanged.
pub fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::{
        apply_reorder, display_cmp, move_element, sections, ManualSections, ReorderPlan,
        SectionLengths,
    };
    use crate::model::project::{Project, Section};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn project(title: &str, created_secs: i64, pinned: bool, completed: bool) -> Project {
        let mut project = Project::with_id(
            Uuid::new_v4(),
            title,
            Utc.timestamp_opt(created_secs, 0).unwrap(),
        );
        project.pinned = pinned;
        project.completed = completed;
        project
    }

    fn titles(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn locate_walks_cumulative_section_lengths() {
        let lengths = SectionLengths {
            pinned: 1,
            in_progress: 2,
            completed: 3,
        };
        assert_eq!(lengths.locate(0), Some((Section::Pinned, 0)));
        assert_eq!(lengths.locate(1), Some((Section::InProgress, 0)));
        assert_eq!(lengths.locate(2), Some((Section::InProgress, 1)));
        assert_eq!(lengths.locate(3), Some((Section::Completed, 0)));
        assert_eq!(lengths.locate(5), Some((Section::Completed, 2)));
        assert_eq!(lengths.locate(6), None);
    }

    #[test]
    fn locate_skips_empty_sections() {
        let lengths = SectionLengths {
            pinned: 0,
            in_progress: 0,
            completed: 2,
        };
        assert_eq!(lengths.locate(0), Some((Section::Completed, 0)));
    }

    #[test]
    fn resolve_clamps_destination_into_source_section() {
        let lengths = SectionLengths {
            pinned: 1,
            in_progress: 2,
            completed: 2,
        };

        let down = ReorderPlan::resolve(lengths, 1, 4).unwrap();
        assert_eq!(down.section, Section::InProgress);
        assert_eq!((down.from, down.to, down.clamped), (0, 1, true));

        let up = ReorderPlan::resolve(lengths, 4, 0).unwrap();
        assert_eq!(up.section, Section::Completed);
        assert_eq!((up.from, up.to, up.clamped), (1, 0, true));

        let inside = ReorderPlan::resolve(lengths, 2, 1).unwrap();
        assert_eq!((inside.from, inside.to, inside.clamped), (1, 0, false));

        assert!(ReorderPlan::resolve(lengths, 5, 0).is_none());
    }

    #[test]
    fn display_cmp_applies_pin_then_completion_then_recency() {
        let mut projects = vec![
            project("old-open", 10, false, false),
            project("pinned-done", 5, true, true),
            project("new-done", 40, false, true),
            project("new-open", 30, false, false),
            project("pinned-open", 1, true, false),
        ];
        projects.sort_by(display_cmp);
        assert_eq!(
            titles(&projects),
            vec!["pinned-open", "pinned-done", "new-open", "old-open", "new-done"]
        );
    }

    fn flat_titles<'a>(projects: &'a [Project], manual: &ManualSections) -> Vec<&'a str> {
        sections(projects, manual)
            .flatten()
            .into_iter()
            .map(|p| p.title.as_str())
            .collect()
    }

    #[test]
    fn sections_sort_newest_first_unless_manually_arranged() {
        let projects = vec![
            project("a", 1, false, false),
            project("b", 2, true, false),
            project("c", 3, false, true),
            project("d", 4, false, false),
        ];

        assert_eq!(
            flat_titles(&projects, &ManualSections::default()),
            vec!["b", "d", "a", "c"]
        );
        let manual = [Section::InProgress].into_iter().collect::<ManualSections>();
        assert_eq!(flat_titles(&projects, &manual), vec!["b", "a", "d", "c"]);
        assert_eq!(sections(&projects, &manual).len(), 4);
    }

    #[test]
    fn apply_reorder_moves_within_section_only() {
        let projects = vec![
            project("pin", 9, true, false),
            project("a", 3, false, false),
            project("b", 2, false, false),
            project("c", 1, false, false),
            project("done", 0, false, true),
        ];
        let manual = ManualSections::default();
        let plan = ReorderPlan::resolve(sections(&projects, &manual).lengths(), 1, 3).unwrap();
        let reordered = apply_reorder(projects, plan, &manual);
        assert_eq!(titles(&reordered), vec!["pin", "b", "c", "a", "done"]);
    }

    #[test]
    fn apply_reorder_indexes_the_sorted_section() {
        // Stored oldest first; displayed newest first.
        let projects = vec![
            project("old", 1, false, false),
            project("mid", 2, false, false),
            project("new", 3, false, false),
        ];
        let manual = ManualSections::default();
        let plan = ReorderPlan::resolve(sections(&projects, &manual).lengths(), 0, 2).unwrap();
        let reordered = apply_reorder(projects, plan, &manual);
        assert_eq!(titles(&reordered), vec!["mid", "old", "new"]);
    }

    #[test]
    fn manual_sections_track_marks() {
        let mut manual = ManualSections::default();
        assert!(manual.mark(Section::Completed));
        assert!(!manual.mark(Section::Completed));
        assert!(manual.mark(Section::Pinned));
        assert_eq!(
            manual.iter().collect::<Vec<_>>(),
            vec![Section::Pinned, Section::Completed]
        );
        assert!(manual.unmark(Section::Pinned));
        assert!(!manual.unmark(Section::Pinned));
        assert!(manual.clear());
        assert!(manual.is_empty());
        assert!(!manual.clear());
    }

    #[test]
    fn move_element_ignores_out_of_range() {
        let mut items = vec![1, 2, 3];
        move_element(&mut items, 0, 2);
        assert_eq!(items, vec![2, 3, 1]);
        move_element(&mut items, 5, 0);
        assert_eq!(items, vec![2, 3, 1]);
    }
}

//! Dependent-field cascade: a parent selection narrows a child option set.
//!
//! The prescription form uses this to offer only the diagnoses of the selected patient.
//!
//! ```text
//! no parent selected      -> options = [] (plus any pinned child)
//! parent selected, loaded -> options = children where parent_id == selected
//! ```
//!
//! Options are recomputed from the *current* state on every call to [`Cascade::options`], so a
//! change of parent can never leave options computed for an earlier selection behind.

use crate::join::Loadable;
use crate::models::{BelongsTo, Diagnosis, Identified, RecordId};
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct Cascade<C> {
    children: Loadable<Vec<C>>,
    parent: Option<RecordId>,
    pinned: Option<C>,
}

impl<C> Default for Cascade<C> {
    fn default() -> Self {
        Self {
            children: Loadable::Loading,
            parent: None,
            pinned: None,
        }
    }
}

impl<C: BelongsTo + Identified + Clone> Cascade<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the side collection once it has been fetched.
    pub fn set_children(&mut self, children: Vec<C>) {
        self.children = Loadable::Loaded(children);
    }

    pub fn select_parent(&mut self, parent: RecordId) {
        self.parent = Some(parent);
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Apply a raw form value for the parent field. Anything that is not an id clears it.
    pub fn select_parent_str(&mut self, raw: &str) {
        match raw.parse::<RecordId>() {
            Ok(id) => self.select_parent(id),
            Err(_) => self.clear_parent(),
        }
    }

    /// Keep `child` selectable while the cascade catches up.
    ///
    /// On edit screens the record's current child is fetched on its own; it stays in the option
    /// set even before the side collection arrives.
    pub fn pin(&mut self, child: C) {
        self.pinned = Some(child);
    }

    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }

    pub fn is_ready(&self) -> bool {
        self.children.is_loaded()
    }

    pub fn options(&self) -> Vec<&C> {
        let mut options: Vec<&C> = match (self.parent, &self.children) {
            (Some(parent), Loadable::Loaded(children)) => children
                .iter()
                .filter(|child| child.parent_id() == parent)
                .collect(),
            _ => Vec::new(),
        };

        if let Some(pinned) = &self.pinned {
            if !options.iter().any(|c| c.id() == pinned.id()) {
                options.push(pinned);
            }
        }

        options
    }

    /// Whether `id` is currently selectable.
    pub fn offers(&self, id: RecordId) -> bool {
        self.options().iter().any(|c| c.id() == id)
    }
}

/// A selectable condition on the prescription form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosisOption {
    pub id: RecordId,
    pub condition: String,
}

impl From<&Diagnosis> for DiagnosisOption {
    fn from(d: &Diagnosis) -> Self {
        Self {
            id: d.id,
            condition: d.condition.clone(),
        }
    }
}

pub type DiagnosisCascade = Cascade<Diagnosis>;

impl DiagnosisCascade {
    pub fn diagnosis_options(&self) -> Vec<DiagnosisOption> {
        self.options().into_iter().map(DiagnosisOption::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::diagnosis;

    fn loaded_cascade() -> DiagnosisCascade {
        let mut cascade = DiagnosisCascade::new();
        cascade.set_children(vec![
            diagnosis(10, 3, "Flu"),
            diagnosis(11, 4, "Cold"),
            diagnosis(12, 3, "Asthma"),
        ]);
        cascade
    }

    #[test]
    fn test_no_parent_means_no_options() {
        let cascade = loaded_cascade();
        assert!(cascade.diagnosis_options().is_empty());
    }

    #[test]
    fn test_options_filtered_by_selected_patient() {
        let mut cascade = DiagnosisCascade::new();
        cascade.set_children(vec![diagnosis(10, 3, "Flu"), diagnosis(11, 4, "Cold")]);
        cascade.select_parent_str("3");

        assert_eq!(
            cascade.diagnosis_options(),
            vec![DiagnosisOption {
                id: RecordId::new(10),
                condition: "Flu".into()
            }]
        );
    }

    #[test]
    fn test_reselecting_a_parent_leaves_no_residue() {
        let mut cascade = loaded_cascade();
        cascade.select_parent(RecordId::new(3));
        let first = cascade.diagnosis_options();

        cascade.select_parent(RecordId::new(4));
        assert_eq!(cascade.diagnosis_options().len(), 1);

        cascade.select_parent(RecordId::new(3));
        assert_eq!(cascade.diagnosis_options(), first);
    }

    #[test]
    fn test_selection_before_children_arrive() {
        let mut cascade = DiagnosisCascade::new();
        cascade.select_parent(RecordId::new(3));
        assert!(cascade.options().is_empty());
        assert!(!cascade.is_ready());

        cascade.set_children(vec![diagnosis(10, 3, "Flu")]);
        assert!(cascade.offers(RecordId::new(10)));
    }

    #[test]
    fn test_non_numeric_parent_clears_selection() {
        let mut cascade = loaded_cascade();
        cascade.select_parent(RecordId::new(3));
        cascade.select_parent_str("");
        assert_eq!(cascade.parent(), None);
        assert!(cascade.options().is_empty());
    }

    #[test]
    fn test_pinned_child_is_merged_without_duplicates() {
        let mut cascade = DiagnosisCascade::new();
        cascade.pin(diagnosis(12, 3, "Asthma"));
        assert!(cascade.offers(RecordId::new(12)), "pinned before load");

        cascade.set_children(vec![diagnosis(10, 3, "Flu"), diagnosis(12, 3, "Asthma")]);
        cascade.select_parent(RecordId::new(3));
        let ids: Vec<u64> = cascade.options().iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![10, 12]);

        cascade.unpin();
        cascade.select_parent(RecordId::new(4));
        assert!(cascade.options().is_empty());
    }
}

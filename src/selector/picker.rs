//! Template list state: filtering, preselection, confirm/cancel

use crate::erp::{PrintTemplate, TemplateId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("no print templates to choose from")]
    NoTemplates,
    #[error("no template is selected")]
    NothingSelected,
    #[error("the selection was already cancelled")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Open,
    Confirmed { template: TemplateId, remember: bool },
    Cancelled,
}

/// Filterable single-select list of print templates
#[derive(Debug, Clone)]
pub struct TemplatePicker {
    templates: Vec<PrintTemplate>,
    preselect: Option<TemplateId>,
    filter: String,
    /// Indices into `templates` passing the filter, in list order
    visible: Vec<usize>,
    selected: Option<TemplateId>,
    remember: bool,
    state: PickerState,
}

impl TemplatePicker {
    /// Open the list; fails right away when there is nothing to pick
    pub fn open(
        templates: Vec<PrintTemplate>,
        preselect: Option<TemplateId>,
        remember_by_default: bool,
    ) -> Result<Self, PickerError> {
        if templates.is_empty() {
            return Err(PickerError::NoTemplates);
        }
        let mut picker = Self {
            visible: (0..templates.len()).collect(),
            templates,
            preselect,
            filter: String::new(),
            selected: None,
            remember: remember_by_default,
            state: PickerState::Open,
        };
        picker.apply_preselection();
        Ok(picker)
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PickerState::Open
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Templates passing the current filter
    pub fn visible(&self) -> impl Iterator<Item = &PrintTemplate> {
        self.visible.iter().map(|&i| &self.templates[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected(&self) -> Option<TemplateId> {
        self.selected
    }

    /// Row of the selection among the visible templates
    pub fn selected_row(&self) -> Option<usize> {
        let selected = self.selected?;
        self.visible().position(|t| t.id == selected)
    }

    pub fn remember(&self) -> bool {
        self.remember
    }

    pub fn set_remember(&mut self, remember: bool) {
        if self.is_open() {
            self.remember = remember;
        }
    }

    /// Narrow the list: substring of the name (any case) or of the id
    pub fn set_filter(&mut self, text: &str) {
        if !self.is_open() {
            return;
        }
        self.filter = text.to_string();
        let query = text.trim().to_lowercase();
        self.visible = self
            .templates
            .iter()
            .enumerate()
            .filter(|(_, t)| matches_query(t, &query))
            .map(|(i, _)| i)
            .collect();
        self.apply_preselection();
    }

    /// Select a visible template; ignored for hidden ids
    pub fn select(&mut self, id: TemplateId) -> bool {
        if !self.is_open() || !self.visible().any(|t| t.id == id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Confirm the current selection
    ///
    /// Confirming again after success returns the same template.
    pub fn confirm(&mut self) -> Result<TemplateId, PickerError> {
        match self.state {
            PickerState::Confirmed { template, .. } => Ok(template),
            PickerState::Cancelled => Err(PickerError::Closed),
            PickerState::Open => {
                let template = self.selected.ok_or(PickerError::NothingSelected)?;
                self.state = PickerState::Confirmed {
                    template,
                    remember: self.remember,
                };
                Ok(template)
            }
        }
    }

    pub fn cancel(&mut self) {
        if self.is_open() {
            self.state = PickerState::Cancelled;
        }
    }

    /// Remembered template when visible, otherwise the first visible one
    fn apply_preselection(&mut self) {
        let remembered = self
            .preselect
            .filter(|id| self.visible().any(|t| t.id == *id));
        self.selected = remembered.or_else(|| self.visible().next().map(|t| t.id));
    }
}

fn matches_query(template: &PrintTemplate, query: &str) -> bool {
    query.is_empty() || template.name.to_lowercase().contains(query) || template.id.to_string().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<PrintTemplate> {
        vec![
            PrintTemplate::new(1, "A"),
            PrintTemplate::new(2, "B"),
            PrintTemplate::new(3, "C"),
        ]
    }

    fn visible_ids(picker: &TemplatePicker) -> Vec<i64> {
        picker.visible().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_preselects_remembered_template() {
        let picker = TemplatePicker::open(candidates(), Some(TemplateId(2)), true).unwrap();
        assert_eq!(picker.selected(), Some(TemplateId(2)));
        assert_eq!(picker.selected_row(), Some(1));
    }

    #[test]
    fn test_unknown_remembered_template_falls_back_to_first() {
        let picker = TemplatePicker::open(candidates(), Some(TemplateId(99)), true).unwrap();
        assert_eq!(picker.selected(), Some(TemplateId(1)));
    }

    #[test]
    fn test_no_remembered_template_selects_first() {
        let picker = TemplatePicker::open(candidates(), None, false).unwrap();
        assert_eq!(picker.selected(), Some(TemplateId(1)));
        assert!(!picker.remember());
    }

    #[test]
    fn test_empty_candidates_fail_immediately() {
        let err = TemplatePicker::open(Vec::new(), None, true).unwrap_err();
        assert_eq!(err, PickerError::NoTemplates);
    }

    #[test]
    fn test_filter_by_name_is_case_insensitive() {
        let mut picker = TemplatePicker::open(candidates(), None, true).unwrap();
        picker.set_filter("c");
        assert_eq!(visible_ids(&picker), vec![3]);
        assert_eq!(picker.selected(), Some(TemplateId(3)));
    }

    #[test]
    fn test_filter_by_id() {
        let templates = vec![
            PrintTemplate::new(10, "Standard"),
            PrintTemplate::new(21, "Z logo"),
            PrintTemplate::new(102, "Eksport"),
        ];
        let mut picker = TemplatePicker::open(templates, None, true).unwrap();
        picker.set_filter(" 10");
        assert_eq!(visible_ids(&picker), vec![10, 102]);
    }

    #[test]
    fn test_filter_reapplies_preselection() {
        let mut picker = TemplatePicker::open(candidates(), Some(TemplateId(2)), true).unwrap();
        picker.select(TemplateId(3));

        picker.set_filter("");
        assert_eq!(picker.selected(), Some(TemplateId(2)));

        // remembered template filtered out: first visible wins
        picker.set_filter("c");
        assert_eq!(picker.selected(), Some(TemplateId(3)));
    }

    #[test]
    fn test_confirm_without_selection_is_rejected_in_place() {
        let mut picker = TemplatePicker::open(candidates(), None, true).unwrap();
        picker.set_filter("nothing matches");
        assert_eq!(picker.visible_len(), 0);

        assert_eq!(picker.confirm(), Err(PickerError::NothingSelected));
        assert_eq!(picker.state(), PickerState::Open);

        picker.set_filter("b");
        assert_eq!(picker.confirm(), Ok(TemplateId(2)));
    }

    #[test]
    fn test_double_confirm_is_single_confirm() {
        let mut picker = TemplatePicker::open(candidates(), None, true).unwrap();
        picker.select(TemplateId(2));
        assert_eq!(picker.confirm(), Ok(TemplateId(2)));

        // late clicks change nothing
        picker.select(TemplateId(3));
        assert_eq!(picker.confirm(), Ok(TemplateId(2)));
        assert_eq!(
            picker.state(),
            PickerState::Confirmed {
                template: TemplateId(2),
                remember: true
            }
        );
    }

    #[test]
    fn test_cancel() {
        let mut picker = TemplatePicker::open(candidates(), Some(TemplateId(2)), true).unwrap();
        picker.cancel();
        assert_eq!(picker.state(), PickerState::Cancelled);
        assert_eq!(picker.confirm(), Err(PickerError::Closed));
    }

    #[test]
    fn test_select_ignores_hidden_template() {
        let mut picker = TemplatePicker::open(candidates(), None, true).unwrap();
        picker.set_filter("a");
        assert!(!picker.select(TemplateId(2)));
        assert_eq!(picker.selected(), Some(TemplateId(1)));
    }
}

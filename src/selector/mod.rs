//! Per-customer template choice

mod picker;

pub use picker::{PickerError, PickerState, TemplatePicker};

use crate::erp::{CustomerId, PrintTemplate, TemplateId};
use crate::store::TemplateStore;

/// Everything the selector shows for one customer
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub customer_id: CustomerId,
    pub customer_name: &'a str,
    pub templates: &'a [PrintTemplate],
    /// 1-based position among the customers of this batch
    pub position: usize,
    pub total: usize,
    /// Template remembered from an earlier run
    pub preselect: Option<TemplateId>,
    pub remember_by_default: bool,
}

/// Receives the confirmed template when the user asks to remember it
pub trait RememberChoice {
    fn remember(&self, template: TemplateId);
}

/// Interactive choice of one template; `None` means cancelled
pub trait TemplateSelector {
    fn select(&mut self, request: &SelectionRequest<'_>, remember: &dyn RememberChoice) -> Option<TemplateId>;
}

/// Remember callback bound to one customer of the store
#[derive(Debug, Clone, Copy)]
pub struct RememberForCustomer<'a> {
    store: &'a TemplateStore,
    customer: CustomerId,
}

impl<'a> RememberForCustomer<'a> {
    pub fn new(store: &'a TemplateStore, customer: CustomerId) -> Self {
        Self { store, customer }
    }
}

impl RememberChoice for RememberForCustomer<'_> {
    fn remember(&self, template: TemplateId) {
        match self.store.set(self.customer, template) {
            Ok(()) => tracing::info!("Remembered template {template} for customer {}", self.customer),
            Err(e) => tracing::warn!("Could not remember template for customer {}: {e:#}", self.customer),
        }
    }
}

/// Run a finished picker's side effect and extract its result
///
/// The remember callback fires exactly once, and only for a confirmation
/// with the remember flag set.
pub fn finish(picker: &TemplatePicker, remember: &dyn RememberChoice) -> Option<TemplateId> {
    match picker.state() {
        PickerState::Confirmed {
            template,
            remember: true,
        } => {
            remember.remember(template);
            Some(template)
        }
        PickerState::Confirmed { template, .. } => Some(template),
        PickerState::Open | PickerState::Cancelled => None,
    }
}

//! Batch of selected documents: one template choice per customer, then one job per document

use crate::erp::catalog::{CustomerNames, TemplateNames};
use crate::erp::{CustomerId, Destination, ErpDocument, PrintTemplate, TemplateId};
use crate::filename::safe_filename;
use crate::selector::{RememberForCustomer, SelectionRequest, TemplateSelector};
use crate::store::TemplateStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Where the documents of a run go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print on a named printer, `None` for the system default
    Printer { name: Option<String>, copies: u32 },
    /// Export each document to `<dir>/<number>.pdf`
    Directory(PathBuf),
}

impl OutputTarget {
    pub fn destination_for(&self, display_number: &str) -> Destination {
        match self {
            Self::Printer { name, copies } => Destination::Printer {
                name: name.clone(),
                copies: *copies,
            },
            Self::Directory(dir) => Destination::File(dir.join(format!("{}.pdf", safe_filename(display_number)))),
        }
    }
}

/// Template chosen per customer; `None` means the prompt was cancelled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerSelection(HashMap<CustomerId, Option<TemplateId>>);

impl CustomerSelection {
    pub fn template_for(&self, customer: CustomerId) -> Option<TemplateId> {
        self.0.get(&customer).copied().flatten()
    }

    pub fn insert(&mut self, customer: CustomerId, template: Option<TemplateId>) {
        self.0.insert(customer, template);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome counts of a dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fixed pause between jobs so the print pipeline keeps up
pub struct Pacing<'p> {
    delay: Duration,
    pause: Box<dyn FnMut(Duration) + 'p>,
}

impl<'p> Pacing<'p> {
    pub fn none() -> Self {
        Self::seconds(0)
    }

    pub fn seconds(seconds: u64) -> Self {
        Self::with_pause(Duration::from_secs(seconds), std::thread::sleep)
    }

    pub fn with_pause(delay: Duration, pause: impl FnMut(Duration) + 'p) -> Self {
        Self {
            delay,
            pause: Box::new(pause),
        }
    }

    fn wait(&mut self) {
        if !self.delay.is_zero() {
            tracing::info!("  ... waiting {} s ...", self.delay.as_secs());
            (self.pause)(self.delay);
        }
    }
}

/// Reference data shared by both phases of a run
pub struct Batch<'a> {
    templates: &'a [PrintTemplate],
    template_names: TemplateNames,
    customers: &'a CustomerNames,
    store: &'a TemplateStore,
}

impl<'a> Batch<'a> {
    pub fn new(templates: &'a [PrintTemplate], customers: &'a CustomerNames, store: &'a TemplateStore) -> Self {
        Self {
            templates,
            template_names: templates.iter().collect(),
            customers,
            store,
        }
    }

    /// Ask once per distinct customer, in order of first appearance
    pub fn resolve_templates<D: ErpDocument>(
        &self,
        documents: &[D],
        selector: &mut dyn TemplateSelector,
    ) -> CustomerSelection {
        let customers = distinct_customers(documents);
        let total = customers.len();
        let mut selection = CustomerSelection::default();

        for (i, customer) in customers.into_iter().enumerate() {
            let name = self.customers.name(customer);
            tracing::info!("Choosing template for {name} (ID: {customer}) ({}/{total})", i + 1);

            let request = SelectionRequest {
                customer_id: customer,
                customer_name: &name,
                templates: self.templates,
                position: i + 1,
                total,
                preselect: self.store.get(customer),
                remember_by_default: true,
            };
            let remember = RememberForCustomer::new(self.store, customer);
            let chosen = selector.select(&request, &remember);

            match chosen {
                Some(template) => tracing::info!("Chosen: {}", self.template_names.name(template)),
                None => tracing::info!("Cancelled"),
            }
            selection.insert(customer, chosen);
        }
        selection
    }

    /// Print or export every document with its customer's template
    ///
    /// A failing document is logged and counted; the batch goes on.
    pub fn dispatch<D: ErpDocument>(
        &self,
        documents: &[D],
        selection: &CustomerSelection,
        target: &OutputTarget,
        pacing: &mut Pacing<'_>,
    ) -> BatchReport {
        let total = documents.len();
        let mut report = BatchReport::default();

        for (i, document) in documents.iter().enumerate() {
            let position = i + 1;
            let number = document
                .display_number()
                .unwrap_or_else(|_| "<bez numeru>".to_string());

            let template = match document.customer_id() {
                Ok(customer) => selection.template_for(customer),
                Err(e) => {
                    tracing::warn!("Skipping {number}: cannot read its customer: {e}");
                    report.failed += 1;
                    continue;
                }
            };
            let Some(template) = template else {
                tracing::warn!("Skipping {number}: no template chosen");
                report.skipped += 1;
                continue;
            };

            let template_name = self.template_names.name(template);
            let destination = target.destination_for(&number);
            match &destination {
                Destination::File(path) => tracing::info!(
                    "Exporting ({position}/{total}) {number} with template {template_name} to {}",
                    path.display()
                ),
                Destination::Printer { .. } => {
                    tracing::info!("Printing ({position}/{total}) {number} with template {template_name}")
                }
            }

            match document.print(template, &destination) {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    tracing::warn!("Failed to process {number}: {e}");
                    report.failed += 1;
                }
            }

            if position < total {
                pacing.wait();
            }
        }

        tracing::info!(
            "Done: {} processed, {} skipped, {} failed",
            report.processed,
            report.skipped,
            report.failed
        );
        report
    }

    /// Both phases back to back
    pub fn run<D: ErpDocument>(
        &self,
        documents: &[D],
        selector: &mut dyn TemplateSelector,
        target: &OutputTarget,
        pacing: &mut Pacing<'_>,
    ) -> BatchReport {
        let selection = self.resolve_templates(documents, selector);
        self.dispatch(documents, &selection, target, pacing)
    }
}

/// Customer ids in order of first appearance
pub fn distinct_customers<D: ErpDocument>(documents: &[D]) -> Vec<CustomerId> {
    let mut customers: Vec<CustomerId> = Vec::new();
    for document in documents {
        match document.customer_id() {
            Ok(customer) if !customers.contains(&customer) => customers.push(customer),
            Ok(_) => {}
            Err(e) => tracing::warn!("Cannot read the customer of a document: {e}"),
        }
    }
    customers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_printer_destination() {
        let target = OutputTarget::Printer {
            name: Some("HP LaserJet".into()),
            copies: 1,
        };
        assert_eq!(
            target.destination_for("FS 1/2024"),
            Destination::Printer {
                name: Some("HP LaserJet".into()),
                copies: 1
            }
        );
    }

    #[test]
    fn test_directory_destination_sanitizes_number() {
        let target = OutputTarget::Directory(PathBuf::from("wydruki"));
        assert_eq!(
            target.destination_for("FS 1/03/2024"),
            Destination::File(Path::new("wydruki").join("FS_1_03_2024.pdf"))
        );
    }

    #[test]
    fn test_cancelled_customer_has_no_template() {
        let mut selection = CustomerSelection::default();
        selection.insert(CustomerId(1), Some(TemplateId(5)));
        selection.insert(CustomerId(2), None);

        assert_eq!(selection.template_for(CustomerId(1)), Some(TemplateId(5)));
        assert_eq!(selection.template_for(CustomerId(2)), None);
        assert_eq!(selection.template_for(CustomerId(3)), None);
    }
}

//! End-to-end runs against a logged-in ERP session

use crate::batch::{Batch, BatchReport, OutputTarget, Pacing};
use crate::erp::catalog::{fetch_customers, fetch_templates, CustomerNames};
use crate::erp::{DocumentFilter, DocumentKind, ErpSession, PrintTemplate};
use crate::redate::{change_issue_dates, RedatePlan, RedateReport};
use crate::selector::TemplateSelector;
use crate::store::TemplateStore;
use anyhow::{Context, Result};

/// Reference data plus the documents the user ticked
pub struct InvoiceBatch<D> {
    pub templates: Vec<PrintTemplate>,
    pub customers: CustomerNames,
    pub documents: Vec<D>,
}

/// Log the session, read the catalogs and let the user pick invoices
pub fn load_invoice_batch<S: ErpSession>(session: &S) -> Result<InvoiceBatch<S::Document>> {
    log_session(session);

    let templates = fetch_templates(session, DocumentKind::SalesInvoice).context("Failed to read print templates")?;
    let customers = fetch_customers(session).context("Failed to read customers")?;
    tracing::info!("{} templates, {} customers", templates.len(), customers.len());

    let documents = select_documents(session, DocumentKind::SalesInvoice)?;
    Ok(InvoiceBatch {
        templates,
        customers,
        documents,
    })
}

/// Choose templates per customer, then print or export every invoice
///
/// `pacing` is asked for after the template prompts, right before the first job.
pub fn run_invoice_batch<'p, S: ErpSession>(
    session: &S,
    store: &TemplateStore,
    selector: &mut dyn TemplateSelector,
    target: &OutputTarget,
    pacing: impl FnOnce() -> Pacing<'p>,
) -> Result<BatchReport> {
    let data = load_invoice_batch(session)?;
    if data.documents.is_empty() {
        tracing::info!("No documents selected");
        return Ok(BatchReport::default());
    }

    let batch = Batch::new(&data.templates, &data.customers, store);
    let selection = batch.resolve_templates(&data.documents, selector);
    let mut pacing = pacing();
    Ok(batch.dispatch(&data.documents, &selection, target, &mut pacing))
}

/// Move the issue date of the ticked MM documents
pub fn run_date_change<S: ErpSession>(session: &S, plan: &RedatePlan) -> Result<RedateReport> {
    log_session(session);

    let kind = DocumentKind::WarehouseTransfer;
    let documents = select_documents(session, kind)?;
    if documents.is_empty() {
        tracing::info!("No documents selected");
        return Ok(RedateReport::default());
    }
    Ok(change_issue_dates(&documents, plan, kind.number_prefix()))
}

fn select_documents<S: ErpSession>(session: &S, kind: DocumentKind) -> Result<Vec<S::Document>> {
    let filter = DocumentFilter::previous_month(kind);
    tracing::info!(
        "Opening the document window ({}-{:02}); tick the documents and press OK",
        filter.period.year,
        filter.period.month
    );
    let documents = session
        .select_documents(&filter)
        .context("Document selection failed")?;
    tracing::info!("{} documents selected", documents.len());
    Ok(documents)
}

fn log_session<S: ErpSession>(session: &S) {
    match session.info() {
        Ok(info) => tracing::info!(
            "Subiekt GT Sfera {}, database: {} ({})",
            info.version,
            info.database,
            info.server
        ),
        Err(e) => tracing::debug!("Session details unavailable: {e}"),
    }
}

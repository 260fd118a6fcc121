//! Subiekt GT office tools - per-customer print templates, batch printing and PDF export
//!
//! # Tools
//! - Printing and PDF export of sales invoices with a template remembered per customer
//! - Moving the issue date of warehouse transfer (MM) documents
//! - Printing every PDF in a folder
//! - Launcher window starting the tools as separate processes

pub mod batch;
pub mod config;
pub mod erp;
pub mod filename;
pub mod gui;
pub mod logging;
pub mod printers;
pub mod redate;
pub mod selector;
pub mod store;
pub mod tool;
pub mod workflow;

pub use erp::{CustomerId, PrintTemplate, TemplateId};
pub use store::TemplateStore;

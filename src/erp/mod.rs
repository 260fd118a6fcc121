//! ERP boundary - the narrow surface of Subiekt GT (Sfera) this crate talks to

pub mod catalog;
mod error;
pub mod period;

#[cfg(windows)]
mod com;
#[cfg(windows)]
mod sfera;

pub use error::ErpError;
pub use period::Period;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Row returned by a catalog query, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Customer identifier (`kh_Id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

/// Print template identifier (`wzw_Id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Print template as listed in the ERP catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrintTemplate {
    #[serde(rename = "wzw_Id")]
    pub id: TemplateId,
    #[serde(rename = "wzw_Nazwa")]
    pub name: String,
}

impl PrintTemplate {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: TemplateId(id),
            name: name.into(),
        }
    }
}

/// Document types understood by the ERP selection window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Faktura sprzedaży (FS)
    SalesInvoice,
    /// Przesunięcie międzymagazynowe (MM)
    WarehouseTransfer,
}

impl DocumentKind {
    /// Value of the selection window's `FiltrTyp`
    pub fn filter_code(self) -> i32 {
        match self {
            Self::SalesInvoice => 2,
            Self::WarehouseTransfer => 9,
        }
    }

    /// Template type name in `wy_Typ`
    pub fn template_type_name(self) -> &'static str {
        match self {
            Self::SalesInvoice => "Faktura sprzedaży",
            Self::WarehouseTransfer => "Przesunięcie międzymagazynowe",
        }
    }

    /// Prefix of the full document number
    pub fn number_prefix(self) -> &'static str {
        match self {
            Self::SalesInvoice => "FS",
            Self::WarehouseTransfer => "MM",
        }
    }
}

/// What the selection window is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFilter {
    pub kind: DocumentKind,
    pub period: Period,
}

impl DocumentFilter {
    /// Documents of `kind` from the previous calendar month
    pub fn previous_month(kind: DocumentKind) -> Self {
        Self {
            kind,
            period: Period::previous_month(),
        }
    }
}

/// Where a single document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Named printer, `None` for the system default
    Printer { name: Option<String>, copies: u32 },
    /// Export to a file
    File(PathBuf),
}

/// Export format code passed to `DrukujDoPlikuWgWzorca`; 0 is PDF
pub const EXPORT_FORMAT_PDF: i32 = 0;

/// Document handle owned by the ERP for the duration of a run
pub trait ErpDocument {
    fn customer_id(&self) -> Result<CustomerId, ErpError>;
    fn display_number(&self) -> Result<String, ErpError>;
    fn net_value(&self) -> Result<f64, ErpError>;
    fn issue_date(&self) -> Result<NaiveDate, ErpError>;
    fn set_issue_date(&self, date: NaiveDateTime) -> Result<(), ErpError>;
    fn save(&self) -> Result<(), ErpError>;

    /// Print or export the document with a given template
    fn print(&self, template: TemplateId, destination: &Destination) -> Result<(), ErpError>;
}

/// Version and database details reported after login
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    pub version: String,
    pub database: String,
    pub server: String,
}

/// Logged-in ERP session
pub trait ErpSession {
    type Document: ErpDocument;

    fn info(&self) -> Result<SessionInfo, ErpError>;

    /// Run a read-only SQL statement on the ERP database
    fn query(&self, sql: &str) -> Result<Vec<Row>, ErpError>;

    /// Open the ERP selection window and return what the user ticked
    fn select_documents(&self, filter: &DocumentFilter) -> Result<Vec<Self::Document>, ErpError>;

    fn logoff(&mut self) -> Result<(), ErpError>;
}

/// Logs the session off when dropped, on every exit path
pub struct SessionGuard<S: ErpSession> {
    session: S,
}

impl<S: ErpSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: ErpSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.logoff() {
            Ok(()) => tracing::info!("Logged off from the ERP"),
            Err(e) => tracing::debug!("Logoff failed: {e}"),
        }
    }
}

/// Connection settings for Subiekt GT
#[derive(Debug, Clone)]
pub struct ErpConfig {
    pub server: String,
    pub sql_login: String,
    pub sql_password: String,
    pub database: String,
    pub operator: String,
    pub operator_password: String,
}

impl ErpConfig {
    /// Read `SFERA_*` variables, falling back to the demo database
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        Self {
            server: var("SFERA_SQL_SERVER", "127.0.0.1"),
            sql_login: var("SFERA_SQL_LOGIN", "sa"),
            sql_password: var("SFERA_SQL_PASSWORD", ""),
            database: var("SFERA_SQL_DB", "sfera_demo"),
            operator: var("SFERA_OPERATOR", "admin"),
            operator_password: var("SFERA_OPERATOR_PASSWORD", ""),
        }
    }
}

#[cfg(windows)]
pub use sfera::{SferaDocument, SferaSession};

/// Session type available on this platform
#[cfg(windows)]
pub type PlatformSession = SferaSession;

/// Session type available on this platform
#[cfg(not(windows))]
pub type PlatformSession = unsupported::NoSession;

/// Log in to Subiekt GT through Sfera
pub fn connect(config: &ErpConfig) -> Result<PlatformSession, ErpError> {
    #[cfg(windows)]
    {
        SferaSession::login(config)
    }
    #[cfg(not(windows))]
    {
        let _ = config;
        Err(ErpError::Unsupported)
    }
}

#[cfg(not(windows))]
mod unsupported {
    use super::*;

    /// Uninhabited: Sfera only exists on Windows
    pub enum NoSession {}

    impl ErpDocument for NoSession {
        fn customer_id(&self) -> Result<CustomerId, ErpError> {
            match *self {}
        }
        fn display_number(&self) -> Result<String, ErpError> {
            match *self {}
        }
        fn net_value(&self) -> Result<f64, ErpError> {
            match *self {}
        }
        fn issue_date(&self) -> Result<NaiveDate, ErpError> {
            match *self {}
        }
        fn set_issue_date(&self, _date: NaiveDateTime) -> Result<(), ErpError> {
            match *self {}
        }
        fn save(&self) -> Result<(), ErpError> {
            match *self {}
        }
        fn print(&self, _template: TemplateId, _destination: &Destination) -> Result<(), ErpError> {
            match *self {}
        }
    }

    impl ErpSession for NoSession {
        type Document = NoSession;

        fn info(&self) -> Result<SessionInfo, ErpError> {
            match *self {}
        }
        fn query(&self, _sql: &str) -> Result<Vec<Row>, ErpError> {
            match *self {}
        }
        fn select_documents(&self, _filter: &DocumentFilter) -> Result<Vec<NoSession>, ErpError> {
            match *self {}
        }
        fn logoff(&mut self) -> Result<(), ErpError> {
            match *self {}
        }
    }
}

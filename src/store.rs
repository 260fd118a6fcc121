//! Remembered print template per customer, kept in a small CSV file

use crate::erp::{CustomerId, TemplateId};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Header record of the mapping file
const HEADER: [&str; 2] = ["kh_id", "wzw_id"];

/// Folder under the local application data directory
const APP_FOLDER: &str = "Subiektowe";
const FILE_NAME: &str = "wzorce_kontrahentow.csv";

pub type TemplateMapping = BTreeMap<CustomerId, TemplateId>;

/// Customer → template mapping stored in `kh_id,wzw_id` records
///
/// Every update is a full read-modify-write without locking: two processes
/// writing at the same time can lose one update.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `path`, or at the per-user default location
    pub fn at(path: Option<PathBuf>) -> Self {
        Self::new(path.unwrap_or_else(default_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole mapping
    ///
    /// A missing or unreadable file yields an empty mapping; the prompt must
    /// never be blocked by a broken store.
    pub fn load(&self) -> TemplateMapping {
        if !self.path.exists() {
            return TemplateMapping::new();
        }
        match read_mapping(&self.path) {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!("Ignoring template store {}: {e:#}", self.path.display());
                TemplateMapping::new()
            }
        }
    }

    /// Replace the file with `mapping` atomically
    pub fn save(&self, mapping: &TemplateMapping) -> Result<()> {
        let staged = self.stage(mapping)?;
        // a failed persist hands the temp file back; dropping it deletes it
        staged
            .persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn get(&self, customer: CustomerId) -> Option<TemplateId> {
        self.load().get(&customer).copied()
    }

    pub fn set(&self, customer: CustomerId, template: TemplateId) -> Result<()> {
        let mut mapping = self.load();
        mapping.insert(customer, template);
        self.save(&mapping)
    }

    /// Write the full mapping to a temp file next to the target
    fn stage(&self, mapping: &TemplateMapping) -> Result<NamedTempFile> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix("wzorce_")
            .suffix(".csv")
            .tempfile_in(&dir)
            .with_context(|| format!("Failed to create a temp file in {}", dir.display()))?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(HEADER)?;
            for (customer, template) in mapping {
                writer.write_record([customer.0.to_string(), template.0.to_string()])?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

/// `%LOCALAPPDATA%\Subiektowe\wzorce_kontrahentow.csv`, falling back to the working directory
pub fn default_path() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join(APP_FOLDER)
        .join(FILE_NAME)
}

fn read_mapping(path: &Path) -> Result<TemplateMapping> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut mapping = TemplateMapping::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            // malformed records are skipped
            Err(_) => continue,
        };
        if let Some((customer, template)) = parse_record(&record) {
            mapping.insert(customer, template);
        }
    }
    Ok(mapping)
}

fn parse_record(record: &csv::StringRecord) -> Option<(CustomerId, TemplateId)> {
    let first = record.get(0)?.trim_start_matches('\u{feff}');
    if first == HEADER[0] {
        return None;
    }
    let customer = first.parse().ok()?;
    let template = record.get(1)?.parse().ok()?;
    Some((CustomerId(customer), TemplateId(template)))
}

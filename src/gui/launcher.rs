//! Launcher window: one button per tool, each started as its own process

use anyhow::{bail, Context, Result};
use eframe::egui;
use egui::{Align, Layout, RichText};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Optional override of the button list, next to the executable
pub const CONFIG_FILE: &str = "launcher.json";

const COLUMNS: usize = 2;

/// A launchable tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LauncherEntry {
    pub id: String,
    pub label: String,
    /// Executable; relative paths resolve against the launcher's folder
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl LauncherEntry {
    fn sibling(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            program: PathBuf::from(id),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LauncherConfig {
    apps: Vec<LauncherEntry>,
}

/// The tools shipped next to the launcher
pub fn default_entries() -> Vec<LauncherEntry> {
    vec![
        LauncherEntry::sibling("print-invoices", "Drukowanie FS"),
        LauncherEntry::sibling("export-invoices", "Eksport FS do PDF"),
        LauncherEntry::sibling("change-mm-dates", "Zmiana dat dokumentów MM"),
        LauncherEntry::sibling("print-pdfs", "Drukowanie PDF-ów z folderu"),
    ]
}

/// Entries from `launcher.json` in `base_dir`, the defaults when it is absent
pub fn load_entries(base_dir: &Path) -> Result<Vec<LauncherEntry>> {
    let path = base_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(default_entries());
    }
    let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: LauncherConfig =
        serde_json::from_str(&text).with_context(|| format!("Invalid launcher config {}", path.display()))?;
    Ok(config.apps)
}

/// Absolute program path, with the platform's executable suffix added when missing
pub fn resolve_program(base_dir: &Path, program: &Path) -> PathBuf {
    let path = if program.is_absolute() {
        program.to_path_buf()
    } else {
        base_dir.join(program)
    };
    if path.extension().is_none() && !std::env::consts::EXE_SUFFIX.is_empty() {
        path.with_extension(std::env::consts::EXE_EXTENSION)
    } else {
        path
    }
}

/// Start a tool detached from the launcher; returns its process id
pub fn launch(entry: &LauncherEntry, base_dir: &Path) -> Result<u32> {
    let program = resolve_program(base_dir, &entry.program);
    if !program.exists() {
        bail!("Nie znaleziono programu: {}", program.display());
    }
    let cwd = entry
        .cwd
        .clone()
        .or_else(|| program.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| base_dir.to_path_buf());

    let mut command = Command::new(&program);
    command.args(&entry.args).current_dir(&cwd).envs(&entry.env);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
        command.creation_flags(CREATE_NEW_CONSOLE);
    }

    let child = command
        .spawn()
        .with_context(|| format!("Nie udało się uruchomić {}", program.display()))?;
    tracing::info!("Started {} ({}), pid {}", entry.label, program.display(), child.id());
    Ok(child.id())
}

pub struct LauncherApp {
    base_dir: PathBuf,
    entries: Vec<LauncherEntry>,
}

impl LauncherApp {
    pub fn new(base_dir: PathBuf) -> Self {
        let entries = load_entries(&base_dir).unwrap_or_else(|e| {
            tracing::error!("{e:#}");
            super::message(rfd::MessageLevel::Error, "Błąd konfiguracji", &format!("{e:#}"));
            default_entries()
        });
        Self { base_dir, entries }
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("close").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Zamknij").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(RichText::new("Wybierz aplikację:").size(15.0).strong());
            ui.add_space(8.0);

            let width = (ui.available_width() - 8.0 * (COLUMNS as f32 - 1.0)) / COLUMNS as f32;
            egui::Grid::new("apps")
                .num_columns(COLUMNS)
                .spacing([8.0, 8.0])
                .show(ui, |ui| {
                    for (i, entry) in self.entries.iter().enumerate() {
                        let button = egui::Button::new(&entry.label).min_size(egui::vec2(width, 40.0));
                        if ui.add(button).clicked() {
                            if let Err(e) = launch(entry, &self.base_dir) {
                                tracing::error!("{e:#}");
                                super::message(rfd::MessageLevel::Error, "Błąd uruchamiania", &format!("{e:#}"));
                            }
                        }
                        if (i + 1) % COLUMNS == 0 {
                            ui.end_row();
                        }
                    }
                });
        });
    }
}

/// Folder of the running executable
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Open the launcher window
pub fn run() -> Result<()> {
    super::run_window("Sfera apps launcher", [420.0, 260.0], false, LauncherApp::new(exe_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let entries = load_entries(dir.path()).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["print-invoices", "export-invoices", "change-mm-dates", "print-pdfs"]);
    }

    #[test]
    fn test_config_file_replaces_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"apps": [{"id": "fs", "label": "Drukowanie FS", "program": "tools/print-invoices",
                "args": ["--printer", "HP"], "env": {"SFERA_SQL_DB": "firma"}}]}"#,
        )
        .unwrap();

        let entries = load_entries(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].args, vec!["--printer", "HP"]);
        assert_eq!(entries[0].env.get("SFERA_SQL_DB").map(String::as_str), Some("firma"));
        assert!(entries[0].cwd.is_none());
    }

    #[test]
    fn test_broken_config_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        assert!(load_entries(dir.path()).is_err());
    }

    #[test]
    fn test_relative_program_resolves_against_base() {
        let base = Path::new("/opt/tools");
        let resolved = resolve_program(base, Path::new("print-invoices"));
        assert!(resolved.starts_with(base));
        assert_eq!(resolved.file_stem().unwrap(), "print-invoices");
    }

    #[test]
    fn test_missing_program_is_reported() {
        let dir = tempdir().unwrap();
        let entry = LauncherEntry::sibling("missing-tool", "Brak");
        let err = launch(&entry, dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Nie znaleziono programu"));
    }
}

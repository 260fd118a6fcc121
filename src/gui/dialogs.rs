//! Small modal prompts shown by the ERP tools

use super::theme::Colors;
use crate::redate::{parse_user_date, RedatePlan};
use chrono::NaiveDate;
use eframe::egui;
use egui::{Align, Key, Layout, RichText};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Allowed pause between print jobs, in seconds
pub const DELAY_RANGE: RangeInclusive<u64> = 0..=600;

/// Validate the typed number of seconds
pub fn parse_delay(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Podaj liczbę sekund.".to_string());
    }
    let seconds: u64 = text.parse().map_err(|_| "Wpisz liczbę całkowitą.".to_string())?;
    if !DELAY_RANGE.contains(&seconds) {
        return Err(format!(
            "Podaj wartość {}-{}.",
            DELAY_RANGE.start(),
            DELAY_RANGE.end()
        ));
    }
    Ok(seconds)
}

/// Outcome of a prompt window
#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer<T> {
    Pending,
    Accepted(T),
    Cancelled,
}

impl<T> Answer<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Pending | Self::Cancelled => None,
        }
    }
}

/// Keys and window events every prompt reacts to
struct PromptKeys {
    enter: bool,
    cancel: bool,
}

fn prompt_keys(ctx: &egui::Context) -> PromptKeys {
    ctx.input(|i| PromptKeys {
        enter: i.key_pressed(Key::Enter),
        cancel: i.key_pressed(Key::Escape) || i.viewport().close_requested(),
    })
}

fn ok_cancel(ui: &mut egui::Ui) -> (bool, bool) {
    let mut ok = false;
    let mut cancel = false;
    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
        cancel = ui.button("Anuluj").clicked();
        ok = ui.button("OK").clicked();
    });
    (ok, cancel)
}

struct DelayPrompt<'a> {
    text: String,
    error: Option<String>,
    focus: bool,
    answer: &'a mut Answer<u64>,
}

impl eframe::App for DelayPrompt<'_> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let keys = prompt_keys(ctx);
        let mut submit = keys.enter;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(RichText::new("Ile sekund program ma czekać między drukowaniami?").strong());
            ui.horizontal(|ui| {
                ui.label("Sekundy:");
                let response = ui.add(egui::TextEdit::singleline(&mut self.text).desired_width(60.0));
                if self.focus {
                    response.request_focus();
                    self.focus = false;
                }
                ui.label(format!("(min {}, max {})", DELAY_RANGE.start(), DELAY_RANGE.end()));
            });
            if let Some(error) = &self.error {
                ui.label(RichText::new(error).color(Colors::ERROR));
            }
            ui.add_space(4.0);
            let (ok, cancel) = ok_cancel(ui);
            submit |= ok;
            if cancel {
                *self.answer = Answer::Cancelled;
            }
        });

        if keys.cancel && self.answer.is_pending() {
            *self.answer = Answer::Cancelled;
        }
        if submit && self.answer.is_pending() {
            match parse_delay(&self.text) {
                Ok(seconds) => *self.answer = Answer::Accepted(seconds),
                Err(message) => self.error = Some(message),
            }
        }
        if !self.answer.is_pending() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Pause between print jobs; `None` when the prompt is cancelled
pub fn ask_delay_seconds(default: u64) -> Option<u64> {
    let mut answer = Answer::Pending;
    let prompt = DelayPrompt {
        text: default.to_string(),
        error: None,
        focus: true,
        answer: &mut answer,
    };
    if let Err(e) = super::run_window("Opóźnienie między wydrukami", [400.0, 170.0], true, prompt) {
        tracing::error!("{e:#}");
    }
    answer.accepted()
}

struct DatePrompt<'a> {
    text: String,
    dry_run: bool,
    error: Option<String>,
    focus: bool,
    answer: &'a mut Answer<RedatePlan>,
}

impl eframe::App for DatePrompt<'_> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let keys = prompt_keys(ctx);
        let mut submit = keys.enter;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(RichText::new("Podaj nową datę dla zaznaczonych dokumentów:").strong());
            ui.horizontal(|ui| {
                ui.label("Nowa data:");
                let response = ui.add(egui::TextEdit::singleline(&mut self.text).desired_width(100.0));
                if self.focus {
                    response.request_focus();
                    self.focus = false;
                }
                ui.label(RichText::new("(RRRR-MM-DD)").color(Colors::TEXT_SECONDARY));
            });
            ui.checkbox(&mut self.dry_run, "DRY RUN (symulacja, bez zapisu)");
            if let Some(error) = &self.error {
                ui.label(RichText::new(error).color(Colors::ERROR));
            }
            ui.add_space(4.0);
            let (ok, cancel) = ok_cancel(ui);
            submit |= ok;
            if cancel {
                *self.answer = Answer::Cancelled;
            }
        });

        if keys.cancel && self.answer.is_pending() {
            *self.answer = Answer::Cancelled;
        }
        if submit && self.answer.is_pending() {
            match parse_user_date(&self.text) {
                Ok(new_date) => {
                    *self.answer = Answer::Accepted(RedatePlan {
                        new_date,
                        dry_run: self.dry_run,
                    })
                }
                Err(e) => self.error = Some(e.to_string()),
            }
        }
        if !self.answer.is_pending() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// New issue date plus the dry-run flag; `None` when cancelled
pub fn ask_new_date_and_dry_run(default_date: NaiveDate, default_dry_run: bool) -> Option<RedatePlan> {
    let mut answer = Answer::Pending;
    let prompt = DatePrompt {
        text: default_date.format("%Y-%m-%d").to_string(),
        dry_run: default_dry_run,
        error: None,
        focus: true,
        answer: &mut answer,
    };
    if let Err(e) = super::run_window("Ustawienia zmiany daty dokumentów", [420.0, 190.0], true, prompt) {
        tracing::error!("{e:#}");
    }
    answer.accepted()
}

struct CompletionNotice {
    text: String,
    logs_dir: PathBuf,
}

impl eframe::App for CompletionNotice {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let keys = prompt_keys(ctx);
        let mut done = keys.enter || keys.cancel;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(&self.text);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Otwórz folder logów").clicked() {
                    if let Err(e) = open::that(&self.logs_dir) {
                        tracing::warn!("Cannot open {}: {e}", self.logs_dir.display());
                    }
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    done |= ui.button("OK").clicked();
                });
            });
        });

        if done {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Text of the final notice; names the log folder and the newest file
pub fn completion_text(log_file: Option<&Path>, logs_dir: &Path) -> String {
    let mut text = format!(
        "Operacja zakończona.\nPrzejrzyj logi i naciśnij OK, aby zamknąć program.\n\nLogi znajdziesz w podkatalogu:\n{}",
        logs_dir.display()
    );
    if let Some(name) = log_file.and_then(Path::file_name) {
        text.push_str(&format!("\nNajnowszy plik logu:\n{}", name.to_string_lossy()));
    }
    text
}

/// "Operation complete" window; blocks until acknowledged
pub fn show_completion(log_file: Option<&Path>, fallback_dir: &Path) {
    let logs_dir = log_file
        .and_then(Path::parent)
        .unwrap_or(fallback_dir)
        .to_path_buf();
    let logs_dir = std::fs::canonicalize(&logs_dir).unwrap_or(logs_dir);
    let notice = CompletionNotice {
        text: completion_text(log_file, &logs_dir),
        logs_dir,
    };
    if let Err(e) = super::run_window("Operacja zakończona", [520.0, 220.0], true, notice) {
        tracing::error!("{e:#}");
    }
}

/// Folder for exported PDFs; the default when the picker is dismissed
pub fn choose_output_dir(default_dir: &Path) -> PathBuf {
    rfd::FileDialog::new()
        .set_title("Wybierz folder zapisu")
        .set_directory(default_dir)
        .pick_folder()
        .unwrap_or_else(|| default_dir.to_path_buf())
}

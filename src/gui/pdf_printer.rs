//! Batch PDF printer: every PDF of a folder to one printer

use super::theme::Colors;
use crate::printers::{self, Duplex, Orientation, PrinterError};
use anyhow::Result;
use eframe::egui;
use egui::{Align, Layout, RichText};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

/// What one print run sends where
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub printer: String,
    pub files: Vec<PathBuf>,
    pub duplex: Duplex,
    pub orientation: Orientation,
    pub delay: Duration,
}

/// Send every file, pausing between jobs but not after the last
///
/// A failed file is reported and the run goes on. Returns the number sent.
pub fn run_job(
    job: &PrintJob,
    mut print: impl FnMut(&str, &Path) -> Result<(), PrinterError>,
    mut pause: impl FnMut(Duration),
    mut report: impl FnMut(String),
) -> usize {
    report(format!(
        "Drukarka: {}\nDwustronnie: {:?}\nOrientacja: {:?}\n---",
        job.printer, job.duplex, job.orientation
    ));

    let total = job.files.len();
    let mut sent = 0;
    for (i, file) in job.files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match print(&job.printer, file) {
            Ok(()) => {
                sent += 1;
                report(format!("[{}/{total}] Wysłano: {name}", i + 1));
            }
            Err(e) => report(format!("BŁĄD przy {name}: {e}")),
        }
        if i + 1 < total {
            report(format!(" ... czekam {} sekund ...", job.delay.as_secs()));
            pause(job.delay);
        }
    }
    report("Gotowe.".to_string());
    sent
}

/// Closing mid-run would end the process before the printer settings are restored
fn hold_close(running: bool, close_requested: bool) -> bool {
    running && close_requested
}

enum WorkerEvent {
    Line(String),
    Finished,
}

pub struct PdfPrinterApp {
    folder: String,
    printers: Vec<String>,
    printer: String,
    duplex: Duplex,
    orientation: Orientation,
    recursive: bool,
    delay_seconds: u32,
    log: String,
    running: bool,
    events: Option<Receiver<WorkerEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl Default for PdfPrinterApp {
    fn default() -> Self {
        let mut app = Self {
            folder: String::new(),
            printers: Vec::new(),
            printer: String::new(),
            duplex: Duplex::default(),
            orientation: Orientation::default(),
            recursive: false,
            delay_seconds: 5,
            log: String::new(),
            running: false,
            events: None,
            worker: None,
        };
        app.load_printers();
        app
    }
}

impl PdfPrinterApp {
    fn load_printers(&mut self) {
        self.printers = match printers::list_printers() {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("Cannot list printers: {e}");
                super::message(rfd::MessageLevel::Error, "Błąd drukarek", &e.to_string());
                Vec::new()
            }
        };
        if self.printer.is_empty() {
            if let Some(first) = self.printers.first() {
                self.printer = first.clone();
            }
        }
    }

    fn append(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    fn start(&mut self, ctx: &egui::Context) {
        let folder = PathBuf::from(self.folder.trim());
        if self.folder.trim().is_empty() || !folder.is_dir() {
            super::message(
                rfd::MessageLevel::Warning,
                "Brak folderu",
                "Wybierz poprawny folder z PDF-ami.",
            );
            return;
        }
        if self.printer.is_empty() {
            super::message(rfd::MessageLevel::Warning, "Brak drukarki", "Wybierz drukarkę.");
            return;
        }

        let files = match printers::collect_pdfs(&folder, self.recursive) {
            Ok(files) => files,
            Err(e) => {
                super::message(rfd::MessageLevel::Error, "Błąd folderu", &e.to_string());
                return;
            }
        };
        if files.is_empty() {
            super::message(
                rfd::MessageLevel::Info,
                "Brak plików",
                "Nie znaleziono żadnych PDF-ów w wybranym folderze.",
            );
            return;
        }

        self.log.clear();
        self.append(&format!("Znalezione PDF-y: {}", files.len()));
        tracing::info!("Printing {} PDFs from {} on {}", files.len(), folder.display(), self.printer);

        let job = PrintJob {
            printer: self.printer.clone(),
            files,
            duplex: self.duplex,
            orientation: self.orientation,
            delay: Duration::from_secs(u64::from(self.delay_seconds)),
        };
        let (tx, rx) = channel();
        self.events = Some(rx);
        self.running = true;

        let ctx = ctx.clone();
        self.worker = Some(std::thread::spawn(move || print_worker(job, tx, ctx)));
    }

    fn receive_events(&mut self) {
        let Some(events) = self.events.take() else {
            return;
        };
        let mut finished = false;
        loop {
            match events.try_recv() {
                Ok(WorkerEvent::Line(line)) => self.append(&line),
                Ok(WorkerEvent::Finished) => finished = true,
                Err(TryRecvError::Empty) => break,
                // worker gone without reporting; its guard has already run
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.running = false;
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    tracing::error!("Print worker panicked");
                }
            }
        } else {
            self.events = Some(events);
        }
    }
}

fn print_worker(job: PrintJob, tx: Sender<WorkerEvent>, ctx: egui::Context) {
    let send = |event| {
        let _ = tx.send(event);
        ctx.request_repaint();
    };
    {
        let _prefs = printers::apply_printer_prefs(&job.printer, job.duplex, job.orientation);
        let sent = run_job(&job, printers::print_pdf, std::thread::sleep, |line| {
            tracing::info!("{line}");
            send(WorkerEvent::Line(line));
        });
        tracing::info!("{sent}/{} PDFs sent", job.files.len());
    }
    send(WorkerEvent::Finished);
}

impl eframe::App for PdfPrinterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_events();

        if hold_close(self.running, ctx.input(|i| i.viewport().close_requested())) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.append("Poczekaj na zakończenie drukowania.");
        }

        egui::TopBottomPanel::bottom("buttons").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let start = ui.add_enabled(!self.running, egui::Button::new("Drukuj wszystkie PDF-y"));
                if start.clicked() {
                    self.start(ctx);
                }
                if self.running {
                    ui.spinner();
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.add_enabled(!self.running, egui::Button::new("Zamknij")).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!self.running, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Folder z PDF-ami:");
                    let browse = ui.button("Wybierz…");
                    ui.add(egui::TextEdit::singleline(&mut self.folder).desired_width(f32::INFINITY));
                    if browse.clicked() {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            self.folder = dir.display().to_string();
                        }
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Drukarka:");
                    egui::ComboBox::from_id_salt("printer")
                        .width(360.0)
                        .selected_text(&self.printer)
                        .show_ui(ui, |ui| {
                            for name in &self.printers {
                                ui.selectable_value(&mut self.printer, name.clone(), name);
                            }
                        });
                    if ui.button("Odśwież").clicked() {
                        self.load_printers();
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Dwustronnie:");
                    ui.radio_value(&mut self.duplex, Duplex::Simplex, "Nie");
                    ui.radio_value(&mut self.duplex, Duplex::LongEdge, "Dł. krawędź");
                    ui.radio_value(&mut self.duplex, Duplex::ShortEdge, "Krót. kraw.");
                });
                ui.horizontal(|ui| {
                    ui.label("Orientacja:");
                    ui.radio_value(&mut self.orientation, Orientation::Portrait, "Pion");
                    ui.radio_value(&mut self.orientation, Orientation::Landscape, "Poziom");
                });

                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.recursive, "Skanuj podfoldery (rekurencyjnie)");
                    ui.add_space(16.0);
                    ui.label("Odstęp między zadaniami [s]:");
                    ui.add(egui::DragValue::new(&mut self.delay_seconds).range(0..=10_000));
                });
            });

            ui.separator();
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if self.log.is_empty() {
                        ui.label(RichText::new("Wybierz folder i drukarkę.").color(Colors::TEXT_SECONDARY));
                    } else {
                        ui.add(
                            egui::TextEdit::multiline(&mut self.log.as_str())
                                .font(egui::TextStyle::Monospace)
                                .desired_width(f32::INFINITY),
                        );
                    }
                });
        });
    }
}

/// Open the batch PDF printer window
pub fn run() -> Result<()> {
    super::run_window("Batch PDF Printer", [680.0, 460.0], false, PdfPrinterApp::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn job(files: &[&str]) -> PrintJob {
        PrintJob {
            printer: "HP".to_string(),
            files: files.iter().map(PathBuf::from).collect(),
            duplex: Duplex::LongEdge,
            orientation: Orientation::Portrait,
            delay: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_close_is_held_while_printing() {
        assert!(hold_close(true, true));
        assert!(!hold_close(false, true));
        assert!(!hold_close(true, false));
    }

    #[test]
    fn test_pauses_between_files_only() {
        let pauses = RefCell::new(0);
        let printed = RefCell::new(Vec::new());

        let sent = run_job(
            &job(&["a.pdf", "b.pdf", "c.pdf"]),
            |printer, file| {
                printed.borrow_mut().push((printer.to_string(), file.to_path_buf()));
                Ok(())
            },
            |_| *pauses.borrow_mut() += 1,
            |_| {},
        );

        assert_eq!(sent, 3);
        assert_eq!(*pauses.borrow(), 2);
        assert_eq!(printed.borrow()[0], ("HP".to_string(), PathBuf::from("a.pdf")));
    }

    #[test]
    fn test_failed_file_is_reported_and_run_continues() {
        let mut lines = Vec::new();

        let sent = run_job(
            &job(&["a.pdf", "b.pdf"]),
            |_, file| {
                if file.ends_with("a.pdf") {
                    Err(PrinterError::AcrobatMissing)
                } else {
                    Ok(())
                }
            },
            |_| {},
            |line| lines.push(line),
        );

        assert_eq!(sent, 1);
        assert!(lines.iter().any(|l| l.starts_with("BŁĄD przy a.pdf")));
        assert!(lines.iter().any(|l| l == "[2/2] Wysłano: b.pdf"));
        assert_eq!(lines.last().map(String::as_str), Some("Gotowe."));
    }
}

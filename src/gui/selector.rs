//! Template choice window

use super::theme::Colors;
use crate::erp::TemplateId;
use crate::selector::{finish, PickerError, RememberChoice, SelectionRequest, TemplatePicker, TemplateSelector};
use eframe::egui;
use egui::{Align, Key, Layout, RichText, Sense};
use egui_extras::{Column, TableBuilder};

/// Asks through a modal egui window, one per customer
#[derive(Debug, Default)]
pub struct EguiTemplateSelector;

impl TemplateSelector for EguiTemplateSelector {
    fn select(&mut self, request: &SelectionRequest<'_>, remember: &dyn RememberChoice) -> Option<TemplateId> {
        let mut picker =
            match TemplatePicker::open(request.templates.to_vec(), request.preselect, request.remember_by_default) {
                Ok(picker) => picker,
                Err(e) => {
                    tracing::warn!("Template prompt not shown: {e}");
                    super::message(
                        rfd::MessageLevel::Warning,
                        "Brak wzorców",
                        "Nie znaleziono żadnych wzorców wydruku.",
                    );
                    return None;
                }
            };

        let title = format!("Wybierz wzór wydruku ({}/{})", request.position, request.total);
        let window = PickerWindow {
            picker: &mut picker,
            request,
            feedback: None,
            focus_filter: true,
            scroll_to_selection: true,
        };
        if let Err(e) = super::run_window(&title, [700.0, 520.0], true, window) {
            tracing::error!("{e:#}");
        }

        picker.cancel();
        finish(&picker, remember)
    }
}

struct PickerWindow<'a> {
    picker: &'a mut TemplatePicker,
    request: &'a SelectionRequest<'a>,
    feedback: Option<&'static str>,
    focus_filter: bool,
    scroll_to_selection: bool,
}

impl PickerWindow<'_> {
    fn confirm(&mut self) {
        match self.picker.confirm() {
            Ok(_) => self.feedback = None,
            Err(PickerError::NothingSelected) => self.feedback = Some("Zaznacz wzór z listy."),
            Err(e) => tracing::debug!("Confirm ignored: {e}"),
        }
    }

    /// Arrow keys move the selection within the visible rows
    fn step_selection(&mut self, rows: &[TemplateId], down: bool) {
        let next = match self.picker.selected_row() {
            Some(row) if down => (row + 1).min(rows.len().saturating_sub(1)),
            Some(row) => row.saturating_sub(1),
            None => 0,
        };
        if let Some(&id) = rows.get(next) {
            self.picker.select(id);
            self.scroll_to_selection = true;
        }
    }
}

impl eframe::App for PickerWindow<'_> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (close, enter, escape, up, down) = ctx.input(|i| {
            (
                i.viewport().close_requested(),
                i.key_pressed(Key::Enter),
                i.key_pressed(Key::Escape),
                i.key_pressed(Key::ArrowUp),
                i.key_pressed(Key::ArrowDown),
            )
        });
        if close || escape {
            self.picker.cancel();
        }

        let rows: Vec<(TemplateId, String)> = self.picker.visible().map(|t| (t.id, t.name.clone())).collect();
        let ids: Vec<TemplateId> = rows.iter().map(|(id, _)| *id).collect();
        if up || down {
            self.step_selection(&ids, down);
        }

        egui::TopBottomPanel::bottom("actions").show(ctx, |ui| {
            ui.add_space(6.0);
            let mut remember = self.picker.remember();
            let label = format!("Zapamiętaj wybór dla kontrahenta (ID: {})", self.request.customer_id);
            if ui.checkbox(&mut remember, label).changed() {
                self.picker.set_remember(remember);
            }
            ui.horizontal(|ui| {
                if let Some(text) = self.feedback {
                    ui.label(RichText::new(text).color(Colors::ERROR));
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Anuluj").clicked() {
                        self.picker.cancel();
                    }
                    if ui.button("OK").clicked() {
                        self.confirm();
                    }
                });
            });
            ui.add_space(6.0);
        });

        let mut clicked = None;
        let mut double_clicked = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(
                RichText::new(format!(
                    "Wybierz wzór wydruku dla kontrahenta: \"{}\"",
                    self.request.customer_name
                ))
                .size(15.0)
                .strong(),
            );

            ui.horizontal(|ui| {
                ui.label("Filtruj:");
                let mut text = self.picker.filter().to_string();
                let response = ui.add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY));
                if self.focus_filter {
                    response.request_focus();
                    self.focus_filter = false;
                }
                if response.changed() {
                    self.picker.set_filter(&text);
                    self.feedback = None;
                    self.scroll_to_selection = true;
                }
            });

            let selected_row = self.picker.selected_row();
            let mut table = TableBuilder::new(ui)
                .striped(true)
                .sense(Sense::click())
                .cell_layout(Layout::left_to_right(Align::Center))
                .column(Column::exact(90.0))
                .column(Column::remainder());
            if self.scroll_to_selection {
                if let Some(row) = selected_row {
                    table = table.scroll_to_row(row, Some(Align::Center));
                }
                self.scroll_to_selection = false;
            }

            table
                .header(22.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("ID");
                    });
                    header.col(|ui| {
                        ui.strong("Nazwa wzorca");
                    });
                })
                .body(|body| {
                    body.rows(22.0, rows.len(), |mut row| {
                        let index = row.index();
                        let (id, name) = &rows[index];
                        row.set_selected(selected_row == Some(index));
                        row.col(|ui| {
                            ui.label(id.to_string());
                        });
                        row.col(|ui| {
                            ui.label(name);
                        });
                        let response = row.response();
                        if response.double_clicked() {
                            double_clicked = Some(*id);
                        } else if response.clicked() {
                            clicked = Some(*id);
                        }
                    });
                });
        });

        if let Some(id) = clicked {
            self.picker.select(id);
            self.feedback = None;
        }
        if let Some(id) = double_clicked {
            self.picker.select(id);
            self.confirm();
        }
        if enter {
            self.confirm();
        }

        if !self.picker.is_open() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

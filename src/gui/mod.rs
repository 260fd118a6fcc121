//! egui windows: template choice, small modal prompts, bulk PDF printer, launcher

pub mod dialogs;
pub mod launcher;
pub mod pdf_printer;
mod selector;
mod theme;

pub use selector::EguiTemplateSelector;

use anyhow::Result;
use eframe::egui;

/// Run one window to completion on the calling thread
///
/// The window closes itself through `ViewportCommand::Close`; whatever it
/// decided is left in the state `app` borrows.
pub(crate) fn run_window<'a>(title: &str, size: [f32; 2], on_top: bool, app: impl eframe::App + 'a) -> Result<()> {
    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(size)
        .with_min_inner_size([size[0] * 0.8, size[1] * 0.8])
        .with_title(title)
        .with_active(true);
    if on_top {
        viewport = viewport.with_window_level(egui::WindowLevel::AlwaysOnTop);
    }
    let options = eframe::NativeOptions {
        viewport,
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(|cc| {
            configure(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {e}"))
}

fn configure(ctx: &egui::Context) {
    ctx.set_style(theme::office_theme());

    #[cfg_attr(not(windows), allow(unused_mut))]
    let mut fonts = egui::FontDefinitions::default();

    #[cfg(windows)]
    {
        if let Ok(font_data) = std::fs::read("C:\\Windows\\Fonts\\segoeui.ttf") {
            fonts
                .font_data
                .insert("segoe_ui".to_owned(), egui::FontData::from_owned(font_data).into());
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .insert(0, "segoe_ui".to_owned());
        }
    }

    ctx.set_fonts(fonts);
}

/// Native message box with a single OK button
pub(crate) fn message(level: rfd::MessageLevel, title: &str, text: &str) {
    rfd::MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(text)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

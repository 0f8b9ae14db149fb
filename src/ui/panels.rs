use std::path::PathBuf;

use eframe::egui::{self, Button, Color32, ProgressBar, RichText, ScrollArea, Ui};

use crate::state::{AppState, Axis, LegendView, ViewMode};

/// Requests that need the application shell (threads, dialogs, viewport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    OpenFile(PathBuf),
    CancelLoad,
    SaveImage(PathBuf),
    ExportData(PathBuf),
    Exit,
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the menu bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) -> Option<ShellAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Load CSV…").clicked() {
                action = pick_csv_file().map(ShellAction::OpenFile);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.can_save_image(), Button::new("Save Image…"))
                .clicked()
            {
                action = pick_image_destination().map(ShellAction::SaveImage);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.can_export(), Button::new("Export Filtered Data…"))
                .clicked()
            {
                action = pick_export_destination().map(ShellAction::ExportData);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                action = Some(ShellAction::Exit);
                ui.close_menu();
            }
        });

        ui.menu_button("View", |ui: &mut Ui| {
            let toggle = match state.view_mode {
                ViewMode::Plot2D => "Switch to 3D Mode",
                ViewMode::Plot3D => "Switch to 2D Mode",
            };
            if ui.button(toggle).clicked() {
                state.toggle_view();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.can_reset_view(), Button::new("Reset View"))
                .clicked()
            {
                state.reset_view();
                ui.close_menu();
            }
            ui.checkbox(&mut state.show_legend, "Show Legend");
        });

        if let Some(name) = &state.source_name {
            ui.separator();
            ui.label(format!(
                "{name}: {} rows loaded, {} shown",
                state.table.len(),
                state.displayed.len()
            ));
        }
    });

    action
}

// ---------------------------------------------------------------------------
// Axis selection
// ---------------------------------------------------------------------------

pub fn axis_toolbar(ui: &mut Ui, state: &mut AppState) {
    let headers = state.table.headers.clone();

    ui.horizontal(|ui: &mut Ui| {
        let mut changed = Vec::new();

        ui.label("X Axis:");
        if let Some(col) = axis_combo(ui, "x_axis", state.x_column.as_deref(), &headers) {
            changed.push((Axis::X, col));
        }
        ui.label("Y Axis:");
        if let Some(col) = axis_combo(ui, "y_axis", state.y_column.as_deref(), &headers) {
            changed.push((Axis::Y, col));
        }
        if state.view_mode == ViewMode::Plot3D {
            ui.label("Z Axis:");
            if let Some(col) = axis_combo(ui, "z_axis", state.z_column.as_deref(), &headers) {
                changed.push((Axis::Z, col));
            }
        }

        for (axis, col) in changed {
            state.set_axis(axis, col);
        }
    });
}

/// Column picker.  Returns the newly chosen column, if any.
fn axis_combo(ui: &mut Ui, id: &str, current: Option<&str>, headers: &[String]) -> Option<String> {
    let mut picked = None;
    ui.add_enabled_ui(!headers.is_empty(), |ui: &mut Ui| {
        egui::ComboBox::from_id_salt(id)
            .selected_text(current.unwrap_or(""))
            .show_ui(ui, |ui: &mut Ui| {
                for header in headers {
                    let is_current = current == Some(header.as_str());
                    if ui.selectable_label(is_current, header).clicked() && !is_current {
                        picked = Some(header.clone());
                    }
                }
            });
    });
    picked
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

pub fn status_bar(ui: &mut Ui, state: &AppState) -> Option<ShellAction> {
    let mut action = None;

    ui.horizontal(|ui: &mut Ui| {
        if let Some(progress) = &state.progress {
            ui.add(
                ProgressBar::new(f32::from(progress.percent) / 100.0)
                    .desired_width(220.0)
                    .show_percentage(),
            );
            if ui.button("Cancel").clicked() {
                action = Some(ShellAction::CancelLoad);
            }
            ui.separator();
        }

        match &state.status {
            Some(msg) if msg.is_error => {
                ui.label(RichText::new(&msg.text).color(Color32::RED));
            }
            Some(msg) => {
                ui.label(&msg.text);
            }
            None => {
                ui.label("Ready");
            }
        }
    });

    action
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

pub fn legend_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Legend");
    ui.separator();

    let note = |ui: &mut Ui, text: String| {
        ui.label(RichText::new(text).italics().color(Color32::GRAY));
    };

    match state.legend() {
        LegendView::NotApplicable => note(ui, "Legend not applicable for 3D view.".into()),
        LegendView::NoData => note(ui, "No data to display legend.".into()),
        LegendView::NoEmitterColumn => note(ui, "No emitter column identified.".into()),
        LegendView::ColumnMissing(col) => note(ui, format!("Emitter column '{col}' not found.")),
        LegendView::NoIds => note(ui, "No emitter IDs found in the current data.".into()),
        LegendView::Entries(entries) => {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    for entry in entries {
                        ui.horizontal(|ui: &mut Ui| {
                            ui.label(RichText::new("■").color(entry.color).size(16.0));
                            ui.label(format!("{} ({})", entry.label, entry.id));
                        });
                    }
                });
        }
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn pick_csv_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open CSV File")
        .add_filter("CSV files", &["csv"])
        .add_filter("All files", &["*"])
        .pick_file()
}

pub fn pick_image_destination() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Plot Image")
        .add_filter("PNG image", &["png"])
        .add_filter("JPEG image", &["jpg", "jpeg"])
        .set_file_name("plot.png")
        .save_file()
}

pub fn pick_export_destination() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Filtered Data")
        .add_filter("CSV files", &["csv"])
        .set_file_name("filtered_data.csv")
        .save_file()
}

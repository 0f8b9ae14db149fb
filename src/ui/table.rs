use eframe::egui::{self, Align, Key, Layout, ScrollArea, TextEdit, TextStyle, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Data table with per-column filter inputs
// ---------------------------------------------------------------------------

/// Render the filtered table.  The filter inputs sit in the header above
/// their column; Enter in any of them applies all filters.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Data");
        ui.separator();
        if ui.button("Apply Filters").clicked() {
            state.apply_filters();
        }
        if ui.button("Clear Filters").clicked() {
            state.clear_filters();
        }
        if !state.table.headers.is_empty() {
            ui.separator();
            ui.label(format!(
                "{} of {} rows shown",
                state.displayed.len(),
                state.table.len()
            ));
        }
    });
    ui.separator();

    let headers = state.table.headers.clone();
    if headers.is_empty() {
        ui.label("No data loaded.");
        return;
    }
    let n_cols = headers.len();
    if state.filters.len() != n_cols {
        state.filters.resize(n_cols, String::new());
    }

    let row_height = ui.text_style_height(&TextStyle::Body) + 4.0;
    let mut apply = false;
    let mut clicked_row = None;

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .sense(egui::Sense::click())
            .cell_layout(Layout::left_to_right(Align::Center))
            .column(Column::auto().at_least(40.0))
            .columns(Column::initial(120.0).at_least(40.0).clip(true), n_cols)
            .header(48.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                for (col, name) in headers.iter().enumerate() {
                    header.col(|ui: &mut Ui| {
                        ui.vertical(|ui: &mut Ui| {
                            ui.strong(name);
                            let edit = ui.add(
                                TextEdit::singleline(&mut state.filters[col])
                                    .hint_text("Filter...")
                                    .desired_width(f32::INFINITY),
                            );
                            if edit.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                                apply = true;
                            }
                        });
                    });
                }
            })
            .body(|body| {
                let displayed = &state.displayed;
                let selected = state.selected_row;
                body.rows(row_height, displayed.len(), |mut row| {
                    let idx = row.index();
                    row.set_selected(selected == Some(idx));
                    row.col(|ui: &mut Ui| {
                        ui.label((idx + 1).to_string());
                    });
                    for col in 0..n_cols {
                        row.col(|ui: &mut Ui| {
                            // Short rows leave trailing cells blank.
                            if let Some(cell) = displayed.cell(idx, col) {
                                ui.label(cell);
                            }
                        });
                    }
                    if row.response().clicked() {
                        clicked_row = Some(idx);
                    }
                });
            });
    });

    if apply {
        state.apply_filters();
    }
    if let Some(row) = clicked_row {
        let next = if state.selected_row == Some(row) { None } else { Some(row) };
        state.select_row(next);
    }
}

use std::f32::consts::FRAC_PI_2;

use eframe::egui::{self, epaint::TextShape, Align2, Color32, FontId, Rect, Sense, Stroke, Ui};

use crate::scatter::PlotLayout;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// 2D scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Paint the current scene.  Returns the canvas rect so the shell can crop
/// screenshots to it.
pub fn scatter_plot(ui: &mut Ui, state: &AppState) -> Option<Rect> {
    if state.table.is_empty() && !state.is_loading() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a CSV file to plot it  (File → Load CSV…)");
        });
        return None;
    }

    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let canvas = response.rect;
    let scene = &state.scene;

    let layout = PlotLayout::compute(
        scene,
        canvas,
        &state.plot_colors,
        state.highlighted_point(),
    )?;

    let text_color = ui.visuals().text_color();
    painter.rect_filled(layout.frame, 0.0, Color32::WHITE);
    let border = Stroke::new(1.0, Color32::BLACK);
    let f = layout.frame;
    painter.line_segment([f.left_top(), f.right_top()], border);
    painter.line_segment([f.right_top(), f.right_bottom()], border);
    painter.line_segment([f.right_bottom(), f.left_bottom()], border);
    painter.line_segment([f.left_bottom(), f.left_top()], border);

    painter.text(
        layout.title_rect.center(),
        Align2::CENTER_CENTER,
        &scene.title,
        FontId::proportional(16.0),
        text_color,
    );
    painter.text(
        layout.x_label_rect.center(),
        Align2::CENTER_CENTER,
        &scene.x_label,
        FontId::proportional(13.0),
        text_color,
    );

    // Rotated a quarter turn counter-clockwise around its top-left corner.
    let galley = painter.layout_no_wrap(scene.y_label.clone(), FontId::proportional(13.0), text_color);
    let size = galley.size();
    let anchor = layout.y_label_center + egui::vec2(-size.y / 2.0, size.x / 2.0);
    painter.add(TextShape::new(anchor, galley, text_color).with_angle(-FRAC_PI_2));

    let inside = painter.with_clip_rect(layout.clip);
    for marker in &layout.markers {
        inside.rect_filled(marker.rect, 0.0, marker.color);
    }
    if let Some(ring) = layout.highlight {
        inside.circle_stroke(ring.center(), ring.width() / 2.0, Stroke::new(2.0, Color32::BLACK));
    }

    Some(canvas)
}

// ---------------------------------------------------------------------------
// 3D placeholder
// ---------------------------------------------------------------------------

pub fn placeholder_3d(ui: &mut Ui, state: &AppState) {
    ui.centered_and_justified(|ui: &mut Ui| {
        let z = state.z_column.as_deref().unwrap_or("-");
        ui.heading(format!("3D view is not implemented yet (Z: {z})"));
    });
}

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{pos2, vec2, Color32, Pos2, Rect};
use thiserror::Error;

use crate::color::NEUTRAL_COLOR;
use crate::data::model::{parse_emitter_id, parse_number, CsvTable, NO_EMITTER_ID};

// Margins around the plot frame, in points.
pub const MARGIN_TOP: f32 = 30.0;
pub const MARGIN_BOTTOM: f32 = 50.0;
pub const MARGIN_LEFT: f32 = 60.0;
pub const MARGIN_RIGHT: f32 = 20.0;

/// Side length of a point marker.
pub const MARKER_SIZE: f32 = 4.0;

/// Side length of the ring drawn around the highlighted point.
pub const HIGHLIGHT_SIZE: f32 = 10.0;

pub const DEFAULT_TITLE: &str = "Plot";
pub const DEFAULT_X_LABEL: &str = "X-Axis";
pub const DEFAULT_Y_LABEL: &str = "Y-Axis";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlotError {
    #[error("Column '{0}' not found in the current headers")]
    ColumnNotFound(String),
}

// ---------------------------------------------------------------------------
// Data space
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub emitter_id: i64,
    /// Index of the source row in the displayed table.
    pub row: usize,
}

/// Axis-aligned extent of the plotted points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const UNIT: BoundingBox = BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Bounds of `points`.  An axis with a single distinct value is widened
    /// by 0.5 on each side; no points gives [`BoundingBox::UNIT`].
    pub fn of(points: &[PlotPoint]) -> Self {
        let Some(first) = points.first() else {
            return Self::UNIT;
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        if min_x == max_x {
            min_x -= 0.5;
            max_x += 0.5;
        }
        if min_y == max_y {
            min_y -= 0.5;
            max_y += 0.5;
        }

        let width = max_x - min_x;
        let height = max_y - min_y;
        Self {
            min_x,
            min_y,
            width: if width == 0.0 { 1.0 } else { width },
            height: if height == 0.0 { 1.0 } else { height },
        }
    }

    /// True when the extent cannot be mapped to the screen: empty, or so
    /// wide that it overflows `f64`.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite())
    }
}

/// Turn the rows of `table` into plot points.
///
/// Rows too short for either axis, and rows whose axis cells are not finite
/// numbers, are skipped.  The emitter id is [`NO_EMITTER_ID`] when there is
/// no emitter column (or the row is too short for it).
pub fn collect_points(
    table: &CsvTable,
    x_column: &str,
    y_column: &str,
    emitter_column: Option<&str>,
) -> Result<Vec<PlotPoint>, PlotError> {
    let x_idx = table
        .column_index(x_column)
        .ok_or_else(|| PlotError::ColumnNotFound(x_column.to_string()))?;
    let y_idx = table
        .column_index(y_column)
        .ok_or_else(|| PlotError::ColumnNotFound(y_column.to_string()))?;
    let emitter_idx = emitter_column.and_then(|name| table.column_index(name));

    let mut points = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let (Some(x_cell), Some(y_cell)) = (row.get(x_idx), row.get(y_idx)) else {
            continue;
        };
        let x = parse_number(x_cell).filter(|v| v.is_finite());
        let y = parse_number(y_cell).filter(|v| v.is_finite());
        let (Some(x), Some(y)) = (x, y) else {
            log::debug!("Skipping row {row_idx}: cannot plot x={x_cell:?} y={y_cell:?}");
            continue;
        };
        let emitter_id = emitter_idx
            .and_then(|idx| row.get(idx))
            .map_or(NO_EMITTER_ID, |cell| parse_emitter_id(cell));

        points.push(PlotPoint {
            x,
            y,
            emitter_id,
            row: row_idx,
        });
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Scene: what the plot shows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlotScene {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<PlotPoint>,
    pub bounds: BoundingBox,
}

impl Default for PlotScene {
    fn default() -> Self {
        Self::empty(DEFAULT_TITLE, DEFAULT_X_LABEL, DEFAULT_Y_LABEL)
    }
}

impl PlotScene {
    pub fn empty(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points: Vec::new(),
            bounds: BoundingBox::UNIT,
        }
    }

    /// Scene shown while the 3D placeholder is active.
    pub fn inactive_3d() -> Self {
        Self::empty("3D View Active", DEFAULT_X_LABEL, DEFAULT_Y_LABEL)
    }

    /// Build the 2D scene for the selected axes.
    ///
    /// A missing axis column does not fail: it produces an empty
    /// "Invalid Columns" scene.
    pub fn build(
        table: &CsvTable,
        x_column: Option<&str>,
        y_column: Option<&str>,
        emitter_column: Option<&str>,
    ) -> Self {
        let (Some(x), Some(y)) = (
            x_column.filter(|s| !s.is_empty()),
            y_column.filter(|s| !s.is_empty()),
        ) else {
            return Self::default();
        };
        if table.rows.is_empty() {
            return Self::default();
        }

        match collect_points(table, x, y, emitter_column) {
            Ok(points) => Self {
                title: format!("2D Plot: {y} vs {x}"),
                x_label: x.to_string(),
                y_label: y.to_string(),
                bounds: BoundingBox::of(&points),
                points,
            },
            Err(e) => {
                log::debug!("{e}");
                Self::empty("Invalid Columns", x, y)
            }
        }
    }

    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }

    /// Distinct emitter ids among the points.
    pub fn emitter_ids(&self) -> BTreeSet<i64> {
        self.points.iter().map(|p| p.emitter_id).collect()
    }

    /// Index of the point produced by table row `row`, if any.
    pub fn point_for_row(&self, row: usize) -> Option<usize> {
        self.points.binary_search_by_key(&row, |p| p.row).ok()
    }
}

// ---------------------------------------------------------------------------
// Screen space
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Already clipped to the frame interior.
    pub rect: Rect,
    pub color: Color32,
}

/// Pixel geometry of a scene inside a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLayout {
    pub frame: Rect,
    /// Frame interior, 1 point inside the border.  Nothing is drawn outside it.
    pub clip: Rect,
    pub title_rect: Rect,
    pub x_label_rect: Rect,
    /// Centre of the rotated y-axis label.
    pub y_label_center: Pos2,
    pub markers: Vec<Marker>,
    pub highlight: Option<Rect>,
}

impl PlotLayout {
    /// Lay out `scene` in `canvas`.  `None` when the canvas is too small to
    /// hold a frame.
    pub fn compute(
        scene: &PlotScene,
        canvas: Rect,
        colors: &BTreeMap<i64, Color32>,
        highlight: Option<usize>,
    ) -> Option<Self> {
        let frame = Rect::from_min_max(
            pos2(canvas.left() + MARGIN_LEFT, canvas.top() + MARGIN_TOP),
            pos2(canvas.right() - MARGIN_RIGHT, canvas.bottom() - MARGIN_BOTTOM),
        );
        if frame.width() < 1.0 || frame.height() < 1.0 {
            return None;
        }
        let clip = frame.shrink(1.0);

        let mut layout = Self {
            frame,
            clip,
            title_rect: Rect::from_min_max(canvas.min, pos2(canvas.right(), canvas.top() + MARGIN_TOP)),
            x_label_rect: Rect::from_min_size(
                pos2(frame.left(), canvas.bottom() - MARGIN_BOTTOM + 15.0),
                vec2(frame.width(), MARGIN_BOTTOM - 15.0),
            ),
            y_label_center: pos2(canvas.left() + MARGIN_LEFT - 35.0, frame.center().y),
            markers: Vec::new(),
            highlight: None,
        };

        if scene.points.is_empty() || scene.bounds.is_degenerate() {
            return Some(layout);
        }

        layout.markers = scene
            .points
            .iter()
            .filter_map(|p| {
                let center = to_screen(frame, &scene.bounds, p.x, p.y);
                let rect = Rect::from_center_size(center, vec2(MARKER_SIZE, MARKER_SIZE)).intersect(clip);
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return None;
                }
                let color = colors.get(&p.emitter_id).copied().unwrap_or(NEUTRAL_COLOR);
                Some(Marker { rect, color })
            })
            .collect();

        layout.highlight = highlight.and_then(|idx| scene.points.get(idx)).map(|p| {
            let center = to_screen(frame, &scene.bounds, p.x, p.y);
            Rect::from_center_size(center, vec2(HIGHLIGHT_SIZE, HIGHLIGHT_SIZE))
        });

        Some(layout)
    }
}

/// Map a data-space coordinate into `frame`.  Larger y is nearer the top.
pub fn to_screen(frame: Rect, bounds: &BoundingBox, x: f64, y: f64) -> Pos2 {
    let sx = frame.width() as f64 / bounds.width;
    let sy = frame.height() as f64 / bounds.height;
    pos2(
        (frame.left() as f64 + (x - bounds.min_x) * sx) as f32,
        (frame.bottom() as f64 - (y - bounds.min_y) * sy) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, emitter_id: i64) -> PlotPoint {
        PlotPoint {
            x,
            y,
            emitter_id,
            row: 0,
        }
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(480.0, 380.0))
    }

    #[test]
    fn bounding_box_spans_points() {
        let b = BoundingBox::of(&[point(1.0, 10.0, 0), point(3.0, -2.0, 0)]);
        assert_eq!(
            b,
            BoundingBox {
                min_x: 1.0,
                min_y: -2.0,
                width: 2.0,
                height: 12.0
            }
        );
    }

    #[test]
    fn degenerate_axis_is_widened() {
        let b = BoundingBox::of(&[point(5.0, 1.0, 0), point(5.0, 2.0, 0)]);
        assert_eq!(b.min_x, 4.5);
        assert_eq!(b.width, 1.0);
        assert_eq!(b.height, 1.0);

        let single = BoundingBox::of(&[point(2.0, 2.0, 0)]);
        assert_eq!(single.width, 1.0);
        assert_eq!(single.height, 1.0);
        assert!(!single.is_degenerate());

        assert_eq!(BoundingBox::of(&[]), BoundingBox::UNIT);
    }

    #[test]
    fn overflowing_extent_draws_nothing() {
        let points = vec![point(-1e308, 0.0, 0), point(1e308, 1.0, 0)];
        let scene = PlotScene {
            bounds: BoundingBox::of(&points),
            points,
            ..PlotScene::default()
        };
        assert!(scene.bounds.is_degenerate());
        let layout = PlotLayout::compute(&scene, canvas(), &BTreeMap::new(), Some(0)).unwrap();
        assert!(layout.markers.is_empty());
        assert!(layout.highlight.is_none());
    }

    #[test]
    fn single_x_value_is_centred() {
        let points = vec![point(7.0, 0.0, 0), point(7.0, 5.0, 0), point(7.0, 10.0, 0)];
        let scene = PlotScene {
            bounds: BoundingBox::of(&points),
            points,
            ..PlotScene::default()
        };
        let layout = PlotLayout::compute(&scene, canvas(), &BTreeMap::new(), None).unwrap();
        assert_eq!(layout.markers.len(), 3);
        for m in &layout.markers {
            assert!((m.rect.center().x - layout.frame.center().x).abs() < 1e-3);
        }
    }

    #[test]
    fn y_grows_upwards() {
        let frame = Rect::from_min_size(pos2(10.0, 20.0), vec2(100.0, 50.0));
        let b = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(to_screen(frame, &b, 0.0, 0.0), pos2(10.0, 70.0));
        assert_eq!(to_screen(frame, &b, 10.0, 10.0), pos2(110.0, 20.0));
        assert!(to_screen(frame, &b, 5.0, 8.0).y < to_screen(frame, &b, 5.0, 2.0).y);
    }

    #[test]
    fn markers_stay_inside_frame_interior() {
        let points = vec![point(0.0, 0.0, 1), point(100.0, 50.0, 2), point(50.0, 25.0, 3)];
        let scene = PlotScene {
            bounds: BoundingBox::of(&points),
            points,
            ..PlotScene::default()
        };
        let layout = PlotLayout::compute(&scene, canvas(), &BTreeMap::new(), None).unwrap();
        assert_eq!(layout.clip, layout.frame.shrink(1.0));
        assert_eq!(layout.markers.len(), 3);
        for m in &layout.markers {
            assert!(layout.clip.contains_rect(m.rect));
        }
        // The centre point is not clipped.
        assert_eq!(layout.markers[2].rect.size(), vec2(MARKER_SIZE, MARKER_SIZE));
    }

    #[test]
    fn marker_colours_come_from_map_or_neutral() {
        let points = vec![point(0.0, 0.0, 1), point(1.0, 1.0, 9)];
        let scene = PlotScene {
            bounds: BoundingBox::of(&points),
            points,
            ..PlotScene::default()
        };
        let colors = BTreeMap::from([(1, Color32::BLUE)]);
        let layout = PlotLayout::compute(&scene, canvas(), &colors, None).unwrap();
        assert_eq!(layout.markers[0].color, Color32::BLUE);
        assert_eq!(layout.markers[1].color, NEUTRAL_COLOR);
    }

    #[test]
    fn empty_scene_has_frame_but_no_markers() {
        let layout = PlotLayout::compute(&PlotScene::default(), canvas(), &BTreeMap::new(), Some(0)).unwrap();
        assert!(layout.markers.is_empty());
        assert!(layout.highlight.is_none());
        assert_eq!(layout.frame.left(), MARGIN_LEFT);
        assert_eq!(layout.frame.bottom(), 380.0 - MARGIN_BOTTOM);
    }

    #[test]
    fn tiny_canvas_has_no_layout() {
        let tiny = Rect::from_min_size(Pos2::ZERO, vec2(50.0, 50.0));
        assert!(PlotLayout::compute(&PlotScene::default(), tiny, &BTreeMap::new(), None).is_none());
    }

    #[test]
    fn highlight_follows_point() {
        let points = vec![point(0.0, 0.0, 1), point(10.0, 10.0, 1)];
        let scene = PlotScene {
            bounds: BoundingBox::of(&points),
            points,
            ..PlotScene::default()
        };
        let layout = PlotLayout::compute(&scene, canvas(), &BTreeMap::new(), Some(1)).unwrap();
        let ring = layout.highlight.unwrap();
        assert_eq!(ring.center(), pos2(layout.frame.right(), layout.frame.top()));
    }

    #[test]
    fn collect_points_skips_bad_rows() {
        let t = table(
            &["x", "y", "emitter_id"],
            &[
                &["1", "2", "3"],
                &["oops", "2", "3"],
                &["4", "5", "radar"],
                &["6"],
                &["7", "8"],
                &["inf", "1", "0"],
            ],
        );
        let points = collect_points(&t, "x", "y", Some("emitter_id")).unwrap();
        assert_eq!(
            points,
            vec![
                PlotPoint { x: 1.0, y: 2.0, emitter_id: 3, row: 0 },
                PlotPoint { x: 4.0, y: 5.0, emitter_id: -2, row: 2 },
                PlotPoint { x: 7.0, y: 8.0, emitter_id: -1, row: 4 },
            ]
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let t = table(&["x", "y"], &[&["1", "2"]]);
        assert_eq!(
            collect_points(&t, "x", "z", None),
            Err(PlotError::ColumnNotFound("z".to_string()))
        );
    }

    #[test]
    fn scene_titles() {
        let t = table(&["a", "b"], &[&["1", "2"], &["3", "4"]]);

        let scene = PlotScene::build(&t, Some("a"), Some("b"), None);
        assert_eq!(scene.title, "2D Plot: b vs a");
        assert_eq!(scene.points.len(), 2);
        assert_eq!(scene.emitter_ids(), BTreeSet::from([-1]));

        let invalid = PlotScene::build(&t, Some("a"), Some("gone"), None);
        assert_eq!(invalid.title, "Invalid Columns");
        assert_eq!(invalid.y_label, "gone");
        assert!(!invalid.has_points());

        assert_eq!(PlotScene::build(&t, None, Some("b"), None), PlotScene::default());
        let no_rows = table(&["a", "b"], &[]);
        assert_eq!(PlotScene::build(&no_rows, Some("a"), Some("b"), None), PlotScene::default());
    }

    #[test]
    fn rows_map_to_points() {
        let t = table(&["a", "b"], &[&["1", "2"], &["x", "4"], &["5", "6"]]);
        let scene = PlotScene::build(&t, Some("a"), Some("b"), None);
        assert_eq!(scene.point_for_row(0), Some(0));
        assert_eq!(scene.point_for_row(1), None);
        assert_eq!(scene.point_for_row(2), Some(1));
    }
}

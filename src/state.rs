use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;

use crate::color::{EmitterColorRegistry, LegendEntry};
use crate::data::filter::{apply_filters, empty_filters, FilterSpec};
use crate::data::loader::{LoadError, LoadEvent, LoadProgress};
use crate::data::model::{parse_emitter_id, CsvTable};
use crate::scatter::PlotScene;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Plot2D,
    /// Placeholder only; nothing is rendered in 3D.
    Plot3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// What the legend panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum LegendView {
    NotApplicable,
    NoData,
    NoEmitterColumn,
    ColumnMissing(String),
    NoIds,
    Entries(Vec<LegendEntry>),
}

/// First header containing `keyword`, ignoring case.
pub fn detect_emitter_column(headers: &[String], keyword: &str) -> Option<String> {
    let keyword = keyword.to_lowercase();
    headers
        .iter()
        .find(|h| h.to_lowercase().contains(&keyword))
        .cloned()
}

/// Emitter ids of `table` in first-seen row order, one entry per row that
/// reaches the emitter column.
fn emitter_ids_in_order<'a>(table: &'a CsvTable, column: &str) -> impl Iterator<Item = i64> + 'a {
    let idx = table.column_index(column);
    table
        .rows
        .iter()
        .filter_map(move |row| idx.and_then(|i| row.get(i)))
        .map(|cell| parse_emitter_id(cell))
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Last successfully loaded table.
    pub table: CsvTable,

    /// `table` after the current filters.
    pub displayed: CsvTable,

    /// Filter text per column of `table`.
    pub filters: FilterSpec,

    pub registry: EmitterColorRegistry,

    /// Header keyword used to find the emitter column after a load.
    pub emitter_keyword: String,
    pub emitter_column: Option<String>,

    pub x_column: Option<String>,
    pub y_column: Option<String>,
    /// Only shown in 3D mode; has no effect.
    pub z_column: Option<String>,

    pub view_mode: ViewMode,

    /// Scene derived from `displayed` and the axis selection.
    pub scene: PlotScene,

    /// Colours for every emitter id in `scene`.
    pub plot_colors: BTreeMap<i64, Color32>,

    /// Selected row of `displayed`.
    pub selected_row: Option<usize>,

    pub show_legend: bool,

    /// File name of the loaded table.
    pub source_name: Option<String>,

    /// Status / error message shown in the UI.
    pub status: Option<StatusMessage>,

    /// Latest progress while a load is running.
    pub progress: Option<LoadProgress>,
}

impl AppState {
    pub fn new(registry: EmitterColorRegistry, emitter_keyword: &str) -> Self {
        Self {
            table: CsvTable::default(),
            displayed: CsvTable::default(),
            filters: Vec::new(),
            registry,
            emitter_keyword: emitter_keyword.to_string(),
            emitter_column: None,
            x_column: None,
            y_column: None,
            z_column: None,
            view_mode: ViewMode::Plot2D,
            scene: PlotScene::default(),
            plot_colors: BTreeMap::new(),
            selected_row: None,
            show_legend: true,
            source_name: None,
            status: None,
            progress: None,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn is_loading(&self) -> bool {
        self.progress.is_some()
    }

    // -- Loading --------------------------------------------------------

    pub fn begin_loading(&mut self, file_name: &str) {
        self.progress = Some(LoadProgress {
            percent: 0,
            rows: 0,
            message: "Starting...".to_string(),
        });
        self.set_status(format!("Loading CSV: {file_name}"));
    }

    /// The worker for `file_name` could not be started.  Any progress left
    /// over from a replaced load is dropped along with it.
    pub fn loading_not_started(&mut self, file_name: &str, error: &std::io::Error) {
        self.progress = None;
        self.set_error(format!("Could not start loading {file_name}: {error}"));
    }

    /// Apply one event from the loader.  `file_name` names the file the
    /// loader is reading.
    pub fn handle_load_event(&mut self, event: LoadEvent, file_name: &str) {
        match event {
            LoadEvent::Progress(p) => {
                self.set_status(format!("Loading... {}% ({})", p.percent, p.message));
                self.progress = Some(p);
            }
            LoadEvent::Finished(table) => self.set_table(table, file_name),
            LoadEvent::Failed(e) => self.load_failed(&e),
            LoadEvent::Cancelled => {
                self.progress = None;
                self.set_status("Loading cancelled.");
            }
        }
    }

    /// Install a freshly loaded table: reset filters, axes, emitter column
    /// and colours, then rebuild the plot.
    pub fn set_table(&mut self, table: CsvTable, file_name: &str) {
        self.filters = empty_filters(&table);
        self.emitter_column = detect_emitter_column(&table.headers, &self.emitter_keyword);
        self.x_column = table.headers.first().cloned();
        self.y_column = table.headers.get(1).or(table.headers.first()).cloned();
        self.z_column = table.headers.get(2).or(table.headers.first()).cloned();

        self.registry.reset();
        if let Some(col) = &self.emitter_column {
            log::debug!("Emitter column identified: {col}");
            for id in emitter_ids_in_order(&table, col) {
                self.registry.color_for(id);
            }
        }

        self.set_status(format!("CSV loaded: {} rows from {file_name}", table.len()));
        self.source_name = Some(file_name.to_string());
        self.displayed = table.clone();
        self.table = table;
        self.selected_row = None;
        self.progress = None;
        self.refresh_plot();
    }

    /// Drop everything loaded and report `error`.
    pub fn load_failed(&mut self, error: &LoadError) {
        self.table.clear();
        self.displayed.clear();
        self.filters.clear();
        self.emitter_column = None;
        self.x_column = None;
        self.y_column = None;
        self.z_column = None;
        self.selected_row = None;
        self.source_name = None;
        self.progress = None;
        self.set_error(format!("Error loading CSV: {error}"));
        self.refresh_plot();
    }

    // -- Filtering ------------------------------------------------------

    pub fn apply_filters(&mut self) {
        self.displayed = apply_filters(&self.table, &self.filters);
        self.selected_row = None;
        self.refresh_plot();
        self.set_status(format!(
            "{} of {} rows match the filters",
            self.displayed.len(),
            self.table.len()
        ));
    }

    pub fn clear_filters(&mut self) {
        for f in &mut self.filters {
            f.clear();
        }
        self.displayed = self.table.clone();
        self.selected_row = None;
        self.refresh_plot();
    }

    // -- Plot -----------------------------------------------------------

    pub fn set_axis(&mut self, axis: Axis, column: String) {
        match axis {
            Axis::X => self.x_column = Some(column),
            Axis::Y => self.y_column = Some(column),
            Axis::Z => self.z_column = Some(column),
        }
        if axis != Axis::Z {
            self.refresh_plot();
        }
    }

    /// Rebuild `scene` and `plot_colors` from the current state.
    pub fn refresh_plot(&mut self) {
        self.scene = match self.view_mode {
            ViewMode::Plot3D => PlotScene::inactive_3d(),
            ViewMode::Plot2D => PlotScene::build(
                &self.displayed,
                self.x_column.as_deref(),
                self.y_column.as_deref(),
                self.emitter_column.as_deref(),
            ),
        };
        self.plot_colors = self.registry.color_map(self.scene.emitter_ids());
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Plot2D => ViewMode::Plot3D,
            ViewMode::Plot3D => ViewMode::Plot2D,
        };
        self.refresh_plot();
    }

    pub fn reset_view(&mut self) {
        self.refresh_plot();
        self.set_status("Plot view reset.");
    }

    pub fn select_row(&mut self, row: Option<usize>) {
        self.selected_row = row.filter(|r| *r < self.displayed.len());
    }

    /// Point index of the selected row, when that row was plotted.
    pub fn highlighted_point(&self) -> Option<usize> {
        self.selected_row
            .and_then(|row| self.scene.point_for_row(row))
    }

    // -- Action availability -------------------------------------------

    pub fn can_save_image(&self) -> bool {
        self.view_mode == ViewMode::Plot2D && self.scene.has_points()
    }

    pub fn can_reset_view(&self) -> bool {
        self.can_save_image()
    }

    pub fn can_export(&self) -> bool {
        !self.displayed.rows.is_empty()
    }

    // -- Legend ---------------------------------------------------------

    pub fn legend(&mut self) -> LegendView {
        if self.view_mode == ViewMode::Plot3D {
            return LegendView::NotApplicable;
        }
        if self.displayed.rows.is_empty() {
            return LegendView::NoData;
        }
        let Some(column) = self.emitter_column.clone() else {
            return LegendView::NoEmitterColumn;
        };
        if self.displayed.column_index(&column).is_none() {
            return LegendView::ColumnMissing(column);
        }

        let ids: BTreeSet<i64> = emitter_ids_in_order(&self.displayed, &column).collect();
        if ids.is_empty() {
            return LegendView::NoIds;
        }
        LegendView::Entries(self.registry.legend_entries(ids))
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use eframe::egui::{self, Rect};

use crate::color::EmitterColorRegistry;
use crate::config::ViewerConfig;
use crate::data::export::export_csv;
use crate::data::loader::{CsvLoader, LoadLimits};
use crate::state::{AppState, ViewMode};
use crate::ui::panels::{self, ShellAction};
use crate::ui::snapshot::save_plot_image;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CsvVisorApp {
    pub state: AppState,
    limits: LoadLimits,

    /// At most one load runs at a time.
    loader: Option<CsvLoader>,
    loading_name: String,

    /// Destination of a requested screenshot, until the frame arrives.
    pending_image: Option<PathBuf>,

    /// Where the scatter plot was painted last frame.
    plot_rect: Option<Rect>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl CsvVisorApp {
    pub fn new(
        ctx: &egui::Context,
        config: &ViewerConfig,
        labels: BTreeMap<i64, String>,
        initial_file: Option<PathBuf>,
    ) -> Self {
        let mut app = Self {
            state: AppState::new(EmitterColorRegistry::new(labels), &config.emitter_keyword),
            limits: config.load_limits(),
            loader: None,
            loading_name: String::new(),
            pending_image: None,
            plot_rect: None,
        };
        if let Some(path) = initial_file {
            app.start_loading(path, ctx);
        }
        app
    }

    /// Start loading `path` in the background, replacing any load in flight.
    pub fn start_loading(&mut self, path: PathBuf, ctx: &egui::Context) {
        if let Some(mut previous) = self.loader.take() {
            log::info!("Cancelling load of {}", previous.path().display());
            previous.cancel_and_wait();
        }

        let name = display_name(&path);
        let repaint = ctx.clone();
        match CsvLoader::spawn(path, self.limits, move || repaint.request_repaint()) {
            Ok(loader) => {
                self.state.begin_loading(&name);
                self.loading_name = name;
                self.loader = Some(loader);
            }
            Err(e) => {
                log::error!("Could not start loader thread: {e}");
                self.state.loading_not_started(&name, &e);
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Feed queued loader events into the state; forget the loader once it
    /// has reported its outcome.
    pub fn poll_loader(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };

        let mut done = false;
        for event in loader.try_events() {
            done |= event.is_terminal();
            self.state.handle_load_event(event, &self.loading_name);
        }
        if done {
            self.loader = None;
        }
    }

    pub fn cancel_loading(&self) {
        if let Some(loader) = &self.loader {
            log::info!("Cancel requested for {}", loader.path().display());
            loader.cancel();
        }
    }

    pub fn export_data(&mut self, path: &Path) {
        match export_csv(&self.state.displayed, path) {
            Ok(()) => self.state.set_status(format!(
                "Filtered data exported to {}",
                display_name(path)
            )),
            Err(e) => {
                log::error!("Export failed: {e}");
                self.state.set_error(format!("Error exporting data: {e}"));
            }
        }
    }

    fn request_image(&mut self, path: PathBuf, ctx: &egui::Context) {
        self.pending_image = Some(path);
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
    }

    /// Save the plot once the requested screenshot has arrived.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.pending_image.is_none() {
            return;
        }
        let image = ctx.input(|i| {
            i.events.iter().rev().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };
        let Some(path) = self.pending_image.take() else {
            return;
        };

        let Some(rect) = self.plot_rect else {
            self.state.set_error("No plot to save.");
            return;
        };
        match save_plot_image(&image, rect, ctx.pixels_per_point(), &path) {
            Ok(()) => self
                .state
                .set_status(format!("Plot saved to {}", display_name(&path))),
            Err(e) => {
                log::error!("{e}");
                self.state.set_error(format!("Error saving image: {e}"));
            }
        }
    }

    fn handle_action(&mut self, action: ShellAction, ctx: &egui::Context) {
        match action {
            ShellAction::OpenFile(path) => self.start_loading(path, ctx),
            ShellAction::CancelLoad => self.cancel_loading(),
            ShellAction::SaveImage(path) => self.request_image(path, ctx),
            ShellAction::ExportData(path) => self.export_data(&path),
            ShellAction::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }
}

impl eframe::App for CsvVisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.handle_screenshot(ctx);

        let mut actions = Vec::new();

        // ---- Top panels: menu bar and axis selection ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            actions.extend(panels::top_bar(ui, &mut self.state));
        });
        egui::TopBottomPanel::top("axis_bar").show(ctx, |ui| {
            panels::axis_toolbar(ui, &mut self.state);
        });

        // ---- Bottom panels: status and data table ----
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            actions.extend(panels::status_bar(ui, &self.state));
        });
        egui::TopBottomPanel::bottom("table_panel")
            .resizable(true)
            .default_height(280.0)
            .show(ctx, |ui| {
                table::data_table(ui, &mut self.state);
            });

        // ---- Right side panel: legend ----
        if self.state.show_legend {
            egui::SidePanel::right("legend_panel")
                .default_width(220.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::legend_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot_rect = match self.state.view_mode {
                ViewMode::Plot2D => plot::scatter_plot(ui, &self.state),
                ViewMode::Plot3D => {
                    plot::placeholder_3d(ui, &self.state);
                    None
                }
            };
        });

        for action in actions {
            self.handle_action(action, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::time::{Duration, Instant};

    fn app(ctx: &egui::Context) -> CsvVisorApp {
        CsvVisorApp::new(ctx, &ViewerConfig::default(), BTreeMap::new(), None)
    }

    fn wait_until_idle(app: &mut CsvVisorApp) {
        let start = Instant::now();
        while app.is_loading() {
            assert!(start.elapsed() < Duration::from_secs(30), "load did not finish");
            app.poll_loader();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn write_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
        let mut text = String::from("x,y,emitter_id\n");
        for i in 0..rows {
            writeln!(text, "{i},{},{}", i * 2, i % 3).unwrap();
        }
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn loads_startup_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "start.csv", 10);
        let ctx = egui::Context::default();

        let mut app = CsvVisorApp::new(&ctx, &ViewerConfig::default(), BTreeMap::new(), Some(path));
        assert!(app.state.is_loading());
        wait_until_idle(&mut app);

        assert_eq!(app.state.table.len(), 10);
        assert_eq!(app.state.source_name.as_deref(), Some("start.csv"));
        assert_eq!(app.state.emitter_column.as_deref(), Some("emitter_id"));
        assert!(!app.state.is_loading());
    }

    #[test]
    fn new_load_replaces_the_running_one() {
        let dir = tempfile::tempdir().unwrap();
        let big = write_csv(dir.path(), "big.csv", 40_000);
        let small = write_csv(dir.path(), "small.csv", 5);
        let ctx = egui::Context::default();
        let mut app = app(&ctx);

        app.start_loading(big, &ctx);
        app.start_loading(small, &ctx);
        wait_until_idle(&mut app);

        assert_eq!(app.state.table.len(), 5);
        assert_eq!(app.state.source_name.as_deref(), Some("small.csv"));
    }

    #[test]
    fn missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut app = app(&ctx);

        app.start_loading(dir.path().join("nope.csv"), &ctx);
        wait_until_idle(&mut app);

        assert!(app.state.table.is_empty());
        let status = app.state.status.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("nope.csv"));
    }

    #[test]
    fn exports_filtered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_csv(dir.path(), "src.csv", 6);
        let ctx = egui::Context::default();
        let mut app = app(&ctx);
        app.start_loading(src, &ctx);
        wait_until_idle(&mut app);

        app.state.filters[2] = "0".to_string();
        app.state.apply_filters();
        let out = dir.path().join("out.csv");
        app.export_data(&out);

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "x,y,emitter_id\n0,0,0\n3,6,0\n");
        assert!(!app.state.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn export_to_bad_path_sets_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut app = app(&ctx);
        app.export_data(&dir.path().join("missing").join("out.csv"));
        assert!(app.state.status.as_ref().unwrap().is_error);
    }
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use super::model::CsvTable;

/// Hard cap on data rows read from one file.
pub const MAX_ROWS: usize = 50_000;

/// Rows between two progress events.
pub const PROGRESS_INTERVAL: usize = 1_000;

// ---------------------------------------------------------------------------
// Errors, limits and events
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File is empty or header could not be read: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("Loading cancelled by user")]
    Cancelled,

    #[error("No data loaded from CSV")]
    NoDataLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    pub max_rows: usize,
    pub progress_interval: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    /// 0..=100, derived from bytes consumed.
    pub percent: u8,
    pub rows: usize,
    pub message: String,
}

/// Everything the worker thread reports back.  `Finished`, `Failed` and
/// `Cancelled` are terminal: exactly one of them is sent per load.
#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Finished(CsvTable),
    Failed(LoadError),
    Cancelled,
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress(_))
    }
}

// ---------------------------------------------------------------------------
// Synchronous reader
// ---------------------------------------------------------------------------

/// Split a line on every `,` and trim each field.  No quote handling: a
/// comma inside quotes is still a separator and `"` is kept verbatim.
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}

fn percent_of(bytes_read: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (bytes_read.saturating_mul(100) / total).min(100) as u8
}

/// Read one line into `buf`, returning the decoded text and the number of
/// bytes consumed (newline included).  `None` at end of file.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<(String, u64)>> {
    buf.clear();
    let n = reader.read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some((String::from_utf8_lossy(buf).into_owned(), n as u64)))
}

/// Parse `path` into a [`CsvTable`].
///
/// The first line is the header.  At most `limits.max_rows` data lines are
/// read; anything after the cap is ignored.  `cancel` is polled once before
/// the first row and then before every row; a cancelled load never returns
/// a partial table.
pub fn read_csv<F>(
    path: &Path,
    cancel: &AtomicBool,
    limits: LoadLimits,
    mut on_progress: F,
) -> Result<CsvTable, LoadError>
where
    F: FnMut(LoadProgress),
{
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }

    let open_err = |source| LoadError::FileOpen {
        path: path.to_path_buf(),
        source,
    };
    if path.is_dir() {
        return Err(open_err(io::Error::new(io::ErrorKind::Other, "is a directory")));
    }
    let file = File::open(path).map_err(open_err)?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::new(file);
    let read_err = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    let mut bytes_read = 0u64;
    let mut table = CsvTable::default();

    match next_line(&mut reader, &mut buf).map_err(read_err)? {
        Some((line, n)) => {
            bytes_read += n;
            table.headers = split_fields(&line);
            on_progress(LoadProgress {
                percent: 0,
                rows: 0,
                message: "Header loaded.".to_string(),
            });
        }
        None => return Err(LoadError::EmptyFile(path.to_path_buf())),
    }

    if cancel.load(Ordering::Acquire) {
        return Err(LoadError::Cancelled);
    }

    let interval = limits.progress_interval.max(1);
    while table.rows.len() < limits.max_rows {
        if cancel.load(Ordering::Acquire) {
            log::info!("Load of {} cancelled after {} rows", path.display(), table.rows.len());
            return Err(LoadError::Cancelled);
        }
        let Some((line, n)) = next_line(&mut reader, &mut buf).map_err(read_err)? else {
            break;
        };
        bytes_read += n;
        table.rows.push(split_fields(&line));

        let rows = table.rows.len();
        if rows % interval == 0 {
            on_progress(LoadProgress {
                percent: percent_of(bytes_read, total),
                rows,
                message: format!("{rows} rows loaded..."),
            });
        }
    }

    // A cancel that lands after the last row still discards the table.
    if cancel.load(Ordering::Acquire) {
        log::info!("Load of {} cancelled after {} rows", path.display(), table.rows.len());
        return Err(LoadError::Cancelled);
    }

    if table.is_empty() {
        return Err(LoadError::NoDataLoaded);
    }

    if !table.rows.is_empty() {
        on_progress(LoadProgress {
            percent: 100,
            rows: table.rows.len(),
            message: format!("Finished loading {} rows.", table.rows.len()),
        });
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Background loader
// ---------------------------------------------------------------------------

/// A load running on its own thread.
///
/// Events arrive on a channel and are drained with [`CsvLoader::try_events`].
/// Dropping the loader cancels it and waits for the thread to exit.
pub struct CsvLoader {
    path: PathBuf,
    cancel: Arc<AtomicBool>,
    events: Receiver<LoadEvent>,
    handle: Option<JoinHandle<()>>,
}

impl CsvLoader {
    /// Start loading `path`.  `wake` is called after every event is queued so
    /// the UI can schedule a repaint.
    pub fn spawn<W>(path: PathBuf, limits: LoadLimits, wake: W) -> io::Result<Self>
    where
        W: Fn() + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, events) = mpsc::channel();

        let worker_cancel = Arc::clone(&cancel);
        let worker_path = path.clone();
        let handle = thread::Builder::new()
            .name("csv-loader".to_string())
            .spawn(move || {
                let send = |event: LoadEvent| {
                    // The receiver is gone when the shell dropped us; nothing to report to.
                    let _ = sender.send(event);
                    wake();
                };

                log::info!("Loading {}", worker_path.display());
                let result = read_csv(&worker_path, &worker_cancel, limits, |p| {
                    send(LoadEvent::Progress(p))
                });
                let event = match result {
                    Ok(table) => {
                        log::info!(
                            "Loaded {} rows x {} columns from {}",
                            table.len(),
                            table.column_count(),
                            worker_path.display()
                        );
                        LoadEvent::Finished(table)
                    }
                    Err(LoadError::Cancelled) => LoadEvent::Cancelled,
                    Err(e) => {
                        log::error!("Failed to load {}: {e}", worker_path.display());
                        LoadEvent::Failed(e)
                    }
                };
                send(event);
            })?;

        Ok(Self {
            path,
            cancel,
            events,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ask the worker to stop at its next poll.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Drain all queued events without blocking.
    pub fn try_events(&self) -> Vec<LoadEvent> {
        self.events.try_iter().collect()
    }

    /// Cancel and block until the worker thread has exited.
    pub fn cancel_and_wait(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Loader thread for {} panicked", self.path.display());
            }
        }
    }
}

impl Drop for CsvLoader {
    fn drop(&mut self) {
        self.cancel_and_wait();
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name searched for when no explicit reference file is configured.
pub const REFERENCE_FILE_NAME: &str = "reference_emitters.txt";

/// Labels used when no reference file can be read.
pub fn default_labels() -> BTreeMap<i64, String> {
    BTreeMap::from([
        (-1, "Noise Source (default)".to_string()),
        (0, "Unknown Emitter (default)".to_string()),
        (1, "Alpha Emitter (default)".to_string()),
    ])
}

/// Parse `name=id` lines.  Lines without exactly one `=` or with a
/// non-integer id are skipped with a warning; blank lines are ignored.
pub fn parse_labels(text: &str) -> BTreeMap<i64, String> {
    let mut labels = BTreeMap::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('=').collect();
        let [name, id] = parts.as_slice() else {
            log::warn!("Reference line {}: expected name=id, got {line:?}", line_no + 1);
            continue;
        };
        match id.trim().parse::<i64>() {
            Ok(id) => {
                labels.insert(id, name.trim().to_string());
            }
            Err(_) => {
                log::warn!("Reference line {}: could not parse emitter id in {line:?}", line_no + 1);
            }
        }
    }
    labels
}

pub fn read_labels(path: &Path) -> Result<BTreeMap<i64, String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading reference labels from {}", path.display()))?;
    Ok(parse_labels(&text))
}

/// Where to look for the reference file, most specific first.
pub fn candidate_paths(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = configured {
        candidates.push(path.to_path_buf());
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(REFERENCE_FILE_NAME));
    }
    candidates.push(PathBuf::from(REFERENCE_FILE_NAME));
    candidates
}

/// Load labels from the first readable candidate.  Falls back to
/// [`default_labels`] when none can be read or the file yields no labels.
pub fn load_labels(candidates: &[PathBuf]) -> BTreeMap<i64, String> {
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match read_labels(path) {
            Ok(labels) if labels.is_empty() => {
                log::warn!("{} has no usable labels, using defaults", path.display());
                return default_labels();
            }
            Ok(labels) => {
                log::info!("Loaded {} emitter labels from {}", labels.len(), path.display());
                return labels;
            }
            Err(e) => log::warn!("{e:#}"),
        }
    }
    log::warn!("Could not load emitter reference file, using defaults");
    default_labels()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_id_pairs() {
        let labels = parse_labels(" Radar A = 3 \nNoise=-1\n\nSonar=12\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[&3], "Radar A");
        assert_eq!(labels[&-1], "Noise");
        assert_eq!(labels[&12], "Sonar");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let labels = parse_labels("no separator\na=b=1\nBad=x\nGood=4\n");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[&4], "Good");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let labels = load_labels(&[dir.path().join("absent.txt")]);
        assert_eq!(labels, default_labels());
    }

    #[test]
    fn file_without_valid_lines_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REFERENCE_FILE_NAME);
        fs::write(&path, "garbage\n").unwrap();
        assert_eq!(load_labels(&[path]), default_labels());
    }

    #[test]
    fn first_readable_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&second, "Second=2\n").unwrap();
        let labels = load_labels(&[first, second]);
        assert_eq!(labels.get(&2).map(String::as_str), Some("Second"));
        assert!(!labels.contains_key(&0));
    }

    #[test]
    fn configured_path_is_tried_first() {
        let configured = PathBuf::from("/tmp/labels.txt");
        let candidates = candidate_paths(Some(&configured));
        assert_eq!(candidates[0], configured);
        assert_eq!(candidates.last().unwrap(), &PathBuf::from(REFERENCE_FILE_NAME));
    }
}

//! Decision Recorder
//!
//! Append-only JSONL writer for decision events.
//! Each line is flushed as it is written, so a killed process loses at most
//! the line in flight.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike, Utc};

use super::event::DecisionEvent;
use super::DecisionSink;
use crate::logic::dataset::ScoredFlow;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (50 MB)
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Log file prefix
const LOG_PREFIX: &str = "decisions";

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// RECORDER
// ============================================================================

/// Append-only JSONL recorder
pub struct Recorder {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
    max_file_size: u64,
    base_dir: PathBuf,
    events_recorded: u64,
}

impl Recorder {
    /// Create a new recorder in the given directory
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        Self::with_max_file_size(base_dir, MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(base_dir: PathBuf, max_file_size: u64) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (file_path, file) = Self::open_new_file(&base_dir)?;

        Ok(Self {
            writer: BufWriter::new(file),
            current_file: file_path,
            current_size: 0,
            max_file_size,
            base_dir,
            events_recorded: 0,
        })
    }

    /// Open a new log file with timestamp
    fn open_new_file(base_dir: &Path) -> std::io::Result<(PathBuf, File)> {
        let now = Utc::now();
        let stem = format!(
            "{}_{}_{:02}_{:02}_{:02}{:02}{:02}",
            LOG_PREFIX,
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
        );

        // Several rotations can happen within one second
        let mut file_path = base_dir.join(format!("{}{}", stem, LOG_EXT));
        let mut seq = 1;
        while file_path.exists() {
            file_path = base_dir.join(format!("{}_{}{}", stem, seq, LOG_EXT));
            seq += 1;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        log::info!("Opened decision log: {:?}", file_path);
        Ok((file_path, file))
    }

    /// Record a decision event
    pub fn record(&mut self, event: &DecisionEvent) -> std::io::Result<()> {
        let line = event.to_jsonl();
        let bytes = line.as_bytes();

        // Check if rotation needed
        if self.current_size > 0 && self.current_size + bytes.len() as u64 + 1 > self.max_file_size {
            self.rotate()?;
        }

        // Write line + newline
        self.writer.write_all(bytes)?;
        self.writer.write_all(b"\n")?;
        self.current_size += bytes.len() as u64 + 1;

        // Flush for durability
        self.writer.flush()?;

        self.events_recorded += 1;
        Ok(())
    }

    /// Rotate to a new file
    fn rotate(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;

        let (new_path, new_file) = Self::open_new_file(&self.base_dir)?;
        self.writer = BufWriter::new(new_file);

        log::info!("Rotated from {:?} to {:?}", self.current_file, new_path);
        self.current_file = new_path;
        self.current_size = 0;

        Ok(())
    }

    /// Get current log file path
    pub fn current_file(&self) -> &Path {
        &self.current_file
    }

    /// Get total events recorded
    pub fn events_count(&self) -> u64 {
        self.events_recorded
    }
}

impl DecisionSink for Recorder {
    fn emit(&mut self, flow: &ScoredFlow) -> std::io::Result<()> {
        self.record(&DecisionEvent::from_flow(flow))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        log::info!(
            "Decision recorder flushed. Total events: {} ({:?})",
            self.events_recorded,
            self.current_file
        );
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{FeatureVectorBuilder, TcpFlag};
    use std::io::{BufRead, BufReader};
    use crate::logic::model::Decision;
    use crate::logic::monitor::ResourceSample;
    use crate::logic::verification::Outcome;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Every event in a log file, skipping lines that do not parse
    fn read_events(file_path: &Path) -> std::io::Result<Vec<DecisionEvent>> {
        let reader = BufReader::new(File::open(file_path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Ok(event) = serde_json::from_str::<DecisionEvent>(&line) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// `.jsonl` files in `dir`, sorted by name (which includes the timestamp)
    fn list_log_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |e| e == "jsonl"))
            .collect();
        files.sort();
        Ok(files)
    }

    fn blocked_flow(id: &str) -> ScoredFlow {
        let raw = FeatureVectorBuilder::new()
            .flow_duration(120.0)
            .flag_count(TcpFlag::Syn, 1.0)
            .flag_count(TcpFlag::Ack, 1.0)
            .build();
        ScoredFlow {
            flow_id: id.to_string(),
            transformed: raw.as_slice().to_vec(),
            raw,
            probability: 0.73,
            decision: Decision::Block,
            label: Some("DoS Hulk".to_string()),
            outcome: Outcome::Correct,
            latency: Duration::from_micros(1500),
            resources: ResourceSample { memory_mb: 64.0, cpu_percent: None },
        }
    }

    #[test]
    fn test_recorder_creation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(recorder.current_file().exists());
        assert_eq!(recorder.events_count(), 0);
    }

    #[test]
    fn test_emit_decision() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();

        recorder.emit(&blocked_flow("FL-1700000000-7")).unwrap();

        // Read back
        let events = read_events(recorder.current_file()).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.flow_id, "FL-1700000000-7");
        assert_eq!(event.decision, Decision::Block);
        assert_eq!(event.outcome, Outcome::Correct);
        assert_eq!(event.active_flags, vec![TcpFlag::Syn, TcpFlag::Ack]);
        assert_eq!(event.flow_duration, 120.0);
        assert!((event.latency_ms - 1.5).abs() < 1e-9);
        assert_eq!(event.layout.feature_count, 78);
    }

    #[test]
    fn test_jsonl_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder = Recorder::new(temp_dir.path().to_path_buf()).unwrap();

        for i in 0..3 {
            recorder.emit(&blocked_flow(&format!("FL-0-{}", i))).unwrap();
        }

        // One JSON object per line
        let content = std::fs::read_to_string(recorder.current_file()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["decision"], "BLOCK");
            assert_eq!(value["active_flags"], serde_json::json!(["SYN", "ACK"]));
        }

        // Same session for every line of a run
        let events = read_events(recorder.current_file()).unwrap();
        assert!(events.iter().all(|e| e.session_id == events[0].session_id));
    }

    #[test]
    fn test_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let mut recorder =
            Recorder::with_max_file_size(temp_dir.path().to_path_buf(), 1024).unwrap();

        for i in 0..4 {
            recorder.emit(&blocked_flow(&format!("FL-0-{}", i))).unwrap();
        }
        recorder.flush().unwrap();

        let files = list_log_files(temp_dir.path()).unwrap();
        assert!(files.len() > 1);

        let total: usize = files.iter().map(|f| read_events(f).unwrap().len()).sum();
        assert_eq!(total, 4);
        assert_eq!(recorder.events_count(), 4);
    }
}

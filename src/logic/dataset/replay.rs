//! Replay Buffer
//!
//! Bounded, read-only set of recorded flows loaded once from a CSV export.
//! Feature columns are picked by header name in the fitted order, so column
//! order in the file does not matter and extra columns (e.g. `Label_Binary`)
//! are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;

use crate::logic::error::RouterError;
use crate::logic::features::FeatureVector;

/// One recorded flow
#[derive(Debug, Clone)]
pub struct ReplayEntry {
    /// 1-based data record in the source file
    pub row: usize,
    pub vector: FeatureVector,
    /// Ground truth; None when the label cell is empty
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    entries: Vec<ReplayEntry>,
    malformed_rows: usize,
}

impl ReplayBuffer {
    pub fn from_entries(entries: Vec<ReplayEntry>) -> Self {
        Self { entries, malformed_rows: 0 }
    }

    /// Load at most `max_rows` flows.
    ///
    /// `schema` is the fitted feature order. A missing file or label column
    /// is a `DatasetLoad` error; a missing feature column is a `SchemaMismatch`.
    /// Only header names are trimmed; label cells are kept verbatim.
    pub fn load(
        path: &Path,
        label_column: &str,
        schema: &[&str],
        max_rows: usize,
    ) -> Result<Self, RouterError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_path(path)
            .map_err(|e| RouterError::dataset(path, e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| RouterError::dataset(path, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        if header.iter().all(|h| h.is_empty()) {
            return Err(RouterError::dataset(path, "file is empty"));
        }

        let label_index = header
            .iter()
            .position(|h| h == label_column)
            .ok_or_else(|| {
                RouterError::dataset(path, format!("missing label column '{}'", label_column))
            })?;

        let feature_indices = schema
            .iter()
            .map(|name| {
                header.iter().position(|h| h == name).ok_or_else(|| {
                    RouterError::SchemaMismatch(format!(
                        "dataset {} lacks fitted feature column '{}'",
                        path.display(),
                        name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::new();
        let mut malformed_rows = 0;

        for (record_num, record) in reader.records().enumerate() {
            if entries.len() >= max_rows {
                break;
            }

            let record = record.map_err(|e| RouterError::dataset(path, e))?;

            // Short rows keep only the cells they have and fail validation later
            let values: Vec<f32> = feature_indices
                .iter()
                .filter_map(|&i| record.get(i))
                .map(parse_cell)
                .collect();

            if values.len() != schema.len() || values.iter().any(|v| !v.is_finite()) {
                malformed_rows += 1;
            }

            let label = record
                .get(label_index)
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            entries.push(ReplayEntry {
                row: record_num + 1,
                vector: FeatureVector::new(values),
                label,
            });
        }

        if entries.is_empty() {
            return Err(RouterError::dataset(path, "no flows found"));
        }

        if malformed_rows > 0 {
            log::warn!(
                "{} of {} replay rows are malformed and will be skipped when drawn",
                malformed_rows,
                entries.len()
            );
        }

        Ok(Self { entries, malformed_rows })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReplayEntry> {
        self.entries.get(index)
    }

    pub fn malformed_rows(&self) -> usize {
        self.malformed_rows
    }

    /// Uniform draw with replacement
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, &ReplayEntry)> {
        if self.entries.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.entries.len());
        Some((index, &self.entries[index]))
    }

    /// Flows per label (unlabelled flows are not counted)
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in self.entries.iter().filter_map(|e| e.label.as_ref()) {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Numeric cell; anything unparseable becomes NaN
fn parse_cell(cell: &str) -> f32 {
    cell.trim().parse::<f32>().unwrap_or(f32::NAN)
}

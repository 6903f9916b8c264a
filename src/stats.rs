// WHY: Detection counters and per-run statistics for the CLI
// Serialized as JSON next to the roster output

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::screenplay::filter::RejectReason;
use crate::screenplay::registry::Resolution;

/// Counters accumulated by one detector session
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionStats {
    pub scenes_scanned: u64,
    pub lines_scanned: u64,
    /// Cues produced by the scanner, before filtering
    pub raw_cues: u64,
    /// Cues discarded by the filter, keyed by reason
    pub filtered: BTreeMap<String, u64>,
    pub exact_matches: u64,
    pub structural_matches: u64,
    pub promotions: u64,
    pub identities_created: u64,
    /// Names accepted from an external candidate source
    pub external_candidates: u64,
}

impl DetectionStats {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        *self.filtered.entry(format!("{reason:?}")).or_insert(0) += 1;
    }

    pub fn record_resolution(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Exact(_) => self.exact_matches += 1,
            Resolution::Structural { .. } => self.structural_matches += 1,
            Resolution::Promoted { .. } => {
                self.structural_matches += 1;
                self.promotions += 1;
            }
            Resolution::Created(_) => self.identities_created += 1,
        }
    }

    pub fn filtered_total(&self) -> u64 {
        self.filtered.values().sum()
    }

    /// Cues that reached the canonicalizer
    pub fn resolved_total(&self) -> u64 {
        self.exact_matches + self.structural_matches + self.identities_created
    }
}

/// Per-run summary written by the CLI
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    /// Screenplay path as given on the command line
    pub path: String,
    pub chars_processed: u64,
    pub scenes: u64,
    pub identities: u64,
    pub confirmed: u64,
    /// Detection time in milliseconds (excludes reading)
    pub detection_time_ms: u64,
    pub read_time_ms: u64,
    pub no_cues_detected: bool,
    pub detection: DetectionStats,
}

/// Write run statistics as pretty JSON
pub async fn write_stats_file(stats_path: &Path, stats: &RunStats) -> Result<()> {
    let file = tokio::fs::File::create(stats_path).await?;
    let mut writer = BufWriter::new(file);

    let content = serde_json::to_string_pretty(stats)?;
    writer.write_all(content.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    writer.flush().await?;
    Ok(())
}

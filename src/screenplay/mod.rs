// WHY: Main detector interface owning one registry per parse session
// Wires segmentation, scanning, filtering and canonicalization together

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub mod patterns;
pub mod segmenter;
pub mod scanner;
pub mod filter;
pub mod normalization;
pub mod registry;
pub mod confidence;

// Re-export core types
pub use confidence::{ConfidenceThresholds, ConfidenceTier};
pub use filter::{CueFilter, RejectReason};
pub use patterns::ScreenplayPatterns;
pub use registry::{CharacterId, CharacterRecord, CharacterRegistry, MatchRule, Resolution};
pub use scanner::CueScanner;

use normalization::clean_cue_name;

use crate::review::ReviewSession;
use crate::stats::DetectionStats;

/// One scene of a screenplay, from its heading line up to the next heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based ordinal of the scene in the document
    pub index: usize,
    /// Trimmed heading line, e.g. `INT. FERRY - DAY`
    pub heading: String,
    /// Raw text from the heading line through the end of the scene
    pub content: String,
    /// 0-based line number of the heading in the source text
    pub line_offset: usize,
}

/// Unresolved cue text seen in one scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCue {
    /// Name plus any trailing parentheticals, e.g. `GWEN (V.O.)`
    pub text: String,
    pub scene_index: usize,
}

/// Candidate name supplied by an alternate source such as per-scene cast lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCandidate {
    pub name: String,
    /// Scenes the name is listed in; each counts as one appearance
    pub scenes: Vec<usize>,
}

/// Detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Leading spaces that make a line count as indented (a tab always does)
    pub indent_spaces: usize,
    pub min_name_len: usize,
    pub max_name_len: usize,
    /// Merge multi-word names sharing a first word (`JOHN SMITH` / `JOHN DOE`)
    pub allow_shared_first_token: bool,
    /// Production-specific background roles to discard
    pub extra_generic_roles: Vec<String>,
    /// Production-specific location nouns to discard
    pub extra_locations: Vec<String>,
    pub confidence: ConfidenceThresholds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            indent_spaces: 5,
            min_name_len: 2,
            max_name_len: 30,
            allow_shared_first_token: true,
            extra_generic_roles: Vec::new(),
            extra_locations: Vec::new(),
            confidence: ConfidenceThresholds::default(),
        }
    }
}

/// Per-session character detector
pub struct CharacterDetector {
    config: DetectorConfig,
    patterns: ScreenplayPatterns,
    filter: CueFilter,
    registry: CharacterRegistry,
    stats: DetectionStats,
    last_scene_index: Option<usize>,
}

impl CharacterDetector {
    /// Create a detector with custom settings
    pub fn new(config: DetectorConfig) -> Result<Self> {
        if config.min_name_len > config.max_name_len {
            anyhow::bail!(
                "min_name_len {} exceeds max_name_len {}",
                config.min_name_len,
                config.max_name_len
            );
        }

        let patterns = ScreenplayPatterns::new()?;
        let filter = CueFilter::with_extras(&config.extra_generic_roles, &config.extra_locations)?;
        let registry = CharacterRegistry::new(config.allow_shared_first_token);

        Ok(Self {
            config,
            patterns,
            filter,
            registry,
            stats: DetectionStats::default(),
            last_scene_index: None,
        })
    }

    /// Create a detector with default settings
    pub fn with_default_config() -> Result<Self> {
        Self::new(DetectorConfig::default())
    }

    /// Split raw text into scenes without touching the registry
    pub fn segment(&self, text: &str) -> Vec<Scene> {
        segmenter::segment_scenes(text, &self.patterns)
    }

    /// Segment raw text and ingest every scene in order; returns the scenes
    pub fn ingest_text(&mut self, text: &str) -> Vec<Scene> {
        let scenes = self.segment(text);
        self.ingest_scenes(&scenes);
        info!(
            "Detected {} identities from {} scenes ({} raw cues, {} filtered)",
            self.registry.len(),
            scenes.len(),
            self.stats.raw_cues,
            self.stats.filtered_total()
        );
        scenes
    }

    /// Ingest a pre-segmented scene list in order
    pub fn ingest_scenes(&mut self, scenes: &[Scene]) {
        for scene in scenes {
            self.ingest_scene(scene);
        }
    }

    /// Scan and resolve one scene; returns the number of cues attributed
    /// Callers may yield between scenes; order of ingestion is the order of attribution
    pub fn ingest_scene(&mut self, scene: &Scene) -> usize {
        if let Some(last) = self.last_scene_index {
            if scene.index < last {
                warn!("Scene {} ingested after scene {}; attribution follows ingestion order", scene.index, last);
            }
        }
        self.last_scene_index = Some(self.last_scene_index.map_or(scene.index, |last| last.max(scene.index)));

        let cues = self.scan_scene(scene);
        self.stats.scenes_scanned += 1;
        self.stats.lines_scanned += scene.content.lines().count() as u64;
        self.stats.raw_cues += cues.len() as u64;

        let attributed = cues.iter().filter_map(|cue| self.observe_cue(cue)).count();
        debug!(scene = scene.index, heading = %scene.heading, cues = cues.len(), attributed, "Scene ingested");
        attributed
    }

    /// Raw cues of one scene, without filtering or resolution
    pub fn scan_scene(&self, scene: &Scene) -> Vec<RawCue> {
        CueScanner::new(&self.patterns, &self.config).scan_scene(scene)
    }

    /// Filter and resolve one cue
    /// Names outside `[min_name_len, max_name_len]` are rejected whatever their source
    pub fn observe_cue(&mut self, cue: &RawCue) -> Option<Resolution> {
        if let Some(reason) = self.filter.check(&cue.text) {
            debug!(cue = %cue.text, ?reason, "Cue filtered");
            self.stats.record_rejection(reason);
            return None;
        }

        let name_len = clean_cue_name(&cue.text).map_or(0, |name| name.chars().count());
        if name_len < self.config.min_name_len || name_len > self.config.max_name_len {
            debug!(cue = %cue.text, name_len, "Cue name length out of bounds");
            self.stats.record_rejection(RejectReason::NameLength);
            return None;
        }

        let resolution = self.registry.resolve(&cue.text, cue.scene_index)?;
        self.stats.record_resolution(&resolution);
        Some(resolution)
    }

    /// Accept a name from an alternate candidate source, once per listed scene
    /// Returns the number of appearances attributed
    pub fn observe_external(&mut self, candidate: &ExternalCandidate) -> usize {
        let mut attributed = 0;
        for &scene_index in &candidate.scenes {
            let cue = RawCue {
                text: candidate.name.to_uppercase(),
                scene_index,
            };
            if self.observe_cue(&cue).is_some() {
                attributed += 1;
            }
        }
        self.stats.external_candidates += attributed as u64;
        attributed
    }

    /// Empty registry: callers should fall back to an alternate candidate source
    pub fn no_cues_detected(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.stats
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn patterns(&self) -> &ScreenplayPatterns {
        &self.patterns
    }

    pub fn filter(&self) -> &CueFilter {
        &self.filter
    }

    /// Hand the registry to a review session
    pub fn into_review(self) -> ReviewSession {
        ReviewSession::new(self.registry, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_pipeline_end_to_end() {
        let mut detector = CharacterDetector::with_default_config().unwrap();
        let text = "INT. FERRY - DAY\n\nGWEN LAWSON\nWe're late.\n\nWAITER\nTickets, please.\n\nEXT. PIER - NIGHT\n\nGWEN (V.O.)\nStill late.\n";
        let scenes = detector.ingest_text(text);

        assert_eq!(scenes.len(), 2);
        assert_eq!(detector.registry().len(), 1);
        let gwen = detector.registry().lookup("Gwen").unwrap();
        assert_eq!(gwen.primary_name, "Gwen Lawson");
        assert_eq!(gwen.dialogue_count, 2);

        let stats = detector.stats();
        assert_eq!(stats.scenes_scanned, 2);
        assert_eq!(stats.raw_cues, 3);
        assert_eq!(stats.filtered.get("GenericRole"), Some(&1));
        detector.registry().check_invariants().unwrap();
    }

    #[test]
    fn test_no_headings_reports_no_cues() {
        let mut detector = CharacterDetector::with_default_config().unwrap();
        let scenes = detector.ingest_text("GWEN\nHello.\n");
        assert!(scenes.is_empty());
        assert!(detector.no_cues_detected());
    }

    #[test]
    fn test_external_candidates() {
        let mut detector = CharacterDetector::with_default_config().unwrap();
        let attributed = detector.observe_external(&ExternalCandidate {
            name: "Gwen Lawson".to_string(),
            scenes: vec![1, 2, 5],
        });
        assert_eq!(attributed, 3);
        assert_eq!(detector.observe_external(&ExternalCandidate { name: "Waiter".to_string(), scenes: vec![1] }), 0);

        let record = detector.registry().lookup("gwen lawson").unwrap();
        assert_eq!(record.dialogue_count, 3);
        assert_eq!(record.scene_appearances.iter().copied().collect::<Vec<_>>(), vec![1, 2, 5]);
        assert_eq!(detector.stats().external_candidates, 3);
    }

    #[test]
    fn test_external_names_outside_length_bounds_rejected() {
        let mut detector = CharacterDetector::with_default_config().unwrap();

        let short = detector.observe_external(&ExternalCandidate { name: "Q".to_string(), scenes: vec![1, 2, 3] });
        let long_name = "Bartholomew Fitzgerald Montgomery Junior";
        let long = detector.observe_external(&ExternalCandidate { name: long_name.to_string(), scenes: vec![1, 2, 3] });
        let thirty_one = "A".repeat(31);
        let limit = detector.observe_external(&ExternalCandidate { name: thirty_one, scenes: vec![4] });
        let thirty = detector.observe_external(&ExternalCandidate { name: "B".repeat(30), scenes: vec![4] });

        assert_eq!((short, long, limit, thirty), (0, 0, 0, 1));
        assert_eq!(detector.registry().len(), 1);
        assert!(detector.registry().lookup("Q").is_none());
        assert!(detector.registry().lookup(long_name).is_none());
        assert_eq!(detector.stats().filtered.get("NameLength"), Some(&7));
        assert_eq!(detector.stats().external_candidates, 1);
    }

    #[test]
    fn test_invalid_name_bounds_rejected() {
        let config = DetectorConfig { min_name_len: 10, max_name_len: 5, ..Default::default() };
        assert!(CharacterDetector::new(config).is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{"allow_shared_first_token": false}"#).unwrap();
        assert!(!config.allow_shared_first_token);
        assert_eq!(config.indent_spaces, 5);
        assert_eq!(config.max_name_len, 30);
    }
}

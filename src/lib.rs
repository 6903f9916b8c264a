pub mod reader;
pub mod review;
pub mod screenplay;
pub mod stats;

// Re-export main types for convenient access
pub use screenplay::{
    CharacterDetector, CharacterId, CharacterRecord, CharacterRegistry, DetectorConfig,
    ExternalCandidate, RawCue, Resolution, Scene,
};

pub use review::{ConfirmedCharacter, ConfirmedRoster, ReviewError, ReviewSession};

pub use reader::{read_scenes_json, read_script_async, ReaderConfig, ScriptReader};

pub use stats::{write_stats_file, DetectionStats, RunStats};

// WHY: Review session for operator selection, rename, merge and confirmation
// Produces the confirmed roster from a detector's registry

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::screenplay::confidence::{ConfidenceThresholds, ConfidenceTier};
use crate::screenplay::registry::{CharacterId, CharacterRecord, CharacterRegistry};
use crate::screenplay::DetectorConfig;

/// Operator input rejected by the review session; the registry is left untouched
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Merge needs at least 2 distinct characters, got {0}")]
    TooFewToMerge(usize),

    #[error("Unknown character {0}")]
    UnknownCharacter(CharacterId),

    #[error("Name is empty")]
    EmptyName,

    #[error("Name length {len} outside {min}..={max}")]
    NameLength { len: usize, min: usize, max: usize },

    #[error("Roster already confirmed")]
    AlreadyConfirmed,
}

/// One row of the review list
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub record: &'a CharacterRecord,
    pub confidence: ConfidenceTier,
    pub selected: bool,
}

/// Confirmed character as handed to external collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedCharacter {
    pub primary_name: String,
    pub aliases: Vec<String>,
    pub scene_appearances: Vec<usize>,
    pub dialogue_count: u32,
    pub first_scene_index: usize,
}

impl From<&CharacterRecord> for ConfirmedCharacter {
    fn from(record: &CharacterRecord) -> Self {
        Self {
            primary_name: record.primary_name.clone(),
            aliases: record.aliases.iter().cloned().collect(),
            scene_appearances: record.scene_appearances.iter().copied().collect(),
            dialogue_count: record.dialogue_count,
            first_scene_index: record.first_scene_index,
        }
    }
}

/// Ordered, human-approved cast of a production
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedRoster {
    pub characters: Vec<ConfirmedCharacter>,
}

impl ConfirmedRoster {
    /// Flat list of display names, in roster order
    pub fn names(&self) -> Vec<&str> {
        self.characters.iter().map(|c| c.primary_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Operator review of detected identities: select, rename, merge, confirm
pub struct ReviewSession {
    registry: CharacterRegistry,
    selection: BTreeSet<CharacterId>,
    thresholds: ConfidenceThresholds,
    min_name_len: usize,
    max_name_len: usize,
    confirmed: bool,
}

impl ReviewSession {
    /// Start a review; identities at or above the pre-check threshold start selected
    pub fn new(registry: CharacterRegistry, config: &DetectorConfig) -> Self {
        let thresholds = config.confidence.clone();
        let selection = registry
            .iter()
            .filter(|record| thresholds.is_prechecked(record.dialogue_count))
            .map(|record| record.id)
            .collect();

        Self {
            registry,
            selection,
            thresholds,
            min_name_len: config.min_name_len,
            max_name_len: config.max_name_len,
            confirmed: false,
        }
    }

    /// Identities by dialogue count descending, then first appearance, then id
    pub fn candidates(&self) -> Vec<Candidate<'_>> {
        let mut records: Vec<&CharacterRecord> = self.registry.iter().collect();
        records.sort_by_key(|record| (Reverse(record.dialogue_count), record.first_scene_index, record.id));
        records
            .into_iter()
            .map(|record| Candidate {
                record,
                confidence: self.thresholds.tier(record.dialogue_count),
                selected: self.selection.contains(&record.id),
            })
            .collect()
    }

    pub fn get(&self, id: CharacterId) -> Option<&CharacterRecord> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Flip selection of one identity; returns the new state
    pub fn toggle(&mut self, id: CharacterId) -> Result<bool, ReviewError> {
        self.ensure_known(id)?;
        if self.selection.remove(&id) {
            Ok(false)
        } else {
            self.selection.insert(id);
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.registry.iter().map(|record| record.id).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: CharacterId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<CharacterId> {
        self.selection.iter().copied().collect()
    }

    /// Overwrite the primary name of one identity; no alias is removed
    pub fn rename(&mut self, id: CharacterId, name: &str) -> Result<(), ReviewError> {
        self.ensure_open()?;
        self.ensure_known(id)?;
        let name = self.validate_name(name)?;

        self.registry.rename(id, &name);
        debug!(%id, name = %name, "Renamed character");
        Ok(())
    }

    /// Collapse several identities into one new identity named `name`
    /// The result does not depend on the order of `ids`
    pub fn merge(&mut self, ids: &[CharacterId], name: &str) -> Result<CharacterId, ReviewError> {
        self.ensure_open()?;
        let distinct: BTreeSet<CharacterId> = ids.iter().copied().collect();
        if distinct.len() < 2 {
            return Err(ReviewError::TooFewToMerge(distinct.len()));
        }
        for id in &distinct {
            self.ensure_known(*id)?;
        }
        let name = self.validate_name(name)?;

        let sources: Vec<CharacterId> = distinct.iter().copied().collect();
        let merged = self
            .registry
            .merge(&sources, &name)
            .ok_or(ReviewError::TooFewToMerge(sources.len()))?;

        let deselected = sources.iter().filter(|id| self.selection.remove(*id)).count();
        if deselected > 0 {
            self.selection.insert(merged);
        }

        info!(%merged, name = %name, sources = sources.len(), "Merged characters");
        Ok(merged)
    }

    /// Mark `ids` confirmed and produce the roster; the session accepts no edits afterwards
    pub fn confirm(&mut self, ids: &[CharacterId]) -> Result<ConfirmedRoster, ReviewError> {
        self.ensure_open()?;
        for id in ids {
            self.ensure_known(*id)?;
        }

        for id in ids {
            self.registry.mark_confirmed(*id);
        }
        self.confirmed = true;

        let characters: Vec<ConfirmedCharacter> = self
            .candidates()
            .into_iter()
            .filter(|candidate| candidate.record.confirmed)
            .map(|candidate| ConfirmedCharacter::from(candidate.record))
            .collect();

        info!("Confirmed roster of {} characters", characters.len());
        Ok(ConfirmedRoster { characters })
    }

    /// Confirm the current selection
    pub fn confirm_selected(&mut self) -> Result<ConfirmedRoster, ReviewError> {
        let ids = self.selected_ids();
        self.confirm(&ids)
    }

    fn ensure_open(&self) -> Result<(), ReviewError> {
        if self.confirmed {
            Err(ReviewError::AlreadyConfirmed)
        } else {
            Ok(())
        }
    }

    fn ensure_known(&self, id: CharacterId) -> Result<(), ReviewError> {
        if self.registry.contains(id) {
            Ok(())
        } else {
            Err(ReviewError::UnknownCharacter(id))
        }
    }

    fn validate_name(&self, name: &str) -> Result<String, ReviewError> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(ReviewError::EmptyName);
        }
        let len = name.chars().count();
        if len < self.min_name_len || len > self.max_name_len {
            return Err(ReviewError::NameLength {
                len,
                min: self.min_name_len,
                max: self.max_name_len,
            });
        }
        Ok(name)
    }
}

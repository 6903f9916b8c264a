// WHY: Character registry for name canonicalization across scenes
// Id-keyed records with a separate case-folded alias index

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use super::normalization::{clean_cue_name, collapse_whitespace, fold, name_tokens};

/// Registry-assigned identity; allocation order is insertion order
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical identity of one character across all its spellings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    /// Current best (longest observed or operator-chosen) display form
    pub primary_name: String,
    /// Every spelling ever observed, always including `primary_name`
    pub aliases: BTreeSet<String>,
    pub first_scene_index: usize,
    pub scene_appearances: BTreeSet<usize>,
    /// Number of cue occurrences attributed to this identity
    pub dialogue_count: u32,
    pub confirmed: bool,
}

impl CharacterRecord {
    fn record_appearance(&mut self, scene_index: usize) {
        self.dialogue_count += 1;
        self.scene_appearances.insert(scene_index);
        self.first_scene_index = self.first_scene_index.min(scene_index);
    }

    /// Case-insensitive alias membership
    pub fn has_alias(&self, name: &str) -> bool {
        let key = fold(name);
        self.aliases.iter().any(|alias| fold(alias) == key)
    }
}

/// Which structural rule tied a candidate to an existing primary name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Candidate tokens are a strict subset of the primary's (`GWEN` vs `GWEN LAWSON`)
    Subset,
    /// Primary tokens are a strict subset of the candidate's
    Superset,
    /// Both multi-token with equal first tokens
    SharedFirstToken,
}

/// Outcome of resolving one cue against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact(CharacterId),
    Structural { id: CharacterId, rule: MatchRule },
    Promoted { id: CharacterId, rule: MatchRule, previous_primary: String },
    Created(CharacterId),
}

impl Resolution {
    pub fn id(&self) -> CharacterId {
        match self {
            Resolution::Exact(id) | Resolution::Created(id) => *id,
            Resolution::Structural { id, .. } | Resolution::Promoted { id, .. } => *id,
        }
    }
}

/// Structural match between candidate tokens and primary tokens (both case-folded)
pub fn structural_rule(candidate: &[String], primary: &[String], allow_shared_first_token: bool) -> Option<MatchRule> {
    if candidate.is_empty() || primary.is_empty() {
        return None;
    }
    if candidate.len() < primary.len() && candidate.iter().all(|token| primary.contains(token)) {
        return Some(MatchRule::Subset);
    }
    if primary.len() < candidate.len() && primary.iter().all(|token| candidate.contains(token)) {
        return Some(MatchRule::Superset);
    }
    if allow_shared_first_token && candidate.len() > 1 && primary.len() > 1 && candidate[0] == primary[0] {
        return Some(MatchRule::SharedFirstToken);
    }
    None
}

/// Identity store plus alias index for one parse session
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    records: BTreeMap<CharacterId, CharacterRecord>,
    alias_index: HashMap<String, CharacterId>,
    next_id: u32,
    version: u64,
    allow_shared_first_token: bool,
}

impl Default for CharacterRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CharacterRegistry {
    pub fn new(allow_shared_first_token: bool) -> Self {
        Self {
            records: BTreeMap::new(),
            alias_index: HashMap::new(),
            next_id: 0,
            version: 0,
            allow_shared_first_token,
        }
    }

    /// Resolve one raw cue (parentheticals allowed) seen in `scene_index`
    /// Returns `None` when nothing is left after cleaning
    pub fn resolve(&mut self, raw_text: &str, scene_index: usize) -> Option<Resolution> {
        let candidate = clean_cue_name(raw_text)?;
        let key = fold(&candidate);

        if let Some(&id) = self.alias_index.get(&key) {
            if let Some(record) = self.records.get_mut(&id) {
                record.record_appearance(scene_index);
                self.version += 1;
                debug!(cue = raw_text, %id, "Exact alias hit");
                return Some(Resolution::Exact(id));
            }
        }

        let tokens = name_tokens(&candidate);
        if let Some((id, rule)) = self.find_structural_match(&tokens) {
            return Some(self.absorb(id, rule, candidate, scene_index));
        }

        Some(Resolution::Created(self.create(candidate, raw_text, scene_index)))
    }

    /// First identity, in insertion order, whose primary name structurally matches
    pub fn find_structural_match(&self, candidate_tokens: &[String]) -> Option<(CharacterId, MatchRule)> {
        self.records.iter().find_map(|(id, record)| {
            let primary_tokens = name_tokens(&record.primary_name);
            structural_rule(candidate_tokens, &primary_tokens, self.allow_shared_first_token)
                .map(|rule| (*id, rule))
        })
    }

    fn allocate_id(&mut self) -> CharacterId {
        let id = CharacterId(self.next_id);
        self.next_id += 1;
        id
    }

    fn create(&mut self, candidate: String, raw_text: &str, scene_index: usize) -> CharacterId {
        let id = self.allocate_id();

        let mut aliases = BTreeSet::new();
        aliases.insert(candidate.clone());
        let raw_form = collapse_whitespace(raw_text);
        if !raw_form.is_empty() {
            aliases.insert(raw_form);
        }

        let staged: Vec<(String, CharacterId)> = aliases.iter().map(|alias| (fold(alias), id)).collect();

        debug!(%id, name = %candidate, scene_index, "Created character identity");
        self.records.insert(
            id,
            CharacterRecord {
                id,
                primary_name: candidate,
                aliases,
                first_scene_index: scene_index,
                scene_appearances: BTreeSet::from([scene_index]),
                dialogue_count: 1,
                confirmed: false,
            },
        );
        self.alias_index.extend(staged);
        self.version += 1;
        id
    }

    /// Attach a structurally matched spelling, promoting it when it is longer
    fn absorb(&mut self, id: CharacterId, rule: MatchRule, candidate: String, scene_index: usize) -> Resolution {
        let Some(record) = self.records.get_mut(&id) else {
            return Resolution::Created(self.create(candidate.clone(), &candidate, scene_index));
        };

        let previous_primary = record.primary_name.clone();
        let promote = candidate.chars().count() > previous_primary.chars().count();

        // Build the complete alias set and index updates before touching the record
        let mut aliases = record.aliases.clone();
        aliases.insert(previous_primary.clone());
        aliases.insert(candidate.clone());
        let staged: Vec<(String, CharacterId)> = if promote {
            aliases.iter().map(|alias| (fold(alias), id)).collect()
        } else {
            vec![(fold(&candidate), id)]
        };

        record.aliases = aliases;
        if promote {
            record.primary_name = candidate.clone();
        }
        record.record_appearance(scene_index);
        self.alias_index.extend(staged);
        self.version += 1;

        if promote {
            debug!(%id, from = %previous_primary, to = %candidate, ?rule, "Promoted primary name");
            Resolution::Promoted { id, rule, previous_primary }
        } else {
            debug!(%id, alias = %candidate, ?rule, "Structural match");
            Resolution::Structural { id, rule }
        }
    }

    /// Overwrite the primary name; the name joins the alias set and is indexed
    /// unless another identity already owns that spelling
    pub(crate) fn rename(&mut self, id: CharacterId, name: &str) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        record.primary_name = name.to_string();
        record.aliases.insert(name.to_string());

        let key = fold(name);
        match self.alias_index.get(&key) {
            Some(owner) if *owner != id => {
                debug!(%id, %owner, name, "Renamed to a spelling owned by another identity");
            }
            _ => {
                self.alias_index.insert(key, id);
            }
        }
        self.version += 1;
        true
    }

    /// Collapse `ids` into one new identity named `name`
    /// Callers validate that at least two distinct, known ids are given
    pub(crate) fn merge(&mut self, ids: &[CharacterId], name: &str) -> Option<CharacterId> {
        let sources: BTreeSet<CharacterId> = ids.iter().copied().collect();
        if sources.len() < 2 {
            return None;
        }

        let mut aliases = BTreeSet::new();
        let mut scene_appearances = BTreeSet::new();
        let mut dialogue_count = 0u32;
        let mut first_scene_index = usize::MAX;
        for id in &sources {
            let record = self.records.get(id)?;
            aliases.extend(record.aliases.iter().cloned());
            scene_appearances.extend(record.scene_appearances.iter().copied());
            dialogue_count += record.dialogue_count;
            first_scene_index = first_scene_index.min(record.first_scene_index);
        }
        aliases.insert(name.to_string());

        let new_id = self.allocate_id();

        // Re-point keys that are unowned or owned by a source; other identities keep theirs
        let staged: Vec<(String, CharacterId)> = aliases
            .iter()
            .map(|alias| fold(alias))
            .filter(|key| match self.alias_index.get(key) {
                Some(owner) => sources.contains(owner),
                None => true,
            })
            .map(|key| (key, new_id))
            .collect();

        let merged = CharacterRecord {
            id: new_id,
            primary_name: name.to_string(),
            aliases,
            first_scene_index,
            scene_appearances,
            dialogue_count,
            confirmed: false,
        };

        for id in &sources {
            self.records.remove(id);
        }
        self.records.insert(new_id, merged);
        self.alias_index.extend(staged);
        self.alias_index.retain(|_, owner| !sources.contains(&*owner));
        self.version += 1;

        debug!(%new_id, name, merged = sources.len(), "Merged character identities");
        Some(new_id)
    }

    pub(crate) fn mark_confirmed(&mut self, id: CharacterId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.confirmed = true;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: CharacterId) -> Option<&CharacterRecord> {
        self.records.get(&id)
    }

    /// Identity owning a spelling, case-insensitively
    pub fn lookup(&self, name: &str) -> Option<&CharacterRecord> {
        self.alias_owner(name).and_then(|id| self.records.get(&id))
    }

    pub fn alias_owner(&self, name: &str) -> Option<CharacterId> {
        self.alias_index.get(&fold(name)).copied()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CharacterRecord> {
        self.records.values()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Incremented on every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn alias_count(&self) -> usize {
        self.alias_index.len()
    }

    /// Verify record and alias-index invariants
    pub fn check_invariants(&self) -> Result<(), String> {
        for (id, record) in &self.records {
            if record.id != *id {
                return Err(format!("Record stored under {id} carries id {}", record.id));
            }
            if !record.aliases.contains(&record.primary_name) {
                return Err(format!("Primary name '{}' missing from aliases of {id}", record.primary_name));
            }
            match record.scene_appearances.first() {
                Some(first) if *first == record.first_scene_index => {}
                other => {
                    return Err(format!(
                        "First scene {} of {id} disagrees with appearances starting at {:?}",
                        record.first_scene_index, other
                    ));
                }
            }
            match self.alias_index.get(&fold(&record.primary_name)) {
                Some(owner) if self.records.get(owner).is_some_and(|r| r.has_alias(&record.primary_name)) => {}
                _ => return Err(format!("Primary name '{}' of {id} is not indexed", record.primary_name)),
            }
        }

        for (key, owner) in &self.alias_index {
            let Some(record) = self.records.get(owner) else {
                return Err(format!("Alias '{key}' points at missing identity {owner}"));
            };
            if !record.aliases.iter().any(|alias| fold(alias) == *key) {
                return Err(format!("Alias '{key}' points at {owner} which does not list it"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(name: &str) -> Vec<String> {
        name_tokens(name)
    }

    #[test]
    fn test_structural_rules() {
        assert_eq!(structural_rule(&tokens("Gwen"), &tokens("Gwen Lawson"), true), Some(MatchRule::Subset));
        assert_eq!(structural_rule(&tokens("Gwen Lawson"), &tokens("Gwen"), true), Some(MatchRule::Superset));
        assert_eq!(
            structural_rule(&tokens("John Smith"), &tokens("John Doe"), true),
            Some(MatchRule::SharedFirstToken)
        );
        assert_eq!(structural_rule(&tokens("John Smith"), &tokens("John Doe"), false), None);
        assert_eq!(structural_rule(&tokens("Peter Lawson"), &tokens("Gwen Lawson"), true), None);
        assert_eq!(structural_rule(&tokens("Gwen"), &tokens("Gwen"), true), None);
    }

    #[test]
    fn test_create_indexes_clean_and_raw_forms() {
        let mut registry = CharacterRegistry::default();
        let resolution = registry.resolve("GWEN LAWSON (V.O.)", 1).unwrap();
        let id = resolution.id();
        assert_eq!(resolution, Resolution::Created(id));

        let record = registry.get(id).unwrap();
        assert_eq!(record.primary_name, "Gwen Lawson");
        assert!(record.aliases.contains("Gwen Lawson"));
        assert!(record.aliases.contains("GWEN LAWSON (V.O.)"));
        assert_eq!(registry.alias_owner("gwen lawson (v.o.)"), Some(id));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_repeated_cue_increments_count_only() {
        let mut registry = CharacterRegistry::default();
        let id = registry.resolve("PETER", 1).unwrap().id();
        let aliases_before = registry.get(id).unwrap().aliases.len();

        assert_eq!(registry.resolve("PETER", 2), Some(Resolution::Exact(id)));
        assert_eq!(registry.resolve("PETER", 2), Some(Resolution::Exact(id)));

        let record = registry.get(id).unwrap();
        assert_eq!(record.dialogue_count, 3);
        assert_eq!(record.aliases.len(), aliases_before);
        assert_eq!(record.scene_appearances.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_subset_resolves_to_existing_identity() {
        let mut registry = CharacterRegistry::default();
        let id = registry.resolve("GWEN LAWSON", 1).unwrap().id();

        let resolution = registry.resolve("GWEN", 3).unwrap();
        assert_eq!(resolution, Resolution::Structural { id, rule: MatchRule::Subset });
        assert_eq!(registry.len(), 1);

        let record = registry.get(id).unwrap();
        assert_eq!(record.primary_name, "Gwen Lawson");
        assert!(record.aliases.contains("Gwen"));
        assert_eq!(registry.alias_owner("GWEN"), Some(id));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_superset_promotes_and_reindexes() {
        let mut registry = CharacterRegistry::default();
        let id = registry.resolve("GWEN", 1).unwrap().id();
        let version_before = registry.version();

        let resolution = registry.resolve("GWEN LAWSON (CONT'D)", 2).unwrap();
        assert_eq!(
            resolution,
            Resolution::Promoted { id, rule: MatchRule::Superset, previous_primary: "Gwen".to_string() }
        );
        assert!(registry.version() > version_before);

        let record = registry.get(id).unwrap();
        assert_eq!(record.primary_name, "Gwen Lawson");
        assert!(record.aliases.contains("Gwen"));
        for alias in &record.aliases {
            assert_eq!(registry.alias_owner(alias), Some(id), "Alias {alias} not re-indexed");
        }
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_shared_first_token_switch() {
        let mut permissive = CharacterRegistry::new(true);
        permissive.resolve("JOHN SMITH", 1);
        permissive.resolve("JOHN DOE", 2);
        assert_eq!(permissive.len(), 1);

        let mut strict = CharacterRegistry::new(false);
        strict.resolve("JOHN SMITH", 1);
        strict.resolve("JOHN DOE", 2);
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn test_empty_after_cleaning_is_dropped() {
        let mut registry = CharacterRegistry::default();
        assert_eq!(registry.resolve("(O.S.)", 1), None);
        assert!(registry.is_empty());
        assert_eq!(registry.version(), 0);
    }

    #[test]
    fn test_merge_repoints_every_alias() {
        let mut registry = CharacterRegistry::default();
        let a = registry.resolve("MAGGIE", 1).unwrap().id();
        let b = registry.resolve("MARGARET (V.O.)", 4).unwrap().id();
        let other = registry.resolve("PETER", 2).unwrap().id();

        let merged = registry.merge(&[a, b], "Margaret").unwrap();
        assert!(!registry.contains(a));
        assert!(!registry.contains(b));
        assert!(registry.contains(other));

        let record = registry.get(merged).unwrap();
        assert_eq!(record.dialogue_count, 2);
        assert_eq!(record.first_scene_index, 1);
        for alias in ["Maggie", "Margaret", "MARGARET (V.O.)"] {
            assert_eq!(registry.alias_owner(alias), Some(merged));
        }
        assert_eq!(registry.alias_owner("Peter"), Some(other));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_merge_requires_two_known_ids() {
        let mut registry = CharacterRegistry::default();
        let a = registry.resolve("MAGGIE", 1).unwrap().id();
        assert_eq!(registry.merge(&[a, a], "Maggie"), None);
        assert_eq!(registry.merge(&[a, CharacterId(99)], "Maggie"), None);
        assert!(registry.contains(a));
        registry.check_invariants().unwrap();
    }
}

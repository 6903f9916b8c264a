// WHY: Centralized rejection of cue-shaped lines that are not speaking characters
// Static word lists plus compiled patterns, extendable from config

use anyhow::Result;
use regex_automata::meta::Regex;
use std::collections::HashSet;

use super::normalization::{collapse_whitespace, strip_parentheticals};

/// Page furniture; a cue made only of these words, optionally numbered, is rejected
pub const PAGE_MARKERS: &[&str] = &["CONTINUED", "MORE", "THE END"];

/// Generic background-role nouns; a cue made only of these (plus modifiers) is discarded
pub const GENERIC_ROLES: &[&str] = &[
    "WAITER", "WAITERS", "WAITRESS", "DRIVER", "CABBIE", "OFFICER", "OFFICERS", "COP", "COPS",
    "POLICE", "POLICEMAN", "POLICEWOMAN", "GUARD", "GUARDS", "SECURITY", "SOLDIER", "SOLDIERS",
    "NURSE", "DOCTOR", "PARAMEDIC", "BARTENDER", "BARMAN", "CLERK", "RECEPTIONIST", "SECRETARY",
    "ASSISTANT", "MAN", "MEN", "WOMAN", "WOMEN", "GUY", "LADY", "BOY", "BOYS", "GIRL", "GIRLS",
    "KID", "KIDS", "CHILD", "CHILDREN", "TEEN", "TEENAGER", "BABY", "VOICE", "VOICES", "CROWD",
    "ALL", "EVERYONE", "BOTH", "TOGETHER", "GROUP", "STRANGER", "PASSENGER", "PASSENGERS",
    "CUSTOMER", "PATRON", "REPORTER", "JOURNALIST", "ANNOUNCER", "OPERATOR", "DISPATCHER",
    "PILOT", "CAPTAIN", "CREW", "DECKHAND", "STAFF", "WORKER", "NEIGHBOR", "NEIGHBOUR",
    "TOURIST", "STUDENT", "STUDENTS", "TEACHER", "PRIEST", "JUDGE", "LAWYER", "BYSTANDER",
    "PEDESTRIAN", "VENDOR", "SHOPKEEPER", "RADIO", "TV", "PHONE", "INTERCOM", "SPEAKER", "PA",
];

/// Descriptive words that may accompany a generic role without naming anyone
pub const ROLE_MODIFIERS: &[&str] = &[
    "A", "AN", "THE", "YOUNG", "YOUNGER", "OLD", "OLDER", "ELDERLY", "MIDDLE-AGED", "TALL",
    "SHORT", "FAT", "THIN", "LITTLE", "BIG", "FIRST", "SECOND", "THIRD", "FOURTH", "FIFTH",
    "ANOTHER", "OTHER", "ONE", "TWO", "THREE", "MALE", "FEMALE", "ANGRY", "DRUNK", "NERVOUS",
    "BORED", "PRETTY", "HANDSOME", "OF", "ON", "AND",
];

/// Location nouns; a cue containing any of these is a slug fragment, not a speaker
pub const LOCATION_NOUNS: &[&str] = &[
    "HOUSE", "KITCHEN", "STREET", "FERRY", "BEDROOM", "BATHROOM", "LIVING ROOM", "DINING ROOM",
    "HALLWAY", "CORRIDOR", "APARTMENT", "RESTAURANT", "HOSPITAL", "BUILDING", "WAREHOUSE",
    "PARKING LOT", "GARAGE", "BEACH", "FOREST", "CHURCH", "SCHOOL", "CLASSROOM", "STATION",
    "AIRPORT", "HOTEL", "LOBBY", "BASEMENT", "ROOFTOP", "GARDEN", "HIGHWAY", "DINER",
    "PRECINCT", "COURTROOM", "STAIRWELL", "ELEVATOR", "SUBWAY",
];

/// Why a cue was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Empty,
    Numeric,
    SceneNumber,
    PageMarker,
    ShotMarker,
    TimeOfDay,
    MultiDigit,
    RepeatedPunctuation,
    Colon,
    GenericRole,
    Location,
    /// Cleaned name shorter or longer than the configured bounds
    NameLength,
}

/// Rejects cue text matching known-invalid patterns, background roles and locations
pub struct CueFilter {
    pure_digits: Regex,
    scene_number: Regex,
    page_marker: Regex,
    shot_marker: Regex,
    time_of_day: Regex,
    multi_digit: Regex,
    repeated_punctuation: Regex,
    ordinal: Regex,
    generic_roles: HashSet<String>,
    role_modifiers: HashSet<&'static str>,
    locations: Vec<String>,
}

impl CueFilter {
    /// Filter with the built-in role and location sets
    pub fn new() -> Result<Self> {
        Self::with_extras(&[], &[])
    }

    /// Filter with additional production-specific roles and locations
    pub fn with_extras(extra_roles: &[String], extra_locations: &[String]) -> Result<Self> {
        let shot_markers = r"TITLE|SUPER|MONTAGE|SERIES OF SHOTS|INTERCUT|INSERT|FLASHBACK|FLASH FORWARD|BACK TO PRESENT|END FLASHBACK";
        let time_words = r"DAY|NIGHT|MORNING|EVENING|DUSK|DAWN|CONTINUOUS|LATER";

        let mut generic_roles: HashSet<String> = GENERIC_ROLES.iter().map(|r| r.to_string()).collect();
        generic_roles.extend(extra_roles.iter().map(|r| collapse_whitespace(r).to_uppercase()));

        let mut locations: Vec<String> = LOCATION_NOUNS.iter().map(|l| l.to_string()).collect();
        locations.extend(
            extra_locations
                .iter()
                .map(|l| collapse_whitespace(l).to_uppercase())
                .filter(|l| !l.is_empty()),
        );

        Ok(Self {
            pure_digits: Regex::new(r"^\d+$")?,
            scene_number: Regex::new(r"^\d+[A-Z]?\.")?,
            page_marker: Regex::new(&format!(r"^(?:\b(?:{})\b[\s\d.,'\-]*)+$", PAGE_MARKERS.join("|")))?,
            shot_marker: Regex::new(&format!(r"\b(?:{shot_markers})\b"))?,
            time_of_day: Regex::new(&format!(r"\b(?:{time_words})\b"))?,
            multi_digit: Regex::new(r"\d{2,}")?,
            repeated_punctuation: Regex::new(r"[!?.]{2,}")?,
            ordinal: Regex::new(r"^#?\d+(?:ST|ND|RD|TH)?\.?$")?,
            generic_roles,
            role_modifiers: ROLE_MODIFIERS.iter().copied().collect(),
            locations,
        })
    }

    /// Reason the cue is discarded, or `None` when it may name a character
    pub fn check(&self, cue_text: &str) -> Option<RejectReason> {
        let name = collapse_whitespace(&strip_parentheticals(cue_text)).to_uppercase();

        if name.is_empty() {
            return Some(RejectReason::Empty);
        }
        if self.pure_digits.is_match(name.as_str()) {
            return Some(RejectReason::Numeric);
        }
        if self.scene_number.is_match(name.as_str()) {
            return Some(RejectReason::SceneNumber);
        }
        if self.page_marker.is_match(name.as_str()) {
            return Some(RejectReason::PageMarker);
        }
        if self.shot_marker.is_match(name.as_str()) {
            return Some(RejectReason::ShotMarker);
        }
        if self.time_of_day.is_match(name.as_str()) {
            return Some(RejectReason::TimeOfDay);
        }
        if self.multi_digit.is_match(name.as_str()) {
            return Some(RejectReason::MultiDigit);
        }
        if self.repeated_punctuation.is_match(name.as_str()) {
            return Some(RejectReason::RepeatedPunctuation);
        }
        if name.contains(':') {
            return Some(RejectReason::Colon);
        }
        if self.is_generic_role(&name) {
            return Some(RejectReason::GenericRole);
        }
        if self.is_location(&name) {
            return Some(RejectReason::Location);
        }
        None
    }

    /// Convenience inverse of [`CueFilter::check`]
    pub fn accepts(&self, cue_text: &str) -> bool {
        self.check(cue_text).is_none()
    }

    /// Every token is a role noun, a modifier or a number, and at least one is a role noun
    /// WHY: `OFFICER BROOKS` names someone while `POLICE OFFICER #2` does not
    pub fn is_generic_role(&self, name: &str) -> bool {
        let mut saw_role = false;
        for token in name.split_whitespace() {
            let token = token.trim_matches(|c: char| matches!(c, ',' | '\'' | '"'));
            if self.generic_roles.contains(token) {
                saw_role = true;
            } else if self.role_modifiers.contains(token)
                || self.ordinal.is_match(token)
                || (token.chars().count() == 1 && token.chars().all(|c| c.is_ascii_alphabetic()))
            {
                continue;
            } else {
                return false;
            }
        }
        saw_role
    }

    /// Any location noun appears as a substring
    pub fn is_location(&self, name: &str) -> bool {
        self.locations.iter().any(|location| name.contains(location.as_str()))
    }
}

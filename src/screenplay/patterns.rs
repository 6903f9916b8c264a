// WHY: Compiled screenplay line patterns shared by every detection stage
// Uses regex-automata meta regexes built from composable pattern fragments

use anyhow::Result;
use regex_automata::meta::Regex;
use tracing::debug;

/// Cue text split into its name and the trailing parentheticals, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCue {
    /// Trimmed uppercase name part, e.g. `GWEN LAWSON`
    pub name: String,
    /// Name plus parentheticals with whitespace collapsed, e.g. `GWEN LAWSON (V.O.)`
    pub text: String,
}

/// Compiled line predicates for headings, transitions and cue extraction
pub struct ScreenplayPatterns {
    heading: Regex,
    transition: Regex,
    cue: Regex,
}

impl ScreenplayPatterns {
    pub fn new() -> Result<Self> {
        // Compositional pattern components
        let scene_number = r"(?:\d+[A-Z]?\.?\s+)?";
        let interior_exterior = r"(?:INT\.?\s*/\s*EXT\.?|EXT\.?\s*/\s*INT\.?|I\s*/\s*E\.|INT\.|EXT\.)";
        let dashed_token = r"(?:INT|EXT)\s*[-\u{2013}\u{2014}]";

        let heading_pattern = format!(r"(?i)^\s*{scene_number}(?:{interior_exterior}|{dashed_token})");

        let named_transitions = r"(?i:CUT TO|SMASH CUT TO|MATCH CUT TO|JUMP CUT TO|FADE IN|FADE OUT|FADE TO BLACK|CUT TO BLACK|DISSOLVE TO|BACK TO|WIPE TO)";
        let generic_transition = r"[\p{Lu}\s]+ TO:";
        let transition_pattern = format!(
            r"^\s*(?:(?:{named_transitions}\s*[:.]?)|(?:{generic_transition}))\s*$"
        );

        // Name: uppercase words (letters, digits, initials, apostrophes, hyphens)
        let name_chars = r"[\p{Lu}\d][\p{Lu}\d\s.'\u{2019}&#/\-]*?";
        let parentheticals = r"(?:\([^)]*\)?\s*)*";
        let cue_pattern = format!(r"^\s*({name_chars})\s*({parentheticals})\^?\s*$");

        let patterns = Self {
            heading: Regex::new(&heading_pattern)?,
            transition: Regex::new(&transition_pattern)?,
            cue: Regex::new(&cue_pattern)?,
        };

        debug!("Compiled screenplay patterns");
        Ok(patterns)
    }

    /// Scene heading such as `INT. FERRY - DAY`, `12A EXT. STREET` or `INT - OFFICE`
    pub fn is_heading(&self, line: &str) -> bool {
        self.heading.is_match(line)
    }

    /// Transition such as `CUT TO:` or `FADE OUT.`
    pub fn is_transition(&self, line: &str) -> bool {
        self.transition.is_match(line)
    }

    /// Heading or transition; neither can be a cue nor dialogue
    pub fn is_structural(&self, line: &str) -> bool {
        self.is_heading(line) || self.is_transition(line)
    }

    /// Extract `NAME (PAREN)` from a cue-shaped line
    pub fn extract_cue(&self, line: &str) -> Option<ExtractedCue> {
        let mut caps = self.cue.create_captures();
        self.cue.captures(line, &mut caps);
        if !caps.is_match() {
            return None;
        }

        let name_span = caps.get_group(1)?;
        let name = line[name_span.range()].trim();
        if name.is_empty() || !name.chars().any(char::is_alphabetic) {
            return None;
        }

        let mut text = String::with_capacity(line.len());
        text.push_str(name);
        if let Some(paren_span) = caps.get_group(2) {
            let parens = line[paren_span.range()].trim();
            if !parens.is_empty() {
                text.push(' ');
                text.push_str(parens);
            }
        }

        Some(ExtractedCue {
            name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        })
    }
}

/// Leading tab, or at least `indent_spaces` leading spaces
pub fn is_indented(raw_line: &str, indent_spaces: usize) -> bool {
    if raw_line.starts_with('\t') {
        return true;
    }
    raw_line.chars().take_while(|c| *c == ' ').count() >= indent_spaces
}

/// Name part (before the first `(`) is all uppercase and has at least one letter
pub fn is_cue_shaped(line: &str) -> bool {
    let name_part = match line.find('(') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let name_part = name_part.trim();
    !name_part.is_empty()
        && name_part.chars().any(char::is_alphabetic)
        && !name_part.chars().any(char::is_lowercase)
}

/// Line opens a parenthetical direction, e.g. `(beat)`
pub fn is_parenthetical(line: &str) -> bool {
    line.trim_start().starts_with('(')
}

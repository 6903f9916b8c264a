// WHY: Per-scene cue scanner built from the line predicates in patterns
// Separated from the detector so scenes can be scanned without touching the registry

use tracing::debug;

use super::patterns::{is_cue_shaped, is_indented, is_parenthetical, ScreenplayPatterns};
use super::{DetectorConfig, RawCue, Scene};

/// Yields raw cue candidates from the lines of one scene
pub struct CueScanner<'a> {
    patterns: &'a ScreenplayPatterns,
    indent_spaces: usize,
    min_name_len: usize,
    max_name_len: usize,
}

impl<'a> CueScanner<'a> {
    pub fn new(patterns: &'a ScreenplayPatterns, config: &DetectorConfig) -> Self {
        Self {
            patterns,
            indent_spaces: config.indent_spaces,
            min_name_len: config.min_name_len,
            max_name_len: config.max_name_len,
        }
    }

    pub fn scan_scene(&self, scene: &Scene) -> Vec<RawCue> {
        let lines: Vec<&str> = scene.content.lines().collect();
        self.scan_lines(&lines, scene.index)
    }

    /// Scan lines top to bottom; never fails, malformed lines are simply not cues
    pub fn scan_lines(&self, lines: &[&str], scene_index: usize) -> Vec<RawCue> {
        let mut cues = Vec::new();
        for i in 0..lines.len() {
            if let Some(cue) = self.cue_at(lines, i, scene_index) {
                cues.push(cue);
            }
        }
        cues
    }

    fn cue_at(&self, lines: &[&str], i: usize, scene_index: usize) -> Option<RawCue> {
        let raw_line = lines[i];
        let line = raw_line.trim();

        if line.is_empty() || self.patterns.is_structural(line) {
            return None;
        }

        let indented = is_indented(raw_line, self.indent_spaces);

        if !is_cue_shaped(line) {
            return None;
        }

        // Indented cues are trusted even without a dialogue line after them
        if !indented && !self.has_dialogue_following(lines, i) {
            debug!(line, scene_index, "Unindented caps line without dialogue");
            return None;
        }

        let extracted = self.patterns.extract_cue(line)?;
        let name_len = extracted.name.chars().count();
        if name_len < self.min_name_len || name_len > self.max_name_len {
            debug!(line, name_len, "Cue name length out of bounds");
            return None;
        }

        Some(RawCue {
            text: extracted.text,
            scene_index,
        })
    }

    /// Dialogue follows the line at `cue_line`, skipping blanks and parentheticals
    pub fn has_dialogue_following(&self, lines: &[&str], cue_line: usize) -> bool {
        let Some(next) = next_non_blank(lines, cue_line + 1) else {
            return false;
        };
        let next_line = lines[next].trim();

        if !is_parenthetical(next_line) {
            return self.is_dialogue_line(next_line);
        }

        // Skip the parenthetical block, including continuation lines of an unclosed one
        let mut open = false;
        for line in &lines[next..] {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if open {
                open = !line.contains(')');
                continue;
            }
            if is_parenthetical(line) {
                open = !line.contains(')');
                continue;
            }
            return self.is_dialogue_line(line);
        }
        false
    }

    fn is_dialogue_line(&self, line: &str) -> bool {
        !self.patterns.is_structural(line) && !is_cue_shaped(line)
    }
}

fn next_non_blank(lines: &[&str], from: usize) -> Option<usize> {
    (from..lines.len()).find(|&i| !lines[i].trim().is_empty())
}

// WHY: Scene segmentation at heading lines
// Byte-offset slicing keeps scene content identical to the input text

use tracing::debug;

use super::patterns::ScreenplayPatterns;
use super::Scene;

/// Split raw screenplay text into scenes at heading lines
/// Each scene runs from its heading line up to (excluding) the next heading line
pub fn segment_scenes(text: &str, patterns: &ScreenplayPatterns) -> Vec<Scene> {
    // (byte offset, 0-based line number, trimmed heading)
    let mut headings: Vec<(usize, usize, &str)> = Vec::new();
    let mut byte_pos = 0usize;

    for (line_number, line) in text.split_inclusive('\n').enumerate() {
        let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if patterns.is_heading(content) {
            headings.push((byte_pos, line_number, content.trim()));
        }
        byte_pos += line.len();
    }

    let scenes: Vec<Scene> = headings
        .iter()
        .enumerate()
        .map(|(i, &(start, line_offset, heading))| {
            let end = headings.get(i + 1).map(|next| next.0).unwrap_or(text.len());
            Scene {
                index: i + 1,
                heading: heading.to_string(),
                content: text[start..end].to_string(),
                line_offset,
            }
        })
        .collect();

    debug!("Segmented {} scenes from {} bytes", scenes.len(), text.len());
    scenes
}

// WHY: standalone cue name cleaning shared by the filter and the registry
// Separates display-form cleanup from alias lookup

/// Remove every parenthetical group, closed or trailing-unclosed, plus a dual-dialogue caret
pub fn strip_parentheticals(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut depth = 0usize;

    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => result.push(ch),
            _ => {}
        }
    }

    result.trim_end().trim_end_matches('^').trim_end().to_string()
}

/// Collapse whitespace runs into single spaces and trim, reusing the supplied buffer
pub fn collapse_whitespace_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut prev_was_space = true; // suppresses leading whitespace
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                buffer.push(' ');
                prev_was_space = true;
            }
        } else {
            buffer.push(ch);
            prev_was_space = false;
        }
    }

    if buffer.ends_with(' ') {
        buffer.pop();
    }
}

/// Collapse whitespace with a new allocation
pub fn collapse_whitespace(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len());
    collapse_whitespace_into(text, &mut buffer);
    buffer
}

/// First character of each space-delimited token uppercased, remainder lowercased
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, token) in text.split(' ').enumerate() {
        if i > 0 {
            result.push(' ');
        }
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            for ch in chars {
                result.extend(ch.to_lowercase());
            }
        }
    }
    result
}

/// Parentheticals stripped, whitespace collapsed, title-cased; `None` when nothing is left
pub fn clean_cue_name(raw: &str) -> Option<String> {
    let stripped = strip_parentheticals(raw);
    let collapsed = collapse_whitespace(&stripped);
    if collapsed.is_empty() {
        return None;
    }
    Some(title_case(&collapsed))
}

/// Case-folded alias key
pub fn fold(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Case-folded word tokens of a name
pub fn name_tokens(name: &str) -> Vec<String> {
    name.split_whitespace().map(str::to_lowercase).collect()
}

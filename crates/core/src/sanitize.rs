pub const MAX_FILENAME_LENGTH: usize = 255;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Literal text between placeholders: `-` connectors become `_`.
pub fn normalize_literal_connector(input: &str) -> String {
    input
        .chars()
        .map(|ch| if ch == '-' { '_' } else { ch })
        .collect()
}

/// A placeholder value: whitespace runs collapse to `_` and characters that
/// are illegal in file names become `_`.
pub fn normalize_value(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|ch| if is_disallowed_char(ch) { '_' } else { ch })
        .collect()
}

/// Collapses each run of separators into one character (`_` wins over `-`,
/// which wins over a space) and trims separators and dots at both ends.
pub fn cleanup_filename(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut run: Option<char> = None;

    for ch in value.chars() {
        if is_collapse_separator(ch) {
            run = Some(match run {
                Some(prev) if separator_rank(prev) >= separator_rank(ch) => prev,
                _ => ch,
            });
            continue;
        }
        if let Some(sep) = run.take() {
            out.push(sep);
        }
        out.push(ch);
    }

    out.trim_matches(|c: char| c == '_' || c == '-' || c == ' ' || c == '.')
        .to_string()
}

fn separator_rank(ch: char) -> u8 {
    match ch {
        '_' => 2,
        '-' => 1,
        _ => 0,
    }
}

/// Replaces disallowed characters, strips trailing dots and spaces and
/// suffixes Windows device names. An empty input stays empty.
pub fn sanitize_filename(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|ch| if is_disallowed_char(ch) { '_' } else { ch })
        .collect();

    let mut out = replaced.trim_end_matches([' ', '.']).trim().to_string();
    if !out.is_empty() && is_windows_reserved(&out) {
        out.push_str("_file");
    }
    out
}

/// Sanitizes one directory segment of a folder path.
pub fn sanitize_path_segment(value: &str) -> String {
    sanitize_filename(&cleanup_filename(&normalize_value(value)))
}

pub fn is_valid_filename(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !name.chars().any(is_disallowed_char)
}

pub fn truncate_filename_if_needed(
    filename_without_ext: &str,
    extension_with_dot: &str,
    limit: usize,
) -> String {
    let ext_len = extension_with_dot.chars().count();
    if filename_without_ext.chars().count() + ext_len <= limit {
        return filename_without_ext.to_string();
    }

    let mut tokens: Vec<&str> = filename_without_ext.split('_').collect();
    while tokens.len() > 1 {
        tokens.pop();
        let candidate = tokens.join("_");
        if candidate.chars().count() + ext_len <= limit {
            return candidate;
        }
    }

    filename_without_ext
        .chars()
        .take(limit.saturating_sub(ext_len))
        .collect()
}

fn is_collapse_separator(ch: char) -> bool {
    matches!(ch, '_' | '-' | ' ')
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}

fn is_windows_reserved(value: &str) -> bool {
    let stem = value
        .split('.')
        .next()
        .unwrap_or(value)
        .to_ascii_uppercase();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved == &stem)
}

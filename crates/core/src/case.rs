use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStyle {
    #[default]
    None,
    Lowercase,
    Uppercase,
    Capitalize,
    TitleCase,
    KebabCase,
    SnakeCase,
    CamelCase,
    PascalCase,
}

const WORD_SEPARATORS: &[char] = &[' ', '_', '-', '.'];

/// Applies `style` to the stem and lowercases the extension. Leading dots
/// of hidden files are kept.
pub fn normalize_filename(filename: &str, style: CaseStyle) -> String {
    if style == CaseStyle::None || filename.is_empty() {
        return filename.to_string();
    }

    let search_from = usize::from(filename.starts_with('.'));
    let (stem, extension) = match filename[search_from..].rfind('.') {
        Some(0) | None => (filename, ""),
        Some(pos) => filename.split_at(search_from + pos),
    };

    format!("{}{}", normalize_stem(stem, style), extension.to_lowercase())
}

/// Applies `style` to a name that carries no extension, keeping a leading
/// dot.
pub fn normalize_stem(stem: &str, style: CaseStyle) -> String {
    match stem.strip_prefix('.') {
        Some(rest) => format!(".{}", normalize_case(rest, style)),
        None => normalize_case(stem, style),
    }
}

pub fn normalize_case(name: &str, style: CaseStyle) -> String {
    if style == CaseStyle::None || name.is_empty() {
        return name.to_string();
    }

    let words = split_into_words(name);
    match style {
        CaseStyle::None => name.to_string(),
        CaseStyle::Lowercase => join_mapped(&words, " ", str::to_lowercase),
        CaseStyle::Uppercase => join_mapped(&words, " ", str::to_uppercase),
        CaseStyle::Capitalize => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { capitalize(w) } else { w.to_lowercase() })
            .collect::<Vec<_>>()
            .join(" "),
        CaseStyle::TitleCase => join_mapped(&words, " ", capitalize),
        CaseStyle::KebabCase => join_mapped(&words, "-", str::to_lowercase),
        CaseStyle::SnakeCase => join_mapped(&words, "_", str::to_lowercase),
        CaseStyle::CamelCase => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect(),
        CaseStyle::PascalCase => join_mapped(&words, "", capitalize),
    }
}

fn join_mapped(words: &[String], separator: &str, f: impl Fn(&str) -> String) -> String {
    words
        .iter()
        .map(|w| f(w.as_str()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Splits on separators and on lower-to-upper camel case transitions.
fn split_into_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in input.chars() {
        if WORD_SEPARATORS.contains(&ch) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev_lower = ch.is_lowercase();
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

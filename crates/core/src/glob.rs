//! Glob patterns for filename rules.
//!
//! Braces are expanded first, each expansion is translated to a regex
//! fragment, and the fragments are OR-ed into one anchored regex.

use regex::{Regex, RegexBuilder};

const MAX_BRACE_EXPANSIONS: usize = 1024;
pub(crate) const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobOptions {
    pub case_sensitive: bool,
}

impl GlobOptions {
    pub fn case_sensitive(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

/// A compiled glob. A pattern that cannot be compiled yields a matcher that
/// never matches.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    regex: Option<Regex>,
}

impl GlobMatcher {
    pub fn test(&self, name: &str) -> bool {
        self.regex
            .as_ref()
            .map(|regex| regex.is_match(name))
            .unwrap_or(false)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_degraded(&self) -> bool {
        self.regex.is_none()
    }
}

pub fn compile(pattern: &str, options: GlobOptions) -> GlobMatcher {
    let regex = build_regex(pattern, options);
    if regex.is_none() {
        tracing::warn!("glob pattern {:?} could not be compiled; it will match nothing", pattern);
    }
    GlobMatcher {
        pattern: pattern.to_string(),
        regex,
    }
}

pub fn is_valid_glob(pattern: &str) -> bool {
    build_regex(pattern, GlobOptions::default()).is_some()
}

pub fn filter_by_glob<'a, S: AsRef<str>>(
    pattern: &str,
    names: &'a [S],
    options: GlobOptions,
) -> Vec<&'a str> {
    let matcher = compile(pattern, options);
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| matcher.test(name))
        .collect()
}

/// Expands `{a,b}` alternations, including nested and sequential groups.
/// Returns `None` when the expansion would exceed the internal limit.
pub fn expand_braces(pattern: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    if expand_into(pattern, &mut out) {
        Some(out)
    } else {
        None
    }
}

fn build_regex(pattern: &str, options: GlobOptions) -> Option<Regex> {
    let expansions = expand_braces(pattern)?;
    let alternatives: Vec<String> = expansions.iter().map(|p| glob_to_regex(p)).collect();
    let source = format!("^(?:{})$", alternatives.join("|"));

    RegexBuilder::new(&source)
        .case_insensitive(!options.case_sensitive)
        .dot_matches_new_line(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .ok()
}

fn expand_into(pattern: &str, out: &mut Vec<String>) -> bool {
    let Some(group) = find_brace_group(pattern) else {
        out.push(pattern.to_string());
        return out.len() <= MAX_BRACE_EXPANSIONS;
    };

    let prefix = &pattern[..group.open];
    let suffix = &pattern[group.close + 1..];
    let mut start = group.open + 1;
    let mut bounds = group.commas.clone();
    bounds.push(group.close);

    for end in bounds {
        let candidate = format!("{}{}{}", prefix, &pattern[start..end], suffix);
        if !expand_into(&candidate, out) {
            return false;
        }
        start = end + 1;
    }

    true
}

struct BraceGroup {
    open: usize,
    close: usize,
    commas: Vec<usize>,
}

// Braces, commas and backslashes are ASCII, so scanning bytes never splits a
// multi-byte character.
fn find_brace_group(pattern: &str) -> Option<BraceGroup> {
    let bytes = pattern.as_bytes();
    let mut search_from = 0usize;

    'outer: while search_from < bytes.len() {
        let mut i = search_from;
        let open = loop {
            match bytes.get(i)? {
                b'\\' => i += 2,
                b'{' => break i,
                _ => i += 1,
            }
        };

        let mut depth = 0usize;
        let mut commas = Vec::new();
        let mut j = open;
        while j < bytes.len() {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if commas.is_empty() {
                            // `{x}` is literal; keep looking inside and after it.
                            search_from = open + 1;
                            continue 'outer;
                        }
                        return Some(BraceGroup {
                            open,
                            close: j,
                            commas,
                        });
                    }
                }
                b',' if depth == 1 => commas.push(j),
                _ => {}
            }
            j += 1;
        }

        // Unclosed brace: treat it as a literal and retry past it.
        search_from = open + 1;
    }

    None
}

fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2);
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some(next) => {
                    push_literal(&mut out, *next);
                    i += 2;
                }
                None => {
                    push_literal(&mut out, '\\');
                    i += 1;
                }
            },
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => match parse_class(&chars, i) {
                Some((class, next)) => {
                    out.push_str(&class);
                    i = next;
                }
                None => {
                    push_literal(&mut out, '[');
                    i += 1;
                }
            },
            ch => {
                push_literal(&mut out, ch);
                i += 1;
            }
        }
    }

    out
}

fn parse_class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let mut class = String::from("[");
    if matches!(chars.get(i), Some('!') | Some('^')) {
        class.push('^');
        i += 1;
    }

    let first = i;
    while i < chars.len() {
        let ch = chars[i];
        if ch == ']' && i > first {
            class.push(']');
            return Some((class, i + 1));
        }
        if ch == '\\' {
            if let Some(next) = chars.get(i + 1) {
                push_class_literal(&mut class, *next);
                i += 2;
                continue;
            }
        }
        if ch == '-' && i > first && chars.get(i + 1).is_some_and(|next| *next != ']') {
            class.push('-');
            i += 1;
            continue;
        }
        push_class_literal(&mut class, ch);
        i += 1;
    }

    None
}

fn push_literal(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
}

fn push_class_literal(class: &mut String, ch: char) {
    if matches!(ch, '\\' | '[' | ']' | '^' | '&' | '~' | '-') {
        class.push('\\');
    }
    class.push(ch);
}

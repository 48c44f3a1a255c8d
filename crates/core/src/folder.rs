use crate::error::ResolveError;
use crate::file::FileDescriptor;
use crate::metadata::{UnifiedMetadata, ValueSource};
use crate::placeholder::{
    parse_template, resolve_placeholder, PlaceholderOptions, ResolvedPlaceholder, TemplatePart,
};
use crate::sanitize::sanitize_path_segment;
use serde::{Deserialize, Serialize};

/// A resolved folder pattern. `resolved_path` is always relative and uses
/// `/` separators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderResolution {
    pub resolved_path: String,
    pub resolved_placeholders: Vec<ResolvedPlaceholder>,
    pub used_fallbacks: bool,
}

/// Resolves `pattern` into a relative directory. Any base directory is the
/// caller's to prepend.
pub fn resolve_folder_path(
    pattern: &str,
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    options: &PlaceholderOptions,
) -> Result<FolderResolution, ResolveError> {
    if pattern.trim().is_empty() {
        return Err(invalid_pattern("folder pattern is empty"));
    }

    let mut segments: Vec<String> = Vec::new();
    let mut resolved: Vec<ResolvedPlaceholder> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for raw_segment in pattern.replace('\\', "/").split('/') {
        if raw_segment.trim().is_empty() {
            continue;
        }

        let mut segment = String::new();
        for part in parse_template(raw_segment)? {
            match part {
                TemplatePart::Literal(text) => segment.push_str(&text),
                TemplatePart::Placeholder(placeholder) => {
                    match resolve_placeholder(&placeholder, metadata, file, options) {
                        Some(value) => {
                            if options.sanitize {
                                segment.push_str(&sanitize_path_segment(&value.value));
                            } else {
                                segment.push_str(&value.value);
                            }
                            if !resolved.iter().any(|r| r.placeholder == value.placeholder) {
                                resolved.push(value);
                            }
                        }
                        None => {
                            if !missing.contains(&placeholder.name) {
                                missing.push(placeholder.name);
                            }
                        }
                    }
                }
            }
        }
        segments.push(segment.trim().to_string());
    }

    if !missing.is_empty() {
        return Err(ResolveError::MissingMetadata { fields: missing });
    }

    let resolved_path = normalize_relative_path(&segments.join("/"));
    if resolved_path.is_empty() {
        return Err(invalid_pattern("folder pattern resolves to an empty path"));
    }
    if resolved_path.split('/').any(|segment| segment == "..") {
        return Err(invalid_pattern("folder pattern escapes the base directory"));
    }

    Ok(FolderResolution {
        used_fallbacks: resolved.iter().any(|r| r.source == ValueSource::Fallback),
        resolved_path,
        resolved_placeholders: resolved,
    })
}

/// Syntax check without resolving values: the pattern must not be blank,
/// every segment must parse and no literal segment may be `..`.
pub fn validate_folder_pattern(pattern: &str) -> Result<(), ResolveError> {
    if pattern.trim().is_empty() {
        return Err(invalid_pattern("folder pattern is empty"));
    }
    for segment in pattern.replace('\\', "/").split('/') {
        if segment.trim().is_empty() {
            continue;
        }
        if segment.trim() == ".." {
            return Err(invalid_pattern("folder pattern escapes the base directory"));
        }
        parse_template(segment)?;
    }
    Ok(())
}

/// `\` becomes `/`, empty and `.` segments drop out, no leading or trailing
/// slash remains.
pub fn normalize_relative_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn invalid_pattern(reason: &str) -> ResolveError {
    ResolveError::InvalidPattern {
        reason: reason.to_string(),
    }
}

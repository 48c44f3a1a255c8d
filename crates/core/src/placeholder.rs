use crate::case::{normalize_stem, CaseStyle};
use crate::error::ResolveError;
use crate::file::FileDescriptor;
use crate::metadata::{non_blank, ImageMetadata, UnifiedMetadata, ValueSource};
use crate::sanitize::{
    cleanup_filename, is_valid_filename, normalize_literal_connector, normalize_value,
    sanitize_filename, truncate_filename_if_needed, MAX_FILENAME_LENGTH,
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

const DATE_TOKENS: [&str; 6] = ["YYYY", "MM", "DD", "HH", "mm", "ss"];

/// Date stamps and copy counters left by earlier renames, removed in this
/// order when `strip_existing_patterns` is set.
const EXISTING_NAME_PATTERNS: [&str; 6] = [
    r"^\d{4}[-_]\d{2}[-_]\d{2}[-_ ]?",
    r"^\d{8}[-_ ]?",
    r"^\d{2}[-_]\d{2}[-_]\d{4}[-_ ]?",
    r"[-_ ]\d{4}[-_]?\d{2}[-_]?\d{2}$",
    r"[-_ ]\d{1,4}$",
    r"\(\d{1,4}\)$",
];

static EXISTING_NAME_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EXISTING_NAME_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Placeholder(Placeholder),
}

/// A `{name}` or `{name:FORMAT}` token. Names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlaceholder {
    pub placeholder: String,
    pub value: String,
    pub source: ValueSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ResolveWarning {
    NameTooLong { length: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedName {
    pub name: String,
    pub resolved_placeholders: Vec<ResolvedPlaceholder>,
    pub used_fallbacks: bool,
    pub warnings: Vec<ResolveWarning>,
}

#[derive(Debug, Clone)]
pub struct PlaceholderOptions {
    /// Values keyed by placeholder name, used when metadata has nothing.
    pub fallbacks: HashMap<String, String>,
    pub include_extension: bool,
    pub sanitize: bool,
    /// Format for a bare `{date}`.
    pub date_format: Option<String>,
    pub max_filename_len: Option<usize>,
    /// Applied to the stem before the validity check. Any active style
    /// lowercases the extension.
    pub case_style: CaseStyle,
    /// `{original}` and `{name}` drop date stamps and copy counters.
    pub strip_existing_patterns: bool,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        Self {
            fallbacks: HashMap::new(),
            include_extension: true,
            sanitize: true,
            date_format: None,
            max_filename_len: None,
            case_style: CaseStyle::None,
            strip_existing_patterns: false,
        }
    }
}

pub fn validate_template(input: &str) -> Result<(), ResolveError> {
    parse_template(input).map(|_| ())
}

pub fn parse_template(input: &str) -> Result<Vec<TemplatePart>, ResolveError> {
    if input.trim().is_empty() {
        return Err(parse_error("template is empty"));
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let mut token = String::new();
                let mut found_close = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    if next == '{' {
                        return Err(parse_error("nested '{' inside a placeholder"));
                    }
                    token.push(next);
                }
                if !found_close {
                    return Err(parse_error("unclosed '{'"));
                }
                parts.push(TemplatePart::Placeholder(parse_placeholder(&token)?));
            }
            '}' => return Err(parse_error("'}' without a matching '{'")),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    Ok(parts)
}

fn parse_placeholder(token: &str) -> Result<Placeholder, ResolveError> {
    let (name, format) = match token.split_once(':') {
        Some((name, format)) => (name, Some(format.to_string())),
        None => (token, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(parse_error("empty placeholder"));
    }
    Ok(Placeholder {
        name: name.to_lowercase(),
        format,
    })
}

fn parse_error(message: &str) -> ResolveError {
    ResolveError::Parse {
        message: message.to_string(),
    }
}

pub fn resolve(
    template: &str,
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    options: &PlaceholderOptions,
) -> Result<ResolvedName, ResolveError> {
    let parts = parse_template(template)?;
    resolve_parts(&parts, metadata, file, options)
}

/// Resolves an already parsed template into a file name.
pub fn resolve_parts(
    parts: &[TemplatePart],
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    options: &PlaceholderOptions,
) -> Result<ResolvedName, ResolveError> {
    let (stem_parts, explicit_ext) = split_explicit_extension(parts);

    let mut raw = String::new();
    let mut resolved: Vec<ResolvedPlaceholder> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    let mut render = |placeholder: &Placeholder| -> Option<String> {
        match resolve_placeholder(placeholder, metadata, file, options) {
            Some(value) => {
                let text = if options.sanitize {
                    normalize_value(&value.value)
                } else {
                    value.value.clone()
                };
                if !resolved.iter().any(|r| r.placeholder == value.placeholder) {
                    resolved.push(value);
                }
                Some(text)
            }
            None => {
                if !missing.contains(&placeholder.name) {
                    missing.push(placeholder.name.clone());
                }
                None
            }
        }
    };

    for part in &stem_parts {
        match part {
            TemplatePart::Literal(text) if options.sanitize => {
                raw.push_str(&normalize_literal_connector(text))
            }
            TemplatePart::Literal(text) => raw.push_str(text),
            TemplatePart::Placeholder(placeholder) => {
                if let Some(text) = render(placeholder) {
                    raw.push_str(&text);
                }
            }
        }
    }
    let explicit_suffix = explicit_ext
        .and_then(|placeholder| render(placeholder))
        .map(|ext| format!(".{}", ext.trim()));

    if !missing.is_empty() {
        return Err(ResolveError::MissingMetadata { fields: missing });
    }

    let base = if options.sanitize {
        sanitize_filename(&cleanup_filename(&raw))
    } else {
        raw.trim().to_string()
    };

    let extension = file.extension.trim();
    let (stem, suffix) = match explicit_suffix {
        Some(suffix) => (base.as_str(), suffix),
        None => {
            let (stem, existing_suffix) = split_known_extension(&base, extension);
            let suffix = if options.include_extension
                && existing_suffix.is_empty()
                && !extension.is_empty()
            {
                format!(".{}", extension)
            } else {
                existing_suffix.to_string()
            };
            (stem, suffix)
        }
    };

    let (stem, suffix) = match options.case_style {
        CaseStyle::None => (stem.to_string(), suffix),
        style => (normalize_stem(stem, style), suffix.to_lowercase()),
    };

    let stem = match options.max_filename_len {
        Some(limit) => truncate_filename_if_needed(&stem, &suffix, limit),
        None => stem,
    };
    let name = format!("{}{}", stem, suffix);

    if !is_valid_filename(&stem) || !is_valid_filename(&name) {
        return Err(ResolveError::InvalidFilename { name });
    }

    let mut warnings = Vec::new();
    let length = name.chars().count();
    if length > MAX_FILENAME_LENGTH {
        warnings.push(ResolveWarning::NameTooLong { length });
    }

    Ok(ResolvedName {
        used_fallbacks: resolved.iter().any(|r| r.source == ValueSource::Fallback),
        name,
        resolved_placeholders: resolved,
        warnings,
    })
}

/// A template ending in `.{ext}` or `.{extension}` names its own extension.
/// Returns the stem parts, with the dot removed, and the extension token.
fn split_explicit_extension(parts: &[TemplatePart]) -> (Vec<TemplatePart>, Option<&Placeholder>) {
    if let [head @ .., TemplatePart::Literal(dot), TemplatePart::Placeholder(ext)] = parts {
        let is_ext = matches!(ext.name.as_str(), "ext" | "extension") && ext.format.is_none();
        if let (true, Some(before)) = (is_ext, dot.strip_suffix('.')) {
            let mut stem = head.to_vec();
            if !before.is_empty() {
                stem.push(TemplatePart::Literal(before.to_string()));
            }
            return (stem, Some(ext));
        }
    }
    (parts.to_vec(), None)
}

/// Splits off a trailing `.ext` when the name already carries the file's
/// extension, compared ASCII case-insensitively.
fn split_known_extension<'a>(name: &'a str, extension: &str) -> (&'a str, &'a str) {
    if extension.is_empty() {
        return (name, "");
    }
    let dotted_len = extension.len() + 1;
    if name.len() <= dotted_len {
        return (name, "");
    }
    let split = name.len() - dotted_len;
    if !name.is_char_boundary(split) {
        return (name, "");
    }
    let (stem, tail) = name.split_at(split);
    if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(extension) {
        (stem, tail)
    } else {
        (name, "")
    }
}

/// Removes leading or trailing date stamps and trailing copy counters such
/// as `_001` or `(2)`. A name that would become empty is returned as is.
pub fn strip_existing_patterns(name: &str) -> String {
    let mut result = name.to_string();
    for regex in EXISTING_NAME_REGEXES.iter() {
        result = regex.replace(&result, "").into_owned();
    }
    let trimmed = result.trim_matches(|c| c == '-' || c == '_' || c == ' ');
    if trimmed.is_empty() {
        name.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Metadata first, then caller fallbacks. Blank values count as absent.
pub(crate) fn resolve_placeholder(
    placeholder: &Placeholder,
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    options: &PlaceholderOptions,
) -> Option<ResolvedPlaceholder> {
    let found = lookup_source(placeholder, metadata, file, options)
        .filter(|(value, _)| !value.trim().is_empty())
        .or_else(|| {
            non_blank(options.fallbacks.get(&placeholder.name).map(String::as_str))
                .map(|value| (value.to_string(), ValueSource::Fallback))
        });

    found.map(|(value, source)| ResolvedPlaceholder {
        placeholder: placeholder.name.clone(),
        value,
        source,
    })
}

fn lookup_source(
    placeholder: &Placeholder,
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    options: &PlaceholderOptions,
) -> Option<(String, ValueSource)> {
    let image = metadata.image.as_ref();
    let exif = |value: String| (value, ValueSource::Exif);
    let document = |value: &str| (value.to_string(), ValueSource::Document);
    let filesystem = |value: String| (value, ValueSource::Filesystem);

    match placeholder.name.as_str() {
        "year" => Some(date_part(metadata, file, |d| format!("{:04}", d.year()))),
        "month" => Some(date_part(metadata, file, |d| format!("{:02}", d.month()))),
        "day" => Some(date_part(metadata, file, |d| format!("{:02}", d.day()))),
        "hour" => Some(date_part(metadata, file, |d| format!("{:02}", d.hour()))),
        "minute" => Some(date_part(metadata, file, |d| format!("{:02}", d.minute()))),
        "second" => Some(date_part(metadata, file, |d| format!("{:02}", d.second()))),
        "date" => {
            let format = placeholder
                .format
                .as_deref()
                .or(options.date_format.as_deref())
                .unwrap_or(DEFAULT_DATE_FORMAT);
            Some(date_part(metadata, file, |d| format_date(d, format)))
        }
        "camera" => image.and_then(ImageMetadata::camera).map(exif),
        "make" => image
            .and_then(|i| non_blank(i.camera_make.as_deref()))
            .map(|v| exif(v.to_string())),
        "model" => image
            .and_then(|i| non_blank(i.camera_model.as_deref()))
            .map(|v| exif(v.to_string())),
        "lens" => image
            .and_then(|i| non_blank(i.lens_model.as_deref()))
            .map(|v| exif(v.to_string())),
        "location" => image.and_then(ImageMetadata::location).map(exif),
        "width" => image.and_then(|i| i.width).map(|v| exif(v.to_string())),
        "height" => image.and_then(|i| i.height).map(|v| exif(v.to_string())),
        "author" => metadata.document_author().map(document),
        "title" => metadata.document_title().map(document),
        "subject" => metadata.document_subject().map(document),
        "original" | "name" if options.strip_existing_patterns => {
            Some(filesystem(strip_existing_patterns(&file.name)))
        }
        "original" | "name" => Some(filesystem(file.name.clone())),
        "ext" | "extension" => Some(filesystem(file.extension.clone())),
        "size" => Some(filesystem(format_size(file.size))),
        "category" => Some(filesystem(file.category.folder_label().to_string())),
        _ => None,
    }
}

fn date_part(
    metadata: &UnifiedMetadata,
    file: &FileDescriptor,
    render: impl Fn(&DateTime<Utc>) -> String,
) -> (String, ValueSource) {
    let (date, source) = source_date(metadata, file);
    (render(&date), source)
}

/// Image capture date, then the document date, then the file's mtime.
fn source_date(metadata: &UnifiedMetadata, file: &FileDescriptor) -> (DateTime<Utc>, ValueSource) {
    if let Some(date) = metadata.image.as_ref().and_then(|image| image.date_taken) {
        return (date, ValueSource::Exif);
    }
    if let Some(date) = metadata.document_date() {
        return (date, ValueSource::Document);
    }
    (file.modified_at, ValueSource::Filesystem)
}

/// Formats with `YYYY MM DD HH mm ss` tokens; other characters pass through.
pub fn format_date(date: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut rest = format;

    'scan: while !rest.is_empty() {
        for token in DATE_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(&render_date_token(token, date));
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }

    out
}

fn render_date_token(token: &str, date: &DateTime<Utc>) -> String {
    match token {
        "YYYY" => format!("{:04}", date.year()),
        "MM" => format!("{:02}", date.month()),
        "DD" => format!("{:02}", date.day()),
        "HH" => format!("{:02}", date.hour()),
        "mm" => format!("{:02}", date.minute()),
        "ss" => format!("{:02}", date.second()),
        _ => String::new(),
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PdfMetadata;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 14, 5, 9)
            .single()
            .expect("valid date")
    }

    fn vacation() -> FileDescriptor {
        FileDescriptor::from_path("/photos/vacation.jpg", 2048, at(2025, 6, 1))
    }

    fn photo_taken(date: DateTime<Utc>) -> UnifiedMetadata {
        UnifiedMetadata::with_image(ImageMetadata {
            date_taken: Some(date),
            camera_make: Some("FUJIFILM".to_string()),
            camera_model: Some("X-T5".to_string()),
            ..ImageMetadata::default()
        })
    }

    fn with_fallback(key: &str, value: &str) -> PlaceholderOptions {
        let mut options = PlaceholderOptions::default();
        options.fallbacks.insert(key.to_string(), value.to_string());
        options
    }

    #[test]
    fn parse_template_ok() {
        let parsed = parse_template("{year}-{Month}_{date:YYYYMMDD}").expect("must parse");
        assert_eq!(parsed.len(), 5);
        assert_eq!(
            parsed[2],
            TemplatePart::Placeholder(Placeholder {
                name: "month".to_string(),
                format: None
            })
        );
        assert_eq!(
            parsed[4],
            TemplatePart::Placeholder(Placeholder {
                name: "date".to_string(),
                format: Some("YYYYMMDD".to_string())
            })
        );
    }

    #[test]
    fn parse_template_rejects_bad_braces() {
        for bad in ["{year", "{}", "{a{b}}", "a}b", "", "   ", "{:YYYY}"] {
            let err = parse_template(bad).expect_err("must fail");
            assert_eq!(err.kind(), "parse_error", "{bad:?}");
        }
    }

    #[test]
    fn vacation_scenario() {
        let resolved = resolve(
            "{year}-{month}-{day}_{original}",
            &photo_taken(at(2026, 1, 10)),
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect("resolves");
        assert_eq!(resolved.name, "2026_01_10_vacation.jpg");
        assert!(!resolved.used_fallbacks);
        let year = &resolved.resolved_placeholders[0];
        assert_eq!(year.placeholder, "year");
        assert_eq!(year.source, ValueSource::Exif);
    }

    #[test]
    fn date_falls_back_to_document_then_filesystem() {
        let pdf = UnifiedMetadata::with_pdf(PdfMetadata {
            creation_date: Some(at(2024, 3, 2)),
            ..PdfMetadata::default()
        });
        let file = FileDescriptor::from_path("/docs/report.pdf", 10, at(2025, 6, 1));
        let from_doc =
            resolve("{date}", &pdf, &file, &PlaceholderOptions::default()).expect("resolves");
        assert_eq!(from_doc.name, "2024-03-02.pdf");
        assert_eq!(from_doc.resolved_placeholders[0].source, ValueSource::Document);

        let from_fs = resolve(
            "{date}",
            &UnifiedMetadata::default(),
            &file,
            &PlaceholderOptions::default(),
        )
        .expect("resolves");
        assert_eq!(from_fs.name, "2025-06-01.pdf");
        assert_eq!(from_fs.resolved_placeholders[0].source, ValueSource::Filesystem);
    }

    #[test]
    fn date_format_argument_and_option() {
        let meta = photo_taken(at(2026, 1, 10));
        let inline = resolve(
            "{date:YYYYMMDD_HHmmss}",
            &meta,
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect("resolves");
        assert_eq!(inline.name, "20260110_140509.jpg");

        let options = PlaceholderOptions {
            date_format: Some("DD.MM.YYYY".to_string()),
            ..PlaceholderOptions::default()
        };
        let configured = resolve("{date}", &meta, &vacation(), &options).expect("resolves");
        assert_eq!(configured.name, "10.01.2026.jpg");
    }

    #[test]
    fn fallback_fills_missing_value() {
        let resolved = resolve(
            "{author}_{original}",
            &photo_taken(at(2026, 1, 10)),
            &vacation(),
            &with_fallback("author", "Unknown Author"),
        )
        .expect("fallback applies");
        assert_eq!(resolved.name, "Unknown_Author_vacation.jpg");
        assert!(resolved.used_fallbacks);
    }

    #[test]
    fn blank_metadata_uses_fallback() {
        let pdf = UnifiedMetadata::with_pdf(PdfMetadata {
            author: Some("   ".to_string()),
            ..PdfMetadata::default()
        });
        let file = FileDescriptor::from_path("/docs/report.pdf", 10, at(2025, 6, 1));
        let resolved =
            resolve("{author}", &pdf, &file, &with_fallback("author", "anon")).expect("resolves");
        assert_eq!(resolved.name, "anon.pdf");
        assert_eq!(resolved.resolved_placeholders[0].source, ValueSource::Fallback);
    }

    #[test]
    fn missing_lists_every_field() {
        let err = resolve(
            "{author}_{title}_{author}_{project}",
            &photo_taken(at(2026, 1, 10)),
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect_err("must fail");
        assert_eq!(
            err,
            ResolveError::MissingMetadata {
                fields: vec![
                    "author".to_string(),
                    "title".to_string(),
                    "project".to_string()
                ]
            }
        );
    }

    #[test]
    fn unknown_placeholder_resolves_from_fallbacks() {
        let resolved = resolve(
            "{project}_{original}",
            &UnifiedMetadata::default(),
            &vacation(),
            &with_fallback("project", "alpha"),
        )
        .expect("resolves");
        assert_eq!(resolved.name, "alpha_vacation.jpg");
    }

    #[test]
    fn extension_is_appended_once() {
        let meta = UnifiedMetadata::default();
        let options = PlaceholderOptions::default();
        let explicit = resolve("{original}.{ext}", &meta, &vacation(), &options).expect("ok");
        assert_eq!(explicit.name, "vacation.jpg");
        let literal = resolve("{original}.JPG", &meta, &vacation(), &options).expect("ok");
        assert_eq!(literal.name, "vacation.JPG");
        let bare = resolve("{original}", &meta, &vacation(), &options).expect("ok");
        assert_eq!(bare.name, "vacation.jpg");

        let without = PlaceholderOptions {
            include_extension: false,
            ..PlaceholderOptions::default()
        };
        let stem_only = resolve("{original}", &meta, &vacation(), &without).expect("ok");
        assert_eq!(stem_only.name, "vacation");
    }

    #[test]
    fn values_are_sanitized_unless_disabled() {
        let meta = UnifiedMetadata::with_image(ImageMetadata {
            lens_model: Some("XF35mm F1.4 R".to_string()),
            camera_model: Some("A/B:C".to_string()),
            ..ImageMetadata::default()
        });
        let resolved = resolve(
            "{lens} - {model}",
            &meta,
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect("ok");
        assert_eq!(resolved.name, "XF35mm_F1.4_R_A_B_C.jpg");

        let raw = PlaceholderOptions {
            sanitize: false,
            ..PlaceholderOptions::default()
        };
        let kept = resolve("{year}-{month}", &photo_taken(at(2026, 1, 10)), &vacation(), &raw)
            .expect("ok");
        assert_eq!(kept.name, "2026-01.jpg");
    }

    #[test]
    fn empty_result_is_invalid_filename() {
        let meta = UnifiedMetadata::default();
        for template in ["___", "...", " - "] {
            let err = resolve(template, &meta, &vacation(), &PlaceholderOptions::default())
                .expect_err("must fail");
            assert_eq!(err.kind(), "invalid_filename", "{template:?}");
        }
    }

    #[test]
    fn long_names_warn_or_truncate() {
        let long = "a".repeat(300);
        let meta = UnifiedMetadata::default();
        let warned = resolve(&long, &meta, &vacation(), &PlaceholderOptions::default())
            .expect("long names are not fatal");
        assert_eq!(warned.warnings, vec![ResolveWarning::NameTooLong { length: 304 }]);

        let options = PlaceholderOptions {
            max_filename_len: Some(20),
            ..PlaceholderOptions::default()
        };
        let truncated = resolve(
            "{year}_{month}_{original}_{camera}",
            &photo_taken(at(2026, 1, 10)),
            &vacation(),
            &options,
        )
        .expect("ok");
        assert_eq!(truncated.name, "2026_01_vacation.jpg");
        assert!(truncated.warnings.is_empty());
    }

    #[test]
    fn image_placeholders() {
        let mut meta = photo_taken(at(2026, 1, 10));
        if let Some(image) = meta.image.as_mut() {
            image.width = Some(6240);
            image.height = Some(4160);
            image.gps = Some(crate::metadata::GpsCoordinates {
                latitude: 35.681236,
                longitude: 139.767125,
            });
        }
        let resolved = resolve(
            "{camera}_{width}x{height}_{location}",
            &meta,
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect("ok");
        assert_eq!(resolved.name, "FUJIFILM_X-T5_6240x4160_35.6812,139.7671.jpg");
    }

    #[test]
    fn filesystem_placeholders() {
        let resolved = resolve(
            "{category}_{size}_{name}",
            &UnifiedMetadata::default(),
            &vacation(),
            &PlaceholderOptions::default(),
        )
        .expect("ok");
        assert_eq!(resolved.name, "Images_2.0KB_vacation.jpg");
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
    }

    #[test]
    fn case_style_applies_before_validation() {
        let file = FileDescriptor::from_path("/x/__.jpg", 1, at(2025, 6, 1));
        let meta = UnifiedMetadata::default();
        let snake = PlaceholderOptions {
            sanitize: false,
            case_style: CaseStyle::SnakeCase,
            ..PlaceholderOptions::default()
        };
        let err = resolve("{original}", &meta, &file, &snake).expect_err("empty stem");
        assert_eq!(err.kind(), "invalid_filename");

        let kebab_no_ext = PlaceholderOptions {
            include_extension: false,
            case_style: CaseStyle::KebabCase,
            ..snake
        };
        let err = resolve("{original}", &meta, &file, &kebab_no_ext).expect_err("empty name");
        assert_eq!(err, ResolveError::InvalidFilename { name: String::new() });

        let holiday = FileDescriptor::from_path("/x/My Holiday.JPG", 1, at(2025, 6, 1));
        let kebab = PlaceholderOptions {
            case_style: CaseStyle::KebabCase,
            ..PlaceholderOptions::default()
        };
        let resolved = resolve("{original}", &meta, &holiday, &kebab).expect("ok");
        assert_eq!(resolved.name, "my-holiday.jpg");
    }

    #[test]
    fn explicit_extension_comes_from_the_template() {
        let meta = UnifiedMetadata::default();
        let raw = PlaceholderOptions {
            sanitize: false,
            ..PlaceholderOptions::default()
        };
        let err = resolve(".{ext}", &meta, &vacation(), &raw).expect_err("no stem");
        assert_eq!(err.kind(), "invalid_filename");

        let named = resolve("{original}.{ext}", &meta, &vacation(), &raw).expect("ok");
        assert_eq!(named.name, "vacation.jpg");
        let long_form = resolve("{original}.{extension}", &meta, &vacation(), &raw).expect("ok");
        assert_eq!(long_form.name, "vacation.jpg");

        let without = PlaceholderOptions {
            include_extension: false,
            ..raw
        };
        let kept = resolve("{original}_x.{ext}", &meta, &vacation(), &without).expect("ok");
        assert_eq!(kept.name, "vacation_x.jpg");
    }

    #[test]
    fn existing_patterns_are_stripped() {
        for (name, expected) in [
            ("photo", "photo"),
            ("2024-01-15_photo", "photo"),
            ("2024_01_15-photo", "photo"),
            ("20240115_photo", "photo"),
            ("15-01-2024 photo", "photo"),
            ("photo_2024-01-15", "photo"),
            ("photo-20240115", "photo"),
            ("photo_001", "photo"),
            ("photo(3)", "photo"),
            ("2024-01-15_photo_001", "photo"),
            ("vacation2024", "vacation2024"),
            ("2024-01-15", "2024-01-15"),
            ("001", "001"),
        ] {
            assert_eq!(strip_existing_patterns(name), expected, "{name:?}");
        }
    }

    #[test]
    fn stripping_applies_to_original_only_when_enabled() {
        let file = FileDescriptor::from_path("/x/2024-01-15_photo.jpg", 1, at(2025, 6, 1));
        let meta = photo_taken(at(2026, 1, 10));
        let kept = resolve("{date}_{name}", &meta, &file, &PlaceholderOptions::default())
            .expect("ok");
        assert_eq!(kept.name, "2026-01-10_2024-01-15_photo.jpg");

        let options = PlaceholderOptions {
            strip_existing_patterns: true,
            ..PlaceholderOptions::default()
        };
        let stripped = resolve("{date}_{name}", &meta, &file, &options).expect("ok");
        assert_eq!(stripped.name, "2026-01-10_photo.jpg");
    }
}

use thiserror::Error;

/// Per-file failure while resolving a name or a folder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("template could not be parsed: {message}")]
    Parse { message: String },
    #[error("invalid folder pattern: {reason}")]
    InvalidPattern { reason: String },
    #[error("resolved filename is not usable: {name:?}")]
    InvalidFilename { name: String },
    #[error("missing metadata for: {}", fields.join(", "))]
    MissingMetadata { fields: Vec<String> },
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Parse { .. } => "parse_error",
            ResolveError::InvalidPattern { .. } => "invalid_pattern",
            ResolveError::InvalidFilename { .. } => "invalid_filename",
            ResolveError::MissingMetadata { .. } => "missing_metadata",
        }
    }
}

/// Batch-level failure. No proposal is produced when one of these occurs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("no default template is configured")]
    NoDefaultTemplate,
    #[error("default template {template_id} is invalid: {source}")]
    InvalidTemplate {
        template_id: String,
        #[source]
        source: ResolveError,
    },
    #[error("invalid base directory: {reason}")]
    InvalidBaseDirectory { reason: String },
    #[error("preview cancelled during {phase}")]
    Cancelled { phase: String },
}

impl PreviewError {
    pub fn kind(&self) -> &'static str {
        match self {
            PreviewError::NoDefaultTemplate => "no_default_template",
            PreviewError::InvalidTemplate { .. } => "parse_error",
            PreviewError::InvalidBaseDirectory { .. } => "invalid_root",
            PreviewError::Cancelled { .. } => "cancelled",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rule {rule_id} references unknown template {template_id}")]
    TemplateNotFound {
        rule_id: String,
        template_id: String,
    },
    #[error("rule {rule_id} references unknown folder structure {folder_structure_id}")]
    FolderStructureNotFound {
        rule_id: String,
        folder_structure_id: String,
    },
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("template {template_id} has an invalid pattern: {source}")]
    InvalidTemplatePattern {
        template_id: String,
        #[source]
        source: ResolveError,
    },
    #[error("folder structure {folder_structure_id} has an invalid pattern: {source}")]
    InvalidFolderPattern {
        folder_structure_id: String,
        #[source]
        source: ResolveError,
    },
    #[error("rule {rule_id} has a glob pattern that cannot be compiled: {pattern}")]
    InvalidGlob { rule_id: String, pattern: String },
    #[error("{id} has an empty {field}")]
    EmptyField { id: String, field: &'static str },
    #[error("{id} has a pattern longer than {max} characters")]
    PatternTooLong { id: String, max: usize },
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::TemplateNotFound { .. } => "template_not_found",
            ConfigError::FolderStructureNotFound { .. } => "folder_structure_not_found",
            ConfigError::DuplicateId(_) => "duplicate_id",
            ConfigError::InvalidTemplatePattern { .. } => "parse_error",
            ConfigError::InvalidFolderPattern { source, .. } => source.kind(),
            ConfigError::InvalidGlob { .. } => "invalid_pattern",
            ConfigError::EmptyField { .. } | ConfigError::PatternTooLong { .. } => "invalid_config",
        }
    }
}

/// Failure while evaluating a single rule against a file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid regex {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("{operator} needs a comparable value for {field}, got {value:?}")]
    InvalidComparisonValue {
        field: String,
        operator: String,
        value: String,
    },
}

mod case;
mod config;
mod error;
mod file;
mod filename_rule;
mod folder;
mod glob;
mod metadata;
mod metadata_rule;
mod placeholder;
mod preview;
mod priority;
mod sanitize;

pub use case::{normalize_case, normalize_filename, normalize_stem, CaseStyle};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    FolderStructure, Preferences, Template,
};
pub use error::{ConfigError, PreviewError, ResolveError, RuleError};
pub use file::{FileCategory, FileDescriptor, MetadataCapability};
pub use filename_rule::{evaluate_filename_rule, FilenamePatternRule};
pub use folder::{
    normalize_relative_path, resolve_folder_path, validate_folder_pattern, FolderResolution,
};
pub use glob::{compile, expand_braces, filter_by_glob, is_valid_glob, GlobMatcher, GlobOptions};
pub use metadata::{
    ExtractionStatus, FieldValue, GpsCoordinates, ImageMetadata, MetadataField, OfficeMetadata,
    PdfMetadata, UnifiedMetadata, UnknownField, ValueSource,
};
pub use metadata_rule::{
    evaluate_condition, evaluate_metadata_rule, CompiledMetadataRule, ConditionOperator,
    FieldCondition, MatchMode, MetadataPatternRule, RuleMatch,
};
pub use placeholder::{
    format_date, parse_template, resolve, resolve_parts, strip_existing_patterns,
    validate_template, Placeholder, PlaceholderOptions, ResolveWarning, ResolvedName,
    ResolvedPlaceholder, TemplatePart, DEFAULT_DATE_FORMAT,
};
pub use preview::{
    generate_preview, generate_preview_cancellable, CancellationToken, ConflictKind,
    FileActionType, FileConflict, IssueCode, PreviewActionSummary, PreviewOptions, PreviewResult,
    PreviewSummary, RenameIssue, RenameProposal, RenameStatus, TemplateSource,
};
pub use priority::{
    detect_priority_ties, order_rules, AppliedRule, PriorityResolution, PriorityResolver,
    PriorityTie, Rule, RuleEvaluation, RuleKind, RuleOutcome, RulePriorityMode, SkipReason,
    TiedRule,
};
pub use sanitize::{cleanup_filename, is_valid_filename, sanitize_filename, MAX_FILENAME_LENGTH};

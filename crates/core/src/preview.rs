//! Turns a batch of files into classified rename proposals.
//!
//! The orchestrator never touches the filesystem: it consumes descriptors and
//! already extracted metadata and returns proposals plus a summary.

use crate::case::CaseStyle;
use crate::config::{AppConfig, Template};
use crate::error::{PreviewError, ResolveError};
use crate::file::FileDescriptor;
use crate::folder::{resolve_folder_path, FolderResolution};
use crate::metadata::{ExtractionStatus, UnifiedMetadata, ValueSource};
use crate::placeholder::{
    parse_template, resolve_parts, PlaceholderOptions, ResolveWarning, ResolvedName,
    TemplatePart,
};
use crate::priority::{AppliedRule, PriorityResolver, PriorityTie};
use crate::sanitize::sanitize_path_segment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Root for organized files. Defaults to each file's own directory.
    pub base_directory: Option<PathBuf>,
    /// Folder pattern applied to every file whose rule carries no folder
    /// structure.
    pub folder_pattern: Option<String>,
    pub fallbacks: HashMap<String, String>,
    pub include_extension: bool,
    pub sanitize_filenames: bool,
    pub date_format: Option<String>,
    pub max_filename_len: Option<usize>,
    /// Drop date stamps and copy counters from `{original}` before reuse.
    pub strip_existing_patterns: bool,
    /// Keep the last `context_depth` directories of the current location
    /// below the resolved folder.
    pub preserve_context: bool,
    pub context_depth: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            base_directory: None,
            folder_pattern: None,
            fallbacks: HashMap::new(),
            include_extension: true,
            sanitize_filenames: true,
            date_format: None,
            max_filename_len: None,
            strip_existing_patterns: false,
            preserve_context: false,
            context_depth: 1,
        }
    }
}

impl PreviewOptions {
    fn placeholder_options(&self, case_style: CaseStyle) -> PlaceholderOptions {
        PlaceholderOptions {
            fallbacks: self.fallbacks.clone(),
            include_extension: self.include_extension,
            sanitize: self.sanitize_filenames,
            date_format: self.date_format.clone(),
            max_filename_len: self.max_filename_len,
            case_style,
            strip_existing_patterns: self.strip_existing_patterns,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RenameStatus {
    Ready,
    Conflict,
    MissingData,
    NoChange,
    InvalidName,
}

impl RenameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RenameStatus::Ready => "ready",
            RenameStatus::Conflict => "conflict",
            RenameStatus::MissingData => "missing-data",
            RenameStatus::NoChange => "no-change",
            RenameStatus::InvalidName => "invalid-name",
        }
    }
}

/// What applying a proposal would do to the file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FileActionType {
    Rename,
    Move,
    NoChange,
    Conflict,
    Error,
}

impl FileActionType {
    pub fn classify(status: RenameStatus, is_move: bool) -> Self {
        match status {
            RenameStatus::Ready if is_move => FileActionType::Move,
            RenameStatus::Ready => FileActionType::Rename,
            RenameStatus::NoChange => FileActionType::NoChange,
            RenameStatus::Conflict => FileActionType::Conflict,
            RenameStatus::MissingData | RenameStatus::InvalidName => FileActionType::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileActionType::Rename => "rename",
            FileActionType::Move => "move",
            FileActionType::NoChange => "no-change",
            FileActionType::Conflict => "conflict",
            FileActionType::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    DuplicateName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileConflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub message: String,
    /// Another proposal in the same group: the first member, or the second
    /// one for the first member itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_file_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    Rule,
    Default,
    Fallback,
    Llm,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    RuleTemplateMissing,
    TemplateParseError,
    FolderStructureMissing,
    InvalidFolderPattern,
    MetadataExtractionFailed,
    MissingMetadata,
    InvalidName,
    NameTooLong,
    DuplicateDestination,
    TemplateFileTypeMismatch,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::RuleTemplateMissing => "RULE_TEMPLATE_MISSING",
            IssueCode::TemplateParseError => "TEMPLATE_PARSE_ERROR",
            IssueCode::FolderStructureMissing => "FOLDER_STRUCTURE_MISSING",
            IssueCode::InvalidFolderPattern => "INVALID_FOLDER_PATTERN",
            IssueCode::MetadataExtractionFailed => "METADATA_EXTRACTION_FAILED",
            IssueCode::MissingMetadata => "MISSING_METADATA",
            IssueCode::InvalidName => "INVALID_NAME",
            IssueCode::NameTooLong => "NAME_TOO_LONG",
            IssueCode::DuplicateDestination => "DUPLICATE_DESTINATION",
            IssueCode::TemplateFileTypeMismatch => "TEMPLATE_FILE_TYPE_MISMATCH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameIssue {
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl RenameIssue {
    fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    fn for_field(code: IssueCode, message: impl Into<String>, field: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            ..Self::new(code, message)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenameProposal {
    pub id: String,
    pub original_path: PathBuf,
    pub original_name: String,
    pub proposed_name: String,
    pub proposed_path: PathBuf,
    pub status: RenameStatus,
    pub action_type: FileActionType,
    pub issues: Vec<RenameIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<FileConflict>,
    pub template_source: TemplateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_rule: Option<AppliedRule>,
    pub is_move_operation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_structure_id: Option<String>,
    /// Relative folder the file moves into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_folder: Option<String>,
    #[serde(default)]
    pub metadata_sources: Vec<ValueSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub total: usize,
    pub ready: usize,
    pub conflicts: usize,
    pub missing_data: usize,
    pub no_change: usize,
    pub invalid_name: usize,
    pub move_operations: usize,
    pub rename_only: usize,
    pub llm_suggested: usize,
}

impl PreviewSummary {
    pub fn from_proposals(proposals: &[RenameProposal]) -> Self {
        let mut summary = PreviewSummary {
            total: proposals.len(),
            ..PreviewSummary::default()
        };
        for proposal in proposals {
            match proposal.status {
                RenameStatus::Ready => summary.ready += 1,
                RenameStatus::Conflict => summary.conflicts += 1,
                RenameStatus::MissingData => summary.missing_data += 1,
                RenameStatus::NoChange => summary.no_change += 1,
                RenameStatus::InvalidName => summary.invalid_name += 1,
            }
            if proposal.is_move_operation {
                summary.move_operations += 1;
            } else if proposal.status == RenameStatus::Ready {
                summary.rename_only += 1;
            }
            if proposal.template_source == TemplateSource::Llm {
                summary.llm_suggested += 1;
            }
        }
        summary
    }
}

/// Counts by [`FileActionType`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreviewActionSummary {
    pub rename_count: usize,
    pub move_count: usize,
    pub no_change_count: usize,
    pub conflict_count: usize,
    pub error_count: usize,
}

impl PreviewActionSummary {
    pub fn from_proposals(proposals: &[RenameProposal]) -> Self {
        let mut summary = PreviewActionSummary::default();
        for proposal in proposals {
            match proposal.action_type {
                FileActionType::Rename => summary.rename_count += 1,
                FileActionType::Move => summary.move_count += 1,
                FileActionType::NoChange => summary.no_change_count += 1,
                FileActionType::Conflict => summary.conflict_count += 1,
                FileActionType::Error => summary.error_count += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub proposals: Vec<RenameProposal>,
    pub summary: PreviewSummary,
    pub action_summary: PreviewActionSummary,
    pub priority_ties: Vec<PriorityTie>,
    /// Pattern of the default template, when the configuration has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_used: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Shared abort flag checked between preview phases.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, phase: &str) -> Result<(), PreviewError> {
        if self.is_cancelled() {
            tracing::debug!("preview cancelled during {}", phase);
            return Err(PreviewError::Cancelled {
                phase: phase.to_string(),
            });
        }
        Ok(())
    }
}

pub fn generate_preview(
    files: &[FileDescriptor],
    metadata: &HashMap<PathBuf, UnifiedMetadata>,
    config: &AppConfig,
    options: &PreviewOptions,
) -> Result<PreviewResult, PreviewError> {
    generate_preview_cancellable(files, metadata, config, options, &CancellationToken::new())
}

pub fn generate_preview_cancellable(
    files: &[FileDescriptor],
    metadata: &HashMap<PathBuf, UnifiedMetadata>,
    config: &AppConfig,
    options: &PreviewOptions,
    token: &CancellationToken,
) -> Result<PreviewResult, PreviewError> {
    token.check("validate")?;

    if let Some(base) = options.base_directory.as_deref() {
        validate_base_directory(base)?;
    }

    let priority_ties = config.priority_ties();
    let template_used = config.default_template().map(|t| t.pattern.clone());
    if files.is_empty() {
        return Ok(PreviewResult {
            proposals: Vec::new(),
            summary: PreviewSummary::default(),
            action_summary: PreviewActionSummary::default(),
            priority_ties,
            template_used,
            generated_at: Utc::now(),
        });
    }

    let default_template = config
        .default_template()
        .ok_or(PreviewError::NoDefaultTemplate)?;
    let default_parts =
        parse_template(&default_template.pattern).map_err(|source| PreviewError::InvalidTemplate {
            template_id: default_template.id.clone(),
            source,
        })?;

    let context = BatchContext {
        config,
        options,
        placeholder_options: options.placeholder_options(config.preferences.case_normalization),
        default_parts,
        rule_templates: parse_rule_templates(config),
        resolver: PriorityResolver::new(
            &config.metadata_rules,
            &config.filename_rules,
            config.preferences.rule_priority_mode,
        ),
    };

    token.check("resolve")?;
    let empty = UnifiedMetadata::default();
    let mut proposals = Vec::with_capacity(files.len());
    for file in files {
        token.check("resolve")?;
        let file_metadata = metadata.get(&file.path).unwrap_or(&empty);
        proposals.push(context.propose(file, file_metadata));
    }

    token.check("conflicts")?;
    mark_conflicts(&mut proposals, config.preferences.case_sensitive_paths);

    let summary = PreviewSummary::from_proposals(&proposals);
    let action_summary = PreviewActionSummary::from_proposals(&proposals);
    tracing::info!(
        "preview: {} files, {} ready, {} conflicts, {} missing data, {} unchanged, {} invalid",
        summary.total,
        summary.ready,
        summary.conflicts,
        summary.missing_data,
        summary.no_change,
        summary.invalid_name
    );

    Ok(PreviewResult {
        proposals,
        summary,
        action_summary,
        priority_ties,
        template_used,
        generated_at: Utc::now(),
    })
}

fn validate_base_directory(base: &Path) -> Result<(), PreviewError> {
    if base.to_string_lossy().trim().is_empty() {
        return Err(PreviewError::InvalidBaseDirectory {
            reason: "base directory is empty".to_string(),
        });
    }
    if base.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(PreviewError::InvalidBaseDirectory {
            reason: format!("{} contains '..'", base.display()),
        });
    }
    Ok(())
}

type ParsedTemplate = Result<Vec<TemplatePart>, ResolveError>;

/// Rule templates parsed once per batch, keyed by template id.
fn parse_rule_templates(config: &AppConfig) -> HashMap<&str, (&Template, ParsedTemplate)> {
    config
        .templates
        .iter()
        .map(|t| (t.id.as_str(), (t, parse_template(&t.pattern))))
        .collect()
}

struct BatchContext<'a> {
    config: &'a AppConfig,
    options: &'a PreviewOptions,
    placeholder_options: PlaceholderOptions,
    default_parts: Vec<TemplatePart>,
    rule_templates: HashMap<&'a str, (&'a Template, ParsedTemplate)>,
    resolver: PriorityResolver<'a>,
}

/// What the rule selection settled on for one file.
struct Selection<'c> {
    parts: Result<&'c [TemplatePart], &'c ResolveError>,
    source: TemplateSource,
    applied_rule: Option<AppliedRule>,
    folder_structure_id: Option<String>,
    folder_pattern: Option<&'c str>,
}

impl<'a> BatchContext<'a> {
    fn propose(&self, file: &FileDescriptor, metadata: &UnifiedMetadata) -> RenameProposal {
        let mut proposal = self.build_proposal(file, metadata);
        proposal.action_type =
            FileActionType::classify(proposal.status, proposal.is_move_operation);
        proposal
    }

    fn build_proposal(
        &self,
        file: &FileDescriptor,
        metadata: &UnifiedMetadata,
    ) -> RenameProposal {
        let original_name = file.full_name();
        let mut issues = Vec::new();

        if metadata.extraction_status == ExtractionStatus::Failed {
            let reason = metadata
                .extraction_error
                .as_deref()
                .unwrap_or("unknown error");
            issues.push(RenameIssue::new(
                IssueCode::MetadataExtractionFailed,
                format!("metadata extraction failed: {}", reason),
            ));
        }

        let selection = self.select(file, metadata, &mut issues);
        let mut proposal = RenameProposal {
            id: Uuid::new_v4().to_string(),
            original_path: file.path.clone(),
            original_name: original_name.clone(),
            proposed_name: original_name.clone(),
            proposed_path: file.path.clone(),
            status: RenameStatus::InvalidName,
            action_type: FileActionType::Error,
            issues: Vec::new(),
            conflict: None,
            template_source: selection.source,
            applied_rule: selection.applied_rule,
            is_move_operation: false,
            folder_structure_id: selection.folder_structure_id,
            destination_folder: None,
            metadata_sources: Vec::new(),
        };

        let parts = match selection.parts {
            Ok(parts) => parts,
            Err(err) => {
                issues.push(RenameIssue::new(
                    IssueCode::TemplateParseError,
                    format!("template could not be parsed: {}", err),
                ));
                proposal.issues = issues;
                return proposal;
            }
        };

        let resolved = match resolve_parts(parts, metadata, file, &self.placeholder_options) {
            Ok(resolved) => resolved,
            Err(err) => {
                proposal.status = status_for_error(&err);
                issues.extend(issues_for_error(&err, IssueCode::InvalidName));
                proposal.issues = issues;
                tracing::debug!("{}: {}", file.path.display(), err);
                return proposal;
            }
        };

        let folder = match selection.folder_pattern {
            Some(pattern) => {
                match resolve_folder_path(pattern, metadata, file, &self.placeholder_options) {
                    Ok(folder) => Some(folder),
                    Err(err) => {
                        proposal.status = status_for_error(&err);
                        issues.extend(issues_for_error(&err, IssueCode::InvalidFolderPattern));
                        proposal.issues = issues;
                        tracing::debug!("{}: folder {}", file.path.display(), err);
                        return proposal;
                    }
                }
            }
            None => None,
        };

        for warning in &resolved.warnings {
            match warning {
                ResolveWarning::NameTooLong { length } => issues.push(RenameIssue::new(
                    IssueCode::NameTooLong,
                    format!("proposed name is {} characters long", length),
                )),
            }
        }

        let current_dir = file.directory();
        let relative_folder = folder.as_ref().map(|folder| {
            let mut path = folder.resolved_path.clone();
            if self.options.preserve_context {
                for segment in context_segments(current_dir, self.options.context_depth) {
                    path.push('/');
                    path.push_str(&segment);
                }
            }
            path
        });
        let destination_dir = match &relative_folder {
            Some(relative) => self
                .options
                .base_directory
                .as_deref()
                .unwrap_or(current_dir)
                .join(relative),
            None => current_dir.to_path_buf(),
        };
        let is_move = destination_dir != current_dir;
        let proposed_path = destination_dir.join(&resolved.name);

        proposal.status = if proposed_path == file.path {
            RenameStatus::NoChange
        } else {
            RenameStatus::Ready
        };
        proposal.metadata_sources = collect_sources(&resolved, folder.as_ref());
        proposal.is_move_operation = is_move;
        proposal.destination_folder = relative_folder.filter(|_| is_move);
        proposal.proposed_name = resolved.name;
        proposal.proposed_path = proposed_path;
        proposal.issues = issues;

        tracing::debug!(
            "{} -> {} ({:?})",
            file.path.display(),
            proposal.proposed_path.display(),
            proposal.status
        );
        proposal
    }

    fn select(
        &self,
        file: &FileDescriptor,
        metadata: &UnifiedMetadata,
        issues: &mut Vec<RenameIssue>,
    ) -> Selection<'_> {
        let batch_folder = self.options.folder_pattern.as_deref();
        let default_selection = |source| Selection {
            parts: Ok(self.default_parts.as_slice()),
            source,
            applied_rule: None,
            folder_structure_id: None,
            folder_pattern: batch_folder,
        };

        let resolution = self.resolver.resolve(file, metadata);
        let Some(rule) = resolution.winner else {
            return default_selection(TemplateSource::Default);
        };

        let Some((template, parts)) = self.rule_templates.get(rule.template_id()) else {
            tracing::warn!(
                "rule {} references missing template {}, using the default template",
                rule.id(),
                rule.template_id()
            );
            issues.push(RenameIssue::new(
                IssueCode::RuleTemplateMissing,
                format!(
                    "template {} of rule {} no longer exists; the default template was used",
                    rule.template_id(),
                    rule.name()
                ),
            ));
            return default_selection(TemplateSource::Fallback);
        };

        if !template.accepts(&file.extension) {
            tracing::debug!(
                "template {} of rule {} does not accept .{} files",
                template.id,
                rule.id(),
                file.extension
            );
            issues.push(RenameIssue::new(
                IssueCode::TemplateFileTypeMismatch,
                format!(
                    "template {} of rule {} is limited to {}; the default template was used",
                    template.id,
                    rule.name(),
                    template.file_types.join(", ")
                ),
            ));
            return default_selection(TemplateSource::Fallback);
        }

        let mut selection = Selection {
            parts: parts.as_ref().map(Vec::as_slice),
            source: TemplateSource::Rule,
            applied_rule: Some(rule.applied()),
            folder_structure_id: None,
            folder_pattern: batch_folder,
        };

        if let Some(folder_id) = rule.folder_structure_id() {
            match self
                .config
                .folder_structure(folder_id)
                .filter(|structure| structure.enabled)
            {
                Some(structure) => {
                    selection.folder_structure_id = Some(structure.id.clone());
                    selection.folder_pattern = Some(structure.pattern.as_str());
                }
                None => {
                    tracing::warn!(
                        "rule {} references missing or disabled folder structure {}",
                        rule.id(),
                        folder_id
                    );
                    issues.push(RenameIssue::for_field(
                        IssueCode::FolderStructureMissing,
                        format!("folder structure {} is missing or disabled", folder_id),
                        folder_id,
                    ));
                    selection.folder_pattern = None;
                }
            }
        }

        selection
    }
}

fn status_for_error(err: &ResolveError) -> RenameStatus {
    match err {
        ResolveError::MissingMetadata { .. } => RenameStatus::MissingData,
        ResolveError::Parse { .. }
        | ResolveError::InvalidPattern { .. }
        | ResolveError::InvalidFilename { .. } => RenameStatus::InvalidName,
    }
}

fn issues_for_error(err: &ResolveError, invalid_code: IssueCode) -> Vec<RenameIssue> {
    match err {
        ResolveError::MissingMetadata { fields } => fields
            .iter()
            .map(|field| {
                RenameIssue::for_field(
                    IssueCode::MissingMetadata,
                    format!("no value for {{{}}}", field),
                    field,
                )
            })
            .collect(),
        ResolveError::Parse { .. } => {
            vec![RenameIssue::new(IssueCode::TemplateParseError, err.to_string())]
        }
        ResolveError::InvalidPattern { .. } | ResolveError::InvalidFilename { .. } => {
            vec![RenameIssue::new(invalid_code, err.to_string())]
        }
    }
}

/// Last `depth` directory names of `dir`, sanitized as folder segments.
fn context_segments(dir: &Path, depth: usize) -> Vec<String> {
    let names: Vec<String> = dir
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(sanitize_path_segment(&name.to_string_lossy())),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect();
    let skip = names.len().saturating_sub(depth);
    names.into_iter().skip(skip).collect()
}

fn collect_sources(name: &ResolvedName, folder: Option<&FolderResolution>) -> Vec<ValueSource> {
    let mut sources = Vec::new();
    let folder_placeholders = folder
        .map(|f| f.resolved_placeholders.as_slice())
        .unwrap_or_default();
    for resolved in name.resolved_placeholders.iter().chain(folder_placeholders) {
        if !sources.contains(&resolved.source) {
            sources.push(resolved.source);
        }
    }
    sources
}

/// Downgrades every ready or unchanged proposal that shares its destination
/// with another one. No member of a colliding group stays ready.
fn mark_conflicts(proposals: &mut [RenameProposal], case_sensitive: bool) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, proposal) in proposals.iter().enumerate() {
        if !matches!(
            proposal.status,
            RenameStatus::Ready | RenameStatus::NoChange
        ) {
            continue;
        }
        let path = proposal.proposed_path.to_string_lossy();
        let key = if case_sensitive {
            path.into_owned()
        } else {
            path.to_lowercase()
        };
        groups.entry(key).or_default().push(index);
    }

    for indices in groups.values().filter(|indices| indices.len() >= 2) {
        let ids: Vec<String> = indices.iter().map(|&i| proposals[i].id.clone()).collect();
        for (position, &index) in indices.iter().enumerate() {
            let other = if position == 0 { 1 } else { 0 };
            let proposal = &mut proposals[index];
            proposal.status = RenameStatus::Conflict;
            proposal.action_type = FileActionType::Conflict;
            proposal.issues.push(RenameIssue::new(
                IssueCode::DuplicateDestination,
                format!(
                    "{} files would be written to {}",
                    indices.len(),
                    proposal.proposed_path.display()
                ),
            ));
            proposal.conflict = Some(FileConflict {
                kind: ConflictKind::DuplicateName,
                message: "another file in this batch would have the same name".to_string(),
                conflicting_file_id: ids.get(other).cloned(),
            });
        }
        tracing::debug!("{} proposals share one destination", indices.len());
    }
}

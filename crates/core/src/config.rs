use crate::case::CaseStyle;
use crate::error::ConfigError;
use crate::filename_rule::FilenamePatternRule;
use crate::folder::validate_folder_pattern;
use crate::glob::is_valid_glob;
use crate::metadata_rule::MetadataPatternRule;
use crate::placeholder::validate_template;
use crate::priority::{detect_priority_ties, PriorityTie, RulePriorityMode};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_PATTERN_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub pattern: String,
    /// Extensions a rule may apply this template to. Empty accepts every
    /// file. The default template is never restricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Template {
    /// Case-insensitive, with or without a leading dot.
    pub fn accepts(&self, extension: &str) -> bool {
        self.file_types.is_empty()
            || self
                .file_types
                .iter()
                .any(|t| t.trim().trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderStructure {
    pub id: String,
    pub name: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Preferences {
    pub rule_priority_mode: RulePriorityMode,
    pub case_normalization: CaseStyle,
    /// Compare destination paths case-sensitively when detecting conflicts.
    pub case_sensitive_paths: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub templates: Vec<Template>,
    pub metadata_rules: Vec<MetadataPatternRule>,
    pub filename_rules: Vec<FilenamePatternRule>,
    pub folder_structures: Vec<FolderStructure>,
    pub preferences: Preferences,
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            templates: default_templates(),
            metadata_rules: Vec::new(),
            filename_rules: Vec::new(),
            folder_structures: default_folder_structures(),
            preferences: Preferences::default(),
        }
    }
}

fn default_templates() -> Vec<Template> {
    let images = ["jpg", "jpeg", "png", "heic", "webp", "gif"];
    let documents = ["pdf", "docx", "xlsx", "pptx"];
    let to_vec = |exts: &[&str]| exts.iter().map(|e| e.to_string()).collect::<Vec<_>>();

    vec![
        Template {
            id: "date-prefix".to_string(),
            name: "Date Prefix".to_string(),
            pattern: "{date}-{name}".to_string(),
            file_types: to_vec(&images[..]),
            is_default: true,
        },
        Template {
            id: "camera-date".to_string(),
            name: "Camera + Date".to_string(),
            pattern: "{camera}-{date}-{name}".to_string(),
            file_types: to_vec(&images[..4]),
            is_default: false,
        },
        Template {
            id: "document-date".to_string(),
            name: "Document Date".to_string(),
            pattern: "{date}-{title}".to_string(),
            file_types: to_vec(&documents[..]),
            is_default: false,
        },
    ]
}

fn default_folder_structures() -> Vec<FolderStructure> {
    let structure = |id: &str, name: &str, pattern: &str, enabled: bool, priority: i32| {
        FolderStructure {
            id: id.to_string(),
            name: name.to_string(),
            pattern: pattern.to_string(),
            description: None,
            enabled,
            priority,
        }
    };

    vec![
        structure("by-year", "By Year", "{year}", true, 10),
        structure("by-year-month", "By Year and Month", "{year}/{month}", true, 20),
        structure("by-category", "By Category", "{category}", true, 30),
        structure("by-date", "By Year/Month/Day", "{year}/{month}/{day}", false, 40),
    ]
}

impl AppConfig {
    /// The first template flagged as default.
    pub fn default_template(&self) -> Option<&Template> {
        self.templates.iter().find(|t| t.is_default)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn folder_structure(&self, id: &str) -> Option<&FolderStructure> {
        self.folder_structures.iter().find(|f| f.id == id)
    }

    pub fn priority_ties(&self) -> Vec<PriorityTie> {
        detect_priority_ties(&self.metadata_rules, &self.filename_rules)
    }

    pub fn add_metadata_rule(&mut self, rule: MetadataPatternRule) -> Result<(), ConfigError> {
        self.check_new_rule(&rule.id, &rule.template_id, rule.folder_structure_id.as_deref())?;
        self.metadata_rules.push(rule);
        Ok(())
    }

    pub fn add_filename_rule(&mut self, rule: FilenamePatternRule) -> Result<(), ConfigError> {
        self.check_new_rule(&rule.id, &rule.template_id, rule.folder_structure_id.as_deref())?;
        if !is_valid_glob(&rule.pattern) {
            return Err(ConfigError::InvalidGlob {
                rule_id: rule.id,
                pattern: rule.pattern,
            });
        }
        self.filename_rules.push(rule);
        Ok(())
    }

    fn check_new_rule(
        &self,
        rule_id: &str,
        template_id: &str,
        folder_structure_id: Option<&str>,
    ) -> Result<(), ConfigError> {
        let taken = self
            .metadata_rules
            .iter()
            .map(|r| r.id.as_str())
            .chain(self.filename_rules.iter().map(|r| r.id.as_str()))
            .any(|id| id == rule_id);
        if taken {
            return Err(ConfigError::DuplicateId(rule_id.to_string()));
        }
        if self.template(template_id).is_none() {
            return Err(ConfigError::TemplateNotFound {
                rule_id: rule_id.to_string(),
                template_id: template_id.to_string(),
            });
        }
        if let Some(folder_id) = folder_structure_id {
            if self.folder_structure(folder_id).is_none() {
                return Err(ConfigError::FolderStructureNotFound {
                    rule_id: rule_id.to_string(),
                    folder_structure_id: folder_id.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every problem found, in configuration order.
    pub fn validation_errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let mut template_ids = HashSet::new();
        for template in &self.templates {
            if !template_ids.insert(template.id.as_str()) {
                errors.push(ConfigError::DuplicateId(template.id.clone()));
            }
            if template.name.trim().is_empty() {
                errors.push(ConfigError::EmptyField {
                    id: template.id.clone(),
                    field: "name",
                });
            }
            if template.pattern.len() > MAX_PATTERN_LEN {
                errors.push(ConfigError::PatternTooLong {
                    id: template.id.clone(),
                    max: MAX_PATTERN_LEN,
                });
            } else if let Err(source) = validate_template(&template.pattern) {
                errors.push(ConfigError::InvalidTemplatePattern {
                    template_id: template.id.clone(),
                    source,
                });
            }
        }

        let mut folder_ids = HashSet::new();
        for structure in &self.folder_structures {
            if !folder_ids.insert(structure.id.as_str()) {
                errors.push(ConfigError::DuplicateId(structure.id.clone()));
            }
            if structure.pattern.trim().is_empty() {
                errors.push(ConfigError::EmptyField {
                    id: structure.id.clone(),
                    field: "pattern",
                });
            } else if structure.pattern.len() > MAX_PATTERN_LEN {
                errors.push(ConfigError::PatternTooLong {
                    id: structure.id.clone(),
                    max: MAX_PATTERN_LEN,
                });
            } else if let Err(source) = validate_folder_pattern(&structure.pattern) {
                errors.push(ConfigError::InvalidFolderPattern {
                    folder_structure_id: structure.id.clone(),
                    source,
                });
            }
        }

        let mut rule_ids = HashSet::new();
        let rule_refs = self
            .metadata_rules
            .iter()
            .map(|r| (&r.id, &r.template_id, &r.folder_structure_id))
            .chain(
                self.filename_rules
                    .iter()
                    .map(|r| (&r.id, &r.template_id, &r.folder_structure_id)),
            );
        for (rule_id, template_id, folder_id) in rule_refs {
            if !rule_ids.insert(rule_id.as_str()) {
                errors.push(ConfigError::DuplicateId(rule_id.clone()));
            }
            if !template_ids.contains(template_id.as_str()) {
                errors.push(ConfigError::TemplateNotFound {
                    rule_id: rule_id.clone(),
                    template_id: template_id.clone(),
                });
            }
            if let Some(folder_id) = folder_id {
                if !folder_ids.contains(folder_id.as_str()) {
                    errors.push(ConfigError::FolderStructureNotFound {
                        rule_id: rule_id.clone(),
                        folder_structure_id: folder_id.clone(),
                    });
                }
            }
        }

        for rule in &self.filename_rules {
            if !is_valid_glob(&rule.pattern) {
                errors.push(ConfigError::InvalidGlob {
                    rule_id: rule.id.clone(),
                    pattern: rule.pattern.clone(),
                });
            }
        }

        errors
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "tidy", "tidy-rename")
        .context("could not determine the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths.config_path)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    save_config_to(config, &paths.config_path)
}

/// Reads `path`, or returns the built-in configuration when it does not
/// exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("failed to create config directory: {}", dir.display())
        })?;
    }
    let body = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("failed to write config file: {}", path.display()))?;
    Ok(())
}

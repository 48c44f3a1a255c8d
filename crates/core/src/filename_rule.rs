use crate::error::RuleError;
use crate::file::FileDescriptor;
use crate::glob::{compile, GlobMatcher, GlobOptions};
use crate::metadata_rule::RuleMatch;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilenamePatternRule {
    pub id: String,
    pub name: String,
    /// Glob matched against the full file name, extension included.
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
    pub template_id: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_structure_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FilenamePatternRule {
    pub fn matcher(&self) -> GlobMatcher {
        compile(&self.pattern, GlobOptions::case_sensitive(self.case_sensitive))
    }
}

/// Never fails: a pattern that does not compile matches nothing.
pub fn evaluate_filename_rule(
    rule: &FilenamePatternRule,
    file: &FileDescriptor,
) -> Result<RuleMatch, RuleError> {
    Ok(evaluate_with_matcher(&rule.matcher(), file))
}

pub fn evaluate_with_matcher(matcher: &GlobMatcher, file: &FileDescriptor) -> RuleMatch {
    RuleMatch {
        matches: matcher.test(&file.full_name()),
    }
}

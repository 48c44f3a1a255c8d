use crate::error::RuleError;
use crate::glob::REGEX_SIZE_LIMIT;
use crate::metadata::{FieldValue, MetadataField, UnifiedMetadata};
use chrono::{DateTime, NaiveDate, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Matches,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ConditionOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not-equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "not-contains",
            ConditionOperator::StartsWith => "starts-with",
            ConditionOperator::EndsWith => "ends-with",
            ConditionOperator::Matches => "matches",
            ConditionOperator::Gt => "gt",
            ConditionOperator::Gte => "gte",
            ConditionOperator::Lt => "lt",
            ConditionOperator::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCondition {
    pub field: MetadataField,
    pub operator: ConditionOperator,
    pub value: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataPatternRule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<FieldCondition>,
    #[serde(default)]
    pub match_mode: MatchMode,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub matches: bool,
}

/// Evaluates every condition of `rule` against `metadata`. A rule with no
/// conditions never matches.
pub fn evaluate_metadata_rule(
    rule: &MetadataPatternRule,
    metadata: &UnifiedMetadata,
) -> Result<RuleMatch, RuleError> {
    CompiledMetadataRule::new(rule).evaluate(metadata)
}

/// A metadata rule whose `matches` patterns are compiled once and reused
/// for every file of a batch.
#[derive(Debug, Clone)]
pub struct CompiledMetadataRule<'a> {
    rule: &'a MetadataPatternRule,
    /// One slot per condition; `Some` only for `matches` conditions.
    patterns: Vec<Option<Result<Regex, RuleError>>>,
}

impl<'a> CompiledMetadataRule<'a> {
    pub fn new(rule: &'a MetadataPatternRule) -> Self {
        let patterns = rule
            .conditions
            .iter()
            .map(|condition| {
                (condition.operator == ConditionOperator::Matches)
                    .then(|| compile_pattern(condition))
            })
            .collect();
        Self { rule, patterns }
    }

    pub fn rule(&self) -> &'a MetadataPatternRule {
        self.rule
    }

    pub fn evaluate(&self, metadata: &UnifiedMetadata) -> Result<RuleMatch, RuleError> {
        if self.rule.conditions.is_empty() {
            return Ok(RuleMatch { matches: false });
        }

        let checks = self
            .rule
            .conditions
            .iter()
            .zip(&self.patterns)
            .map(|(condition, pattern)| check_condition(condition, pattern.as_ref(), metadata));

        let matches = match self.rule.match_mode {
            MatchMode::All => {
                let mut all = true;
                for check in checks {
                    if !check? {
                        all = false;
                        break;
                    }
                }
                all
            }
            MatchMode::Any => {
                let mut any = false;
                for check in checks {
                    if check? {
                        any = true;
                        break;
                    }
                }
                any
            }
        };

        Ok(RuleMatch { matches })
    }
}

/// A condition on an absent field is false for every operator.
pub fn evaluate_condition(
    condition: &FieldCondition,
    metadata: &UnifiedMetadata,
) -> Result<bool, RuleError> {
    let pattern = (condition.operator == ConditionOperator::Matches)
        .then(|| compile_pattern(condition));
    check_condition(condition, pattern.as_ref(), metadata)
}

fn compile_pattern(condition: &FieldCondition) -> Result<Regex, RuleError> {
    RegexBuilder::new(&condition.value)
        .case_insensitive(!condition.case_sensitive)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|err| RuleError::InvalidRegex {
            pattern: condition.value.clone(),
            message: err.to_string(),
        })
}

fn check_condition(
    condition: &FieldCondition,
    pattern: Option<&Result<Regex, RuleError>>,
    metadata: &UnifiedMetadata,
) -> Result<bool, RuleError> {
    let Some(actual) = condition.field.lookup(metadata) else {
        return Ok(false);
    };

    match condition.operator {
        ConditionOperator::Gt
        | ConditionOperator::Gte
        | ConditionOperator::Lt
        | ConditionOperator::Lte => {
            let ordering = compare(&actual, condition)?;
            Ok(match condition.operator {
                ConditionOperator::Gt => ordering == Ordering::Greater,
                ConditionOperator::Gte => ordering != Ordering::Less,
                ConditionOperator::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
        ConditionOperator::Matches => match pattern {
            Some(Ok(regex)) => Ok(regex.is_match(&actual.as_text())),
            Some(Err(err)) => Err(err.clone()),
            None => compile_pattern(condition).map(|regex| regex.is_match(&actual.as_text())),
        },
        _ => Ok(evaluate_text(condition, &actual)),
    }
}

fn evaluate_text(condition: &FieldCondition, actual: &FieldValue) -> bool {
    // Numbers and dates compare by value for equality, not by their text.
    if matches!(
        condition.operator,
        ConditionOperator::Equals | ConditionOperator::NotEquals
    ) && !matches!(actual, FieldValue::Text(_))
    {
        let equal = compare(actual, condition)
            .map(|ordering| ordering == Ordering::Equal)
            .unwrap_or(false);
        return (condition.operator == ConditionOperator::Equals) == equal;
    }

    let (actual, expected) = if condition.case_sensitive {
        (actual.as_text(), condition.value.clone())
    } else {
        (actual.as_text().to_lowercase(), condition.value.to_lowercase())
    };

    match condition.operator {
        ConditionOperator::Equals => actual == expected,
        ConditionOperator::NotEquals => actual != expected,
        ConditionOperator::Contains => actual.contains(&expected),
        ConditionOperator::NotContains => !actual.contains(&expected),
        ConditionOperator::StartsWith => actual.starts_with(&expected),
        ConditionOperator::EndsWith => actual.ends_with(&expected),
        _ => false,
    }
}

fn compare(actual: &FieldValue, condition: &FieldCondition) -> Result<Ordering, RuleError> {
    let invalid = || RuleError::InvalidComparisonValue {
        field: condition.field.to_string(),
        operator: condition.operator.as_str().to_string(),
        value: condition.value.clone(),
    };

    match actual {
        FieldValue::Number(n) => {
            let expected: f64 = condition.value.trim().parse().map_err(|_| invalid())?;
            n.partial_cmp(&expected).ok_or_else(invalid)
        }
        FieldValue::Date(d) => {
            let expected = parse_date(&condition.value).ok_or_else(invalid)?;
            Ok(d.cmp(&expected))
        }
        FieldValue::Text(s) => {
            if let (Ok(a), Ok(b)) = (s.trim().parse::<f64>(), condition.value.trim().parse::<f64>())
            {
                return a.partial_cmp(&b).ok_or_else(invalid);
            }
            if condition.case_sensitive {
                Ok(s.as_str().cmp(condition.value.as_str()))
            } else {
                Ok(s.to_lowercase().cmp(&condition.value.to_lowercase()))
            }
        }
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

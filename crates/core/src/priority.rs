//! Ordering of metadata and filename rules, winner selection and tie
//! diagnostics.

use crate::file::FileDescriptor;
use crate::error::RuleError;
use crate::filename_rule::{evaluate_with_matcher, FilenamePatternRule};
use crate::glob::GlobMatcher;
use crate::metadata::UnifiedMetadata;
use crate::metadata_rule::{CompiledMetadataRule, MetadataPatternRule, RuleMatch};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RulePriorityMode {
    #[default]
    Combined,
    MetadataFirst,
    FilenameFirst,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Metadata,
    Filename,
}

#[derive(Debug, Clone, Copy)]
pub enum Rule<'a> {
    Metadata(&'a MetadataPatternRule),
    Filename(&'a FilenamePatternRule),
}

impl<'a> Rule<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            Rule::Metadata(rule) => &rule.id,
            Rule::Filename(rule) => &rule.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Rule::Metadata(rule) => &rule.name,
            Rule::Filename(rule) => &rule.name,
        }
    }

    pub fn priority(&self) -> i32 {
        match *self {
            Rule::Metadata(rule) => rule.priority,
            Rule::Filename(rule) => rule.priority,
        }
    }

    pub fn enabled(&self) -> bool {
        match *self {
            Rule::Metadata(rule) => rule.enabled,
            Rule::Filename(rule) => rule.enabled,
        }
    }

    pub fn template_id(&self) -> &'a str {
        match *self {
            Rule::Metadata(rule) => &rule.template_id,
            Rule::Filename(rule) => &rule.template_id,
        }
    }

    pub fn folder_structure_id(&self) -> Option<&'a str> {
        match *self {
            Rule::Metadata(rule) => rule.folder_structure_id.as_deref(),
            Rule::Filename(rule) => rule.folder_structure_id.as_deref(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match *self {
            Rule::Metadata(_) => RuleKind::Metadata,
            Rule::Filename(_) => RuleKind::Filename,
        }
    }

    pub fn applied(&self) -> AppliedRule {
        AppliedRule {
            id: self.id().to_string(),
            name: self.name().to_string(),
            rule_type: self.kind(),
        }
    }
}

/// The rule that produced a proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleKind,
}

/// Candidate order for `mode`, highest priority first. Equal priorities keep
/// metadata rules before filename rules, each in configuration order.
pub fn order_rules<'a>(
    metadata_rules: &'a [MetadataPatternRule],
    filename_rules: &'a [FilenamePatternRule],
    mode: RulePriorityMode,
) -> Vec<Rule<'a>> {
    let mut metadata: Vec<Rule<'a>> = metadata_rules.iter().map(Rule::Metadata).collect();
    let mut filename: Vec<Rule<'a>> = filename_rules.iter().map(Rule::Filename).collect();

    match mode {
        RulePriorityMode::Combined => {
            metadata.append(&mut filename);
            metadata.sort_by_key(|rule| Reverse(rule.priority()));
            metadata
        }
        RulePriorityMode::MetadataFirst => {
            metadata.sort_by_key(|rule| Reverse(rule.priority()));
            filename.sort_by_key(|rule| Reverse(rule.priority()));
            metadata.append(&mut filename);
            metadata
        }
        RulePriorityMode::FilenameFirst => {
            metadata.sort_by_key(|rule| Reverse(rule.priority()));
            filename.sort_by_key(|rule| Reverse(rule.priority()));
            filename.append(&mut metadata);
            filename
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "reason", rename_all = "kebab-case")]
pub enum RuleOutcome {
    Winner,
    MatchedButLost,
    NotMatched,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Disabled,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub rule_name: String,
    pub kind: RuleKind,
    pub priority: i32,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone)]
pub struct PriorityResolution<'a> {
    pub winner: Option<Rule<'a>>,
    pub evaluations: Vec<RuleEvaluation>,
}

impl PriorityResolution<'_> {
    pub fn matched_but_lost(&self) -> impl Iterator<Item = &RuleEvaluation> {
        self.evaluations
            .iter()
            .filter(|e| e.outcome == RuleOutcome::MatchedButLost)
    }
}

struct Candidate<'a> {
    rule: Rule<'a>,
    /// `None` for disabled rules.
    evaluator: Option<Evaluator<'a>>,
}

enum Evaluator<'a> {
    Metadata(CompiledMetadataRule<'a>),
    Filename(GlobMatcher),
}

/// Holds the ordered candidate list for one batch so glob and regex
/// patterns are compiled once rather than per file.
pub struct PriorityResolver<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> PriorityResolver<'a> {
    pub fn new(
        metadata_rules: &'a [MetadataPatternRule],
        filename_rules: &'a [FilenamePatternRule],
        mode: RulePriorityMode,
    ) -> Self {
        let candidates = order_rules(metadata_rules, filename_rules, mode)
            .into_iter()
            .map(|rule| {
                let evaluator = match rule {
                    _ if !rule.enabled() => None,
                    Rule::Metadata(metadata) => {
                        Some(Evaluator::Metadata(CompiledMetadataRule::new(metadata)))
                    }
                    Rule::Filename(filename) => Some(Evaluator::Filename(filename.matcher())),
                };
                Candidate { rule, evaluator }
            })
            .collect();
        Self { candidates }
    }

    pub fn ordered(&self) -> impl Iterator<Item = Rule<'a>> + '_ {
        self.candidates.iter().map(|c| c.rule)
    }

    /// Walks the candidates in order. The first enabled match wins; later
    /// matches are still evaluated and reported as lost.
    pub fn resolve(
        &self,
        file: &FileDescriptor,
        metadata: &UnifiedMetadata,
    ) -> PriorityResolution<'a> {
        let mut winner: Option<Rule<'a>> = None;
        let mut evaluations = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let rule = candidate.rule;
            let outcome = match &candidate.evaluator {
                None => RuleOutcome::Skipped(SkipReason::Disabled),
                Some(evaluator) => match evaluator.evaluate(file, metadata) {
                    Ok(hit) if hit.matches => {
                        if winner.is_none() {
                            winner = Some(rule);
                            RuleOutcome::Winner
                        } else {
                            RuleOutcome::MatchedButLost
                        }
                    }
                    Ok(_) => RuleOutcome::NotMatched,
                    Err(err) => {
                        tracing::warn!(
                            "rule {} could not be evaluated for {}: {}",
                            rule.id(),
                            file.path.display(),
                            err
                        );
                        RuleOutcome::Skipped(SkipReason::Error(err.to_string()))
                    }
                },
            };

            evaluations.push(RuleEvaluation {
                rule_id: rule.id().to_string(),
                rule_name: rule.name().to_string(),
                kind: rule.kind(),
                priority: rule.priority(),
                outcome,
            });
        }

        PriorityResolution {
            winner,
            evaluations,
        }
    }
}

impl Evaluator<'_> {
    fn evaluate(
        &self,
        file: &FileDescriptor,
        metadata: &UnifiedMetadata,
    ) -> Result<RuleMatch, RuleError> {
        match self {
            Evaluator::Metadata(rule) => rule.evaluate(metadata),
            Evaluator::Filename(matcher) => Ok(evaluate_with_matcher(matcher, file)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TiedRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityTie {
    pub priority: i32,
    pub rules: Vec<TiedRule>,
}

/// Groups every rule, of both kinds, by numeric priority and reports groups
/// with two or more members, highest priority first. Never affects which
/// rule wins.
pub fn detect_priority_ties(
    metadata_rules: &[MetadataPatternRule],
    filename_rules: &[FilenamePatternRule],
) -> Vec<PriorityTie> {
    let mut groups: BTreeMap<Reverse<i32>, Vec<TiedRule>> = BTreeMap::new();
    let all = metadata_rules
        .iter()
        .map(Rule::Metadata)
        .chain(filename_rules.iter().map(Rule::Filename));

    for rule in all {
        groups
            .entry(Reverse(rule.priority()))
            .or_default()
            .push(TiedRule {
                id: rule.id().to_string(),
                name: rule.name().to_string(),
                kind: rule.kind(),
            });
    }

    groups
        .into_iter()
        .filter(|(_, rules)| rules.len() >= 2)
        .map(|(Reverse(priority), rules)| PriorityTie { priority, rules })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ImageMetadata, MetadataField};
    use crate::metadata_rule::{ConditionOperator, FieldCondition, MatchMode};
    use chrono::Utc;

    fn meta_rule(id: &str, priority: i32) -> MetadataPatternRule {
        MetadataPatternRule {
            id: id.to_string(),
            name: format!("meta {id}"),
            conditions: vec![FieldCondition {
                field: MetadataField::ImageCameraMake,
                operator: ConditionOperator::Equals,
                value: "Apple".to_string(),
                case_sensitive: false,
            }],
            match_mode: MatchMode::All,
            template_id: "t".to_string(),
            priority,
            enabled: true,
            folder_structure_id: None,
        }
    }

    fn name_rule(id: &str, priority: i32) -> FilenamePatternRule {
        FilenamePatternRule {
            id: id.to_string(),
            name: format!("name {id}"),
            pattern: "*.jpg".to_string(),
            case_sensitive: false,
            template_id: "t".to_string(),
            priority,
            enabled: true,
            folder_structure_id: None,
        }
    }

    fn iphone_photo() -> (FileDescriptor, UnifiedMetadata) {
        let file = FileDescriptor::from_path("/p/IMG_1.jpg", 1, Utc::now());
        let meta = UnifiedMetadata::with_image(ImageMetadata {
            camera_make: Some("Apple".to_string()),
            ..ImageMetadata::default()
        });
        (file, meta)
    }

    fn ids(rules: &[Rule<'_>]) -> Vec<String> {
        rules.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn combined_sorts_by_priority_with_stable_kind_tiebreak() {
        let meta = vec![meta_rule("m1", 5), meta_rule("m2", 10)];
        let names = vec![name_rule("f1", 10), name_rule("f2", 1)];
        let ordered = order_rules(&meta, &names, RulePriorityMode::Combined);
        assert_eq!(ids(&ordered), vec!["m2", "f1", "m1", "f2"]);
    }

    #[test]
    fn kind_first_modes_ignore_numeric_priority_across_kinds() {
        let meta = vec![meta_rule("m1", 1)];
        let names = vec![name_rule("f1", 100)];
        let ordered = order_rules(&meta, &names, RulePriorityMode::MetadataFirst);
        assert_eq!(ids(&ordered), vec!["m1", "f1"]);
        let ordered = order_rules(&meta, &names, RulePriorityMode::FilenameFirst);
        assert_eq!(ids(&ordered), vec!["f1", "m1"]);
    }

    #[test]
    fn combined_higher_filename_priority_wins_and_swapping_swaps() {
        let (file, meta) = iphone_photo();

        let metadata_rules = vec![meta_rule("m", 5)];
        let filename_rules = vec![name_rule("f", 10)];
        let resolver =
            PriorityResolver::new(&metadata_rules, &filename_rules, RulePriorityMode::Combined);
        let resolution = resolver.resolve(&file, &meta);
        assert_eq!(resolution.winner.map(|r| r.id()), Some("f"));
        assert_eq!(resolution.matched_but_lost().count(), 1);

        let metadata_rules = vec![meta_rule("m", 10)];
        let filename_rules = vec![name_rule("f", 5)];
        let resolver =
            PriorityResolver::new(&metadata_rules, &filename_rules, RulePriorityMode::Combined);
        let resolution = resolver.resolve(&file, &meta);
        assert_eq!(resolution.winner.map(|r| r.id()), Some("m"));
    }

    #[test]
    fn disabled_rules_are_skipped_and_recorded() {
        let (file, meta) = iphone_photo();
        let mut disabled = name_rule("f", 100);
        disabled.enabled = false;
        let metadata_rules = vec![meta_rule("m", 1)];
        let filename_rules = vec![disabled];
        let resolver =
            PriorityResolver::new(&metadata_rules, &filename_rules, RulePriorityMode::Combined);
        let resolution = resolver.resolve(&file, &meta);

        assert_eq!(resolution.winner.map(|r| r.id()), Some("m"));
        assert_eq!(
            resolution.evaluations[0].outcome,
            RuleOutcome::Skipped(SkipReason::Disabled)
        );
    }

    #[test]
    fn erroring_rule_is_skipped_not_fatal() {
        let (file, meta) = iphone_photo();
        let mut broken = meta_rule("bad", 50);
        broken.conditions[0].operator = ConditionOperator::Matches;
        broken.conditions[0].value = "(".to_string();
        let metadata_rules = vec![broken, meta_rule("m", 1)];
        let resolver = PriorityResolver::new(&metadata_rules, &[], RulePriorityMode::Combined);
        let resolution = resolver.resolve(&file, &meta);

        assert_eq!(resolution.winner.map(|r| r.id()), Some("m"));
        assert!(matches!(
            resolution.evaluations[0].outcome,
            RuleOutcome::Skipped(SkipReason::Error(_))
        ));
    }

    #[test]
    fn one_resolver_serves_a_whole_batch() {
        let (file, meta) = iphone_photo();
        let mut regex_rule = meta_rule("re", 5);
        regex_rule.conditions[0].operator = ConditionOperator::Matches;
        regex_rule.conditions[0].value = "^app".to_string();
        let mut broken = meta_rule("bad", 9);
        broken.conditions[0].operator = ConditionOperator::Matches;
        broken.conditions[0].value = "[".to_string();
        let metadata_rules = vec![broken, regex_rule];
        let resolver = PriorityResolver::new(&metadata_rules, &[], RulePriorityMode::Combined);

        for _ in 0..3 {
            let resolution = resolver.resolve(&file, &meta);
            assert_eq!(resolution.winner.map(|r| r.id()), Some("re"));
            assert!(matches!(
                resolution.evaluations[0].outcome,
                RuleOutcome::Skipped(SkipReason::Error(_))
            ));
        }
    }

    #[test]
    fn no_match_means_no_winner() {
        let file = FileDescriptor::from_path("/p/notes.txt", 1, Utc::now());
        let metadata_rules = vec![meta_rule("m", 1)];
        let filename_rules = vec![name_rule("f", 1)];
        let resolver =
            PriorityResolver::new(&metadata_rules, &filename_rules, RulePriorityMode::Combined);
        let resolution = resolver.resolve(&file, &UnifiedMetadata::default());
        assert!(resolution.winner.is_none());
        assert!(resolution
            .evaluations
            .iter()
            .all(|e| e.outcome == RuleOutcome::NotMatched));
    }

    #[test]
    fn ties_across_kinds_are_reported_highest_first() {
        let meta = vec![meta_rule("m1", 5), meta_rule("m2", 7)];
        let names = vec![name_rule("f1", 5), name_rule("f2", 7), name_rule("f3", 1)];
        let ties = detect_priority_ties(&meta, &names);
        assert_eq!(ties.len(), 2);
        assert_eq!(ties[0].priority, 7);
        assert_eq!(ties[1].priority, 5);
        assert_eq!(ties[1].rules[0].kind, RuleKind::Metadata);
        assert_eq!(ties[1].rules[1].kind, RuleKind::Filename);
    }

    #[test]
    fn distinct_priorities_have_no_ties() {
        let meta = vec![meta_rule("m1", 5)];
        let names = vec![name_rule("f1", 6)];
        assert!(detect_priority_ties(&meta, &names).is_empty());
    }
}

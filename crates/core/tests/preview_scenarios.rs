//! End-to-end preview scenarios.
//!
//! Tests cover:
//! - Default template resolution and connector normalization
//! - Destination conflicts across directories
//! - Rules whose template was deleted after creation
//! - Empty batches and missing default templates
//! - Rule priority in every mode and tie reporting

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tidy_rename_core::{
    generate_preview, AppConfig, ConditionOperator, FieldCondition, FileDescriptor,
    FilenamePatternRule, ImageMetadata, IssueCode, MatchMode, MetadataField, MetadataPatternRule,
    PreviewOptions, RenameStatus, RuleKind, RulePriorityMode, TemplateSource, UnifiedMetadata,
};

// ========== TEST FIXTURES ==========

fn taken(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 30, 0)
        .single()
        .expect("valid date")
}

fn scanned(path: &str) -> FileDescriptor {
    FileDescriptor::from_path(path, 2048, taken(2025, 12, 31))
}

fn iphone_shot(date: DateTime<Utc>) -> UnifiedMetadata {
    UnifiedMetadata::with_image(ImageMetadata {
        date_taken: Some(date),
        camera_make: Some("Apple".to_string()),
        camera_model: Some("iPhone 15".to_string()),
        ..ImageMetadata::default()
    })
}

/// Default configuration with the default template's pattern replaced.
fn config_with_default(pattern: &str) -> AppConfig {
    let mut config = AppConfig::default();
    for template in &mut config.templates {
        if template.is_default {
            template.pattern = pattern.to_string();
        }
    }
    config
}

fn apple_rule(priority: i32, template_id: &str) -> MetadataPatternRule {
    MetadataPatternRule {
        id: "apple".to_string(),
        name: "Apple devices".to_string(),
        conditions: vec![FieldCondition {
            field: MetadataField::ImageCameraMake,
            operator: ConditionOperator::Equals,
            value: "Apple".to_string(),
            case_sensitive: false,
        }],
        match_mode: MatchMode::All,
        template_id: template_id.to_string(),
        priority,
        enabled: true,
        folder_structure_id: None,
    }
}

fn jpeg_rule(priority: i32, template_id: &str) -> FilenamePatternRule {
    FilenamePatternRule {
        id: "jpegs".to_string(),
        name: "JPEG files".to_string(),
        pattern: "*.{jpg,jpeg}".to_string(),
        case_sensitive: false,
        template_id: template_id.to_string(),
        priority,
        enabled: true,
        folder_structure_id: None,
    }
}

fn metadata_for(
    files: &[FileDescriptor],
    meta: UnifiedMetadata,
) -> HashMap<PathBuf, UnifiedMetadata> {
    files
        .iter()
        .map(|file| (file.path.clone(), meta.clone()))
        .collect()
}

// ========== NAME RESOLUTION ==========

#[test]
fn date_template_renames_vacation_photo() {
    let config = config_with_default("{year}-{month}-{day}_{original}");
    let files = vec![scanned("/photos/vacation.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));

    let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("preview");

    let proposal = &result.proposals[0];
    assert_eq!(proposal.proposed_name, "2026_01_10_vacation.jpg");
    assert_eq!(proposal.status, RenameStatus::Ready);
    assert_eq!(proposal.original_name, "vacation.jpg");
    assert!(!proposal.is_move_operation);
    assert_eq!(result.summary.ready, 1);
}

#[test]
fn unchanged_name_is_no_change_and_anything_else_is_not() {
    let config = config_with_default("{original}");
    let files = vec![scanned("/photos/vacation.jpg"), scanned("/photos/My Trip.jpg")];

    let result = generate_preview(&files, &HashMap::new(), &config, &PreviewOptions::default())
        .expect("preview");

    let by_name: HashMap<&str, _> = result
        .proposals
        .iter()
        .map(|p| (p.original_name.as_str(), p))
        .collect();
    assert_eq!(by_name["vacation.jpg"].status, RenameStatus::NoChange);
    assert_eq!(by_name["vacation.jpg"].proposed_name, "vacation.jpg");
    assert_eq!(by_name["My Trip.jpg"].status, RenameStatus::Ready);
    assert_eq!(by_name["My Trip.jpg"].proposed_name, "My_Trip.jpg");
    assert_eq!(result.summary.no_change, 1);
}

// ========== CONFLICTS ==========

#[test]
fn shared_destination_marks_every_member_as_conflict() {
    let config = config_with_default("photo");
    let files = vec![
        scanned("/inbox/phone/IMG_0001.jpg"),
        scanned("/inbox/camera/DSC_0042.jpg"),
        scanned("/inbox/camera/DSC_0043.jpg"),
    ];
    let mut metadata = metadata_for(&files[..2], iphone_shot(taken(2026, 1, 10)));
    metadata.insert(files[2].path.clone(), iphone_shot(taken(2026, 2, 1)));
    let options = PreviewOptions {
        base_directory: Some(PathBuf::from("/library")),
        folder_pattern: Some("{year}/{month}".to_string()),
        ..PreviewOptions::default()
    };

    let result = generate_preview(&files, &metadata, &config, &options).expect("preview");

    for proposal in &result.proposals[..2] {
        assert_eq!(proposal.proposed_path, PathBuf::from("/library/2026/01/photo.jpg"));
        assert_eq!(proposal.status, RenameStatus::Conflict);
        assert!(proposal
            .issues
            .iter()
            .any(|issue| issue.code == IssueCode::DuplicateDestination));
    }
    assert_eq!(result.proposals[2].status, RenameStatus::Ready);
    assert_eq!(
        result.proposals[2].destination_folder.as_deref(),
        Some("2026/02")
    );
    assert_eq!(result.summary.conflicts, 2);
    assert_eq!(result.summary.move_operations, 3);
}

// ========== RULES ==========

#[test]
fn deleted_rule_template_falls_back_to_default() {
    let mut config = config_with_default("{year}-{month}-{day}_{original}");
    config
        .add_metadata_rule(apple_rule(5, "camera-date"))
        .expect("template exists when the rule is added");
    config.templates.retain(|template| template.id != "camera-date");

    let files = vec![scanned("/inbox/IMG_0001.heic")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));
    let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("preview");

    let proposal = &result.proposals[0];
    assert_eq!(proposal.template_source, TemplateSource::Fallback);
    assert!(proposal
        .issues
        .iter()
        .any(|issue| issue.code == IssueCode::RuleTemplateMissing));
    assert_eq!(proposal.proposed_name, "2026_01_10_IMG_0001.heic");
    assert_eq!(proposal.status, RenameStatus::Ready);
}

#[test]
fn applied_rule_is_stable_across_runs() {
    let mut config = AppConfig::default();
    config
        .add_metadata_rule(apple_rule(5, "camera-date"))
        .expect("add rule");
    config
        .add_filename_rule(jpeg_rule(5, "date-prefix"))
        .expect("add rule");
    let files = vec![scanned("/inbox/IMG_0001.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));

    let first = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("first run");
    let second = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("second run");

    assert!(first.proposals[0].applied_rule.is_some());
    assert_eq!(first.proposals[0].applied_rule, second.proposals[0].applied_rule);
    assert_eq!(first.proposals[0].proposed_path, second.proposals[0].proposed_path);
}

#[test]
fn combined_mode_follows_numeric_priority() {
    let files = vec![scanned("/inbox/IMG_0001.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));

    let winner = |filename_priority: i32, metadata_priority: i32| {
        let mut config = AppConfig::default();
        config.preferences.rule_priority_mode = RulePriorityMode::Combined;
        config
            .add_metadata_rule(apple_rule(metadata_priority, "camera-date"))
            .expect("add rule");
        config
            .add_filename_rule(jpeg_rule(filename_priority, "date-prefix"))
            .expect("add rule");
        let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
            .expect("preview");
        result.proposals[0]
            .applied_rule
            .as_ref()
            .map(|rule| rule.rule_type)
    };

    assert_eq!(winner(10, 5), Some(RuleKind::Filename));
    assert_eq!(winner(5, 10), Some(RuleKind::Metadata));
}

#[test]
fn grouped_modes_ignore_priority_across_kinds() {
    let files = vec![scanned("/inbox/IMG_0001.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));

    let run = |mode: RulePriorityMode, filename_priority: i32, metadata_priority: i32| {
        let mut config = config_with_default("{original}");
        config.preferences.rule_priority_mode = mode;
        config
            .add_metadata_rule(apple_rule(metadata_priority, "camera-date"))
            .expect("add rule");
        config
            .add_filename_rule(jpeg_rule(filename_priority, "date-prefix"))
            .expect("add rule");
        generate_preview(&files, &metadata, &config, &PreviewOptions::default())
            .expect("preview")
            .proposals
            .remove(0)
    };

    let metadata_first = run(RulePriorityMode::MetadataFirst, 100, 1);
    assert_eq!(
        metadata_first.applied_rule.as_ref().map(|rule| rule.rule_type),
        Some(RuleKind::Metadata)
    );
    assert_eq!(metadata_first.proposed_name, "Apple_iPhone_15_2026-01-10_IMG_0001.jpg");

    let filename_first = run(RulePriorityMode::FilenameFirst, 1, 100);
    assert_eq!(
        filename_first.applied_rule.as_ref().map(|rule| rule.rule_type),
        Some(RuleKind::Filename)
    );
    assert_eq!(filename_first.proposed_name, "IMG_0001.jpg");
    assert_eq!(filename_first.status, RenameStatus::NoChange);
}

#[test]
fn ties_are_reported_without_changing_the_winner() {
    let mut config = AppConfig::default();
    config
        .add_metadata_rule(apple_rule(7, "camera-date"))
        .expect("add rule");
    config
        .add_filename_rule(jpeg_rule(7, "date-prefix"))
        .expect("add rule");
    let files = vec![scanned("/inbox/IMG_0001.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));

    let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("preview");

    assert_eq!(result.priority_ties.len(), 1);
    assert_eq!(result.priority_ties[0].priority, 7);
    assert_eq!(result.priority_ties[0].rules.len(), 2);
    assert_eq!(
        result.proposals[0].applied_rule.as_ref().map(|r| r.id.as_str()),
        Some("apple")
    );

    config.filename_rules[0].priority = 3;
    let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("preview");
    assert!(result.priority_ties.is_empty());
}

// ========== BATCH EDGE CASES ==========

#[test]
fn empty_batch_yields_empty_result() {
    let result = generate_preview(
        &[],
        &HashMap::new(),
        &AppConfig::default(),
        &PreviewOptions::default(),
    )
    .expect("empty batch is not an error");
    assert_eq!(result.summary.total, 0);
    assert!(result.proposals.is_empty());
}

#[test]
fn missing_default_template_aborts_non_empty_batch() {
    let mut config = AppConfig::default();
    for template in &mut config.templates {
        template.is_default = false;
    }

    let err = generate_preview(
        &[scanned("/inbox/a.jpg")],
        &HashMap::new(),
        &config,
        &PreviewOptions::default(),
    )
    .expect_err("no default template");
    assert_eq!(err.kind(), "no_default_template");

    let empty = generate_preview(&[], &HashMap::new(), &config, &PreviewOptions::default())
        .expect("empty batch never needs a template");
    assert_eq!(empty.summary.total, 0);
}

#[test]
fn proposals_serialize_in_camel_case() {
    let config = config_with_default("{year}-{month}-{day}_{original}");
    let files = vec![scanned("/photos/vacation.jpg")];
    let metadata = metadata_for(&files, iphone_shot(taken(2026, 1, 10)));
    let result = generate_preview(&files, &metadata, &config, &PreviewOptions::default())
        .expect("preview");

    let json = serde_json::to_value(&result).expect("serialize");
    let proposal = &json["proposals"][0];
    assert_eq!(proposal["proposedName"], "2026_01_10_vacation.jpg");
    assert_eq!(proposal["status"], "ready");
    assert_eq!(proposal["templateSource"], "default");
    assert_eq!(proposal["actionType"], "rename");
    assert!(proposal.get("conflict").is_none());
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["actionSummary"]["renameCount"], 1);
    assert_eq!(json["templateUsed"], "{year}-{month}-{day}_{original}");
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tidy_rename_core::{
    app_paths, generate_preview, load_config, load_config_from, parse_template,
    validate_folder_pattern, AppConfig, FileDescriptor, PreviewOptions, PreviewResult,
    TemplatePart, UnifiedMetadata,
};

#[derive(Debug, Parser)]
#[command(name = "tidy-rename-cli")]
#[command(about = "Preview rule-driven renames for a batch of scanned files")]
struct Cli {
    /// Log per-file decisions.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build rename proposals for a batch without touching any file.
    Preview(PreviewArgs),
    /// List rules that share a priority.
    Ties(ConfigPathArgs),
    /// Check a template or folder pattern for syntax errors.
    ValidateTemplate(ValidateArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigPathArgs {
    /// Configuration file. Defaults to the OS configuration directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show(ConfigPathArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    pattern: String,
    /// Treat the pattern as a folder pattern.
    #[arg(long, default_value_t = false)]
    folder: bool,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    /// JSON batch: `{ "files": [...], "metadata": { "<path>": {...} } }`.
    #[arg(long)]
    input: PathBuf,
    #[command(flatten)]
    config: ConfigPathArgs,
    #[arg(long)]
    base_directory: Option<PathBuf>,
    /// Organize every file into this folder pattern, e.g. `{year}/{month}`.
    #[arg(long)]
    folder_pattern: Option<String>,
    /// Fallback value for a placeholder, as `name=value`. Repeatable.
    #[arg(long = "fallback", value_parser = parse_fallback)]
    fallbacks: Vec<(String, String)>,
    #[arg(long)]
    date_format: Option<String>,
    #[arg(long)]
    max_filename_len: Option<usize>,
    #[arg(long, default_value_t = false)]
    no_extension: bool,
    #[arg(long, default_value_t = false)]
    no_sanitize: bool,
    /// Drop date stamps and copy counters from `{original}`.
    #[arg(long, default_value_t = false)]
    strip_existing_patterns: bool,
    /// Keep the current parent folders below the resolved folder.
    #[arg(long, default_value_t = false)]
    preserve_context: bool,
    #[arg(long, default_value_t = 1)]
    context_depth: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Deserialize)]
struct Batch {
    files: Vec<FileDescriptor>,
    #[serde(default)]
    metadata: HashMap<PathBuf, UnifiedMetadata>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Preview(args) => cmd_preview(args),
        Commands::Ties(args) => cmd_ties(args),
        Commands::ValidateTemplate(args) => cmd_validate_template(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show(args) => cmd_config_show(args),
        },
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("tidy_rename=debug")
    } else {
        EnvFilter::new("tidy_rename=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn parse_fallback(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_lowercase(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got {raw:?}")),
    }
}

fn read_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

fn cmd_preview(args: PreviewArgs) -> Result<()> {
    let config = read_config(args.config.config.as_deref())?;
    for problem in config.validation_errors() {
        tracing::warn!("config: {}", problem);
    }

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read batch file: {}", args.input.display()))?;
    let batch: Batch = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse batch file: {}", args.input.display()))?;

    let options = PreviewOptions {
        base_directory: args.base_directory,
        folder_pattern: args.folder_pattern,
        fallbacks: args.fallbacks.into_iter().collect(),
        include_extension: !args.no_extension,
        sanitize_filenames: !args.no_sanitize,
        date_format: args.date_format,
        max_filename_len: args.max_filename_len,
        strip_existing_patterns: args.strip_existing_patterns,
        preserve_context: args.preserve_context,
        context_depth: args.context_depth,
    };

    let result = generate_preview(&batch.files, &batch.metadata, &config, &options)
        .context("preview failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => print_table(&result),
    }
    eprintln!("dry run: no files were changed.");
    Ok(())
}

fn cmd_ties(args: ConfigPathArgs) -> Result<()> {
    let config = read_config(args.config.as_deref())?;
    let ties = config.priority_ties();
    if ties.is_empty() {
        println!("no priority ties");
        return Ok(());
    }
    for tie in ties {
        let names: Vec<String> = tie
            .rules
            .iter()
            .map(|rule| format!("{} ({:?})", rule.name, rule.kind))
            .collect();
        println!("priority {}: {}", tie.priority, names.join(", "));
    }
    Ok(())
}

fn cmd_validate_template(args: ValidateArgs) -> Result<()> {
    if args.folder {
        validate_folder_pattern(&args.pattern)?;
        println!("ok: folder pattern");
        return Ok(());
    }

    let parts = parse_template(&args.pattern)?;
    let placeholders: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            TemplatePart::Placeholder(placeholder) => Some(placeholder.name.as_str()),
            TemplatePart::Literal(_) => None,
        })
        .collect();
    println!("ok: placeholders [{}]", placeholders.join(", "));
    Ok(())
}

fn cmd_config_show(args: ConfigPathArgs) -> Result<()> {
    let config = read_config(args.config.as_deref())?;
    match &args.config {
        Some(path) => println!("config file: {}", path.display()),
        None => println!("config file: {}", app_paths()?.config_path.display()),
    }
    println!("{}", toml::to_string_pretty(&config)?);
    for problem in config.validation_errors() {
        println!("# problem ({}): {}", problem.kind(), problem);
    }
    Ok(())
}

fn print_table(result: &PreviewResult) {
    if let Some(template) = &result.template_used {
        println!("default template: {}", template);
    }
    println!("status       action     original -> proposed");
    for proposal in &result.proposals {
        println!(
            "{:<12} {:<10} {} -> {}",
            proposal.status.as_str(),
            proposal.action_type.as_str(),
            proposal.original_path.display(),
            proposal.proposed_path.display()
        );
        for issue in &proposal.issues {
            println!("             [{}] {}", issue.code.as_str(), issue.message);
        }
    }

    for tie in &result.priority_ties {
        let ids: Vec<&str> = tie.rules.iter().map(|rule| rule.id.as_str()).collect();
        println!("warning: rules share priority {}: {}", tie.priority, ids.join(", "));
    }

    let s = &result.summary;
    println!(
        "\nsummary: total={} ready={} conflicts={} missing_data={} no_change={} invalid_name={}",
        s.total, s.ready, s.conflicts, s.missing_data, s.no_change, s.invalid_name
    );
    println!(
        "         moves={} rename_only={}",
        s.move_operations, s.rename_only
    );
    let a = &result.action_summary;
    println!(
        "actions: rename={} move={} no_change={} conflict={} error={}",
        a.rename_count, a.move_count, a.no_change_count, a.conflict_count, a.error_count
    );
}

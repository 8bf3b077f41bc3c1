use crate::config::{AnalysisConfig, ApiFlavor, GroupingStrategy};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Builds a documentation-ready API model (endpoints, data types, resource groups) from
/// annotated Rust sources
#[derive(Parser, Debug)]
#[command(name = "api-model-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// API flavors to analyze (if not specified, auto-detect)
    #[arg(short = 'w', long = "flavor", value_enum)]
    pub flavors: Vec<ApiFlavor>,

    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Additional source roots whose types may be documented (not analyzed for endpoints
    /// unless the detection strategy is aggressive)
    #[arg(long = "include", value_name = "DIR")]
    pub include_paths: Vec<PathBuf>,

    /// How operations are grouped into resource groups
    #[arg(long = "group-by", value_enum)]
    pub group_by: Option<GroupingStrategy>,

    /// Context path every operation path is relative to
    #[arg(long = "context-path", value_name = "PATH")]
    pub context_path: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    for include in &args.include_paths {
        if !include.is_dir() {
            anyhow::bail!("Include path is not a directory: {}", include.display());
        }
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if args.flavors.is_empty() {
        info!("Flavors: auto-detect");
    } else {
        info!("Flavors: {:?}", args.flavors);
    }

    Ok(args)
}

/// Loads the configuration file, if any, and applies the command line overrides.
pub fn load_config(args: &CliArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config_path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(grouping) = args.group_by {
        config.override_grouping(grouping);
    }
    if let Some(context_path) = &args.context_path {
        config.override_context_path(context_path);
    }
    if !args.flavors.is_empty() {
        config.override_flavors(&args.flavors);
    }
    config.add_include_paths(args.include_paths.iter().cloned());

    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::detector::FlavorDetector;
    use crate::engine::analyze;
    use crate::parser::{AstParser, ParsedFile};
    use crate::scanner::{FileScanner, SourceRoot};
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
    use crate::source_model::SourceModel;

    info!("Starting API model generation...");
    let config = load_config(&args)?;

    // Step 1: Scan the project and every included root
    info!("Scanning source roots...");
    let mut roots = vec![SourceRoot::local(args.project_path.clone())];
    roots.extend(config.include_paths.iter().cloned().map(SourceRoot::included));
    let scanner = FileScanner::new(roots);
    let scan_result = scanner.scan()?;

    info!(
        "Found {} Rust files ({} local)",
        scan_result.rust_files.len(),
        scan_result.local_count()
    );
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    if scan_result.local_count() == 0 {
        anyhow::bail!("No Rust files found in the project directory");
    }

    // Step 2: Parse files into AST
    info!("Parsing Rust files...");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.rust_files)
        .into_iter()
        .filter_map(|result| match result {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to parse error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());

    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    // Step 3: Detect flavors
    info!("Detecting API flavors...");
    let detection = FlavorDetector::detect(&parsed_files);
    if detection.flavors.is_empty() && args.flavors.is_empty() {
        warn!("No API flavor detected; only data types will be documented");
    } else {
        info!("Detected flavors: {:?}", detection.flavors);
    }

    // Step 4: Build the program model and run the analysis
    let model = SourceModel::new(&parsed_files);
    let api_model = analyze(&config, &model, &detection).context("Analysis failed")?;

    // Step 5: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&api_model)?,
        OutputFormat::Json => serialize_json(&api_model)?,
    };

    // Step 6: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.rust_files.len());
    info!("  - Files parsed: {}", parsed_files.len());
    for api in &api_model.resource_apis {
        info!(
            "  - {}: {} endpoints, {} resource groups",
            api.name,
            api.endpoints.len(),
            api.resource_groups.len()
        );
    }
    for (format, data_types) in &api_model.data_types {
        info!("  - {} data types: {}", format, data_types.len());
    }

    Ok(())
}

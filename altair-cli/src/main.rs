use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use altair_aws::AwsLookups;
use altair_core::config::{ResolvedLookups, TopologyConfig};
use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};
use altair_core::schema::ResourceSchema;
use altair_topology::schemas;

#[derive(Parser)]
#[command(name = "altair")]
#[command(about = "Declarative AWS topology for a small Kubernetes cluster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Configuration file plus per-option overrides
#[derive(Args)]
struct ConfigArgs {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Availability zones (comma separated)
    #[arg(long, value_delimiter = ',')]
    zones: Option<Vec<String>>,

    /// Name of the pre-existing hosted zone for DNS records
    #[arg(long)]
    dns_zone: Option<String>,

    /// Environment suffix stamped into network resource names
    #[arg(long)]
    suffix: Option<String>,

    /// EC2 instance type for every node
    #[arg(long)]
    instance_type: Option<String>,

    /// Node name prefix
    #[arg(long)]
    instance_prefix: Option<String>,

    /// AWS region for the lookups
    #[arg(long)]
    region: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and the generated declarations
    Validate {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the dependency-ordered declarations
    Render {
        #[command(flatten)]
        config: ConfigArgs,

        /// Use placeholder lookups instead of querying AWS
        #[arg(long)]
        offline: bool,
    },
    /// Emit the manifest as JSON for the reconciliation engine
    Export {
        #[command(flatten)]
        config: ConfigArgs,

        /// Use placeholder lookups instead of querying AWS
        #[arg(long)]
        offline: bool,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Diff a previously exported manifest against a regeneration
    Diff {
        /// Path to an exported manifest JSON file
        file: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Use placeholder lookups instead of querying AWS
        #[arg(long)]
        offline: bool,
    },
    /// Report the declared instances as AWS currently sees them
    Status {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { config } => run_validate(&config),
        Commands::Render { config, offline } => run_render(&config, offline).await,
        Commands::Export {
            config,
            offline,
            output,
        } => run_export(&config, offline, output.as_deref()).await,
        Commands::Diff {
            file,
            config,
            offline,
        } => run_diff(&file, &config, offline).await,
        Commands::Status { config } => run_status(&config).await,
        Commands::Completions { shell } => run_completions(shell),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(args: &ConfigArgs) -> Result<TopologyConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?
        }
        None => TopologyConfig::default(),
    };

    if let Some(zones) = &args.zones {
        config.availability_zones = zones.clone();
    }
    if let Some(dns_zone) = &args.dns_zone {
        config.dns_zone_name = dns_zone.clone();
    }
    if let Some(suffix) = &args.suffix {
        config.suffix = suffix.clone();
    }
    if let Some(instance_type) = &args.instance_type {
        config.instance_type = instance_type.clone();
    }
    if let Some(instance_prefix) = &args.instance_prefix {
        config.instance_prefix = instance_prefix.clone();
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

async fn resolve_lookups(
    config: &TopologyConfig,
    offline: bool,
) -> Result<ResolvedLookups, String> {
    if offline {
        return Ok(ResolvedLookups::placeholder());
    }

    println!(
        "{}",
        format!("Resolving lookups (region: {})", config.region).cyan()
    );
    let lookups = AwsLookups::new(&config.region).await;
    lookups.resolve(config).await.map_err(|e| e.to_string())
}

fn build_manifest(
    config: &TopologyConfig,
    lookups: &ResolvedLookups,
) -> Result<Manifest, String> {
    altair_topology::build(config, lookups).map_err(|e| e.to_string())
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    let mut all_schemas = HashMap::new();
    for schema in schemas::all_schemas() {
        all_schemas.insert(schema.resource_type.clone(), schema);
    }
    all_schemas
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = get_schemas();
    let mut all_errors = Vec::new();

    for resource in resources {
        if let Some(schema) = schemas.get(&resource.id.resource_type)
            && let Err(errors) = schema.validate(&resource.attributes)
        {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(args: &ConfigArgs) -> Result<(), String> {
    let config = load_config(args)?;

    println!("{}", "Validating...".cyan());

    // Validation never needs AWS: lookups only contribute opaque identifiers
    let manifest = build_manifest(&config, &ResolvedLookups::placeholder())?;
    validate_resources(manifest.resources())?;
    let ordered = manifest.ordered().map_err(|e| e.to_string())?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", ordered.len())
            .green()
            .bold()
    );

    for resource in ordered {
        println!("  • {}", resource.id);
    }

    Ok(())
}

async fn run_render(args: &ConfigArgs, offline: bool) -> Result<(), String> {
    let config = load_config(args)?;
    let lookups = resolve_lookups(&config, offline).await?;
    let manifest = build_manifest(&config, &lookups)?;

    print_manifest(&manifest)?;
    Ok(())
}

async fn run_export(
    args: &ConfigArgs,
    offline: bool,
    output: Option<&std::path::Path>,
) -> Result<(), String> {
    let config = load_config(args)?;
    let lookups = resolve_lookups(&config, offline).await?;
    let manifest = build_manifest(&config, &lookups)?;

    let json = manifest.to_json_string().map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!(
                "{}",
                format!("Exported {} resources to {}.", manifest.len(), path.display())
                    .green()
                    .bold()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn run_diff(
    file: &std::path::Path,
    args: &ConfigArgs,
    offline: bool,
) -> Result<(), String> {
    let previous = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;

    let config = load_config(args)?;
    let lookups = resolve_lookups(&config, offline).await?;
    let manifest = build_manifest(&config, &lookups)?;
    let current = manifest.to_json_string().map_err(|e| e.to_string())?;

    if previous == current {
        println!("{}", "No changes. Manifest is up-to-date.".green());
        return Ok(());
    }

    println!("{} {}:", "Diff for".cyan().bold(), file.display());
    let diff = TextDiff::from_lines(&previous, &current);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }

    Err("Manifest differs from the exported file".to_string())
}

async fn run_status(args: &ConfigArgs) -> Result<(), String> {
    let config = load_config(args)?;

    println!(
        "{}",
        format!("Querying instances (region: {})", config.region).cyan()
    );

    let lookups = AwsLookups::new(&config.region).await;
    let reports = lookups
        .instance_reports(&config)
        .await
        .map_err(|e| e.to_string())?;

    if reports.is_empty() {
        println!("{}", "No instances found.".yellow());
        return Ok(());
    }

    for report in &reports {
        let json = serde_json::to_string(report).map_err(|e| e.to_string())?;
        println!("instance: {}", json);
    }

    Ok(())
}

fn run_completions(shell: Shell) -> Result<(), String> {
    clap_complete::generate(shell, &mut Cli::command(), "altair", &mut io::stdout());
    Ok(())
}

fn print_manifest(manifest: &Manifest) -> Result<(), String> {
    let ordered = manifest.ordered().map_err(|e| e.to_string())?;

    println!("{}", "Declarations:".cyan().bold());
    println!();

    for resource in &ordered {
        println!("  {} {}", "+".green().bold(), resource.id.resource_type.cyan().bold());

        let mut keys: Vec<_> = resource.attributes.keys().collect();
        keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
            ("name", _) => std::cmp::Ordering::Less,
            (_, "name") => std::cmp::Ordering::Greater,
            _ => a.cmp(b),
        });

        for key in keys {
            let value = &resource.attributes[key];
            if key == "name" {
                println!(
                    "      {}: {}",
                    key.bold(),
                    format_value(value).white().bold()
                );
            } else {
                println!("      {}: {}", key, format_value(value).green());
            }
        }
    }

    println!();
    println!("{}", manifest.summary());
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.len() > 50 {
                format!("\"{}...\"", &s[..47])
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            if items.len() <= 3 {
                let strs: Vec<_> = items.iter().map(format_value).collect();
                format!("[{}]", strs.join(", "))
            } else {
                format!("[{} items]", items.len())
            }
        }
        Value::Map(map) => {
            let strs: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
        Value::Ref(name, attr) => format!("{}.{}", name, attr),
        Value::Concat(_) => match value.to_json() {
            serde_json::Value::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        },
    }
}

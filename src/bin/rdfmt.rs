//! rdfmt CLI: extract and inspect RDF Molecule Templates.
//!
//! Usage:
//!   rdfmt extract --config fed.yaml [--out fed.json] [--replace]
//!   rdfmt refresh --config fed.yaml --snapshot fed.json --source <dsId>
//!   rdfmt show --snapshot fed.json

use clap::{Parser, Subcommand};
use rdfmt::{
    AppConfig, ExtractMode, Federation, FederationExtractor, HttpTransport, SchemaDiscoverer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rdfmt",
    version,
    about = "RDF Molecule Template discovery for federated SPARQL sources"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover every source of a federation
    Extract {
        /// Federation configuration (YAML)
        #[arg(long)]
        config: PathBuf,
        /// Snapshot file to write; an existing one is loaded and merged into
        #[arg(long)]
        out: Option<PathBuf>,
        /// Drop stored templates before extracting
        #[arg(long)]
        replace: bool,
    },
    /// Re-discover one source and rewrite the snapshot
    Refresh {
        /// Federation configuration (YAML)
        #[arg(long)]
        config: PathBuf,
        /// Snapshot file to update
        #[arg(long)]
        snapshot: PathBuf,
        /// ID of the source to refresh
        #[arg(long)]
        source: String,
    },
    /// Summarize a stored snapshot
    Show {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

fn load_config(path: &Path) -> Result<AppConfig, String> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config '{}': {}", path.display(), e))
}

fn load_snapshot(path: &Path) -> Result<Federation, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read snapshot '{}': {}", path.display(), e))?;
    Federation::from_json_str(&text)
        .map_err(|e| format!("Failed to parse snapshot '{}': {}", path.display(), e))
}

fn write_snapshot(federation: &Federation, out: Option<&Path>) -> Result<(), String> {
    let json = federation
        .to_json_string()
        .map_err(|e| format!("Failed to serialize federation: {}", e))?;
    match out {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn build_extractor(config: &AppConfig) -> Result<FederationExtractor, String> {
    let transport = HttpTransport::new(&config.transport)
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
    let discoverer = SchemaDiscoverer::new(Arc::new(transport), config.discovery.clone());
    Ok(FederationExtractor::new(Arc::new(discoverer))
        .with_max_concurrent_sources(config.max_concurrent_sources))
}

async fn cmd_extract(config_path: &Path, out: Option<&Path>, replace: bool) -> Result<(), String> {
    let config = load_config(config_path)?;
    let federation = match out {
        Some(path) if path.exists() => {
            let federation = load_snapshot(path)?;
            for source in &config.sources {
                federation.replace_source(source.clone());
            }
            federation
        }
        _ => config.build_federation(),
    };
    let extractor = build_extractor(&config)?;

    let mode = if replace { ExtractMode::Replace } else { ExtractMode::Merge };
    let report = extractor.extract_molecules(&federation, mode).await;
    write_snapshot(&federation, out)?;

    eprintln!(
        "Extracted {} templates from {} sources ({} skipped, {} failed)",
        federation.rdfmt_count(),
        report.sources_discovered,
        report.sources_skipped,
        report.sources_failed
    );
    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("{} sources failed", report.sources_failed))
    }
}

async fn cmd_refresh(config_path: &Path, snapshot: &Path, source_id: &str) -> Result<(), String> {
    let config = load_config(config_path)?;
    let federation = load_snapshot(snapshot)?;

    let source = match config.source(source_id).cloned().or_else(|| federation.get_source(source_id)) {
        Some(source) => source,
        None => return Err(format!("source '{}' not found", source_id)),
    };
    if let Some(retraction) = federation.replace_source(source.clone()) {
        eprintln!(
            "Source '{}' moved to {}: {} templates removed, {} detached",
            source_id,
            source.url,
            retraction.removed.len(),
            retraction.detached.len()
        );
    }

    let extractor = build_extractor(&config)?;
    let report = extractor
        .extract_source_molecules(&federation, &source)
        .await
        .map_err(|e| e.to_string())?;
    write_snapshot(&federation, Some(snapshot))?;

    eprintln!(
        "Refreshed '{}': {} templates folded, {} templates total",
        source_id,
        report.templates_folded,
        federation.rdfmt_count()
    );
    Ok(())
}

fn cmd_show(snapshot: &Path) -> Result<(), String> {
    let federation = load_snapshot(snapshot)?;

    println!("Federation {} ({})", federation.name(), federation.id());
    if !federation.description().is_empty() {
        println!("{}", federation.description());
    }
    println!();

    println!("{:<24}  {:<18}  URL", "SOURCE", "TYPE");
    println!("{}", "-".repeat(72));
    for source in federation.sources() {
        println!("{:<24}  {:<18}  {}", source.id, source.kind.to_string(), source.url);
    }
    println!();

    let rdfmts = federation.rdfmts();
    if rdfmts.is_empty() {
        println!("No templates extracted.");
        return Ok(());
    }
    println!("{:<56}  {:>5}  {:>7}  {:>11}", "CONCEPT", "PREDS", "SOURCES", "CARDINALITY");
    println!("{}", "-".repeat(86));
    for mt in rdfmts {
        println!(
            "{:<56}  {:>5}  {:>7}  {:>11}",
            mt.id,
            mt.predicate_count(),
            mt.sources.len(),
            mt.cardinality
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Extract { config, out, replace } => {
            cmd_extract(&config, out.as_deref(), replace).await
        }
        Commands::Refresh { config, snapshot, source } => {
            cmd_refresh(&config, &snapshot, &source).await
        }
        Commands::Show { snapshot } => cmd_show(&snapshot),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

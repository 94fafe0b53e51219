//! mesh-enrich CLI: descriptor extraction and resumable upstream lookups.
//!
//! Usage:
//!   mesh-enrich parse <desc.xml> [-o mesh_all.csv]
//!   mesh-enrich filter <mesh_all.csv> [-o mesh_filtered.csv]
//!   mesh-enrich wiki <mesh_filtered.csv> [--resweep] [--checkpoint path]
//!   mesh-enrich wikidata <analysis.csv> [--checkpoint path]
//!   mesh-enrich status <checkpoint.json>

use clap::{Parser, Subcommand};
use mesh_enrich::vocab::{descriptor_table, filter_table, read_descriptors};
use mesh_enrich::{
    BatchResolver, CancellationToken, CheckpointStore, Config, JsonFileStore, Pass, Pipeline,
    Report, ReportOptions, RunSettings, Table, TitleFilter, WikidataResolver, WikipediaResolver,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mesh-enrich",
    version,
    about = "Resumable batched enrichment of MeSH vocabulary"
)]
struct Cli {
    /// YAML config file (default: <config dir>/mesh-enrich/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract descriptors from the MeSH XML release into CSV
    Parse {
        /// Descriptor XML file (descYYYY)
        xml: PathBuf,
        #[arg(short, long, default_value = "mesh_all.csv")]
        output: PathBuf,
    },
    /// Drop names unlikely to be article titles and assign topics
    Filter {
        /// CSV produced by `parse`
        csv: PathBuf,
        #[arg(short, long, default_value = "mesh_filtered.csv")]
        output: PathBuf,
    },
    /// Check which names have an encyclopedia article
    Wiki {
        csv: PathBuf,
        /// Checkpoint file (default: <checkpoint dir>/wikipedia_checkpoint.json)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        #[arg(long, default_value = "name")]
        key_column: String,
        /// Column to break missing counts down by (default: topic, if present)
        #[arg(long)]
        category_column: Option<String>,
        /// Re-check keys left ERROR by an earlier run, at the slower pace
        #[arg(long)]
        resweep: bool,
        #[arg(short, long, default_value = "mesh_wikipedia_analysis.csv")]
        output: PathBuf,
    },
    /// Look up knowledge-base entities linked to each descriptor id
    Wikidata {
        csv: PathBuf,
        /// Checkpoint file (default: <checkpoint dir>/wikidata_checkpoint.json)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        #[arg(long, default_value = "uid")]
        key_column: String,
        #[arg(short, long, default_value = "mesh_wikidata.csv")]
        output: PathBuf,
    },
    /// Print outcome counts of a checkpoint file
    Status {
        checkpoint: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the report summary only
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_parse(xml: &Path, output: &Path) -> i32 {
    let descriptors = match read_descriptors(xml) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = descriptor_table(&descriptors).write(output) {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!(
        "Parsed {} descriptors into {}",
        descriptors.len(),
        output.display()
    );
    0
}

fn cmd_filter(csv: &Path, output: &Path) -> i32 {
    let filter = match TitleFilter::new() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let result = Table::read(csv)
        .and_then(|table| filter_table(&table, &filter).map(|kept| (table.len(), kept)));
    let (total, kept) = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = kept.write(output) {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!(
        "Kept {}/{} records in {}",
        kept.len(),
        total,
        output.display()
    );
    0
}

/// What one enrichment command runs against.
struct Enrichment<'a> {
    resolver: &'a dyn BatchResolver,
    settings: RunSettings,
    input: &'a Path,
    checkpoint: PathBuf,
    report: ReportOptions,
    /// Category column to break the summary down by when the input has it
    /// and none was given
    default_category: Option<&'static str>,
    output: &'a Path,
}

fn cmd_enrich(mut job: Enrichment<'_>) -> i32 {
    let table = match Table::read(job.input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(column) = job.default_category {
        job.report = job.report.with_category_if_present(&table, column);
    }
    let keys = match table.keys(&job.report.key_column) {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let mut store = JsonFileStore::new(&job.checkpoint);
    let outcome = rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if on_interrupt.cancel_on_signal(tokio::signal::ctrl_c).await {
                eprintln!("Interrupted again; exiting without waiting for the current batch");
                std::process::exit(130);
            }
        });

        Pipeline::new(job.resolver, job.settings)
            .with_cancellation(cancel)
            .run(&keys, &mut store)
            .await
    });

    let summary = match outcome {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    info!(
        checkpoint = %job.checkpoint.display(),
        errored = summary.counts.error,
        "checkpoint saved"
    );
    if summary.interrupted {
        eprintln!("Interrupted; rerun the same command to resume.");
    }

    let report = match Report::build(&table, store.snapshot(), &job.report) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = report.write(job.output) {
        eprintln!("Error: {}", e);
        return 1;
    }
    print!("{}", report.summary());
    println!("\nWrote {}", job.output.display());
    if summary.interrupted {
        130
    } else {
        0
    }
}

fn cmd_status(path: &Path) -> i32 {
    let mut store = JsonFileStore::new(path);
    let counts = match store.load() {
        Ok(snapshot) => snapshot.counts(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("{:<10}  {:>8}", "OUTCOME", "KEYS");
    println!("{}", "-".repeat(20));
    println!("{:<10}  {:>8}", "EXISTS", counts.exists);
    println!("{:<10}  {:>8}", "MISSING", counts.missing);
    println!("{:<10}  {:>8}", "LINKED", counts.linked);
    println!("{:<10}  {:>8}", "UNLINKED", counts.unlinked);
    println!("{:<10}  {:>8}", "ERROR", counts.error);
    println!("{:<10}  {:>8}", "TOTAL", counts.total());
    0
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Parse { xml, output } => cmd_parse(&xml, &output),
        Commands::Filter { csv, output } => cmd_filter(&csv, &output),
        Commands::Wiki {
            csv,
            checkpoint,
            key_column,
            category_column,
            resweep,
            output,
        } => {
            let resolver = match WikipediaResolver::new(&config.wikipedia) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let pass = if resweep { Pass::Resweep } else { Pass::Initial };
            cmd_enrich(Enrichment {
                resolver: &resolver,
                settings: config.wikipedia.run_settings(pass),
                input: &csv,
                checkpoint: checkpoint.unwrap_or_else(|| config.checkpoint_path("wikipedia")),
                report: ReportOptions {
                    key_column,
                    category_column,
                    ..ReportOptions::existence()
                },
                default_category: Some("topic"),
                output: &output,
            })
        }
        Commands::Wikidata {
            csv,
            checkpoint,
            key_column,
            output,
        } => {
            let resolver = match WikidataResolver::new(&config.wikidata) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            cmd_enrich(Enrichment {
                resolver: &resolver,
                settings: config.wikidata.run_settings(Pass::Initial),
                input: &csv,
                checkpoint: checkpoint.unwrap_or_else(|| config.checkpoint_path("wikidata")),
                report: ReportOptions {
                    key_column,
                    ..ReportOptions::linked_id()
                },
                default_category: None,
                output: &output,
            })
        }
        Commands::Status { checkpoint } => cmd_status(&checkpoint),
    };
    std::process::exit(code);
}

//! Catalog Dedup CLI
//!
//! Batch entry point: reads a catalog file, deduplicates it, writes the audit
//! report and overwrites the catalog. Safe to re-run on the same input.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catalog_core::deduplication::bucket_sizes;
use catalog_core::io::timestamp_now;
use catalog_core::{dedupe_catalog, load_catalog, write_catalog, write_report, DedupConfig};

#[derive(Parser, Debug)]
#[command(name = "catalog-dedup", version, about = "Find and collapse duplicate catalog products")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deduplicate a catalog file in place and write an audit report
    Dedupe {
        /// Catalog JSON file ({generatedAt, count, products})
        catalog: PathBuf,

        /// Where to write the report
        #[arg(short, long)]
        report: PathBuf,

        /// TOML file overriding thresholds and weights
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the report but leave the catalog untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Print bucket sizes (buckets with two or more records)
    Keys {
        catalog: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<DedupConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config = DedupConfig::load(path)?;
            tracing::info!("Loaded config from {:?}", path);
            Ok(config)
        }
        None => Ok(DedupConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Dedupe {
            catalog,
            report,
            config,
            dry_run,
        } => {
            let config = load_config(config.as_deref())?;
            let loaded = load_catalog(&catalog)?;
            tracing::info!(
                records = loaded.records.len(),
                rejected = loaded.rejected.len(),
                "Loaded catalog from {:?}",
                catalog
            );

            let mut outcome = dedupe_catalog(&loaded.records, &config);
            outcome.report.record_rejected(&loaded.rejected);

            let run_at = timestamp_now();
            write_report(&report, &outcome.report, &run_at)?;
            tracing::info!("Wrote report to {:?}", report);

            if dry_run {
                tracing::info!("Dry run, catalog left unchanged");
            } else {
                write_catalog(
                    &catalog,
                    &loaded.envelope,
                    &outcome.catalog,
                    &loaded.rejected,
                    &run_at,
                )?;
                tracing::info!(
                    count = outcome.report.output_count,
                    "Wrote catalog to {:?}",
                    catalog
                );
            }
            Ok(())
        }
        Command::Keys { catalog, config } => {
            let config = load_config(config.as_deref())?;
            let loaded = load_catalog(&catalog)?;
            for (key, size) in bucket_sizes(&loaded.records, &config) {
                if size >= 2 {
                    println!("{size:>5}  {key}");
                }
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_dedupe() {
        let cli = Cli::try_parse_from([
            "catalog-dedup",
            "dedupe",
            "catalog.json",
            "--report",
            "report.json",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Dedupe {
                catalog,
                report,
                config,
                dry_run,
            } => {
                assert_eq!(catalog, PathBuf::from("catalog.json"));
                assert_eq!(report, PathBuf::from("report.json"));
                assert!(config.is_none());
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_report() {
        assert!(Cli::try_parse_from(["catalog-dedup", "dedupe", "catalog.json"]).is_err());
    }

    #[test]
    fn test_dedupe_run_rewrites_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        let report = dir.path().join("report.json");
        std::fs::write(
            &catalog,
            serde_json::json!({
                "generatedAt": "2024-01-01T00:00:00.000Z",
                "count": 3,
                "products": [
                    {"sourceId": 1, "name": "Vitamin D3 5000 IU", "brand": "NOW Foods",
                     "amount": "120 softgels", "potency": "5000 IU", "price": 15000},
                    {"sourceId": 2, "name": "NOW Foods D3 Vitamin 5000iu", "brand": "NOW Foods",
                     "amount": "120 softgels", "potency": "5000 IU", "price": 15000},
                    {"name": "no id"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        run(Cli {
            command: Command::Dedupe {
                catalog: catalog.clone(),
                report: report.clone(),
                config: None,
                dry_run: false,
            },
        })
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&catalog).unwrap()).unwrap();
        assert_eq!(written["count"], 2);
        assert_eq!(written["products"][0]["sourceId"], 1);
        assert_eq!(written["products"][1], serde_json::json!({"name": "no id"}));

        let written_report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(written_report["autoDeletedSourceIds"], serde_json::json!([2]));
        assert_eq!(written_report["inputCount"], 3);
        assert_eq!(written_report["outputCount"], written["count"]);
        assert_eq!(written_report["rejectedCount"], 1);
        assert_eq!(written_report["rejectedRecords"][0]["index"], 2);
        assert!(written_report["runAt"].is_string());
    }
}

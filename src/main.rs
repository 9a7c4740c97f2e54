use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sales_insights::{
    compute_reasons, generate_suggestions, load_dataset_file, report, select_low_performers,
    serve, Dataset, ServerConfig, Thresholds,
};

#[derive(Parser)]
#[command(name = "sales-insights")]
#[command(about = "Customer sales insights: low performers, suggestions and reasons", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    thresholds: ThresholdArgs,
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SALES_INSIGHTS_LOG_JSON")]
    log_json: bool,
}

#[derive(Args)]
struct ThresholdArgs {
    #[arg(long, global = true, env = "SALES_INSIGHTS_MIN_INTERACTIONS", default_value_t = 10)]
    min_interactions: u64,
    #[arg(long, global = true, env = "SALES_INSIGHTS_MIN_AVERAGE_DISCOUNT", default_value_t = 20.0)]
    min_average_discount: f64,
    #[arg(long, global = true, env = "SALES_INSIGHTS_MIN_TOTAL_CONTACTS", default_value_t = 10)]
    min_total_contacts: u64,
    #[arg(long, global = true, env = "SALES_INSIGHTS_HIGH_PERFORMER_FRACTION", default_value_t = 0.25)]
    high_performer_fraction: f64,
}

impl From<&ThresholdArgs> for Thresholds {
    fn from(args: &ThresholdArgs) -> Self {
        Thresholds {
            min_interactions: args.min_interactions,
            min_average_discount: args.min_average_discount,
            min_total_contacts: args.min_total_contacts,
            high_performer_fraction: args.high_performer_fraction,
        }
    }
}

#[derive(Args)]
struct DatasetArgs {
    #[arg(long)]
    csv: PathBuf,
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    count: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        #[arg(long, env = "SALES_INSIGHTS_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        #[arg(long, env = "SALES_INSIGHTS_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
        max_upload_bytes: usize,
    },
    /// Print the lowest-performing customers of a CSV file as JSON
    LowPerformers {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Print improvement suggestions for the lowest performers as JSON
    Suggestions {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Print reasons for low business as JSON
    Reasons {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).init();
    }
}

fn load(path: &Path) -> anyhow::Result<Dataset> {
    let dataset = load_dataset_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    info!(rows = dataset.len(), path = %path.display(), "dataset loaded");
    Ok(dataset)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let thresholds = Thresholds::from(&cli.thresholds);
    thresholds
        .validate()
        .context("invalid threshold configuration")?;

    match cli.command {
        Commands::Serve {
            bind,
            max_upload_bytes,
        } => {
            serve(ServerConfig {
                bind,
                max_upload_bytes,
                thresholds,
            })
            .await?;
        }
        Commands::LowPerformers { dataset } => {
            let data = load(&dataset.csv)?;
            let low = select_low_performers(&data.records, dataset.count as usize);
            print_json(&low)?;
        }
        Commands::Suggestions { dataset } => {
            let data = load(&dataset.csv)?;
            let low = select_low_performers(&data.records, dataset.count as usize);
            print_json(&generate_suggestions(&data.records, &low, &thresholds))?;
        }
        Commands::Reasons { dataset } => {
            let data = load(&dataset.csv)?;
            let low = select_low_performers(&data.records, dataset.count as usize);
            print_json(&compute_reasons(&low, &thresholds))?;
        }
        Commands::Report { dataset, out } => {
            let data = load(&dataset.csv)?;
            let report = report::build_report(&data, dataset.count as usize, &thresholds);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_must_be_at_least_one() {
        let parsed = Cli::try_parse_from(["sales-insights", "reasons", "--csv", "x", "--count", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn count_defaults_to_two() {
        let cli = Cli::try_parse_from(["sales-insights", "low-performers", "--csv", "sales.csv"])
            .unwrap();
        match cli.command {
            Commands::LowPerformers { dataset } => {
                assert_eq!(dataset.count, 2);
                assert_eq!(dataset.csv, PathBuf::from("sales.csv"));
            }
            _ => panic!("expected low-performers"),
        }
    }

    #[test]
    fn threshold_flags_apply_to_subcommands() {
        let cli = Cli::try_parse_from([
            "sales-insights",
            "report",
            "--csv",
            "sales.csv",
            "--count",
            "3",
            "--min-interactions",
            "4",
            "--high-performer-fraction",
            "0.5",
        ])
        .unwrap();
        let thresholds = Thresholds::from(&cli.thresholds);
        assert_eq!(thresholds.min_interactions, 4);
        assert_eq!(thresholds.high_performer_fraction, 0.5);
        assert_eq!(thresholds.min_total_contacts, 10);
        match cli.command {
            Commands::Report { dataset, out } => {
                assert_eq!(dataset.count, 3);
                assert_eq!(out, PathBuf::from("report.md"));
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn serve_parses_bind_address() {
        let cli = Cli::try_parse_from(["sales-insights", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve { bind, .. } => assert_eq!(bind.port(), 9000),
            _ => panic!("expected serve"),
        }
    }
}

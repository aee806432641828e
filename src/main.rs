//! Retail Insights - retail orders aggregation & report views
//!
//! Usage:
//!   retail-insights report                      - Print every view
//!   retail-insights report --view shipping      - Print one view
//!   retail-insights --csv orders.csv schema     - Show which columns a source provides
//!   retail-insights watch --interval 30         - Re-render through the snapshot cache

use anyhow::Context;
use clap::{Parser, Subcommand};
use retail_insights::config::{load_config, Config, SourceConfig};
use retail_insights::data::{
    DataLoader, Field, OrderSnapshot, ParseOptions, SnapshotCache, SnapshotSource,
};
use retail_insights::report::{Dashboard, Formatter, TextRenderer, ViewBuilder, ViewKind};
use std::fs::File;
use std::io::{BufWriter, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "retail-insights")]
#[command(about = "Retail orders aggregation & report views", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./retail-insights.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read orders from this CSV file instead of the configured source
    #[arg(long, global = true, conflicts_with = "inline")]
    csv: Option<PathBuf>,

    /// Use the built-in sample orders
    #[arg(long, global = true)]
    inline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and print the report views
    Report {
        /// Views to include (comma-separated); all when omitted
        #[arg(long, value_enum, value_delimiter = ',')]
        view: Vec<ViewKind>,
        /// Also write the dashboard as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Load the source and show which columns it provides
    Schema,
    /// Re-render on a fixed interval, reusing the cached snapshot until it expires
    Watch {
        /// Seconds between render passes
        #[arg(long, default_value_t = 30)]
        interval: u64,
        /// Stop after this many passes
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        passes: Option<u64>,
        /// Views to include (comma-separated); all when omitted
        #[arg(long, value_enum, value_delimiter = ',')]
        view: Vec<ViewKind>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,retail_insights=debug")
    } else {
        EnvFilter::new("warn,retail_insights=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = cli.csv {
        config.source = SourceConfig::Csv { path };
    } else if cli.inline {
        config.source = SourceConfig::Inline;
    }

    match cli.command {
        Commands::Report {
            view,
            json,
            no_color,
        } => cmd_report(&config, &view, json.as_deref(), no_color)?,
        Commands::Schema => cmd_schema(&config)?,
        Commands::Watch {
            interval,
            passes,
            view,
            no_color,
        } => cmd_watch(&config, interval, passes, &view, no_color)?,
    }

    Ok(())
}

fn loader_for(config: &Config) -> DataLoader {
    let options = ParseOptions {
        date_format: config.parse.date_format.clone(),
    };
    DataLoader::new(config.source.clone(), options)
}

fn use_color(config: &Config, no_color: bool) -> bool {
    config.display.color && !no_color && std::io::stdout().is_terminal()
}

fn build_dashboard(config: &Config, snapshot: &OrderSnapshot, views: &[ViewKind]) -> Dashboard {
    let formatter = Formatter::new(&config.display.currency_prefix);
    let mut builder = ViewBuilder::new(snapshot, &formatter);
    if let Some(recommendations) = &config.report.recommendations {
        builder = builder.with_recommendations(recommendations.clone());
    }
    builder.build(views)
}

fn render(config: &Config, dashboard: &Dashboard, color: bool) -> String {
    let formatter = Formatter::new(&config.display.currency_prefix);
    TextRenderer::new(&formatter, color).render(dashboard)
}

fn cmd_report(
    config: &Config,
    views: &[ViewKind],
    json: Option<&Path>,
    no_color: bool,
) -> anyhow::Result<()> {
    let loader = loader_for(config);
    let snapshot = loader
        .load()
        .with_context(|| format!("Failed to load orders from {}", loader.describe()))?;

    let dashboard = build_dashboard(config, &snapshot, views);
    println!("{}", render(config, &dashboard, use_color(config, no_color)));

    if let Some(path) = json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        dashboard.write_json(BufWriter::new(file))?;
        info!("Dashboard exported to {}", path.display());
    }

    Ok(())
}

fn cmd_schema(config: &Config) -> anyhow::Result<()> {
    let loader = loader_for(config);
    let snapshot = loader
        .load()
        .with_context(|| format!("Failed to load orders from {}", loader.describe()))?;

    println!("Source: {}", snapshot.source());
    println!(
        "Rows: {} ({} dropped for missing sales or profit)",
        snapshot.len(),
        snapshot.dropped_rows()
    );
    for field in Field::ALL {
        let status = if snapshot.capabilities().has(field) {
            "present"
        } else {
            "absent"
        };
        println!("  {:<14} {}", field.column_name(), status);
    }

    Ok(())
}

fn cmd_watch(
    config: &Config,
    interval: u64,
    passes: Option<u64>,
    views: &[ViewKind],
    no_color: bool,
) -> anyhow::Result<()> {
    let loader = loader_for(config);
    let label = loader.describe();
    let mut cache = SnapshotCache::new(loader, Duration::from_secs(config.cache.ttl_secs));
    let color = use_color(config, no_color);

    info!(
        source = %label,
        ttl_secs = cache.ttl().as_secs(),
        interval,
        "Watching source"
    );

    let mut pass = 0u64;
    loop {
        pass += 1;
        let snapshot = cache
            .get()
            .with_context(|| format!("Failed to load orders from {}", label))?;
        let dashboard = build_dashboard(config, &snapshot, views);
        println!("{}", render(config, &dashboard, color));

        if passes.is_some_and(|limit| pass >= limit) {
            break;
        }
        std::thread::sleep(Duration::from_secs(interval));
    }

    Ok(())
}

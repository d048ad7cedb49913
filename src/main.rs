/// Version injected at compile time via EC2_SUBNETS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("EC2_SUBNETS_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ec2_subnets::aws::{format_aws_error, Ec2Client};
use ec2_subnets::config::Config;
use ec2_subnets::resource::subnet::{self, Subnet};
use ec2_subnets::resource::{Delivery, QualFilter, QueryContext, QueryData, Row, RowSink, Table};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Query EC2 VPC subnets as table rows
#[derive(Parser, Debug)]
#[command(name = "ec2-subnets", version, about, long_about = None)]
struct Args {
    /// AWS profile to use
    #[arg(short, long)]
    profile: Option<String>,

    /// AWS region to query
    #[arg(short, long)]
    region: Option<String>,

    /// EC2 endpoint override (e.g. http://localhost:4566)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Column qualifier, `column=value`, `column<>value` or `column=(a,b)` (repeatable)
    #[arg(short = 'w', long = "where", value_name = "EXPR")]
    quals: Vec<String>,

    /// Maximum number of rows
    #[arg(short, long)]
    limit: Option<u64>,

    /// Columns to output (comma separated, default all)
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Persist profile, region and endpoint as defaults
    #[arg(long)]
    save_defaults: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON object per line
    Json,
    /// YAML documents separated by `---`
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ec2-subnets {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ec2-subnets").join("ec2-subnets.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ec2-subnets").join("ec2-subnets.log");
    }
    PathBuf::from("ec2-subnets.log")
}

/// Writes rows to stdout as they are streamed
struct OutputSink<W: Write> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> OutputSink<W> {
    fn write_row(&mut self, row: &Row) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, row)?;
                writeln!(self.out)?;
            }
            OutputFormat::Yaml => {
                let doc = serde_yaml::to_string(row)?;
                write!(self.out, "---\n{}", doc)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> RowSink for OutputSink<W> {
    fn send_row(&mut self, row: Row) -> Delivery {
        match self.write_row(&row) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                // Usually a closed pipe (`| head`)
                tracing::debug!("Output closed: {}", e);
                Delivery::Closed
            }
        }
    }
}

async fn run(args: Args, table: &Table<Subnet>) -> Result<()> {
    let mut config = Config::load();
    let profile = config.effective_profile(args.profile.as_deref());
    let region = config.effective_region(args.region.as_deref(), &profile);
    let endpoint_url = config.effective_endpoint(args.endpoint_url.as_deref());

    if args.save_defaults {
        config.profile = Some(profile.clone());
        config.region = Some(region.clone());
        config.endpoint_url = endpoint_url.clone();
        config.save().context("Failed to save defaults")?;
    }

    let quals = table.parse_quals(&args.quals)?;
    table.check_columns(&args.columns)?;

    tracing::info!(
        "Querying {} in {} (profile {}, {} quals, limit {:?})",
        table.def.name,
        region,
        profile,
        quals.len(),
        args.limit
    );

    let client = Ec2Client::connect(&profile, &region, endpoint_url).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling query");
            on_interrupt.cancel();
        }
    });

    let stdout = io::stdout();
    let mut sink = OutputSink {
        format: args.output,
        out: io::BufWriter::new(stdout.lock()),
    };

    // Pushed-down filters are advisory; every qualifier is re-checked here
    let mut filter = QualFilter::new(quals.clone(), args.columns, &mut sink);
    let context = QueryContext {
        columns: filter.fetch_columns(),
        limit: args.limit,
    };
    let mut d =
        QueryData::new(table, quals, context, &region, &mut filter).with_cancellation(cancel);
    let result = subnet::execute(&client, &mut d).await;
    let streamed = d.rows_streamed();
    drop(d);
    drop(filter);

    // Rows already written stay written, even when the query failed later
    let _ = sink.out.flush();
    tracing::info!("Streamed {} rows", streamed);
    result
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let table = subnet::subnet_table().context("Invalid table definition")?;

    match run(args, &table).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!("Query failed: {:#}", err);
            eprintln!("Error: {}", format_aws_error(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

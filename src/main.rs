use anyhow::{Context, Result};
use chartsmith::config::ChartConfiguration;
use chartsmith::data::{discover_fields, RowSet};
use chartsmith::{runtime, OutputFormat, RenderOptions};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "chartsmith")]
#[command(about = "Turn tabular rows and a saved chart configuration into a chart", long_about = None)]
struct Args {
    /// Chart configuration exported by the chart builder
    #[arg(long, required_unless_present = "fields")]
    config: Option<PathBuf>,

    /// Data file (JSON array, API response with `items`, or CSV); stdin if omitted
    #[arg(long)]
    data: Option<PathBuf>,

    /// Read the data as CSV instead of JSON
    #[arg(long)]
    csv: bool,

    #[arg(long, value_enum, default_value_t = Output::Json)]
    output: Output,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// List the fields found in the data with their inferred types
    #[arg(long)]
    fields: bool,
}

fn read_rows(args: &Args) -> Result<RowSet> {
    let reader: Box<dyn Read> = match &args.data {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Failed to open data file '{}'", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    if args.csv {
        RowSet::from_csv(reader).context("Failed to read CSV data")
    } else {
        let text = io::read_to_string(reader).context("Failed to read JSON data")?;
        RowSet::from_json_str(&text)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_span_events(FmtSpan::CLOSE))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let rows = read_rows(&args)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.fields {
        let fields = discover_fields(&rows);
        let text = serde_json::to_string_pretty(&fields).context("Failed to serialize fields")?;
        writeln!(handle, "{}", text).context("Failed to write to stdout")?;
        return Ok(());
    }

    let config_path = args
        .config
        .as_deref()
        .context("--config is required unless --fields is given")?;
    let config = ChartConfiguration::load(config_path)?;

    let format = match args.output {
        Output::Json => {
            let output = runtime::build(&config, &rows);
            let text = serde_json::to_string_pretty(&output).context("Failed to serialize chart")?;
            writeln!(handle, "{}", text).context("Failed to write to stdout")?;
            return Ok(());
        }
        Output::Png => OutputFormat::Png,
        Output::Svg => OutputFormat::Svg,
    };

    let options = RenderOptions {
        width: args.width,
        height: args.height,
        format,
    };
    let bytes = runtime::render_plot(&config, &rows, &options).context("Failed to render plot")?;

    handle.write_all(&bytes).context("Failed to write image to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

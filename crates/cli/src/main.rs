//! `reten` — consolidate NFe/NFSe tax withholdings into a CSV report.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use reten_core::{DecimalStyle, OutputConfig};
use reten_extract::{csv_bytes, process_uploads, Upload};

#[derive(Parser)]
#[command(name = "reten")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// XML documents or ZIP archives of XML documents
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decimal separator for amount columns
    #[arg(long, value_enum, default_value = "comma")]
    decimal: DecimalArg,

    /// CSV field delimiter
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Emit rows and errors as JSON instead of CSV
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum DecimalArg {
    /// PT-BR style: 1234,56
    Comma,
    /// US style: 1234.56
    Dot,
}

impl From<DecimalArg> for DecimalStyle {
    fn from(arg: DecimalArg) -> Self {
        match arg {
            DecimalArg::Comma => DecimalStyle::Comma,
            DecimalArg::Dot => DecimalStyle::Dot,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    anyhow::ensure!(
        cli.delimiter.is_ascii(),
        "delimiter must be a single ASCII character"
    );
    let config = OutputConfig {
        decimal_style: cli.decimal.into(),
        delimiter: cli.delimiter as u8,
    };

    let mut uploads = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        uploads.push(Upload::new(name, data));
    }

    let outcome = process_uploads(&uploads, &config);
    for error in &outcome.errors {
        warn!("{error}");
    }

    let report = if cli.json {
        serde_json::to_vec_pretty(&outcome)?
    } else {
        csv_bytes(&outcome.rows, &config)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &report).with_context(|| format!("writing {}", path.display()))?
        }
        None => std::io::stdout().write_all(&report)?,
    }

    eprintln!(
        "{} row(s), {} error(s)",
        outcome.rows.len(),
        outcome.errors.len()
    );
    if outcome.is_total_failure() {
        anyhow::bail!("no valid documents found");
    }
    Ok(())
}

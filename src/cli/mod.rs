use std::fs::File;
use std::io::{stdout, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::{AggregateOptions, AggregationStats, ReportService};
use crate::domain::{format_euro, OutputRow};
use crate::io::{render_totals, TOTALS_FILENAME};
use crate::server::config::{DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT};
use crate::server::{self, Environment, ServerConfig};

/// Omzet - ledger workbook totals
#[derive(Parser)]
#[command(name = "omzet")]
#[command(about = "Totals portfolio ledger balances per owner from an Excel workbook")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP upload service
    Serve(ServeArgs),

    /// Compute per-name totals for a workbook on disk
    Totals {
        /// Input workbook (xlsx, xlsm, xlsb, xls or ods)
        input: PathBuf,

        /// Output file (xlsx defaults to user_totals.xlsx, other formats to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = TotalsFormat::Xlsx)]
        format: TotalsFormat,

        /// Fail when ledger rows reference portfolios missing from the mapping sheet
        #[arg(long)]
        strict_mapping: bool,
    },

    /// Print the poule sheets of a workbook as JSON
    Poules {
        /// Input workbook (xlsx, xlsm, xlsb, xls or ods)
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Client IP allowed to upload; repeat the flag or comma-separate ALLOWED_IPS
    #[arg(long = "allowed-ip", env = "ALLOWED_IPS", value_delimiter = ',')]
    pub allowed_ips: Vec<IpAddr>,

    /// Deployment environment; development disables the IP allow-list
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// Use the first X-Forwarded-For address as the client address
    #[arg(long, env = "TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Largest accepted upload, in MiB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Reject uploads whose ledger references portfolios missing from the mapping sheet
    #[arg(long, env = "STRICT_MAPPING")]
    pub strict_mapping: bool,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            environment: self.environment,
            allowed_ips: self.allowed_ips,
            trust_forwarded_for: self.trust_forwarded_for,
            max_upload_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
            aggregate: AggregateOptions {
                strict_mapping: self.strict_mapping,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TotalsFormat {
    Xlsx,
    Table,
    Csv,
    Json,
}

impl Cli {
    /// Install the global tracing subscriber. `RUST_LOG` overrides the default
    /// level picked from `--verbose`.
    pub fn init_logging(&self) {
        let level = if self.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,omzet={}", level)));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => server::serve(args.into_config()).await?,

            Commands::Totals {
                input,
                output,
                format,
                strict_mapping,
            } => {
                let service = ReportService::new(AggregateOptions { strict_mapping });
                run_totals(&service, &input, output.as_deref(), format)?;
            }

            Commands::Poules { input, output } => {
                run_poules(&ReportService::default(), &input, output.as_deref())?;
            }
        }
        Ok(())
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read workbook: {}", path.display()))
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };
    Ok(writer)
}

pub fn run_totals(
    service: &ReportService,
    input: &Path,
    output: Option<&Path>,
    format: TotalsFormat,
) -> Result<()> {
    let upload = read_input(input)?;
    let (rows, stats) = service.totals_rows(&upload)?;

    match format {
        TotalsFormat::Xlsx => {
            let path = output.unwrap_or_else(|| Path::new(TOTALS_FILENAME));
            let bytes = render_totals(&rows)?;
            std::fs::write(path, bytes)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Wrote {} totals to {}", rows.len(), path.display());
        }
        TotalsFormat::Table => write_table(open_output(output)?, &rows)?,
        TotalsFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(open_output(output)?);
            for row in &rows {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush()?;
        }
        TotalsFormat::Json => {
            let mut writer = open_output(output)?;
            writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
    }

    print_skipped(&stats);
    Ok(())
}

fn write_table(mut writer: Box<dyn Write>, rows: &[OutputRow]) -> Result<()> {
    if rows.is_empty() {
        writeln!(writer, "No totals found.")?;
        return Ok(());
    }

    writeln!(writer, "{:<32} {:>16}", "NAAM", "OMZET")?;
    writeln!(writer, "{}", "-".repeat(49))?;
    for row in rows {
        writeln!(writer, "{:<32} {:>16}", row.naam, format_euro(row.omzet))?;
    }
    writeln!(writer, "{}", "-".repeat(49))?;
    let total: f64 = rows.iter().map(|row| row.omzet).sum();
    writeln!(writer, "{:<32} {:>16}", "TOTAL", format_euro(total))?;
    writer.flush()?;
    Ok(())
}

fn print_skipped(stats: &AggregationStats) {
    if stats.unmapped_rows == 0 {
        return;
    }
    eprintln!(
        "Skipped {} ledger row(s) for {} portfolio(s) without a mapping entry:",
        stats.unmapped_rows,
        stats.unmapped_portfolios.len()
    );
    for email in stats.unmapped_portfolios.iter().take(10) {
        eprintln!("  {}", email);
    }
    if stats.unmapped_portfolios.len() > 10 {
        eprintln!("  ... and {} more", stats.unmapped_portfolios.len() - 10);
    }
}

pub fn run_poules(service: &ReportService, input: &Path, output: Option<&Path>) -> Result<()> {
    let upload = read_input(input)?;
    let poules = service.poules(&upload)?;

    let mut writer = open_output(output)?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&poules)?)?;
    writer.flush()?;
    Ok(())
}

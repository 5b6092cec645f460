use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use clap::Parser;
use incident_report::{IncidentRecord, ReportConfig, ReportError};

/// Renders an incident report ("Laporan Kejadian dan Gangguan") to PDF.
///
/// The report fonts (`msyh.ttf` and `SimHei.ttf`) are looked up in
/// `--fonts-dir`, then `INCIDENT_REPORT_FONTS_DIR`, then
/// `/usr/share/fonts/truetype/chinese`.
#[derive(Parser)]
#[command(author, version, about = "Generate the incident report PDF")]
struct Cli {
    /// JSON object with the incident fields. Defaults to the built-in sample.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file. Defaults to `Laporan_Kejadian_<timestamp>.pdf`.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory holding the report fonts.
    #[arg(long, value_name = "DIR")]
    fonts_dir: Option<PathBuf>,

    /// Image printed above the title.
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// Directory that photo URLs such as `/uploads/a.jpg` are resolved against.
    #[arg(long, value_name = "DIR", default_value = incident_report::config::DEFAULT_PHOTOS_DIR)]
    photos_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(path) => println!("PDF_CREATED:{}", path.display()),
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf, ReportError> {
    let record = match &cli.input {
        Some(path) => IncidentRecord::from_path(path)?,
        None => IncidentRecord::sample()?,
    };

    let (file_time, report_time) = run_times(Local::now());
    let config = match cli.output {
        Some(path) => ReportConfig::new(path),
        None => ReportConfig::with_default_output(file_time),
    }
    .with_fonts_dir(cli.fonts_dir)
    .with_logo(cli.logo)
    .with_photos_dir(cli.photos_dir);

    incident_report::generate(&record, &config, report_time)
}

/// The output name (UTC) and the report stamp (local wall clock) of one instant.
fn run_times(now: DateTime<Local>) -> (DateTime<Utc>, NaiveDateTime) {
    (now.with_timezone(&Utc), now.naive_local())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use large_image_finder::{
    config,
    models::{ExportFormat, ScanConfig, BYTES_PER_MB},
    scanner::Scanner,
    utils,
    writer::Exporter,
    ScanResult,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "large-image-finder")]
#[command(author, version, about = "Find oversized images and export them to a spreadsheet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory for images above the size threshold
    Scan {
        /// Directory to search (prompted for when omitted)
        path: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory receiving the spreadsheet
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Prefix prepended to every server path
        #[arg(short, long)]
        base_url: Option<String>,

        /// Size threshold in MB; only larger images are reported
        #[arg(short, long)]
        threshold_mb: Option<f64>,

        /// Comma-separated image extensions (e.g. jpg,png,webp)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Spreadsheet format
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Maximum depth to scan (unlimited if not specified)
        #[arg(short, long)]
        max_depth: Option<usize>,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Scan {
            path,
            config,
            output_dir,
            base_url,
            threshold_mb,
            extensions,
            format,
            follow_symlinks,
            max_depth,
            no_progress,
        } => {
            let mut scan_config = match config {
                Some(config_path) => config::load_config(&config_path)
                    .with_context(|| format!("Failed to load config {}", config_path.display()))?,
                None => ScanConfig::default(),
            };

            if let Some(dir) = output_dir {
                scan_config.output_dir = dir;
            }
            if let Some(url) = base_url {
                scan_config.base_url = url;
            }
            if let Some(mb) = threshold_mb {
                anyhow::ensure!(mb >= 0.0, "Threshold must not be negative");
                scan_config.size_threshold_bytes = (mb * BYTES_PER_MB as f64) as u64;
            }
            if let Some(exts) = extensions {
                scan_config.extensions = exts;
            }
            if let Some(format) = format {
                scan_config.format = format;
            }
            if follow_symlinks {
                scan_config.follow_symlinks = true;
            }
            if max_depth.is_some() {
                scan_config.max_depth = max_depth;
            }
            scan_config.show_progress = !no_progress;

            let scan_config = config::normalize(scan_config).context("Invalid configuration")?;

            let path = match path {
                Some(path) => path,
                None => prompt_for_directory()?,
            };

            run_scan(path, scan_config)?;
        }
        Commands::Version => {
            println!("large-image-finder v{}", env!("CARGO_PKG_VERSION"));
            println!("Find oversized images and export them to a spreadsheet");
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

fn prompt_for_directory() -> Result<PathBuf> {
    print!("Directory to search for images: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read directory from stdin")?;

    Ok(PathBuf::from(line.trim()))
}

fn run_scan(path: PathBuf, scan_config: ScanConfig) -> Result<()> {
    info!("Large Image Finder v{}", env!("CARGO_PKG_VERSION"));

    utils::validate_path(&path).context("Invalid input path")?;

    let threshold_mb = scan_config.threshold_mb();
    let exporter = Exporter::new(scan_config.output_dir.clone(), scan_config.format);

    println!(
        "Searching '{}' for images larger than {:.1} MB...",
        path.display(),
        threshold_mb
    );
    println!();

    let scanner = Scanner::new(scan_config);
    let result = scanner.scan(&path).context("Scan failed")?;

    if result.is_empty() {
        println!("No images larger than {:.1} MB were found.", threshold_mb);
    } else {
        print_entries(&result, threshold_mb);

        let output = exporter
            .export(&result.entries)
            .context("Failed to export results")?;
        println!();
        println!("Results saved to '{}'", output.display());
    }

    print_summary(&result);

    Ok(())
}

fn print_entries(result: &ScanResult, threshold_mb: f64) {
    println!(
        "Images larger than {:.1} MB ({}):",
        threshold_mb,
        utils::format_number(result.entries.len() as u64)
    );
    for entry in &result.entries {
        println!("{} - {:.1} MB - {}", entry.path, entry.size_mb, entry.server_url);
    }
}

fn print_summary(result: &ScanResult) {
    println!();
    for line in summary_lines(result) {
        println!("{}", line);
    }
}

fn summary_lines(result: &ScanResult) -> Vec<String> {
    let stats = &result.stats;
    let mut lines = vec![
        format!("Above threshold:     {}", utils::format_number(result.entries.len() as u64)),
        format!("Total image files:   {}", utils::format_number(result.total_image_count)),
    ];

    if !result.entries.is_empty() {
        lines.push(format!("Large image size:    {}", utils::format_bytes(stats.total_image_bytes)));
    }
    if stats.missing_paths > 0 {
        lines.push(format!("Missing paths:       {}", utils::format_number(stats.missing_paths)));
    }
    if stats.errors_encountered > 0 {
        lines.push(format!("Skipped (errors):    {}", utils::format_number(stats.errors_encountered)));
    }

    lines
}

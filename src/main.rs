//! # Server Image Optimizer - Main Entry Point
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging operativo con `tracing` (stderr)
//! - Costruzione della configurazione (file JSON opzionale + flag)
//! - Avvio del MediaOptimizer o dell'installer delle dipendenze
//!
//! ## Exit code:
//! - 0: run completata (anche con job falliti), `--help`, `--install-dependencies`
//! - 1: directory sorgente mancante, tool mancanti, flag sconosciuto
//!
//! ## Esempio di utilizzo:
//! ```bash
//! optimize-images --source /srv/www/uploads --backup /srv/backups --threads 8 --verbose
//! ```

use anyhow::Result;
use clap::{error::ErrorKind, Parser};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use server_image_optimizer::{installer, Config, MediaOptimizer, OptimizeError, PdfPreset};

#[derive(Parser)]
#[command(name = "optimize-images")]
#[command(version, about = "Optimize JPEG, PNG, TIFF, PDF and GIF files in place, with backups")]
struct Args {
    /// Directory to optimize
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Directory receiving a mirrored copy of every original
    #[arg(long, value_name = "DIR")]
    backup: Option<PathBuf>,

    /// Audit log file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Number of parallel workers [default: 4]
    #[arg(long, value_name = "NUM")]
    threads: Option<usize>,

    /// Report what would be optimized without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Only process the top level of the source directory
    #[arg(long)]
    no_recursive: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Install the external tools with the system package manager and exit
    #[arg(long)]
    install_dependencies: bool,

    /// Do not back up originals
    #[arg(long)]
    no_backup: bool,

    /// Skip the resize / bit depth / DPI passes
    #[arg(long)]
    no_aggressive: bool,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ghostscript preset for PDF files
    #[arg(long, value_enum)]
    pdf_preset: Option<PdfPresetArg>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PdfPresetArg {
    Ebook,
    Screen,
}

impl From<PdfPresetArg> for PdfPreset {
    fn from(arg: PdfPresetArg) -> Self {
        match arg {
            PdfPresetArg::Ebook => PdfPreset::Ebook,
            PdfPresetArg::Screen => PdfPreset::Screen,
        }
    }
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(ref source) = self.source {
            config.source_dir = source.clone();
        }
        if let Some(ref backup) = self.backup {
            config.backup_dir = Some(backup.clone());
        }
        if let Some(ref log) = self.log {
            config.log_file = log.clone();
        }
        if let Some(threads) = self.threads {
            config.workers = threads;
        }
        if let Some(preset) = self.pdf_preset {
            config.pdf_preset = preset.into();
        }
        config.dry_run |= self.dry_run;
        if self.no_recursive {
            config.recursive = false;
        }
        if self.no_backup {
            config.backup_enabled = false;
        }
        if self.no_aggressive {
            config.aggressive = false;
        }
    }
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.install_dependencies {
        return installer::install_dependencies().await;
    }

    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path).await?
        }
        None => Config::default(),
    };
    args.apply_to(&mut config);

    let optimizer = MediaOptimizer::new(config).await.inspect_err(|e| {
        if e.downcast_ref::<OptimizeError>().is_some_and(OptimizeError::is_fatal) {
            error!("❌ Pre-flight check failed, no file was touched");
        }
    })?;
    let stats = optimizer.run().await?;
    eprintln!("{}", stats.format_summary());
    eprintln!("Audit log: {}", optimizer.audit_log_path().display());

    Ok(())
}

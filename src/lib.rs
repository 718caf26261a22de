//! # Server Image Optimizer Library
//!
//! Ottimizzazione batch in-place di immagini e documenti (JPEG, PNG, TIFF,
//! PDF, GIF) tramite tool esterni, con backup e log di audit.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test di integrazione
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione, default e validazione
//! - `error`: Tipi di errore custom
//! - `audit_log`: Log di audit con formato stabile, rotazione all'avvio
//! - `file_manager`: Discovery dei file candidati
//! - `backup`: Copia speculare degli originali prima di ogni modifica
//! - `safe_replace`: Sostituzione atomica solo se il risultato è più piccolo
//! - `strategies`: Una strategia per formato + pass aggressivi
//! - `toolchain` / `tool_resolver`: Risoluzione ed esecuzione dei tool esterni
//! - `optimizer`: Controller, worker pool e worker per singolo file
//! - `progress`: Progress bar e statistiche
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use server_image_optimizer::{Config, MediaOptimizer};
//!
//! let config = Config { source_dir: "/srv/www/uploads".into(), ..Default::default() };
//! let stats = MediaOptimizer::new(config).await?.run().await?;
//! println!("{}", stats.format_summary());
//! ```

pub mod audit_log;
pub mod backup;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod format;
pub mod installer;
pub mod optimizer;
pub mod outcome;
pub mod probe;
pub mod progress;
pub mod safe_replace;
pub mod strategies;
pub mod tool_resolver;
pub mod toolchain;
pub mod utils;

pub use audit_log::{AuditLog, LogEvent};
pub use config::{BackupFailurePolicy, Config, PdfPreset};
pub use error::OptimizeError;
pub use format::{FormatKind, Job};
pub use optimizer::MediaOptimizer;
pub use outcome::{OptimizationOutcome, OutcomeKind};
pub use progress::OptimizationStats;
pub use toolchain::{Tool, Toolchain};

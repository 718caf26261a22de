//! # Optimizer Module
//!
//! Separa le responsabilità in sottomoduli:
//! - `media_optimizer`: Controller (pre-flight, discovery, riepilogo)
//! - `worker_pool`: Dispatcher a concorrenza limitata
//! - `task_optimizer`: Worker per singoli file (gate + strategia)
//! - `progress_tracker`: Statistiche e progress bar condivise

pub mod media_optimizer;
pub mod progress_tracker;
pub mod task_optimizer;
pub mod worker_pool;

pub use media_optimizer::MediaOptimizer;
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::TaskOptimizer;
pub use worker_pool::WorkerPool;

//! # Worker Pool Module
//!
//! Pool a dimensione fissa: un producer (blocking, perché la discovery fa I/O
//! sincrono) riempie un canale limitato, `n` worker long-lived consumano un
//! job alla volta fino a esaurimento del canale.
//!
//! ## Garanzie:
//! - Ogni job è consegnato a esattamente un worker
//! - Al massimo `n` job in esecuzione contemporaneamente
//! - Nessun ordine tra job; nessun retry, nessuna cancellazione

use anyhow::Result;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::format::Job;

/// Bounded-concurrency dispatcher
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `handler` on every job and collect the results, in completion order per worker
    pub async fn run<I, H, Fut, T>(&self, jobs: I, handler: H) -> Result<Vec<T>>
    where
        I: Iterator<Item = Job> + Send + 'static,
        H: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>(self.workers * 2);

        let producer = tokio::task::spawn_blocking(move || {
            let mut sent = 0usize;
            for job in jobs {
                if tx.blocking_send(job).is_err() {
                    break;
                }
                sent += 1;
            }
            sent
        });

        let rx = Arc::new(Mutex::new(rx));
        let handler = Arc::new(handler);

        let workers: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let mut results = Vec::new();
                    loop {
                        let job = rx.lock().await.recv().await;
                        let Some(job) = job else { break };
                        debug!("worker {} picked {}", worker_id, job.path.display());
                        results.push(handler(job).await);
                    }
                    results
                })
            })
            .collect();

        let mut results = Vec::new();
        for worker in join_all(workers).await {
            results.extend(worker?);
        }

        let sent = producer.await?;
        debug!("{} jobs dispatched to {} workers", sent, self.workers);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatKind;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn jobs(count: usize) -> impl Iterator<Item = Job> + Send + 'static {
        (0..count).map(|i| Job::new(PathBuf::from(format!("/tmp/{}.jpg", i)), FormatKind::Jpeg))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_job_handled_exactly_once() {
        let results = WorkerPool::new(4)
            .run(jobs(100), |job| async move { job.path })
            .await
            .unwrap();

        assert_eq!(results.len(), 100);
        let unique: HashSet<_> = results.into_iter().collect();
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        WorkerPool::new(3)
            .run(jobs(30), move |_job| {
                let (running, peak) = (Arc::clone(&r), Arc::clone(&p));
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {}", peak);
        assert!(peak >= 2, "pool never ran jobs in parallel");
    }

    #[tokio::test]
    async fn test_empty_input_and_zero_workers() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.workers(), 1);
        let results = pool.run(jobs(0), |job| async move { job }).await.unwrap();
        assert!(results.is_empty());
    }
}

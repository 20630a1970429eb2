//! Enumeration worker pool
//!
//! A producer feeds candidates into a bounded channel; each worker owns one
//! session and pulls candidates off the shared receiver until the channel
//! drains or a stop is requested.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, error, info};

use super::report::ScanReport;
use super::retry::attempt_with_retry;
use crate::candidates::filter_candidates;
use crate::config::ScanConfig;
use crate::enumerate::TransactionDriver;
use crate::session::ScreenSession;

/// Try every candidate against `config.host` with `config.threads`
/// sessions built by `factory`
pub async fn run_enumeration<S, F>(
    config: &ScanConfig,
    candidates: Vec<String>,
    factory: F,
) -> ScanReport
where
    S: ScreenSession + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    let candidates = filter_candidates(candidates);
    let threads = config.threads.max(1);
    info!(
        "Enumerating {} transaction IDs on {}:{} with {} sessions",
        candidates.len(),
        config.host,
        config.port,
        threads
    );

    let report = Arc::new(Mutex::new(ScanReport::new(config.host.clone(), config.port)));
    let stop = Arc::new(AtomicBool::new(false));
    let config = Arc::new(config.clone());
    let factory = Arc::new(factory);

    let (tx, rx) = mpsc::channel::<String>(threads.saturating_mul(4).max(8));

    let producer_stop = stop.clone();
    let producer = tokio::spawn(async move {
        for candidate in candidates {
            if producer_stop.load(Ordering::Relaxed) {
                break;
            }
            if tx.send(candidate).await.is_err() {
                break;
            }
        }
    });

    let rx = Arc::new(AsyncMutex::new(rx));
    let mut workers = Vec::with_capacity(threads);

    for worker_id in 0..threads {
        let rx = rx.clone();
        let stop = stop.clone();
        let report = report.clone();
        let config = config.clone();
        let factory = factory.clone();

        workers.push(tokio::spawn(async move {
            let mut driver = TransactionDriver::new((*factory)(), &config);

            loop {
                let next = {
                    let mut guard = rx.lock().await;
                    guard.recv().await
                };
                let Some(candidate) = next else {
                    break;
                };
                if stop.load(Ordering::Relaxed) {
                    break;
                }

                let result = attempt_with_retry(&mut driver, &candidate, &config.retry).await;
                let found = result.is_ok();
                match &result {
                    Ok(finding) => info!("Found {}", finding),
                    Err(e) => debug!("Worker {}: {}: {}", worker_id, candidate, e),
                }
                report.lock().record(&candidate, result);

                if found && config.stop_on_first {
                    info!("Stopping at first valid transaction");
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
            }

            driver.disconnect().await;
            debug!("Worker {} finished", worker_id);
        }));
    }

    for worker in workers {
        if let Err(e) = worker.await {
            error!("Enumeration worker failed: {}", e);
        }
    }
    // Workers are gone; unblock a producer still waiting on a full channel
    drop(rx);
    if let Err(e) = producer.await {
        error!("Candidate producer failed: {}", e);
    }

    let mut report = report.lock().clone();
    report.finish();
    info!(
        "Enumeration of {}:{} done: {} valid, {} rejected, {} errors",
        report.host,
        report.port,
        report.findings.len(),
        report.rejected,
        report.errors.len()
    );
    report
}

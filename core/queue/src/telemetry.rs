//! Telemetry related to pushing and popping jobs.
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;

/// Total number of pop requests.
pub static POP_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new("cloudqueue_pop_count", "Total number of pop requests"),
        &["queue"],
    )
    .expect("failed to initialise POP_COUNT counter")
});

/// Number of pop requests that found no job available.
pub static POP_EMPTY: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "cloudqueue_pop_empty",
            "Number of pop requests that found no job available",
        ),
        &["queue"],
    )
    .expect("failed to initialise POP_EMPTY counter")
});

/// Number of pop requests that resulted in error.
pub static POP_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "cloudqueue_pop_error",
            "Number of pop requests that resulted in error",
        ),
        &["queue"],
    )
    .expect("failed to initialise POP_ERR counter")
});

/// Total number of push requests.
pub static PUSH_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new("cloudqueue_push_count", "Total number of push requests"),
        &["queue"],
    )
    .expect("failed to initialise PUSH_COUNT counter")
});

/// Number of push requests that resulted in error.
pub static PUSH_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "cloudqueue_push_error",
            "Number of push requests that resulted in error",
        ),
        &["queue"],
    )
    .expect("failed to initialise PUSH_ERR counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the job queue metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(POP_COUNT.clone()),
        Box::new(POP_EMPTY.clone()),
        Box::new(POP_ERR.clone()),
        Box::new(PUSH_COUNT.clone()),
        Box::new(PUSH_ERR.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}

/// Await a fallible queue operation and increment `err_count` if it fails.
pub async fn count_on_err<F, T>(err_count: Counter, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let result = operation.await;
    if result.is_err() {
        err_count.inc();
    }
    result
}

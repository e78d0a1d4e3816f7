//! Telemetry related to the Cloud Queues backend.
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use opentelemetry_api::global::BoxedTracer;
use opentelemetry_api::trace::FutureExt;
use opentelemetry_api::trace::SpanKind;
use opentelemetry_api::trace::Status;
use opentelemetry_api::trace::TraceContextExt;
use opentelemetry_api::trace::Tracer;
use opentelemetry_api::trace::TracerProvider;
use opentelemetry_api::Context;
use prometheus::CounterVec;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::Opts;

/// Duration (in seconds) of Cloud Queues operations.
pub static OPS_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cloudqueue_cloud_ops_duration",
            "Duration (in seconds) of Cloud Queues operations",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["op"],
    )
    .expect("failed to initialise OPS_DURATION histogram")
});

/// Number of Cloud Queues operations that resulted in error.
pub static OPS_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "cloudqueue_cloud_ops_error",
            "Number of Cloud Queues operations that resulted in error",
        ),
        &["op"],
    )
    .expect("failed to initialise OPS_ERR counter")
});

/// Open Telemetry tracer for the Cloud Queues backend.
pub static TRACER: Lazy<BoxedTracer> = Lazy::new(|| {
    opentelemetry_api::global::tracer_provider().versioned_tracer(
        env!("CARGO_PKG_NAME"),
        Some(env!("CARGO_PKG_VERSION")),
        Option::<&str>::None,
        None,
    )
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the Cloud Queues backend metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 2] =
        [Box::new(OPS_DURATION.clone()), Box::new(OPS_ERR.clone())];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}

/// Cloud Queues operations observed with metrics and traces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    ClaimMessages,
    CreateMessage,
    CreateQueue,
    DeleteMessages,
    ReleaseClaim,
    Stats,
}

impl Op {
    /// Name of the operation used as metrics label and span name.
    pub fn name(self) -> &'static str {
        match self {
            Op::ClaimMessages => "message.claim",
            Op::CreateMessage => "message.create",
            Op::CreateQueue => "queue.create",
            Op::DeleteMessages => "message.delete",
            Op::ReleaseClaim => "message.release",
            Op::Stats => "queue.stats",
        }
    }
}

/// Run a Cloud Queues operation in a client span, timing it and counting failures.
///
/// Failed operations record the error on the span and set its status.
pub async fn observe<F, T>(op: Op, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let err_count = OPS_ERR.with_label_values(&[op.name()]);
    let timer = OPS_DURATION.with_label_values(&[op.name()]).start_timer();
    let trace = span_context(op);
    let result = operation.with_context(trace.clone()).await;
    timer.observe_duration();

    if let Err(error) = &result {
        err_count.inc();
        let span = trace.span();
        let cause: &(dyn std::error::Error + 'static) = error.as_ref();
        span.record_error(cause);
        span.set_status(Status::error(format!("{:#}", error)));
    }
    result
}

/// Initialise a new client span, child of the active span and context.
fn span_context(op: Op) -> Context {
    let mut builder = TRACER.span_builder(op.name());
    builder.span_kind = Some(SpanKind::Client);
    let parent = Context::current();
    let span = TRACER.build_with_context(builder, &parent);
    parent.with_span(span)
}

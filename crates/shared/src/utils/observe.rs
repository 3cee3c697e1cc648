use crate::utils::{Method, Metrics, Status, TracingContext};
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use std::{fmt, sync::Arc};
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

/// Span + request metrics for one service. Every operation calls
/// [`ServiceObserver::start`] and finishes with exactly one of
/// [`ServiceObserver::success`] or [`ServiceObserver::failure`].
#[derive(Clone)]
pub struct ServiceObserver {
    tracer_name: &'static str,
    metrics: Metrics,
}

impl ServiceObserver {
    pub async fn new(name: &'static str, registry: &Arc<Mutex<Registry>>) -> Self {
        let metrics = Metrics::new();
        metrics.register(&mut *registry.lock().await, &name.replace('-', "_"));

        Self {
            tracer_name: name,
            metrics,
        }
    }

    fn tracer(&self) -> BoxedTracer {
        global::tracer(self.tracer_name)
    }

    pub fn start(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Server)
            .with_attributes(attributes)
            .start(&tracer);

        info!("Starting operation: {operation_name}");

        span.add_event(
            "Operation started",
            vec![KeyValue::new("operation", operation_name.to_string())],
        );

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    pub fn success(&self, tracing_ctx: &TracingContext, method: Method, message: &str) {
        self.complete(tracing_ctx, method, true, message);
    }

    pub fn failure(&self, tracing_ctx: &TracingContext, method: Method, message: &str) {
        self.complete(tracing_ctx, method, false, message);
    }

    /// Closes the span from the outcome of `result`.
    pub fn record<T, E: fmt::Display>(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        result: &Result<T, E>,
        success_message: &str,
    ) {
        match result {
            Ok(_) => self.success(tracing_ctx, method, success_message),
            Err(err) => self.failure(tracing_ctx, method, &err.to_string()),
        }
    }

    fn complete(&self, tracing_ctx: &TracingContext, method: Method, is_success: bool, message: &str) {
        let (status_str, status) = if is_success {
            ("SUCCESS", Status::Success)
        } else {
            ("ERROR", Status::Error)
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", status_str),
                KeyValue::new("duration_secs", elapsed.to_string()),
                KeyValue::new("message", message.to_string()),
            ],
        );

        if is_success {
            info!("✅ Operation completed successfully: {message}");
        } else {
            error!("❌ Operation failed: {message}");
        }

        self.metrics.record(method, status, elapsed);

        tracing_ctx.cx.span().end();
    }
}

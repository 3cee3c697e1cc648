mod logs;
mod metrics;
mod observe;
mod otel;
mod retry;
mod shutdown;
mod tracking_id;

pub use self::logs::init_logger;
pub use self::metrics::{Method, Metrics, Status, SystemMetrics, run_metrics_collector};
pub use self::observe::ServiceObserver;
pub use self::otel::{Telemetry, TracingContext};
pub use self::retry::{RetryPolicy, with_retry};
pub use self::shutdown::shutdown_signal;
pub use self::tracking_id::{generate_tracking_id, to_base36};

//! Runtime orchestrator — drives asynchronous service resources to a terminal status.
//!
//! Submits create calls, polls describe calls with bounded retry and an
//! optional wait guard, streams progress, and honors external cancellation.

pub mod backoff;
pub mod cancel;
pub mod orchestrator;
pub mod progress;
pub mod types;

pub use backoff::RetryPolicy;
pub use cancel::CancelToken;
pub use orchestrator::Orchestrator;
pub use progress::{BufferSink, FnSink, NullSink, ProgressSink, StdoutSink};
pub use types::*;

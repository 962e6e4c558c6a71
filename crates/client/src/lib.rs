//! Client side of the agent gateway: HTTP access plus the simulated progress
//! shown while an agent runs.

pub mod client;
pub mod error;
pub mod progress;
pub mod session;

pub use client::GatewayClient;
pub use error::{ClientError, Result};
pub use progress::{ProgressConfig, ProgressPhase, ProgressSimulator, ProgressSnapshot};
pub use session::ExecutionSession;

pub mod boundary;
pub mod config;
pub mod error;
pub mod signal;
pub mod telemetry;

pub use boundary::{catch, Caught, Outcome, SignalBoundary, SignalHandler};
pub use config::{BoundaryConfig, LoggingConfig, PlanSignalConfig};
pub use error::{PlanError, Result};
pub use signal::{Disposition, Signal};
pub use telemetry::{init_logging, LogFormat};

use thiserror::Error;

/// Control-flow signals raised between plan steps and the supervising loop.
///
/// Neither variant carries a payload. A step raises at most one of them, and
/// the caller decides what to do with it by matching on the variant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Dependent services have not finished starting; wait and recheck.
    #[error("Services are still starting")]
    ServicesStarting,

    /// The current plan must be abandoned and shut down.
    #[error("Plan should be shut down")]
    ShutdownPlan,
}

/// What the supervising loop does after catching a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    WaitAndRecheck,
    ShutDown,
}

impl Signal {
    pub const ALL: [Signal; 2] = [Signal::ServicesStarting, Signal::ShutdownPlan];

    /// Map the signal to the orchestrator transition it calls for
    pub fn disposition(self) -> Disposition {
        match self {
            Signal::ServicesStarting => Disposition::WaitAndRecheck,
            Signal::ShutdownPlan => Disposition::ShutDown,
        }
    }

    /// Whether waiting can clear the condition
    pub fn is_recoverable(self) -> bool {
        matches!(self, Signal::ServicesStarting)
    }

    /// Stable identifier for structured logs
    pub fn name(self) -> &'static str {
        match self {
            Signal::ServicesStarting => "services_starting",
            Signal::ShutdownPlan => "shutdown_plan",
        }
    }
}

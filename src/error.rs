use crate::signal::Signal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Signal(#[from] Signal),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Handler error in {handler}: {message}")]
    Handler { handler: String, message: String },

    /// A handler failed while reacting to a signal; the signal is kept
    #[error("Failed to handle '{signal}': {source}")]
    Unhandled {
        signal: Signal,
        #[source]
        source: Box<PlanError>,
    },
}

impl PlanError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn handler<S: Into<String>>(handler: S, message: S) -> Self {
        Self::Handler {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Attach the signal being handled to a handler failure
    pub fn unhandled(signal: Signal, source: PlanError) -> Self {
        Self::Unhandled {
            signal,
            source: Box::new(source),
        }
    }

    /// The control-flow signal carried by this error, if any
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::Signal(signal) => Some(*signal),
            Self::Unhandled { signal, .. } => Some(*signal),
            _ => None,
        }
    }

    pub fn is_signal(&self) -> bool {
        self.signal().is_some()
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;

//! Supervisory catching boundary for plan signals.
//!
//! The boundary runs one operation, sorts its result into "completed",
//! "services starting" or "shutdown plan", and calls exactly one handler
//! method for a signal. It never retries: looping and backoff belong to
//! the caller.

use crate::config::BoundaryConfig;
use crate::error::{PlanError, Result};
use crate::signal::{Disposition, Signal};
use std::future::Future;
use tracing::{debug, info, warn};

/// Result of classifying an operation's outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Caught<T> {
    Completed(T),
    Signalled(Signal),
}

/// Result of running an operation through a [`SignalBoundary`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation finished without raising a signal
    Completed(T),
    /// Services are still starting; the caller should recheck later
    Waiting,
    /// The plan is being shut down
    ShuttingDown,
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Split signals out of a result; all other errors pass through untouched
pub fn catch<T>(result: Result<T>) -> Result<Caught<T>> {
    match result {
        Ok(value) => Ok(Caught::Completed(value)),
        Err(PlanError::Signal(signal)) => Ok(Caught::Signalled(signal)),
        Err(e) => Err(e),
    }
}

/// Reactions installed at a boundary
#[async_trait::async_trait]
pub trait SignalHandler: Send + Sync {
    /// Called when an operation reports that services are still starting
    async fn on_services_starting(&self) -> Result<()>;

    /// Called when an operation asks for the plan to be shut down
    async fn on_shutdown_plan(&self) -> Result<()>;

    /// Get the name of this handler for logging
    fn handler_name(&self) -> &str;
}

/// Catching boundary between plan steps and the supervising loop
#[derive(Debug, Clone)]
pub struct SignalBoundary {
    name: String,
    quiet_services_starting: bool,
}

impl SignalBoundary {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            quiet_services_starting: false,
        }
    }

    pub fn from_config(config: &BoundaryConfig) -> Self {
        Self {
            name: config.name.clone(),
            quiet_services_starting: config.quiet_services_starting,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Await `op` and dispatch any signal it raises to `handler`
    pub async fn run<H, F, T>(&self, handler: &H, op: F) -> Result<Outcome<T>>
    where
        H: SignalHandler + ?Sized,
        F: Future<Output = Result<T>>,
    {
        match catch(op.await)? {
            Caught::Completed(value) => Ok(Outcome::Completed(value)),
            Caught::Signalled(signal) => match self.dispatch(handler, signal).await? {
                Disposition::WaitAndRecheck => Ok(Outcome::Waiting),
                Disposition::ShutDown => Ok(Outcome::ShuttingDown),
            },
        }
    }

    /// Hand a caught signal to the matching handler method.
    ///
    /// A handler failure comes back as [`PlanError::Unhandled`], which still
    /// reports the signal through [`PlanError::signal`].
    pub async fn dispatch<H>(&self, handler: &H, signal: Signal) -> Result<Disposition>
    where
        H: SignalHandler + ?Sized,
    {
        match signal {
            Signal::ServicesStarting => {
                if self.quiet_services_starting {
                    debug!(
                        boundary = %self.name,
                        handler = handler.handler_name(),
                        signal = signal.name(),
                        "{}", signal
                    );
                } else {
                    info!(
                        boundary = %self.name,
                        handler = handler.handler_name(),
                        signal = signal.name(),
                        "{}", signal
                    );
                }
                handler
                    .on_services_starting()
                    .await
                    .map_err(|e| PlanError::unhandled(signal, e))?;
            }
            Signal::ShutdownPlan => {
                warn!(
                    boundary = %self.name,
                    handler = handler.handler_name(),
                    signal = signal.name(),
                    "{}", signal
                );
                handler
                    .on_shutdown_plan()
                    .await
                    .map_err(|e| PlanError::unhandled(signal, e))?;
            }
        }

        Ok(signal.disposition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records the level of every event it sees
    #[derive(Clone, Default)]
    struct LevelRecorder {
        levels: Arc<Mutex<Vec<Level>>>,
    }

    impl<S: Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.levels.lock().unwrap().push(*event.metadata().level());
        }
    }

    async fn dispatched_level(boundary: &SignalBoundary, signal: Signal) -> Vec<Level> {
        let recorder = LevelRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        boundary
            .dispatch(&CountingHandler::default(), signal)
            .await
            .unwrap();

        let levels = recorder.levels.lock().unwrap().clone();
        levels
    }

    #[derive(Default)]
    struct CountingHandler {
        starting: AtomicUsize,
        shutdown: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SignalHandler for CountingHandler {
        async fn on_services_starting(&self) -> Result<()> {
            self.starting.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_shutdown_plan(&self) -> Result<()> {
            self.shutdown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn handler_name(&self) -> &str {
            "counting"
        }
    }

    struct FailingHandler;

    #[async_trait::async_trait]
    impl SignalHandler for FailingHandler {
        async fn on_services_starting(&self) -> Result<()> {
            Ok(())
        }

        async fn on_shutdown_plan(&self) -> Result<()> {
            Err(PlanError::handler("failing", "teardown refused"))
        }

        fn handler_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_catch_classifies_results() {
        assert_eq!(catch(Ok(3)).unwrap(), Caught::Completed(3));
        assert_eq!(
            catch::<()>(Err(Signal::ShutdownPlan.into())).unwrap(),
            Caught::Signalled(Signal::ShutdownPlan)
        );
    }

    #[test]
    fn test_catch_passes_other_errors_through() {
        let err = catch::<()>(Err(PlanError::system("boom"))).unwrap_err();
        assert_eq!(err.to_string(), "System error: boom");
    }

    #[tokio::test]
    async fn test_services_starting_runs_only_starting_handler() {
        let boundary = SignalBoundary::new("test");
        let handler = CountingHandler::default();

        let outcome = boundary
            .run(&handler, async { Err::<(), PlanError>(Signal::ServicesStarting.into()) })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Waiting);
        assert_eq!(handler.starting.load(Ordering::SeqCst), 1);
        assert_eq!(handler.shutdown.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_plan_runs_only_shutdown_handler() {
        let boundary = SignalBoundary::new("test");
        let handler = CountingHandler::default();

        let outcome = boundary
            .run(&handler, async { Err::<(), PlanError>(Signal::ShutdownPlan.into()) })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::ShuttingDown);
        assert_eq!(handler.starting.load(Ordering::SeqCst), 0);
        assert_eq!(handler.shutdown.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completion_runs_no_handler() {
        let boundary = SignalBoundary::from_config(&BoundaryConfig::default());
        let handler = CountingHandler::default();

        let outcome = boundary.run(&handler, async { Ok::<_, PlanError>(42) }).await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.completed(), Some(42));
        assert_eq!(handler.starting.load(Ordering::SeqCst), 0);
        assert_eq!(handler.shutdown.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_signal_error_propagates() {
        let boundary = SignalBoundary::new("test");
        let handler = CountingHandler::default();

        let err = boundary
            .run(&handler, async {
                Err::<(), PlanError>(PlanError::system("services unreachable"))
            })
            .await
            .unwrap_err();

        assert!(!err.is_signal());
        assert_eq!(handler.starting.load(Ordering::SeqCst), 0);
        assert_eq!(handler.shutdown.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let boundary = SignalBoundary::new("test");

        let err = boundary
            .dispatch(&FailingHandler, Signal::ShutdownPlan)
            .await
            .unwrap_err();
        assert_eq!(err.signal(), Some(Signal::ShutdownPlan));
        match err {
            PlanError::Unhandled { signal, source } => {
                assert_eq!(signal, Signal::ShutdownPlan);
                assert!(matches!(*source, PlanError::Handler { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let disposition = boundary
            .dispatch(&FailingHandler, Signal::ServicesStarting)
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::WaitAndRecheck);
    }

    #[tokio::test]
    async fn test_failed_shutdown_handler_still_reports_shutdown() {
        let boundary = SignalBoundary::new("test");

        let err = boundary
            .run(&FailingHandler, async {
                Err::<(), PlanError>(Signal::ShutdownPlan.into())
            })
            .await
            .unwrap_err();

        assert_eq!(err.signal(), Some(Signal::ShutdownPlan));
        assert_eq!(
            err.signal().map(Signal::disposition),
            Some(Disposition::ShutDown)
        );
    }

    #[tokio::test]
    async fn test_log_levels_follow_quiet_setting() {
        let loud = SignalBoundary::from_config(&BoundaryConfig {
            name: "loud".to_string(),
            quiet_services_starting: false,
        });
        let quiet = SignalBoundary::from_config(&BoundaryConfig {
            name: "quiet".to_string(),
            quiet_services_starting: true,
        });

        assert_eq!(
            dispatched_level(&loud, Signal::ServicesStarting).await,
            vec![Level::INFO]
        );
        assert_eq!(
            dispatched_level(&quiet, Signal::ServicesStarting).await,
            vec![Level::DEBUG]
        );
        assert_eq!(
            dispatched_level(&quiet, Signal::ShutdownPlan).await,
            vec![Level::WARN]
        );
        assert_eq!(
            dispatched_level(&loud, Signal::ShutdownPlan).await,
            vec![Level::WARN]
        );
    }

    #[tokio::test]
    async fn test_dyn_handler() {
        let boundary = SignalBoundary::new("dyn");
        let handler: Box<dyn SignalHandler> = Box::new(CountingHandler::default());

        let outcome = boundary
            .run(handler.as_ref(), async { Err::<u8, PlanError>(Signal::ShutdownPlan.into()) })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::ShuttingDown);
    }
}

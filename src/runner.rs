// ABOUTME: Session lifecycle for one load-test run: validate, open, submit, drain, close
// ABOUTME: The session is always closed once the scheduler returns, whatever its outcome

use crate::client::{SmppConnection, SmppConnector};
use crate::config::SendConfig;
use crate::dispatcher::{Dispatcher, PduHandler};
use crate::error::LoadTestError;
use crate::scheduler::{RunStats, Scheduler};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Run a load test over a session opened by `connector`.
///
/// Configuration and connect failures return before anything is sent. Once
/// the session is open it is closed exactly once. A close failure is logged
/// and never replaces the scheduler's own result.
pub async fn run<C: SmppConnector>(
    connector: &C,
    send_config: SendConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<RunStats, LoadTestError> {
    run_with(connector, send_config, shutdown, Dispatcher::new()).await
}

/// Like [`run`], with a caller-supplied dispatcher (for extra observers)
pub async fn run_with<C: SmppConnector>(
    connector: &C,
    send_config: SendConfig,
    shutdown: watch::Receiver<bool>,
    dispatcher: Dispatcher,
) -> Result<RunStats, LoadTestError> {
    let scheduler = Scheduler::new(send_config)?.with_shutdown(shutdown);

    let dispatcher = Arc::new(dispatcher);
    let handler: Arc<dyn PduHandler> = dispatcher.clone();
    let mut session = connector
        .open(handler)
        .await
        .map_err(LoadTestError::Connect)?;
    info!("session open");

    let outcome = scheduler.run(&mut session).await;

    if let Err(e) = session.close().await {
        error!(error = %e, "close failed");
    }

    let inbound = dispatcher.counts();
    match &outcome {
        Ok(stats) => info!(
            sent = stats.sent,
            segments = stats.segments,
            elapsed = ?stats.elapsed,
            rate = format_args!("{:.2}", stats.rate()),
            %inbound,
            "load test finished"
        ),
        Err(e) => error!(error = %e, %inbound, "load test failed"),
    }

    outcome.map_err(LoadTestError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{SmppError, SmppResult, SmppTransmitter, SubmitError};
    use crate::codec::Frame;
    use crate::datatypes::{CommandStatus, EnquireLink, EnquireLinkResponse, SubmitSm};
    use crate::dispatcher::InboundEvent;
    use crate::scheduler::RunError;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Log {
        opened: usize,
        closed: usize,
        submitted: usize,
        replies: Vec<Option<Frame>>,
    }

    #[derive(Clone, Default)]
    struct FakeConnector {
        log: Arc<Mutex<Log>>,
        refuse: bool,
        fail_close: bool,
        /// 1-based submission that fails
        fail_on: Option<usize>,
    }

    struct FakeSession {
        log: Arc<Mutex<Log>>,
        fail_close: bool,
        fail_on: Option<usize>,
    }

    impl SmppConnector for FakeConnector {
        type Session = FakeSession;

        async fn open(&self, handler: Arc<dyn PduHandler>) -> SmppResult<FakeSession> {
            if self.refuse {
                return Err(SmppError::Protocol(CommandStatus::BindFailed));
            }
            let mut log = self.log.lock().unwrap();
            log.opened += 1;
            let link = InboundEvent::classify(Frame::EnquireLink(EnquireLink::new(7)));
            log.replies.push(handler.handle(&link).response);
            Ok(FakeSession {
                log: Arc::clone(&self.log),
                fail_close: self.fail_close,
                fail_on: self.fail_on,
            })
        }
    }

    impl SmppTransmitter for FakeSession {
        async fn submit(&mut self, _pdu: SubmitSm) -> Result<(), SubmitError> {
            let mut log = self.log.lock().unwrap();
            if self.fail_on == Some(log.submitted + 1) {
                return Err(SubmitError::SessionClosed);
            }
            log.submitted += 1;
            Ok(())
        }
    }

    impl SmppConnection for FakeSession {
        async fn close(self) -> SmppResult<()> {
            self.log.lock().unwrap().closed += 1;
            if self.fail_close {
                Err(SmppError::Timeout)
            } else {
                Ok(())
            }
        }

        fn is_bound(&self) -> bool {
            true
        }
    }

    fn send_config() -> SendConfig {
        SendConfig::builder()
            .rate(10)
            .max_count(5)
            .drain(Duration::ZERO)
            .build()
            .unwrap()
    }

    fn no_shutdown() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_closes_once() {
        let connector = FakeConnector::default();
        let stats = run(&connector, send_config(), no_shutdown()).await.unwrap();

        assert_eq!(stats.sent, 5);
        let log = connector.log.lock().unwrap();
        assert_eq!(log.opened, 1);
        assert_eq!(log.submitted, 5);
        assert_eq!(log.closed, 1);
        assert_eq!(
            log.replies,
            vec![Some(Frame::EnquireLinkResp(EnquireLinkResponse::new(7)))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_never_connects() {
        let connector = FakeConnector::default();
        let mut config = send_config();
        config.rate = 0;

        let err = run(&connector, config, no_shutdown()).await.unwrap_err();
        assert!(matches!(err, LoadTestError::Config(_)));
        assert!(err.is_startup());
        assert_eq!(connector.log.lock().unwrap().opened, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_sends_nothing() {
        let connector = FakeConnector {
            refuse: true,
            ..Default::default()
        };
        let err = run(&connector, send_config(), no_shutdown()).await.unwrap_err();
        assert!(matches!(
            err,
            LoadTestError::Connect(SmppError::Protocol(CommandStatus::BindFailed))
        ));
        let log = connector.log.lock().unwrap();
        assert_eq!(log.submitted, 0);
        assert_eq!(log.closed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_failure_still_closes() {
        let connector = FakeConnector {
            fail_on: Some(3),
            ..Default::default()
        };
        let err = run(&connector, send_config(), no_shutdown()).await.unwrap_err();
        assert!(matches!(
            err,
            LoadTestError::Run(RunError::Submit {
                index: 3,
                source: SubmitError::SessionClosed,
                ..
            })
        ));
        assert!(!err.is_startup());
        let log = connector.log.lock().unwrap();
        assert_eq!(log.submitted, 2);
        assert_eq!(log.closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_failure_does_not_hide_result() {
        let connector = FakeConnector {
            fail_close: true,
            ..Default::default()
        };
        let stats = run(&connector, send_config(), no_shutdown()).await.unwrap();
        assert_eq!(stats.sent, 5);

        let connector = FakeConnector {
            fail_close: true,
            fail_on: Some(1),
            ..Default::default()
        };
        let err = run(&connector, send_config(), no_shutdown()).await.unwrap_err();
        assert!(matches!(err, LoadTestError::Run(RunError::Submit { index: 1, .. })));
        assert_eq!(connector.log.lock().unwrap().closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_ends_run_and_closes() {
        let connector = FakeConnector::default();
        let (stop, shutdown) = watch::channel(false);
        let config = SendConfig::builder()
            .rate(10)
            .drain(Duration::ZERO)
            .build()
            .unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            stop.send_replace(true);
        });
        let stats = run(&connector, config, shutdown).await.unwrap();

        assert_eq!(stats.sent, 3);
        assert_eq!(connector.log.lock().unwrap().closed, 1);
    }
}

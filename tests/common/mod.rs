//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use troubleshooter::domain::models::{Config, PollingConfig};
use troubleshooter::domain::ports::{InvestigationBackend, Sleeper};
use troubleshooter::services::{InvestigationClient, OperationPoller};

/// Sleeper that records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Session client over `backend` that never waits on the wall clock.
#[allow(dead_code)]
pub fn instant_client<B: InvestigationBackend>(
    backend: Arc<B>,
    polling: PollingConfig,
) -> (InvestigationClient<B>, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let poller = OperationPoller::with_sleeper(polling, sleeper.clone()).with_jitter(|| 0.0);
    let client = InvestigationClient::with_poller(backend, poller, Config::default().page_size);
    (client, sleeper)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

//! Mock discovery backend for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::{Discovery, DiscoveryEvent};

/// Mock discovery backend.
///
/// Returns a `mpsc::Sender<DiscoveryEvent>` that tests use to inject events.
/// Each `start_discovery()` hands out a fresh receiver fed from that sender
/// until the next `stop_discovery()`, so the backend can be restarted.
pub struct MockDiscovery {
    feed_rx: Arc<Mutex<mpsc::Receiver<DiscoveryEvent>>>,
    pump: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
}

impl MockDiscovery {
    /// Create a new mock discovery and a sender for injecting events.
    pub fn new() -> (Self, mpsc::Sender<DiscoveryEvent>) {
        let (feed_tx, feed_rx) = mpsc::channel(64);
        let discovery = Self {
            feed_rx: Arc::new(Mutex::new(feed_rx)),
            pump: None,
            running: Arc::new(AtomicBool::new(false)),
            starts: Arc::new(AtomicUsize::new(0)),
        };
        (discovery, feed_tx)
    }

    /// Get a handle reporting whether discovery is running.
    pub fn handle(&self) -> MockDiscoveryHandle {
        MockDiscoveryHandle {
            running: Arc::clone(&self.running),
            starts: Arc::clone(&self.starts),
        }
    }
}

/// Clonable observer handle for `MockDiscovery`.
#[derive(Clone)]
pub struct MockDiscoveryHandle {
    running: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
}

impl MockDiscoveryHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// How many times `start_discovery` was called.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Discovery for MockDiscovery {
    async fn start_discovery(&mut self) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.pump.is_some() {
            return Err(DiscoveryError::AlreadyRunning);
        }

        let (tx, rx) = mpsc::channel(64);
        let feed = Arc::clone(&self.feed_rx);
        self.pump = Some(tokio::spawn(async move {
            let mut feed = feed.lock().await;
            while let Some(event) = feed.recv().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        }));
        self.running.store(true, Ordering::SeqCst);
        debug!("mock discovery started");
        Ok(rx)
    }

    async fn stop_discovery(&mut self) -> Result<(), DiscoveryError> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.running.store(false, Ordering::SeqCst);
        debug!("mock discovery stopped");
        Ok(())
    }
}

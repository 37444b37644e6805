//! Cooperative stop signal for retry loops

use std::sync::Arc;

use tokio::sync::watch;

/// Shared flag that ends a retry loop.
///
/// Checked before every attempt, and raced against the wait between attempts
/// so a stop during that wait takes effect immediately. An in-flight request
/// is never interrupted.
#[derive(Debug, Clone)]
pub struct StopToken {
    tx: Arc<watch::Sender<bool>>,
}

impl StopToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`StopToken::stop`] has been called
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on stop.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stop_is_shared_between_clones() {
        let token = StopToken::new();
        let clone = token.clone();
        assert!(!clone.is_stopped());

        token.stop();
        assert!(clone.is_stopped());
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_stop() {
        let token = StopToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.stopped().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stopped_is_immediate_when_already_stopped() {
        let token = StopToken::new();
        token.stop();
        tokio::time::timeout(Duration::from_millis(100), token.stopped())
            .await
            .unwrap();
    }
}

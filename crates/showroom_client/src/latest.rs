use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Hands out one cancellation token per request generation.
///
/// Starting a new generation cancels whatever was still in flight, so a
/// slow stale response can never overwrite fresher state. Teardown cancels
/// the last outstanding token.
#[derive(Debug, Default)]
pub struct LatestGate {
    current: Mutex<Option<CancellationToken>>,
}

impl LatestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the previous in-flight request and returns the token the
    /// new request must race against.
    pub fn begin(&self) -> CancellationToken {
        let mut current = self.current.lock().expect("latest gate lock");
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        token
    }

    pub fn teardown(&self) {
        if let Some(token) = self.current.lock().expect("latest gate lock").take() {
            token.cancel();
        }
    }
}

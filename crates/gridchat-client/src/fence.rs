//! Request tickets: per-ask cancellation plus generation fencing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Handed to one ask; identifies it and carries its cancellation token.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Issues tickets. Only the most recent ticket is current; replies carrying
/// an older one are stale and must not be committed.
#[derive(Debug, Default)]
pub struct RequestGate {
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new current ticket. The previous ticket is superseded but its
    /// token is left alone.
    pub fn begin(&self) -> RequestTicket {
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *current = Some(token.clone());
        RequestTicket { generation, token }
    }

    /// Cancel the current ticket. Returns false if none was ever issued.
    pub fn cancel_current(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}

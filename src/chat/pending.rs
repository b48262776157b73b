use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// The slot holding the one streamed request that may be in flight.
///
/// Clones share the slot, so a signal handler can cancel what the
/// controller started.
#[derive(Debug, Clone, Default)]
pub struct PendingRequest {
    inner: Arc<Mutex<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Proof of having started a request; used to finish it.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    /// Cancellation token of this request.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl PendingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels whatever is pending and registers a new request.
    pub fn begin(&self) -> RequestTicket {
        let mut slot = self.slot();
        if let Some(previous) = slot.token.take() {
            previous.cancel();
        }
        slot.generation += 1;
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        RequestTicket {
            generation: slot.generation,
            token,
        }
    }

    /// Cancels the pending request, if any. Returns whether there was one.
    pub fn cancel(&self) -> bool {
        match self.slot().token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the slot if it still belongs to `ticket`.
    ///
    /// Returns false when a newer request has started since; the caller
    /// must then leave the input state to that request.
    pub fn finish(&self, ticket: &RequestTicket) -> bool {
        let mut slot = self.slot();
        if slot.generation != ticket.generation {
            return false;
        }
        slot.token = None;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.slot().token.is_some()
    }
}

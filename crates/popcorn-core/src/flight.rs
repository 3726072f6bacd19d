//! Single-flight bookkeeping shared by the search and detail lifecycles.
//!
//! Every cycle gets a fresh epoch and cancellation token. Starting a new
//! cycle cancels the previous token first, so at most one request of a
//! kind is ever outstanding. A completion may mutate state only if it
//! carries the current epoch and its token was never cancelled.

use tokio_util::sync::CancellationToken;

/// What happened to a completion handed back to a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The completion belonged to the current cycle and state changed
    Updated,
    /// Superseded or cancelled; state untouched
    Discarded,
}

#[derive(Debug, Default)]
pub(crate) struct FlightTracker {
    epoch: u64,
    in_flight: Option<CancellationToken>,
}

impl FlightTracker {
    /// Cancel whatever is outstanding and open a new epoch with no request.
    pub(crate) fn supersede(&mut self) -> u64 {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.epoch += 1;
        self.epoch
    }

    /// Supersede, then register a request for the new epoch.
    pub(crate) fn begin(&mut self) -> (u64, CancellationToken) {
        let epoch = self.supersede();
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        (epoch, token)
    }

    pub(crate) fn is_current(&self, epoch: u64, token: &CancellationToken) -> bool {
        epoch == self.epoch && !token.is_cancelled()
    }

    /// The current request has completed
    pub(crate) fn settle(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}

impl Drop for FlightTracker {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_cancels_previous() {
        let mut tracker = FlightTracker::default();
        let (first_epoch, first) = tracker.begin();
        let (second_epoch, second) = tracker.begin();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!tracker.is_current(first_epoch, &first));
        assert!(tracker.is_current(second_epoch, &second));
    }

    #[test]
    fn test_supersede_without_request_invalidates() {
        let mut tracker = FlightTracker::default();
        let (epoch, token) = tracker.begin();
        tracker.supersede();
        assert!(token.is_cancelled());
        assert!(!tracker.is_current(epoch, &token));
        assert!(!tracker.has_in_flight());
    }

    #[test]
    fn test_drop_cancels_outstanding() {
        let mut tracker = FlightTracker::default();
        let (_, token) = tracker.begin();
        drop(tracker);
        assert!(token.is_cancelled());
    }
}

//! Out-of-band cancellation for a running stream.
//!
//! Closing a [`CancelHandle`] is the client-side equivalent of closing the
//! connection: the session reading under it stops at its next read attempt
//! (or immediately, if it is parked waiting for bytes) and terminates as
//! `Cancelled`.

use std::sync::Arc;

use tokio::sync::watch;

/// Clone-able handle that closes the stream it was given to.
///
/// Every [`cancel`](CancelHandle::cancel) bumps a shared counter. A handle
/// reports cancellation once the counter has moved past the value it was
/// armed at, so a request made while nobody is listening stays pending
/// until some reader observes it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<u64>>,
    armed_at: u64,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            armed_at: 0,
        }
    }

    /// Request cancellation. Repeated calls before anyone re-arms coalesce.
    pub fn cancel(&self) {
        self.tx.send_modify(|count| *count = count.wrapping_add(1));
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow() != self.armed_at
    }

    /// A handle sharing this one's signal that ignores cancels issued so far.
    pub(crate) fn rearmed(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            armed_at: *self.tx.borrow(),
        }
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() != self.armed_at {
                return;
            }
            if rx.changed().await.is_err() {
                // sender is owned by self and never dropped first
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_handle_is_not_cancelled() {
        assert!(!CancelHandle::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_rearmed_ignores_earlier_cancels() {
        let handle = CancelHandle::new();
        handle.cancel();
        let next = handle.rearmed();
        assert!(handle.is_cancelled());
        assert!(!next.is_cancelled());

        handle.cancel();
        assert!(next.is_cancelled());
    }

    #[test]
    fn test_cancel_before_rearm_stays_pending() {
        let handle = CancelHandle::new();
        let session = handle.rearmed();
        handle.cancel();
        // a later rearm does not swallow it for holders of the old handle
        let _next = session.rearmed();
        assert!(session.is_cancelled());
    }

    #[tokio::test]
    async fn test_rearmed_waiter_wakes_on_new_cancel() {
        let handle = CancelHandle::new();
        handle.cancel();
        let next = handle.rearmed();
        let waiter = {
            let next = next.clone();
            tokio::spawn(async move { next.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let handle = CancelHandle::new();
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle.cancelled())
            .await
            .expect("should resolve");
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let handle = CancelHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}

//! Sequence fencing for overlapping loads
//!
//! Every load takes a ticket before it starts fetching. A response is only
//! applied when its ticket is newer than the last one applied, so a slow
//! response can never overwrite a faster, later one.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct TicketCounter(AtomicU64);

impl TicketCounter {
    pub fn issue(&self) -> LoadTicket {
        LoadTicket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// What happened to a load response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    Stale,
    Detached,
}

#[derive(Debug)]
pub struct Fenced<D> {
    value: D,
    applied: Option<LoadTicket>,
    detached: bool,
}

impl<D> Fenced<D> {
    pub fn new(value: D) -> Self {
        Self {
            value,
            applied: None,
            detached: false,
        }
    }

    pub fn value(&self) -> &D {
        &self.value
    }

    /// Whether any load has landed yet
    pub fn is_loaded(&self) -> bool {
        self.applied.is_some()
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Stop accepting responses for good
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn apply(&mut self, ticket: LoadTicket, value: D) -> Applied {
        if self.detached {
            return Applied::Detached;
        }
        if self.applied.is_some_and(|last| ticket <= last) {
            return Applied::Stale;
        }
        self.value = value;
        self.applied = Some(ticket);
        Applied::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tickets_increase() {
        let counter = TicketCounter::default();
        let a = counter.issue();
        let b = counter.issue();
        assert!(b > a);
    }

    #[test]
    fn test_older_response_is_dropped() {
        let counter = TicketCounter::default();
        let first = counter.issue();
        let second = counter.issue();

        let mut fenced = Fenced::new(0);
        assert_eq!(fenced.apply(second, 2), Applied::Fresh);
        assert_eq!(fenced.apply(first, 1), Applied::Stale);
        assert_eq!(*fenced.value(), 2);
    }

    #[test]
    fn test_detached_ignores_everything() {
        let counter = TicketCounter::default();
        let mut fenced = Fenced::new(0);
        fenced.detach();
        assert_eq!(fenced.apply(counter.issue(), 7), Applied::Detached);
        assert_eq!(*fenced.value(), 0);
        assert!(!fenced.is_loaded());
    }

    proptest! {
        /// Whatever order responses arrive in, the newest issued one wins
        #[test]
        fn newest_ticket_wins(order in Just((0u64..8).collect::<Vec<_>>()).prop_shuffle()) {
            let counter = TicketCounter::default();
            let tickets: Vec<_> = (0..8).map(|_| counter.issue()).collect();

            let mut fenced = Fenced::new(u64::MAX);
            for i in &order {
                fenced.apply(tickets[*i as usize], *i);
            }
            prop_assert_eq!(*fenced.value(), 7);
        }
    }
}

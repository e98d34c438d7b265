/// Identifies one in-flight distance table request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Monotonic request counter. Only the most recently started request may
/// apply its result; anything that completes later than a newer start is stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSequence {
    latest: u64,
}

impl FetchSequence {
    pub const fn new() -> Self {
        Self { latest: 0 }
    }

    pub fn begin(&mut self) -> FetchTicket {
        self.latest = self.latest.wrapping_add(1);
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Invalidate every outstanding ticket without starting a request.
    pub fn cancel_all(&mut self) {
        self.latest = self.latest.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::FetchSequence;

    #[test]
    fn newer_request_makes_older_ticket_stale() {
        let mut seq = FetchSequence::new();
        let first = seq.begin();
        assert!(seq.is_current(first));

        let second = seq.begin();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn out_of_order_completion_applies_only_last_click() {
        let mut seq = FetchSequence::new();
        let clicks: Vec<_> = (0..4).map(|_| seq.begin()).collect();

        let applied: Vec<usize> = [2usize, 3, 0, 1]
            .into_iter()
            .filter(|&i| seq.is_current(clicks[i]))
            .collect();
        assert_eq!(applied, vec![3]);
    }

    #[test]
    fn cancel_all_invalidates_outstanding_tickets() {
        let mut seq = FetchSequence::new();
        let ticket = seq.begin();
        seq.cancel_all();
        assert!(!seq.is_current(ticket));
    }
}

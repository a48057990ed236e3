use chrono::{DateTime, Duration, Utc};

/// The ledger's "current time" oracle.
///
/// Every phase and window check reads this clock, never a wall clock supplied
/// by the caller. Real deployments follow the host clock; simulations and
/// tests drive a manual clock forward explicitly. Callers of the manual clock
/// are expected to advance it monotonically, mirroring block timestamps.
#[derive(Debug, Clone)]
pub enum LedgerClock {
    /// Follow the host clock.
    System,
    /// Time stands still until advanced.
    Manual(DateTime<Utc>),
}

impl LedgerClock {
    pub fn manual(start: DateTime<Utc>) -> Self {
        Self::Manual(start)
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Manual(now) => *now,
        }
    }

    /// Pin the clock to the given instant (switches a system clock to manual).
    pub fn set(&mut self, to: DateTime<Utc>) {
        *self = Self::Manual(to);
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&mut self, by: Duration) {
        let now = self.now();
        *self = Self::Manual(now + by);
    }
}

impl Default for LedgerClock {
    fn default() -> Self {
        Self::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_stands_still_until_advanced() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut clock = LedgerClock::manual(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(30));
        assert_eq!(clock.now(), start + Duration::minutes(30));

        clock.set(start + Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
    }
}

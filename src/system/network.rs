use std::time::{Duration, Instant};

/// Cumulative byte counters summed across all interfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Baseline carried from one sampling cycle to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkCounterState {
    pub previous_bytes_received: u64,
    pub previous_bytes_sent: u64,
    pub previous_sample_time: Instant,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkRates {
    pub in_bytes_per_sec: u64,
    pub out_bytes_per_sec: u64,
}

impl NetworkCounterState {
    pub fn new(counters: NetworkCounters, at: Instant) -> Self {
        NetworkCounterState {
            previous_bytes_received: counters.bytes_received,
            previous_bytes_sent: counters.bytes_sent,
            previous_sample_time: at,
        }
    }

    /// Rates since this baseline. A zero elapsed time, or a clock that went
    /// backwards, yields zero rates.
    pub fn rates_to(&self, current: NetworkCounters, now: Instant) -> NetworkRates {
        let elapsed = now.saturating_duration_since(self.previous_sample_time);
        NetworkRates {
            in_bytes_per_sec: counter_rate(
                self.previous_bytes_received,
                current.bytes_received,
                elapsed,
            ),
            out_bytes_per_sec: counter_rate(self.previous_bytes_sent, current.bytes_sent, elapsed),
        }
    }
}

/// Bytes per second between two readings of a monotonic counter, floored.
/// A counter that went down (interface reset or wraparound) reports 0.
pub fn counter_rate(previous: u64, current: u64, elapsed: Duration) -> u64 {
    if elapsed.is_zero() || current < previous {
        return 0;
    }
    ((current - previous) as f64 / elapsed.as_secs_f64()).floor() as u64
}

/// Derive rates for this cycle and roll the baseline forward. The first
/// call only records a baseline.
pub fn advance(
    state: &mut Option<NetworkCounterState>,
    current: NetworkCounters,
    now: Instant,
) -> NetworkRates {
    let rates = state
        .as_ref()
        .map(|prev| prev.rates_to(current, now))
        .unwrap_or_default();
    *state = Some(NetworkCounterState::new(current, now));
    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counters(rx: u64, tx: u64) -> NetworkCounters {
        NetworkCounters {
            bytes_received: rx,
            bytes_sent: tx,
        }
    }

    #[test]
    fn first_cycle_reports_zero_and_sets_baseline() {
        let mut state = None;
        let now = Instant::now();
        let rates = advance(&mut state, counters(1_000_000, 5_000), now);
        assert_eq!(rates, NetworkRates::default());
        assert_eq!(state, Some(NetworkCounterState::new(counters(1_000_000, 5_000), now)));
    }

    #[test]
    fn rate_over_two_seconds() {
        let t0 = Instant::now();
        let mut state = None;
        advance(&mut state, counters(1000, 100), t0);
        let rates = advance(&mut state, counters(3000, 401), t0 + Duration::from_secs(2));
        assert_eq!(rates.in_bytes_per_sec, 1000);
        // 301 / 2 = 150.5, floored
        assert_eq!(rates.out_bytes_per_sec, 150);
    }

    #[test]
    fn zero_elapsed_reports_zero_but_moves_baseline() {
        let t0 = Instant::now();
        let mut state = None;
        advance(&mut state, counters(1000, 1000), t0);
        let rates = advance(&mut state, counters(5000, 5000), t0);
        assert_eq!(rates, NetworkRates::default());
        assert_eq!(state.unwrap().previous_bytes_received, 5000);
    }

    #[test]
    fn counter_reset_reports_zero() {
        let t0 = Instant::now();
        let mut state = None;
        advance(&mut state, counters(10_000, 10_000), t0);
        let rates = advance(&mut state, counters(500, 20_000), t0 + Duration::from_secs(1));
        assert_eq!(rates.in_bytes_per_sec, 0);
        assert_eq!(rates.out_bytes_per_sec, 10_000);
        assert_eq!(state.unwrap().previous_bytes_received, 500);
    }

    #[test]
    fn sub_second_interval() {
        assert_eq!(counter_rate(0, 300, Duration::from_millis(1500)), 200);
        assert_eq!(counter_rate(0, 1, Duration::from_millis(3000)), 0);
    }

    proptest! {
        #[test]
        fn rate_matches_floor_of_delta_over_time(
            previous in 0u64..1_000_000_000,
            delta in 0u64..1_000_000_000,
            millis in 1u64..60_000,
        ) {
            let elapsed = Duration::from_millis(millis);
            let expected = (delta as f64 / elapsed.as_secs_f64()).floor() as u64;
            prop_assert_eq!(counter_rate(previous, previous + delta, elapsed), expected);
        }
    }
}

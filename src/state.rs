// Per-host sliding window of (timestamp, account) pairs backing the auth-burst detector.
//
// One window per host, guarded independently so bursts on different hosts never contend.
// Purely `as_of`-driven: an event older than an already-evicted entry cannot resurrect it.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct HostWindow {
    events: VecDeque<(DateTime<Utc>, String)>,
}

#[derive(Debug, Default)]
pub struct BurstWindowState {
    windows: DashMap<String, Mutex<HostWindow>>,
}

impl BurstWindowState {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_locked(window: &mut HostWindow, timestamp: DateTime<Utc>, account_id: &str, max_events: usize) {
        window.events.push_back((timestamp, account_id.to_string()));
        while window.events.len() > max_events {
            window.events.pop_front();
        }
    }

    /// Evicts entries older than `as_of - window_seconds` from an already-locked window,
    /// then returns the distinct account ids remaining in it.
    fn distinct_in_window_locked(
        window: &mut HostWindow,
        window_seconds: i64,
        as_of: DateTime<Utc>,
    ) -> std::collections::BTreeSet<String> {
        // Half-open window (cutoff, as_of]: an entry sitting exactly on the boundary is
        // exactly `window_seconds` old and counts as stale.
        let cutoff = as_of - Duration::seconds(window_seconds);
        while window
            .events
            .front()
            .map(|(ts, _)| *ts <= cutoff)
            .unwrap_or(false)
        {
            window.events.pop_front();
        }
        window.events.iter().map(|(_, acct)| acct.clone()).collect()
    }

    pub fn record(&self, host_id: &str, timestamp: DateTime<Utc>, account_id: &str, max_events: usize) {
        let entry = self.windows.entry(host_id.to_string()).or_default();
        let mut window = entry.lock();
        Self::record_locked(&mut window, timestamp, account_id, max_events);
    }

    /// Evicts entries older than `as_of - window_seconds`, then returns the distinct
    /// account ids remaining in the window.
    pub fn get_distinct_accounts_in_window(
        &self,
        host_id: &str,
        window_seconds: i64,
        as_of: DateTime<Utc>,
    ) -> std::collections::BTreeSet<String> {
        let Some(entry) = self.windows.get(host_id) else {
            return std::collections::BTreeSet::new();
        };
        let mut window = entry.lock();
        Self::distinct_in_window_locked(&mut window, window_seconds, as_of)
    }

    /// Records the event and reads back the surviving distinct accounts under a single
    /// lock acquisition on the host's window, so the two steps observe one consistent
    /// ingest ordering instead of letting a concurrent ingest interleave between them (spec
    /// §5: "a short critical section around `record` + `get_distinct_accounts_in_window`").
    pub fn record_and_get_distinct(
        &self,
        host_id: &str,
        timestamp: DateTime<Utc>,
        account_id: &str,
        max_events: usize,
        window_seconds: i64,
    ) -> std::collections::BTreeSet<String> {
        let entry = self.windows.entry(host_id.to_string()).or_default();
        let mut window = entry.lock();
        Self::record_locked(&mut window, timestamp, account_id, max_events);
        Self::distinct_in_window_locked(&mut window, window_seconds, timestamp)
    }

    /// Clears one host's window, or every host's window when `host_id` is `None`.
    pub fn reset(&self, host_id: Option<&str>) {
        match host_id {
            Some(id) => {
                self.windows.remove(id);
            }
            None => self.windows.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn per_host_isolation() {
        let state = BurstWindowState::new();
        state.record("host:a", t(0), "account:u0", 1000);
        let distinct = state.get_distinct_accounts_in_window("host:b", 60, t(0));
        assert!(distinct.is_empty());
    }

    #[test]
    fn repeated_same_account_does_not_inflate_count() {
        let state = BurstWindowState::new();
        for i in 0..10 {
            state.record("host:a", t(i), "account:u0", 1000);
        }
        let distinct = state.get_distinct_accounts_in_window("host:a", 60, t(9));
        assert_eq!(distinct.len(), 1);
    }

    #[test]
    fn window_eviction_drops_stale_entries() {
        let state = BurstWindowState::new();
        state.record("host:a", t(0), "account:u0", 1000);
        state.record("host:a", t(0), "account:u1", 1000);
        state.record("host:a", t(60), "account:u2", 1000);
        let distinct = state.get_distinct_accounts_in_window("host:a", 30, t(60));
        assert_eq!(distinct, std::collections::BTreeSet::from(["account:u2".to_string()]));
    }

    #[test]
    fn max_events_tracked_caps_window_length() {
        let state = BurstWindowState::new();
        for i in 0..5 {
            state.record("host:a", t(i), format!("account:u{i}").as_str(), 3);
        }
        let distinct = state.get_distinct_accounts_in_window("host:a", 1_000_000, t(4));
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn record_and_get_distinct_matches_separate_calls() {
        let state = BurstWindowState::new();
        state.record("host:a", t(0), "account:u0", 1000);
        let combined = state.record_and_get_distinct("host:a", t(1), "account:u1", 1000, 60);
        assert_eq!(
            combined,
            std::collections::BTreeSet::from(["account:u0".to_string(), "account:u1".to_string()])
        );
    }

    #[test]
    fn reset_clears_one_host_only() {
        let state = BurstWindowState::new();
        state.record("host:a", t(0), "account:u0", 1000);
        state.record("host:b", t(0), "account:u1", 1000);
        state.reset(Some("host:a"));
        assert!(state.get_distinct_accounts_in_window("host:a", 1000, t(0)).is_empty());
        assert!(!state.get_distinct_accounts_in_window("host:b", 1000, t(0)).is_empty());
    }
}

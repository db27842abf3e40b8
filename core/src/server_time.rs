//! Per-host estimate of the remote server's clock.
//!
//! # Design
//! Every decoded response hands its `Date` header to a `ServerTimeTracker`,
//! which stores the remote time together with the local time it was seen at.
//! Callers that need remote-relative timestamps (transaction validity
//! windows, signature expiry) ask for `current_server_time(host)`.
//!
//! The tracker is an ordinary value, usually shared through an `Arc`. It is
//! not a process-wide global, so tests get isolated instances and can inject
//! a `ManualClock`. An unknown estimate is `None`, never `0`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};

/// Records older than this (measured from when they were recorded) are
/// no longer trusted.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(5 * 60);

/// RFC 1123 HTTP-date after the weekday, e.g. `06 Nov 1994 08:49:37 GMT`.
const HTTP_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Source of the local wall-clock time, in epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Remote time observed for a host, and the local time it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeRecord {
    pub server_time: i64,
    pub local_time_recorded: i64,
}

/// Thread-safe map from host identity to the last observed server time.
///
/// One record per host, last write wins. Records are never evicted; stale
/// ones are simply reported as unknown.
pub struct ServerTimeTracker {
    records: Mutex<HashMap<String, ServerTimeRecord>>,
    clock: Arc<dyn Clock>,
    staleness: Duration,
}

impl std::fmt::Debug for ServerTimeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTimeTracker")
            .field("records", &*self.lock())
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl Default for ServerTimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerTimeTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            staleness: DEFAULT_STALENESS,
        }
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    // Records are plain `Copy` data, so a panic while holding the lock
    // cannot leave one half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ServerTimeRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the server time carried by an HTTP `Date` header value.
    ///
    /// A value that is not an RFC 1123 date is ignored and any previous
    /// record for `host` is kept.
    pub fn record(&self, host: &str, date_header: &str) {
        match parse_http_date(date_header) {
            Some(server_time) => self.record_time(host, server_time),
            None => log::debug!("ignoring unparsable Date header from {host}: {date_header:?}"),
        }
    }

    /// Record an already-parsed server time (epoch seconds) for `host`.
    pub fn record_time(&self, host: &str, server_time: i64) {
        let record = ServerTimeRecord {
            server_time,
            local_time_recorded: self.clock.now(),
        };
        log::trace!(
            "server time for {host}: {server_time} (local {})",
            record.local_time_recorded
        );
        self.lock().insert(host.to_string(), record);
    }

    /// Raw record for `host`, regardless of age.
    pub fn get(&self, host: &str) -> Option<ServerTimeRecord> {
        self.lock().get(host).copied()
    }

    /// Record for `host` together with the local time now, if the record
    /// was taken within the staleness window.
    fn fresh(&self, host: &str) -> Option<(ServerTimeRecord, i64)> {
        let record = self.get(host)?;
        let now = self.clock.now();
        let elapsed = now - record.local_time_recorded;
        if elapsed > self.staleness.as_secs() as i64 {
            return None;
        }
        Some((record, now))
    }

    /// Estimated current time on `host`, in epoch seconds.
    ///
    /// `None` when nothing was recorded for `host` or the record is older
    /// than the staleness threshold.
    pub fn current_server_time(&self, host: &str) -> Option<i64> {
        let (record, now) = self.fresh(host)?;
        Some(now - record.local_time_recorded + record.server_time)
    }

    /// Remote clock minus local clock for `host`, in seconds.
    pub fn offset(&self, host: &str) -> Option<i64> {
        let (record, _) = self.fresh(host)?;
        Some(record.server_time - record.local_time_recorded)
    }

    /// `current_server_time(host)`, or local time when it is unknown.
    pub fn now_for(&self, host: &str) -> i64 {
        self.current_server_time(host)
            .unwrap_or_else(|| self.clock.now())
    }
}

/// Parse an RFC 1123 HTTP-date into epoch seconds.
///
/// The weekday must be a valid abbreviation but is not checked against the
/// date, so `Mon, 06 Nov 1994 08:49:37 GMT` parses like the `Sun` form.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let (weekday, rest) = value.trim().split_once(", ")?;
    if !WEEKDAYS.contains(&weekday) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest, HTTP_DATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

//! Keeps a formatted HTTP `Date` header value fresh without reformatting it on every response.
//!
//! Grounded on the teacher's `crates/web/src/date/mod.rs`: a background task refreshes an
//! `ArcSwap`-held value on an interval and callers take a cheap clone. Two things are
//! deliberately not carried over: the `once_cell::sync::Lazy` global singleton (this crate's
//! redesign notes call for dropping ambient global state — a `DateService` is constructed by
//! and owned by whatever builds the [`crate::server::Server`]) and the `unsafe
//! HeaderValue::from_maybe_shared_unchecked` call, since this crate's `Headers` type stores
//! plain `String`s rather than `http::HeaderValue`.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(800);

/// A background-refreshed cache of the current IMF-fixdate-formatted time.
pub struct DateService {
    current: Arc<ArcSwap<String>>,
    handle: tokio::task::JoinHandle<()>,
}

impl DateService {
    /// Spawns the refresh task onto `handle`. The task holds only a clone of the `ArcSwap`, so
    /// dropping the `DateService` (which aborts the task) does not disturb any response still
    /// holding a cloned date string.
    pub fn spawn(handle: &tokio::runtime::Handle) -> Self {
        Self::spawn_with_interval(handle, DEFAULT_REFRESH_INTERVAL)
    }

    pub fn spawn_with_interval(handle: &tokio::runtime::Handle, interval: Duration) -> Self {
        let current = Arc::new(ArcSwap::from_pointee(format_now()));
        let background = Arc::clone(&current);

        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                background.store(Arc::new(format_now()));
            }
        });

        DateService { current, handle: task }
    }

    /// Returns the current cached date string.
    pub fn current(&self) -> Arc<String> {
        self.current.load_full()
    }
}

impl Drop for DateService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn format_now() -> String {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

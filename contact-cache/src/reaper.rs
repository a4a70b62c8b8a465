//! Background sweep that removes expired entries.
//!
//! The reaper is a Tokio task woken by an interval. It holds only a weak
//! reference to the cache, so it never keeps a dropped cache alive, and it
//! stops when the shutdown channel flips to `true` or its sender goes away.

use std::collections::HashMap;
use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{Entry, Shared};

/// Spawns the reaper on `handle`.
pub(crate) fn spawn(
    handle: &Handle,
    shared: Weak<Shared>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    handle.spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; sweeps start one period in.
        ticker.tick().await;

        info!(?period, "Reaper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    let Some(shared) = shared.upgrade() else {
                        break;
                    };
                    shared.sweep();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reaper stopped");
    })
}

/// Removes every entry last seen before `now - ttl`.
///
/// Keys are collected first and removed afterwards. Returns the number removed.
pub(crate) fn sweep(entries: &mut HashMap<String, Entry>, now: Instant, ttl: Duration) -> usize {
    // Nothing can be older than the clock's origin.
    let Some(cutoff) = now.checked_sub(ttl) else {
        return 0;
    };

    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, e)| e.seen_at < cutoff)
        .map(|(k, _)| k.clone())
        .collect();

    for key in &expired {
        entries.remove(key);
    }

    if !expired.is_empty() {
        debug!(removed = expired.len(), remaining = entries.len(), "Swept expired entries");
    }

    expired.len()
}

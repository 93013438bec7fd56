//! Waiting for the filesystem after the connection closes.
//!
//! There is no completion signal for OS-level write-back. The default waits a
//! fixed interval; `UntilStable` polls size and modification time instead.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, warn};

/// Default fixed settle interval.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// How long to wait between closing the connection and copying the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Sleep for a constant interval.
    Fixed(Duration),
    /// Poll until two consecutive observations of size and mtime agree,
    /// giving up after `max_wait`.
    UntilStable { poll: Duration, max_wait: Duration },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SETTLE)
    }
}

impl SettlePolicy {
    /// Block until the policy is satisfied; returns the time spent.
    pub fn wait(&self, path: &Path) -> Duration {
        let start = Instant::now();

        match *self {
            Self::Fixed(interval) => {
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            Self::UntilStable { poll, max_wait } => {
                let mut last = observe(path);
                loop {
                    if start.elapsed() >= max_wait {
                        warn!(path = %path.display(), ?max_wait, "File did not settle in time");
                        break;
                    }
                    thread::sleep(poll);
                    let current = observe(path);
                    if current.is_some() && current == last {
                        break;
                    }
                    last = current;
                }
            }
        }

        let waited = start.elapsed();
        debug!(?waited, "Settle complete");
        waited
    }
}

fn observe(path: &Path) -> Option<(u64, Option<SystemTime>)> {
    fs::metadata(path)
        .ok()
        .map(|m| (m.len(), m.modified().ok()))
}

use std::fmt;

/// Whole seconds, formatted for humans, e.g. `1h 2m 3s`.
///
/// Used for elapsed time and the remaining time of a run.
pub(crate) struct Duration {
    elapsed: u64,
}

impl Duration {
    /// Create a new `Duration` from the given number of seconds.
    pub(crate) const fn from_secs(elapsed: u64) -> Self {
        Self { elapsed }
    }
}

impl From<std::time::Duration> for Duration {
    fn from(duration: std::time::Duration) -> Self {
        // Round up, so that a nearly finished run never reports `0s` left
        let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        Self::from_secs(secs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.elapsed / 86400;
        let hours = (self.elapsed % 86400) / 3600;
        let minutes = (self.elapsed % 3600) / 60;
        let seconds = self.elapsed % 60;

        if days > 0 {
            write!(f, "{days}d {hours}h {minutes}m {seconds}s")
        } else if hours > 0 {
            write!(f, "{hours}h {minutes}m {seconds}s")
        } else if minutes > 0 {
            write!(f, "{minutes}m {seconds}s")
        } else {
            write!(f, "{seconds}s")
        }
    }
}

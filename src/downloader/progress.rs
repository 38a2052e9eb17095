//! Progress parsing for yt-dlp download output
//!
//! One grammar covers both shapes yt-dlp prints:
//!
//! ```text
//! [download]  42.5% of ~ 10.00MiB in 00:05 at 2.00MiB/s ETA 00:02
//! 42.5%
//! ```
//!
//! In the rich form only the percentage and size are required. Elapsed time,
//! speed and ETA each default to unknown (`None`) when missing or reported as
//! `Unknown`. Lines that match neither shape are noise and produce nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Rendering of a field yt-dlp did not report
pub const UNKNOWN: &str = "Unknown";

static RICH_PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\[download\]\s+(?P<pct>\d{1,3}(?:\.\d+)?)%",
        r"\s+of\s+(?:~\s*)?(?P<size>\d+(?:\.\d+)?\s*[KMGTPE]?i?B)",
        r"(?:\s+in\s+(?:Unknown|(?P<elapsed>\d+(?::\d+)+)))?",
        r"(?:\s+at\s+(?:Unknown\s+\S+|(?P<speed>\d+(?:\.\d+)?\s*[KMGTPE]?i?B/s)))?",
        r"(?:\s+ETA\s+(?:Unknown|(?P<eta>\d+(?::\d+)+)))?",
    ))
    .expect("valid progress regex")
});

static BARE_PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<pct>\d{1,3}(?:\.\d+)?)%")
        .expect("valid percent regex")
});

/// One parsed progress line
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Completion in 0.0..=1.0, at whole-percent granularity
    pub fraction: f64,
    /// Total size text, e.g. `10.00MiB`
    pub size: Option<String>,
    /// Transfer speed text, e.g. `2.00MiB/s`
    pub speed: Option<String>,
    /// Remaining time text, e.g. `00:02`
    pub eta: Option<String>,
    /// Elapsed time text (only printed once a fragment finishes)
    pub elapsed: Option<String>,
}

impl ProgressEvent {
    pub fn from_percent(percent: f64) -> Self {
        Self {
            fraction: normalize(percent),
            size: None,
            speed: None,
            eta: None,
            elapsed: None,
        }
    }

    /// Whole percentage, 0..=100
    pub fn percent(&self) -> u32 {
        (self.fraction * 100.0).round() as u32
    }

    pub fn size_or_unknown(&self) -> &str {
        self.size.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn speed_or_unknown(&self) -> &str {
        self.speed.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn eta_or_unknown(&self) -> &str {
        self.eta.as_deref().unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}% of {} at {} ETA {}",
            self.percent(),
            self.size_or_unknown(),
            self.speed_or_unknown(),
            self.eta_or_unknown()
        )
    }
}

/// Round to a whole percent, then scale to 0..=1
fn normalize(percent: f64) -> f64 {
    percent.round().clamp(0.0, 100.0) / 100.0
}

/// Stateless line parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressParser;

impl ProgressParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line, or `None` when it is not a progress line
    pub fn parse_line(&self, line: &str) -> Option<ProgressEvent> {
        if let Some(caps) = RICH_PROGRESS.captures(line) {
            let percent: f64 = caps["pct"].parse().ok()?;
            let text = |name: &str| caps.name(name).map(|m| m.as_str().replace(' ', ""));
            return Some(ProgressEvent {
                fraction: normalize(percent),
                size: text("size"),
                speed: text("speed"),
                eta: text("eta"),
                elapsed: text("elapsed"),
            });
        }

        let caps = BARE_PERCENT.captures(line)?;
        let percent: f64 = caps["pct"].parse().ok()?;
        Some(ProgressEvent::from_percent(percent))
    }
}

use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Current time as fractional unix seconds.
pub fn now_unix() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Compact age: "45s", "12m", "3h 05m", "2d 4h".
pub fn fmt_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3_599 => format!("{}m", secs / 60),
        3_600..=86_399 => format!("{}h {:02}m", secs / 3_600, (secs % 3_600) / 60),
        _ => format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3_600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_age() {
        assert_eq!(fmt_age(Duration::from_secs(0)), "0s");
        assert_eq!(fmt_age(Duration::from_secs(125)), "2m");
        assert_eq!(fmt_age(Duration::from_secs(3 * 3_600 + 5 * 60)), "3h 05m");
        assert_eq!(fmt_age(Duration::from_secs(2 * 86_400 + 4 * 3_600 + 1)), "2d 4h");
    }

    #[test]
    fn test_now_unix_tracks_clock() {
        let a = now_unix();
        let b = Utc::now().timestamp() as f64;
        assert!((a - b).abs() < 5.0);
    }
}

//! Timing utilities
//!
//! Monotonic timestamps for the timed phase of a run, plus the compact
//! duration format used in every report.

use std::time::{Duration, Instant};

/// Monotonic timestamp
///
/// Thin wrapper around `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: Instant,
}

impl Timestamp {
    /// Capture the current instant
    #[inline]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    /// Time elapsed since this timestamp
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }
}

/// Format a duration in compact form
///
/// Picks the largest unit below one second, trimming trailing zeros from
/// the fraction. From one second up, hours and minutes are spelled out.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rowpulse::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(350)), "350ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.5µs");
/// assert_eq!(format_duration(Duration::from_micros(2250)), "2.25ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", fixed_point(nanos, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", fixed_point(nanos, 6));
    }

    let total_secs = nanos / 1_000_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = fixed_point(nanos % 60_000_000_000, 9);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Render `value / 10^scale` with the fraction's trailing zeros removed
fn fixed_point(value: u128, scale: u32) -> String {
    let unit = 10u128.pow(scale);
    let whole = value / unit;
    let frac = value % unit;

    if frac == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0width$}", frac, width = scale as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Operations per second over `duration`, 0 for an empty duration
pub fn calculate_rate(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}

/// `elapsed / n` truncated to whole nanoseconds
///
/// `n` must be non-zero.
pub fn mean_per_iteration(elapsed: Duration, n: u64) -> Duration {
    let nanos = elapsed.as_nanos() / u128::from(n.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timestamp_elapsed() {
        let start = Timestamp::now();
        thread::sleep(Duration::from_millis(10));
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_format_duration_sub_second() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(1)), "1ns");
        assert_eq!(format_duration(Duration::from_nanos(999)), "999ns");
        assert_eq!(format_duration(Duration::from_nanos(1_000)), "1µs");
        assert_eq!(format_duration(Duration::from_nanos(12_345)), "12.345µs");
        assert_eq!(format_duration(Duration::from_nanos(1_000_001)), "1.000001ms");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_format_duration_seconds_and_up() {
        assert_eq!(format_duration(Duration::from_secs(1)), "1s");
        assert_eq!(format_duration(Duration::from_millis(1_200)), "1.2s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
        assert_eq!(format_duration(Duration::from_millis(61_500)), "1m1.5s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_calculate_rate() {
        assert_eq!(calculate_rate(1000, Duration::from_secs(1)), 1000.0);
        assert_eq!(calculate_rate(5000, Duration::from_millis(500)), 10000.0);
        assert_eq!(calculate_rate(1000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_mean_per_iteration_truncates() {
        assert_eq!(mean_per_iteration(Duration::from_nanos(1000), 3), Duration::from_nanos(333));
        assert_eq!(mean_per_iteration(Duration::from_secs(1), 1000), Duration::from_millis(1));
        assert_eq!(mean_per_iteration(Duration::from_nanos(5), 10), Duration::ZERO);
    }
}

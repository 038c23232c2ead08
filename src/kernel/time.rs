use chrono::{DateTime, TimeZone, Utc};

/// Wall-clock time in seconds since the Unix epoch.
pub type Timestamp = f64;

pub fn now() -> Timestamp {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

fn to_datetime<Tz: TimeZone>(ts: Timestamp, tz: &Tz) -> Option<DateTime<Tz>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1_000_000_000.0) as u32;
    tz.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
}

/// `H:MM:SS` from whole seconds. Hours are not padded and not wrapped at 24.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// `h:mm:ss AM` with the leading zero of the hour stripped.
pub fn format_clock<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match to_datetime(ts, tz) {
        Some(dt) => {
            let text = dt.format("%I:%M:%S %p").to_string();
            text.strip_prefix('0').map(str::to_string).unwrap_or(text)
        }
        None => String::new(),
    }
}

/// `Tuesday October 14, 2026`
pub fn format_date<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match to_datetime(ts, tz) {
        Some(dt) => dt.format("%A %B %-d, %Y").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_hours_minutes_seconds() {
        assert_eq!(format_duration(0.0), "0:00:00");
        assert_eq!(format_duration(59.9), "0:00:59");
        assert_eq!(format_duration(3_725.0), "1:02:05");
        assert_eq!(format_duration(90_000.0), "25:00:00");
        assert_eq!(format_duration(-4.0), "0:00:00");
    }

    #[test]
    fn clock_strips_leading_zero() {
        // 2026-10-14 03:04:05 UTC
        let ts = 1_791_947_045.0;
        assert_eq!(format_clock(ts, &Utc), "3:04:05 AM");
        // 2026-10-14 15:04:05 UTC
        assert_eq!(format_clock(ts + 12.0 * 3600.0, &Utc), "3:04:05 PM");
        // 2026-10-14 11:04:05 UTC keeps both digits
        assert_eq!(format_clock(ts + 8.0 * 3600.0, &Utc), "11:04:05 AM");
    }

    #[test]
    fn date_is_spelled_out() {
        assert_eq!(format_date(1_791_947_045.0, &Utc), "Wednesday October 14, 2026");
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now() > 1_577_836_800.0);
    }
}

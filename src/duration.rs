// src/duration.rs
//
// Signed "HH:MM" <-> decimal hours codec shared by the ledger normalizer
// and every KPI formatter. Parsing is deliberately lenient: the source
// spreadsheets carry free-text duration cells and a malformed cell must
// contribute zero to the aggregates instead of aborting the whole load.

/// Sentinel strings that mean "no duration" in the source tables.
const ZERO_SENTINELS: [&str; 2] = ["00:00", "00:00:00"];

/// Converts a textual `[-]HH:MM` duration into signed decimal hours.
///
/// `None`, empty cells, and the `00:00` / `00:00:00` sentinels all map to
/// `0.0`. A leading `-` is stripped before the numeric parts are parsed and
/// reapplied to the result. A trailing `:SS` component is tolerated and
/// ignored. Any malformed input (missing colon, non-numeric parts) also
/// yields `0.0`; callers accept that broken cells silently become zero.
pub fn parse_duration(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || ZERO_SENTINELS.contains(&trimmed) {
        return 0.0;
    }

    let (is_negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut parts = body.splitn(3, ':');
    let hours_part = parts.next().unwrap_or_default();
    let Some(minutes_part) = parts.next() else {
        return 0.0;
    };
    let (Ok(hours), Ok(minutes)) = (hours_part.parse::<i64>(), minutes_part.parse::<i64>()) else {
        return 0.0;
    };

    let total = hours as f64 + minutes as f64 / 60.0;
    if is_negative {
        -total
    } else {
        total
    }
}

/// Formats signed decimal hours back into `[-]HH:MM`.
///
/// `None`, zero, and non-finite values render as `"00:00"`. Minutes are
/// rounded to the nearest whole minute; when rounding lands on exactly 60
/// one hour is carried so e.g. `1.999999` renders as `"02:00"`, never
/// `"01:60"`.
pub fn format_duration(hours: Option<f64>) -> String {
    let Some(value) = hours else {
        return "00:00".to_string();
    };
    if !value.is_finite() || value == 0.0 {
        return "00:00".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let mut whole_hours = abs.floor() as i64;
    let mut minutes = ((abs - abs.floor()) * 60.0).round() as i64;
    if minutes == 60 {
        whole_hours += 1;
        minutes = 0;
    }

    format!("{}{:02}:{:02}", sign, whole_hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_durations() {
        assert_eq!(parse_duration(Some("02:45")), 2.75);
        assert_eq!(parse_duration(Some("-05:30")), -5.5);
        assert_eq!(parse_duration(Some("00:00")), 0.0);
        assert_eq!(parse_duration(Some("00:00:00")), 0.0);
        assert_eq!(parse_duration(None), 0.0);
        assert_eq!(parse_duration(Some("")), 0.0);
    }

    #[test]
    fn tolerates_seconds_component() {
        assert_eq!(parse_duration(Some("01:30:15")), 1.5);
        assert_eq!(parse_duration(Some("-01:30:59")), -1.5);
    }

    #[test]
    fn hours_are_unbounded() {
        assert_eq!(parse_duration(Some("123:00")), 123.0);
        assert_eq!(parse_duration(Some("-999:30")), -999.5);
    }

    #[test]
    fn malformed_input_becomes_zero() {
        assert_eq!(parse_duration(Some("garbage")), 0.0);
        assert_eq!(parse_duration(Some("12")), 0.0);
        assert_eq!(parse_duration(Some("ab:cd")), 0.0);
        assert_eq!(parse_duration(Some("1.5:00")), 0.0);
    }

    #[test]
    fn formats_zero_and_missing() {
        assert_eq!(format_duration(None), "00:00");
        assert_eq!(format_duration(Some(0.0)), "00:00");
        assert_eq!(format_duration(Some(f64::NAN)), "00:00");
    }

    #[test]
    fn formats_signed_durations() {
        assert_eq!(format_duration(Some(-5.5)), "-05:30");
        assert_eq!(format_duration(Some(2.75)), "02:45");
        assert_eq!(format_duration(Some(7.0 / 60.0)), "00:07");
    }

    #[test]
    fn carries_rounded_minutes_into_hours() {
        assert_eq!(format_duration(Some(1.999999)), "02:00");
        assert_eq!(format_duration(Some(-1.999999)), "-02:00");
    }

    #[test]
    fn round_trips_whole_minute_values() {
        // Every whole-minute value in [-999, 999] hours survives the trip
        // within one minute of floating error. Stride keeps the loop cheap
        // while still crossing hour boundaries and both signs.
        let mut minutes = -999 * 60;
        while minutes <= 999 * 60 {
            let hours = minutes as f64 / 60.0;
            let round_tripped = parse_duration(Some(&format_duration(Some(hours))));
            assert!(
                (round_tripped - hours).abs() < 1.0 / 60.0,
                "round trip failed for {} ({} back)",
                hours,
                round_tripped
            );
            minutes += 7;
        }
    }
}

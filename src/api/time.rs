use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Datetime format used by API fields such as `adddate` and `editdate`,
/// e.g. `12/31/2014 12:46:50 PM`.
pub const API_DATETIME_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Parses an API datetime string in the fixed zone the service reports in.
///
/// The API transmits no zone information, so the zone is an out-of-band
/// constant the integrating application configures once and applies to every
/// date field. Ambiguous local times (the fall-back DST transition) resolve
/// to the earlier instant so the result stays deterministic.
pub fn parse_api_datetime(value: &str, zone: Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(value, API_DATETIME_FORMAT).ok()?;
    zone.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Offset, Timelike};
    use chrono_tz::America::Los_Angeles;

    #[test]
    fn parses_sample_datetime() {
        let parsed = parse_api_datetime("12/31/2014 12:46:50 PM", Los_Angeles).unwrap();
        assert_eq!(parsed.year(), 2014);
        assert_eq!(parsed.month(), 12);
        assert_eq!(parsed.day(), 31);
        assert_eq!(parsed.hour(), 12);
        assert_eq!(parsed.minute(), 46);
        assert_eq!(parsed.second(), 50);
    }

    #[test]
    fn formats_back_to_month_day_year() {
        let parsed = parse_api_datetime("12/31/2014 12:46:50 PM", Los_Angeles).unwrap();
        assert_eq!(parsed.format("%m/%d/%Y").to_string(), "12/31/2014");
    }

    #[test]
    fn accepts_unpadded_fields() {
        // The API does not zero-pad months, days, or hours.
        let parsed = parse_api_datetime("1/3/2015 7:03:10 AM", Los_Angeles).unwrap();
        assert_eq!(parsed.format("%m/%d/%Y").to_string(), "01/03/2015");
        assert_eq!(parsed.hour(), 7);
    }

    #[test]
    fn applies_the_configured_zone() {
        // Late December is PST, UTC-8.
        let parsed = parse_api_datetime("12/31/2014 12:46:50 PM", Los_Angeles).unwrap();
        assert_eq!(parsed.offset().fix().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_api_datetime("2014-12-31 12:46:50", Los_Angeles).is_none());
        assert!(parse_api_datetime("", Los_Angeles).is_none());
    }
}

//! Parsing of date, time, date-time and timezone offset values.
//!
//! All parsers here are total: malformed input yields `None`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};

fn digits(s: &str, at: usize, n: usize) -> Option<u32> {
    let part = s.get(at..at + n)?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Parse a DA value: `YYYYMMDD`, or the legacy `YYYY.MM.DD` form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    let (y, m, d) = if s.len() >= 10 && s.as_bytes()[4] == b'.' && s.as_bytes()[7] == b'.' {
        (digits(s, 0, 4)?, digits(s, 5, 2)?, digits(s, 8, 2)?)
    } else if s.len() >= 8 {
        (digits(s, 0, 4)?, digits(s, 4, 2)?, digits(s, 6, 2)?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(y as i32, m, d)
}

/// Parse a TM value: `HHMMSS[.FFFFFF]`, where the minute, second and
/// fraction components may be left out from the right.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let s = value.trim();
    let h = digits(s, 0, 2)?;
    let m = if s.len() >= 4 { digits(s, 2, 2)? } else { 0 };
    let sec = if s.len() >= 6 { digits(s, 4, 2)? } else { 0 };
    let micro = if s.len() > 7 && s.as_bytes()[6] == b'.' {
        let frac = &s[7..];
        let frac = &frac[..frac.len().min(6)];
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut n: u32 = frac.parse().ok()?;
        for _ in frac.len()..6 {
            n *= 10;
        }
        n
    } else {
        0
    };
    NaiveTime::from_hms_micro_opt(h, m, sec, micro)
}

/// Parse a timezone suffix of the form `+HHMM` or `-HHMM`.
pub fn parse_zone_offset(value: &str) -> Option<FixedOffset> {
    let s = value.trim();
    if s.len() != 5 {
        return None;
    }
    let sign = match s.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let h = digits(s, 1, 2)?;
    let m = digits(s, 3, 2)?;
    FixedOffset::east_opt(sign * ((h * 60 + m) * 60) as i32)
}

/// Parse a DT value: `YYYY[MM[DD[HH[MM[SS[.FFFFFF]]]]]][&plusmn;ZZZZ]`,
/// with missing components defaulting to their lowest value. The zone
/// suffix falls back to `default_offset` when absent.
pub fn parse_date_time(
    value: &str,
    default_offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let mut s = value.trim();
    let mut offset = default_offset;
    if s.len() > 5 {
        let tail = &s[s.len() - 5..];
        if tail.starts_with('+') || tail.starts_with('-') {
            offset = parse_zone_offset(tail)?;
            s = &s[..s.len() - 5];
        }
    }
    let y = digits(s, 0, 4)?;
    let m = if s.len() >= 6 { digits(s, 4, 2)? } else { 1 };
    let d = if s.len() >= 8 { digits(s, 6, 2)? } else { 1 };
    let date = NaiveDate::from_ymd_opt(y as i32, m, d)?;
    let time = if s.len() > 8 {
        parse_time(&s[8..])?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    offset.from_local_datetime(&date.and_time(time)).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_standard_and_legacy_forms() {
        assert_eq!(
            parse_date("20200101"),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(
            parse_date("2020.01.01"),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(parse_date("20201301"), None);
        assert_eq!(parse_date("garbage!"), None);
        assert_eq!(parse_date("2020"), None);
    }

    #[test]
    fn time_with_and_without_fraction() {
        assert_eq!(
            parse_time("121530"),
            NaiveTime::from_hms_opt(12, 15, 30)
        );
        assert_eq!(
            parse_time("121530.250000"),
            NaiveTime::from_hms_micro_opt(12, 15, 30, 250_000)
        );
        assert_eq!(
            parse_time("121530.25"),
            NaiveTime::from_hms_micro_opt(12, 15, 30, 250_000)
        );
        assert_eq!(parse_time("12"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_time("991212"), None);
    }

    #[test]
    fn zone_offsets() {
        assert_eq!(
            parse_zone_offset("+0100"),
            FixedOffset::east_opt(3600)
        );
        assert_eq!(
            parse_zone_offset("-0530"),
            FixedOffset::east_opt(-(5 * 3600 + 30 * 60))
        );
        assert_eq!(parse_zone_offset("0100"), None);
    }

    #[test]
    fn date_time_with_fallback_zone() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus1 = FixedOffset::east_opt(3600).unwrap();

        let dt = parse_date_time("20200101121530.250000+0100", utc).unwrap();
        assert_eq!(dt.offset(), &plus1);
        assert_eq!(dt.naive_local().to_string(), "2020-01-01 12:15:30.250");

        let dt = parse_date_time("20200101121530", plus1).unwrap();
        assert_eq!(dt.offset(), &plus1);

        let dt = parse_date_time("2020", utc).unwrap();
        assert_eq!(dt.naive_local().to_string(), "2020-01-01 00:00:00");
    }
}

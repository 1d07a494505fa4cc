// src/table/dates.rs
//
// Date handling for datetime-typed columns. Metadata declares formats with
// the tokens `YYYY`, `MM` and `[Q]Q`; quarters are rewritten textually into
// their ending month before parsing, so `2020-Q3` parses as 2020-09.

use chrono::{DateTime, NaiveDate};

/// Quarter token -> ending month of that quarter.
const QUARTER_MONTHS: [(&str, &str); 4] =
    [("Q1", "03"), ("Q2", "06"), ("Q3", "09"), ("Q4", "12")];

/// Replace quarter tokens in a raw cell value with the quarter's ending
/// month, e.g. `2020-Q1` -> `2020-03`. Values without a quarter token pass
/// through unchanged.
pub fn substitute_quarters(raw: &str) -> String {
    QUARTER_MONTHS
        .iter()
        .fold(raw.to_string(), |acc, (token, month)| acc.replace(token, month))
}

/// Map a metadata format string onto strftime directives: `YYYY` -> `%Y`,
/// `MM` -> `%m`, `DD` -> `%d`, and `[Q]Q` -> `%m` (the quarter digit has
/// already been rewritten into a two-digit month by [`substitute_quarters`]).
pub fn strftime_format(descriptor_format: &str) -> String {
    descriptor_format
        .replace("YYYY", "%Y")
        .replace("MM", "%m")
        .replace("DD", "%d")
        .replace("[Q]Q", "%m")
}

/// Parse a (possibly partial) date against a strftime-style format limited
/// to `%Y`, `%m` and `%d` plus literal separators. Missing month and day
/// default to 1, so `2020-05` with `%Y-%m` is 2020-05-01.
pub fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let mut pos = 0usize;
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;

    let mut directives = format.chars();
    while let Some(c) = directives.next() {
        if c == '%' {
            match directives.next()? {
                'Y' => year = Some(take_digits(bytes, &mut pos, 4)? as i32),
                'm' => month = Some(take_digits(bytes, &mut pos, 2)?),
                'd' => day = Some(take_digits(bytes, &mut pos, 2)?),
                _ => return None,
            }
        } else {
            if !c.is_ascii() || pos >= bytes.len() || bytes[pos] != c as u8 {
                return None;
            }
            pos += 1;
        }
    }
    if pos != bytes.len() {
        return None;
    }
    NaiveDate::from_ymd_opt(year?, month.unwrap_or(1), day.unwrap_or(1))
}

fn take_digits(bytes: &[u8], pos: &mut usize, n: usize) -> Option<u32> {
    let end = pos.checked_add(n)?;
    if end > bytes.len() || !bytes[*pos..end].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let parsed = std::str::from_utf8(&bytes[*pos..end]).ok()?.parse().ok()?;
    *pos = end;
    Some(parsed)
}

/// Midnight of `date` as epoch milliseconds, the storage representation of
/// datetime columns.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Render stored epoch milliseconds back as a calendar date.
pub fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarters_become_ending_months() {
        assert_eq!(substitute_quarters("2020-Q1"), "2020-03");
        assert_eq!(substitute_quarters("2020-Q3"), "2020-09");
        assert_eq!(substitute_quarters("1999-Q4"), "1999-12");
        assert_eq!(substitute_quarters("2020-05"), "2020-05");
    }

    #[test]
    fn format_tokens_map_to_strftime() {
        assert_eq!(strftime_format("YYYY-MM"), "%Y-%m");
        assert_eq!(strftime_format("YYYY-[Q]Q"), "%Y-%m");
        assert_eq!(strftime_format("YYYY-MM-DD"), "%Y-%m-%d");
    }

    #[test]
    fn partial_dates_default_month_and_day() {
        let d = parse_date("2020-05", "%Y-%m").unwrap();
        assert_eq!((d.format("%Y-%m-%d").to_string()), "2020-05-01");
        let d = parse_date("2020", "%Y").unwrap();
        assert_eq!(d.to_string(), "2020-01-01");
    }

    #[test]
    fn quarter_value_parses_to_ending_month() {
        let substituted = substitute_quarters("2020-Q3");
        let d = parse_date(&substituted, &strftime_format("YYYY-[Q]Q")).unwrap();
        assert_eq!(d.to_string(), "2020-09-01");
    }

    #[test]
    fn full_dates_parse() {
        let d = parse_date("2021-12-31", "%Y-%m-%d").unwrap();
        assert_eq!(d.to_string(), "2021-12-31");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(parse_date("2020/05", "%Y-%m").is_none());
        assert!(parse_date("20-05", "%Y-%m").is_none());
        assert!(parse_date("2020-13", "%Y-%m").is_none());
        assert!(parse_date("2020-05-extra", "%Y-%m").is_none());
        assert!(parse_date("abcd-ef", "%Y-%m").is_none());
    }

    #[test]
    fn millis_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2020, 9, 1).unwrap();
        assert_eq!(format_millis(date_to_millis(d)), "2020-09-01");
    }
}

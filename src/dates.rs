/// Post timestamps in US Pacific time (`America/Los_Angeles`).
///
/// Posts give a local date and time of day, resolved against the tz database
/// so historical daylight-saving rules apply. A local time that falls in the
/// spring-forward gap keeps the standard offset in force just before the
/// jump; one in the repeated autumn hour is read as daylight time.
use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::America::Los_Angeles;
use chrono_tz::{OffsetComponents, Tz};

const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";
const RFC822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, thiserror::Error)]
#[error("invalid date `{input}`: {source}")]
pub struct DateError {
    input: String,
    #[source]
    source: chrono::ParseError,
}

/// A post timestamp with its Pacific offset resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostDate {
    instant: DateTime<Utc>,
    local: NaiveDateTime,
    daylight: bool,
}

impl PostDate {
    /// Parse `YYYY-MM-DD` plus `HH:MM` as Pacific local time.
    pub fn parse(date: &str, time: &str) -> Result<Self, DateError> {
        let input = format!("{} {}", date.trim(), time.trim());
        let local = NaiveDateTime::parse_from_str(&input, INPUT_FORMAT)
            .map_err(|source| DateError { input, source })?;
        Ok(Self::from_local(local))
    }

    pub fn from_local(local: NaiveDateTime) -> Self {
        let (instant, daylight) = match Los_Angeles.from_local_datetime(&local).earliest() {
            Some(dt) => (dt.with_timezone(&Utc), is_daylight(&dt)),
            None => {
                // Spring-forward gap
                let before = local - TimeDelta::hours(1);
                match Los_Angeles.from_local_datetime(&before).earliest() {
                    Some(dt) => (
                        (dt + TimeDelta::hours(1)).with_timezone(&Utc),
                        is_daylight(&dt),
                    ),
                    None => (Utc.from_utc_datetime(&local), false),
                }
            }
        };
        PostDate {
            instant,
            local,
            daylight,
        }
    }

    /// Pacific wall-clock time for an instant.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        let pacific = instant.with_timezone(&Los_Angeles);
        PostDate {
            instant,
            local: pacific.naive_local(),
            daylight: is_daylight(&pacific),
        }
    }

    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn zone_abbreviation(&self) -> &'static str {
        if self.daylight { "PDT" } else { "PST" }
    }

    /// `March 3rd, 2024 at 9:05 AM PST`
    pub fn display(&self) -> String {
        let day = self.local.day();
        format!(
            "{} {}{}, {} at {} {}",
            self.local.format("%B"),
            day,
            ordinal_suffix(day),
            self.local.year(),
            self.local.format("%-I:%M %p"),
            self.zone_abbreviation()
        )
    }

    /// RFC 822 timestamp in GMT, as RSS expects.
    pub fn rfc822_utc(&self) -> String {
        self.instant.format(RFC822_FORMAT).to_string()
    }

    /// Local calendar date, `YYYY-MM-DD`.
    pub fn w3c_date(&self) -> String {
        self.local.format("%Y-%m-%d").to_string()
    }
}

pub fn rfc822_now() -> String {
    Utc::now().format(RFC822_FORMAT).to_string()
}

fn is_daylight(dt: &DateTime<Tz>) -> bool {
    dt.offset().dst_offset() != TimeDelta::zero()
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (10..=20).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_time_display() {
        let date = PostDate::parse("2024-03-03", "09:05").unwrap();
        assert_eq!(date.display(), "March 3rd, 2024 at 9:05 AM PST");
        assert_eq!(date.rfc822_utc(), "Sun, 03 Mar 2024 17:05:00 GMT");
        assert_eq!(date.w3c_date(), "2024-03-03");
    }

    #[test]
    fn test_daylight_time_display() {
        let date = PostDate::parse("2024-07-22", "18:30").unwrap();
        assert_eq!(date.display(), "July 22nd, 2024 at 6:30 PM PDT");
        assert_eq!(date.rfc822_utc(), "Tue, 23 Jul 2024 01:30:00 GMT");
    }

    #[test]
    fn test_midnight_and_teens() {
        let date = PostDate::parse("2023-12-11", "00:00").unwrap();
        assert_eq!(date.display(), "December 11th, 2023 at 12:00 AM PST");
    }

    #[test]
    fn test_transition_boundaries() {
        // 2024: DST starts March 10, ends November 3
        assert!(!PostDate::parse("2024-03-10", "01:59").unwrap().daylight);
        assert!(!PostDate::parse("2024-03-10", "02:30").unwrap().daylight);
        assert!(PostDate::parse("2024-03-10", "03:00").unwrap().daylight);
        assert!(PostDate::parse("2024-11-03", "01:30").unwrap().daylight);
        assert!(!PostDate::parse("2024-11-03", "02:00").unwrap().daylight);
    }

    #[test]
    fn test_pre_2007_rules() {
        // 2006: DST ran from April 2 to October 29
        let spring = PostDate::parse("2006-03-20", "12:00").unwrap();
        assert_eq!(spring.display(), "March 20th, 2006 at 12:00 PM PST");
        assert_eq!(spring.rfc822_utc(), "Mon, 20 Mar 2006 20:00:00 GMT");
        assert!(PostDate::parse("2006-04-03", "12:00").unwrap().daylight);
        assert!(PostDate::parse("2006-10-28", "12:00").unwrap().daylight);
        assert!(!PostDate::parse("2006-10-30", "12:00").unwrap().daylight);
    }

    #[test]
    fn test_gap_time_keeps_wall_clock() {
        let date = PostDate::parse("2024-03-10", "02:30").unwrap();
        assert_eq!(date.display(), "March 10th, 2024 at 2:30 AM PST");
        assert_eq!(date.rfc822_utc(), "Sun, 10 Mar 2024 10:30:00 GMT");
    }

    #[test]
    fn test_from_utc_round_trips_local_time() {
        let date = PostDate::parse("2024-07-22", "18:30").unwrap();
        assert_eq!(PostDate::from_utc(date.instant()), date);
        let winter = PostDate::parse("2024-01-05", "23:15").unwrap();
        assert_eq!(PostDate::from_utc(winter.instant()), winter);
    }

    #[test]
    fn test_invalid_date() {
        let err = PostDate::parse("someday", "00:00").unwrap_err();
        assert!(err.to_string().starts_with("invalid date `someday 00:00`"));
    }

    #[test]
    fn test_ordinals() {
        let suffixes: Vec<&str> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31]
            .into_iter()
            .map(ordinal_suffix)
            .collect();
        assert_eq!(
            suffixes,
            ["st", "nd", "rd", "th", "th", "th", "th", "st", "nd", "rd", "st"]
        );
    }
}

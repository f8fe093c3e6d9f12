//! # Date/time formatting
//!
//! [`DateTimeService`] renders timestamps for display in the board's time
//! zone. [`DateTimeServiceExt`] adds formatting of loosely typed values (as
//! found in page data and cached rows): anything that does not convert to a
//! timestamp renders as [`FORMAT_ERROR`] instead of failing the page.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Rendered in place of a value that is not a timestamp.
pub const FORMAT_ERROR: &str = "[error]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTimeFormat {
    #[default]
    Both,
    BothDateShort,
    BothTopic,
    DateLong,
    DateShort,
    Time,
}

pub trait DateTimeService: Send + Sync {
    fn format_date_time(&self, value: DateTime<Utc>) -> String;
    fn format_date_time_short(&self, value: DateTime<Utc>) -> String;
    /// Relative rendering for topic lists ("Today, 14:05").
    fn format_date_time_topic(&self, value: DateTime<Utc>) -> String;
    fn format_date_long(&self, value: DateTime<Utc>) -> String;
    fn format_date_short(&self, value: DateTime<Utc>) -> String;
    fn format_time(&self, value: DateTime<Utc>) -> String;
}

pub trait DateTimeServiceExt: DateTimeService {
    /// Formats `value` as `kind`, or [`FORMAT_ERROR`] if it is not a timestamp.
    fn format_value(&self, kind: DateTimeFormat, value: &Value) -> String {
        let Some(value) = to_date_time(value) else {
            return FORMAT_ERROR.to_string();
        };

        match kind {
            DateTimeFormat::Both => self.format_date_time(value),
            DateTimeFormat::BothDateShort => self.format_date_time_short(value),
            DateTimeFormat::BothTopic => self.format_date_time_topic(value),
            DateTimeFormat::DateLong => self.format_date_long(value),
            DateTimeFormat::DateShort => self.format_date_short(value),
            DateTimeFormat::Time => self.format_time(value),
        }
    }
}

impl<T: DateTimeService + ?Sized> DateTimeServiceExt for T {}

/// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` and integer
/// Unix seconds.
pub fn to_date_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|dt| dt.and_utc())
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// The minimal date time suitable for the database (1903-01-01 UTC).
pub fn sql_db_min_time() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1903, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Error, Debug)]
#[error("invalid date format '{0}'")]
pub struct InvalidDateFormat(pub String);

/// strftime patterns, one per [`DateTimeFormat`] flavour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormats {
    pub date_short: String,
    pub date_long: String,
    pub time: String,
    pub date_time: String,
    pub date_time_short: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            date_short: "%Y-%m-%d".into(),
            date_long: "%A, %B %-d, %Y".into(),
            time: "%H:%M".into(),
            date_time: "%B %-d, %Y %H:%M".into(),
            date_time_short: "%Y-%m-%d %H:%M".into(),
        }
    }
}

impl DateFormats {
    fn validate(&self) -> Result<(), InvalidDateFormat> {
        for pattern in [
            &self.date_short,
            &self.date_long,
            &self.time,
            &self.date_time,
            &self.date_time_short,
        ] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(InvalidDateFormat(pattern.clone()));
            }
        }
        Ok(())
    }
}

/// Board-wide formatter with a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct BoardDateTime {
    offset: FixedOffset,
    formats: DateFormats,
}

impl BoardDateTime {
    /// Offsets outside ±24h fall back to UTC.
    pub fn new(utc_offset_minutes: i32, formats: DateFormats) -> Result<Self, InvalidDateFormat> {
        formats.validate()?;
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Ok(Self { offset, formats })
    }

    fn render(&self, value: DateTime<Utc>, pattern: &str) -> String {
        value.with_timezone(&self.offset).format(pattern).to_string()
    }

    /// [`DateTimeService::format_date_time_topic`] against an explicit "now".
    pub fn format_date_time_topic_at(&self, value: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let day = value.with_timezone(&self.offset).date_naive();
        let today = now.with_timezone(&self.offset).date_naive();
        let time = self.render(value, &self.formats.time);

        if day == today {
            format!("Today, {time}")
        } else if today.pred_opt() == Some(day) {
            format!("Yesterday, {time}")
        } else {
            self.render(value, &self.formats.date_time)
        }
    }
}

impl Default for BoardDateTime {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            formats: DateFormats::default(),
        }
    }
}

impl DateTimeService for BoardDateTime {
    fn format_date_time(&self, value: DateTime<Utc>) -> String {
        self.render(value, &self.formats.date_time)
    }

    fn format_date_time_short(&self, value: DateTime<Utc>) -> String {
        self.render(value, &self.formats.date_time_short)
    }

    fn format_date_time_topic(&self, value: DateTime<Utc>) -> String {
        self.format_date_time_topic_at(value, Utc::now())
    }

    fn format_date_long(&self, value: DateTime<Utc>) -> String {
        self.render(value, &self.formats.date_long)
    }

    fn format_date_short(&self, value: DateTime<Utc>) -> String {
        self.render(value, &self.formats.date_short)
    }

    fn format_time(&self, value: DateTime<Utc>) -> String {
        self.render(value, &self.formats.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn formats_each_kind() {
        let service = BoardDateTime::default();
        let value = json!("2024-03-05T14:07:00Z");

        assert_eq!(service.format_value(DateTimeFormat::DateShort, &value), "2024-03-05");
        assert_eq!(service.format_value(DateTimeFormat::DateLong, &value), "Tuesday, March 5, 2024");
        assert_eq!(service.format_value(DateTimeFormat::Time, &value), "14:07");
        assert_eq!(service.format_value(DateTimeFormat::Both, &value), "March 5, 2024 14:07");
        assert_eq!(service.format_value(DateTimeFormat::BothDateShort, &value), "2024-03-05 14:07");
    }

    #[test]
    fn unconvertible_values_render_the_sentinel() {
        let service = BoardDateTime::default();
        for value in [json!("yesterday-ish"), json!(null), json!(true), json!({"at": 1})] {
            assert_eq!(service.format_value(DateTimeFormat::Both, &value), FORMAT_ERROR);
        }
    }

    #[test]
    fn accepts_database_and_unix_forms() {
        assert_eq!(to_date_time(&json!("2024-03-05 14:07:00")), Some(at(2024, 3, 5, 14, 7)));
        assert_eq!(to_date_time(&json!("2024-03-05")), Some(at(2024, 3, 5, 0, 0)));
        assert_eq!(to_date_time(&json!(0)), Some(at(1970, 1, 1, 0, 0)));
    }

    #[test]
    fn offset_shifts_the_rendered_time() {
        let service = BoardDateTime::new(90, DateFormats::default()).unwrap();
        assert_eq!(service.format_time(at(2024, 3, 5, 23, 0)), "00:30");
        assert_eq!(service.format_date_short(at(2024, 3, 5, 23, 0)), "2024-03-06");
    }

    #[test]
    fn topic_format_is_relative_to_now() {
        let service = BoardDateTime::default();
        let now = at(2024, 3, 5, 18, 0);

        assert_eq!(service.format_date_time_topic_at(at(2024, 3, 5, 9, 15), now), "Today, 09:15");
        assert_eq!(service.format_date_time_topic_at(at(2024, 3, 4, 22, 40), now), "Yesterday, 22:40");
        assert_eq!(
            service.format_date_time_topic_at(at(2024, 2, 29, 8, 0), now),
            "February 29, 2024 08:00"
        );
    }

    #[test]
    fn rejects_broken_patterns() {
        let formats = DateFormats {
            time: "%Q".into(),
            ..DateFormats::default()
        };
        assert!(BoardDateTime::new(0, formats).is_err());
    }

    #[test]
    fn min_database_time() {
        assert_eq!(sql_db_min_time(), at(1903, 1, 1, 0, 0));
    }

    #[test]
    fn works_through_trait_objects() {
        let service: Box<dyn DateTimeService> = Box::new(BoardDateTime::default());
        assert_eq!(service.format_value(DateTimeFormat::Time, &json!(3600)), "01:00");
    }
}

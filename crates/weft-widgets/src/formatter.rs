#![forbid(unsafe_code)]

//! Day-name formatting boundary.
//!
//! Locale-aware formatting lives outside weft. The week view only needs a
//! weekday label per column, so it talks to a [`DayNameFormatter`] and ships
//! [`EnglishDayNames`] as the default.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;

/// Width of a weekday label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DayNameFormat {
    /// One letter: `M`.
    Narrow,
    /// Abbreviation: `Mon`.
    #[default]
    Short,
    /// Full name: `Monday`.
    Long,
}

impl DayNameFormat {
    pub const ALL: [&'static str; 3] = ["narrow", "short", "long"];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "narrow" => Some(Self::Narrow),
            "short" => Some(Self::Short),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for DayNameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces the weekday label of a column header.
pub trait DayNameFormatter {
    fn day_name(&self, date: NaiveDate, format: DayNameFormat, locale: &str) -> String;
}

/// English weekday names. Ignores the locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishDayNames;

impl DayNameFormatter for EnglishDayNames {
    fn day_name(&self, date: NaiveDate, format: DayNameFormat, _locale: &str) -> String {
        let long = long_name(date.weekday());
        match format {
            DayNameFormat::Long => long.to_owned(),
            DayNameFormat::Short => long[..3].to_owned(),
            DayNameFormat::Narrow => long[..1].to_owned(),
        }
    }
}

fn long_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_widths() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let f = EnglishDayNames;
        assert_eq!(f.day_name(monday, DayNameFormat::Long, "en-US"), "Monday");
        assert_eq!(f.day_name(monday, DayNameFormat::Short, "en-US"), "Mon");
        assert_eq!(f.day_name(monday, DayNameFormat::Narrow, "de-DE"), "M");
    }

    #[test]
    fn parse_round_trips_names() {
        for name in DayNameFormat::ALL {
            assert_eq!(DayNameFormat::parse(name).map(DayNameFormat::as_str), Some(name));
        }
        assert_eq!(DayNameFormat::parse("tiny"), None);
    }
}

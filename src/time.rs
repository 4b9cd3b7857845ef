use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = Error;

    /// Accepts the full English name or its three-letter abbreviation, in any case.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Day::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_lowercase();
                name == key || name[..3] == key
            })
            .ok_or_else(|| Error::UnknownDay(s.to_string()))
    }
}

/// A wall-clock time with minute resolution, ordered by (hour, minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<TimeOfDay> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidInput(format!(
                "time {}:{} is out of range",
                hour, minute
            )));
        }
        Ok(TimeOfDay { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    /// Parses `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|e| Error::InvalidInput(format!("invalid time {:?}: {}", s, e)))?;
        TimeOfDay::new(time.hour() as u8, time.minute() as u8)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Half-open interval test: `[a_start, a_end)` against `[b_start, b_end)`.
/// Intervals that only touch at an endpoint do not overlap.
pub fn overlaps(a_start: TimeOfDay, a_end: TimeOfDay, b_start: TimeOfDay, b_end: TimeOfDay) -> bool {
    a_start.max(b_start) < a_end.min(b_end)
}

/// A distinct (start, end) pair, used as the row axis of a timetable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeSlot {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> TimeSlot {
        TimeSlot { start, end }
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_time() {
        let time = t("09:05");
        assert_eq!(time.hour(), 9);
        assert_eq!(time.minute(), 5);
        assert_eq!(time.to_string(), "09:05");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("9h30".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_time_ordering() {
        assert!(t("09:59") < t("10:00"));
        assert!(t("10:00") < t("10:01"));
        assert_eq!(t("10:00").max(t("08:30")), t("10:00"));
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        assert!(!overlaps(t("09:00"), t("10:00"), t("10:00"), t("11:00")));
        assert!(!overlaps(t("10:00"), t("11:00"), t("09:00"), t("10:00")));
    }

    #[test]
    fn test_overlap() {
        assert!(overlaps(t("09:00"), t("10:00"), t("09:30"), t("10:30")));
        assert!(overlaps(t("09:00"), t("12:00"), t("10:00"), t("11:00")));
        assert!(overlaps(t("09:00"), t("10:00"), t("09:00"), t("10:00")));
    }

    #[test]
    fn test_parse_day() {
        assert_eq!("monday".parse::<Day>().unwrap(), Day::Monday);
        assert_eq!("Thu".parse::<Day>().unwrap(), Day::Thursday);
        assert_eq!(" SUNDAY ".parse::<Day>().unwrap(), Day::Sunday);
        match "  Funday".parse::<Day>() {
            Err(Error::UnknownDay(input)) => assert_eq!(input, "  Funday"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_time_serde() {
        let slot = TimeSlot::new(t("08:00"), t("09:30"));
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(json, r#"{"start":"08:00","end":"09:30"}"#);
        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
        assert!(serde_json::from_str::<TimeOfDay>(r#""25:00""#).is_err());
    }

    fn time() -> impl Strategy<Value = TimeOfDay> {
        (0u8..24, 0u8..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in time(), b in time(), c in time(), d in time()) {
            prop_assert_eq!(overlaps(a, b, c, d), overlaps(c, d, a, b));
        }

        #[test]
        fn ordering_matches_minutes(a in time(), b in time()) {
            prop_assert_eq!(a.cmp(&b), a.minutes_since_midnight().cmp(&b.minutes_since_midnight()));
        }
    }
}

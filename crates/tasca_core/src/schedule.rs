//! Weekly opening schedule model and point-in-time evaluation.
//!
//! # Responsibility
//! - Define the strict `WeeklySchedule` shape persisted as `schedule_json`.
//! - Answer "is it open" for a wall-clock instant, including ranges that
//!   cross midnight.
//! - Render a day's ranges for display.
//!
//! # Invariants
//! - Day keys are exactly `sun|mon|tue|wed|thu|fri|sat`; anything else is
//!   rejected at deserialization.
//! - Times are `H:MM` or `HH:MM`, 24-hour clock. `24:00` is accepted as an
//!   end-of-day marker.
//! - A range with `end < start` spans midnight into the early hours of the
//!   same day's entry. The previous day's entry is never consulted.
//! - An absent day and an empty range list both mean closed.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time-of-day regex"));

const MINUTES_PER_HOUR: u16 = 60;
const END_OF_DAY_MINUTES: u16 = 24 * MINUTES_PER_HOUR;
const RANGE_SEPARATOR: &str = "\u{2013}";

/// Schedule parse/validation error.
#[derive(Debug)]
pub enum ScheduleError {
    /// Time text is not a valid `HH:MM` value.
    InvalidTime(String),
    /// Day key is not one of `sun..sat`.
    UnknownDay(String),
    /// Persisted JSON could not be decoded into a schedule.
    Json(serde_json::Error),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTime(value) => write!(f, "invalid schedule time `{value}`"),
            Self::UnknownDay(value) => write!(f, "unknown schedule day `{value}`"),
            Self::Json(err) => write!(f, "invalid schedule json: {err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Three-letter lowercase weekday key used by the persisted schedule.
///
/// Ordering follows weekday index: Sunday is 0, Saturday is 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayKey {
    /// All day keys indexed by weekday number (0 = Sunday).
    pub const ALL: [DayKey; 7] = [
        DayKey::Sun,
        DayKey::Mon,
        DayKey::Tue,
        DayKey::Wed,
        DayKey::Thu,
        DayKey::Fri,
        DayKey::Sat,
    ];

    /// Maps a chrono weekday to its schedule key.
    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }

    /// Parses an exact lowercase key (`"mon"`).
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
        }
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time of day stored as minutes since midnight (0..=1440).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Builds a time from hour/minute components.
    ///
    /// Returns `None` for out-of-range components. `24:00` is allowed.
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes >= MINUTES_PER_HOUR {
            return None;
        }
        let total = hours.checked_mul(MINUTES_PER_HOUR)?.checked_add(minutes)?;
        if total > END_OF_DAY_MINUTES {
            return None;
        }
        Some(Self(total))
    }

    /// Parses `H:MM` / `HH:MM` text.
    pub fn parse(value: &str) -> Result<Self, ScheduleError> {
        let invalid = || ScheduleError::InvalidTime(value.to_string());
        let caps = TIME_OF_DAY_RE.captures(value.trim()).ok_or_else(invalid)?;
        let hours = caps[1].parse::<u16>().map_err(|_| invalid())?;
        let minutes = caps[2].parse::<u16>().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }

    /// Minutes elapsed since midnight.
    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}",
            self.0 / MINUTES_PER_HOUR,
            self.0 % MINUTES_PER_HOUR
        )
    }
}

/// One opening interval, serialized as `["HH:MM", "HH:MM"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parses both endpoints from text.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Ok(Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?))
    }

    /// Whether this range continues past midnight.
    pub fn spans_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Inclusive containment check for minutes since midnight.
    pub fn contains(&self, minutes: u16) -> bool {
        let start = self.start.minutes();
        let end = self.end.minutes();
        if self.spans_midnight() {
            minutes >= start || minutes <= end
        } else {
            minutes >= start && minutes <= end
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{RANGE_SEPARATOR}{}", self.start, self.end)
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start.to_string(), self.end.to_string()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(String, String)>::deserialize(deserializer)?;
        TimeRange::parse(&start, &end).map_err(D::Error::custom)
    }
}

/// Day-keyed mapping to ordered opening ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    days: BTreeMap<DayKey, Vec<TimeRange>>,
}

impl WeeklySchedule {
    /// Creates a schedule closed on every day.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`WeeklySchedule::set_day`].
    pub fn with_day(mut self, day: DayKey, ranges: Vec<TimeRange>) -> Self {
        self.set_day(day, ranges);
        self
    }

    /// Replaces the ranges of one day. An empty list keeps the key (closed).
    pub fn set_day(&mut self, day: DayKey, ranges: Vec<TimeRange>) {
        self.days.insert(day, ranges);
    }

    /// Ranges for one day; empty when absent.
    pub fn ranges_for(&self, day: DayKey) -> &[TimeRange] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Day keys present in the mapping, including explicitly closed days.
    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.days.keys().copied()
    }

    /// Whether no day has any range.
    pub fn is_always_closed(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    /// Decodes the persisted `schedule_json` representation.
    pub fn from_json(raw: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encodes to the persisted `schedule_json` representation.
    pub fn to_json(&self) -> Result<String, ScheduleError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses the line-oriented submission format.
    ///
    /// One line per day, e.g. `mon:12:00-15:00,19:00-22:00`. The day key is
    /// the first three letters of the line's label, lower-cased. Blank lines
    /// are ignored, `sun:` marks a closed day and ranges missing an endpoint
    /// are dropped. Malformed times and unknown days are rejected.
    pub fn parse_text(input: &str) -> Result<Self, ScheduleError> {
        let mut schedule = Self::new();
        for line in input.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let (label, ranges_text) = line.split_once(':').unwrap_or((line, ""));
            let normalized: String = label.trim().chars().take(3).collect::<String>();
            let day = DayKey::parse(&normalized.to_lowercase())
                .ok_or_else(|| ScheduleError::UnknownDay(label.trim().to_string()))?;

            let mut ranges = Vec::new();
            for slot in ranges_text.split(',').map(str::trim) {
                let Some((start, end)) = slot.split_once('-') else {
                    continue;
                };
                let (start, end) = (start.trim(), end.trim());
                if start.is_empty() || end.is_empty() {
                    continue;
                }
                ranges.push(TimeRange::parse(start, end)?);
            }
            schedule.set_day(day, ranges);
        }
        Ok(schedule)
    }
}

/// Returns whether any of the instant's weekday ranges contains it.
///
/// Only the instant's own weekday entry is evaluated; an overnight range
/// from the previous day does not keep the place open after midnight.
pub fn is_open(schedule: &WeeklySchedule, at: NaiveDateTime) -> bool {
    let today = todays_schedule(schedule, at);
    if today.is_empty() {
        return false;
    }
    let minutes = minutes_since_midnight(at);
    today.iter().any(|range| range.contains(minutes))
}

/// Returns the ranges listed for the instant's weekday.
pub fn todays_schedule(schedule: &WeeklySchedule, at: NaiveDateTime) -> &[TimeRange] {
    schedule.ranges_for(DayKey::from_weekday(at.weekday()))
}

/// Renders ranges as `"12:00–15:00, 19:00–22:00"`.
pub fn format_schedule_range(ranges: &[TimeRange]) -> String {
    ranges
        .iter()
        .map(TimeRange::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn minutes_since_midnight(at: NaiveDateTime) -> u16 {
    // hour() <= 23 and minute() <= 59, so the product fits in u16.
    (at.hour() * 60 + at.minute()) as u16
}

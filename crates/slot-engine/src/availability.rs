//! Recurring weekly availability and its projection onto concrete dates.
//!
//! An [`AvailabilityConfig`] maps a weekday index (0 = Monday .. 6 = Sunday) to the
//! time-of-day windows during which work may be placed. Windows within a weekday should be
//! sorted and non-overlapping; the projector neither merges nor reorders them, and the
//! free-slot solver processes each window on its own.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::interval::Interval;

/// A time-of-day window, e.g. 09:00–17:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Window from whole hours, e.g. `TimeWindow::hours_opt(9, 17)`.
    ///
    /// Returns `None` if either hour is above 23.
    pub fn hours_opt(start_hour: u32, end_hour: u32) -> Option<Self> {
        let start = NaiveTime::from_hms_opt(start_hour, 0, 0)?;
        let end = NaiveTime::from_hms_opt(end_hour, 0, 0)?;
        Some(Self::new(start, end))
    }

    /// Combine the window with a calendar date.
    pub fn on(&self, date: NaiveDate) -> Interval {
        Interval::new(date.and_time(self.start), date.and_time(self.end))
    }
}

/// Weekday-indexed recurring availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityConfig {
    windows: BTreeMap<u8, Vec<TimeWindow>>,
}

impl AvailabilityConfig {
    pub fn new(windows: BTreeMap<u8, Vec<TimeWindow>>) -> Self {
        Self { windows }
    }

    /// The same single window on every listed weekday.
    pub fn uniform(weekdays: impl IntoIterator<Item = u8>, window: TimeWindow) -> Self {
        Self::new(weekdays.into_iter().map(|wd| (wd, vec![window])).collect())
    }

    /// Append a window to a weekday, keeping configured order.
    pub fn add_window(&mut self, weekday: u8, window: TimeWindow) -> &mut Self {
        self.windows.entry(weekday).or_default().push(window);
        self
    }

    pub fn windows_for_weekday(&self, weekday: u8) -> &[TimeWindow] {
        self.windows.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no weekday carries any window, so nothing can ever be projected.
    pub fn is_empty(&self) -> bool {
        self.windows.values().all(Vec::is_empty)
    }

    /// Project the configured windows for `date`'s weekday onto `date`.
    ///
    /// Returns them in configured order; a weekday without configuration yields nothing.
    pub fn windows_for_date(&self, date: NaiveDate) -> Vec<Interval> {
        let weekday = date.weekday().num_days_from_monday() as u8;
        self.windows_for_weekday(weekday)
            .iter()
            .map(|w| w.on(date))
            .collect()
    }

    /// Reject weekday indices outside 0..=6 and windows whose end is not after their start.
    pub fn validate(&self) -> Result<()> {
        for (&weekday, windows) in &self.windows {
            if weekday > 6 {
                return Err(SlotError::InvalidWeekday(weekday));
            }
            if let Some(w) = windows.iter().find(|w| w.end <= w.start) {
                return Err(SlotError::InvalidWindow {
                    weekday,
                    start: w.start,
                    end: w.end,
                });
            }
        }
        Ok(())
    }
}

/// `HH:MM` / `HH:MM:SS` (de)serialization for times of day.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| de::Error::custom(format!("invalid time of day: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_json_accepts_short_and_long_forms() {
        let w: TimeWindow = serde_json::from_str(r#"{"start":"09:00","end":"17:30:00"}"#).unwrap();
        assert_eq!(w.start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(w.end, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
        assert!(serde_json::from_str::<TimeWindow>(r#"{"start":"9am","end":"10:00"}"#).is_err());
    }

    #[test]
    fn hours_opt_rejects_out_of_range_hours() {
        let w = TimeWindow::hours_opt(9, 17).unwrap();
        assert_eq!(w.start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(w.end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(TimeWindow::hours_opt(9, 24), None);
        assert_eq!(TimeWindow::hours_opt(25, 10), None);
    }

    #[test]
    fn config_json_uses_string_weekday_keys() {
        let cfg: AvailabilityConfig =
            serde_json::from_str(r#"{"0":[{"start":"09:00","end":"12:00"}],"4":[]}"#).unwrap();
        assert_eq!(cfg.windows_for_weekday(0).len(), 1);
        assert!(cfg.windows_for_weekday(4).is_empty());
        assert!(cfg.windows_for_weekday(6).is_empty());
    }
}

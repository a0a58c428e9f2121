use crate::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SLOT_HOUR_MIN: u8 = 8;
pub const SLOT_HOUR_MAX: u8 = 19;

/// A bookable reservation slot: a calendar date plus an on-the-hour time
/// within opening hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(deny_unknown_fields)]
pub struct SlotTime {
    pub date: NaiveDate,
    pub hour: u8,
}

impl SlotTime {
    pub fn new(date: NaiveDate, hour: u8) -> Result<Self, ValidationError> {
        if !(SLOT_HOUR_MIN..=SLOT_HOUR_MAX).contains(&hour) {
            return Err(ValidationError(format!(
                "slot hour must be within {SLOT_HOUR_MIN}..={SLOT_HOUR_MAX}"
            )));
        }
        Ok(Self { date, hour })
    }

    /// Accepts `"YYYY-MM-DD"` and either `"HH:00"` or a bare hour.
    pub fn parse(date: &str, hour: &str) -> Result<Self, ValidationError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError("date must be YYYY-MM-DD".to_string()))?;
        let hour_text = hour.trim();
        let hour_text = hour_text.strip_suffix(":00").unwrap_or(hour_text);
        let hour = hour_text
            .parse::<u8>()
            .map_err(|_| ValidationError("hour must be HH or HH:00".to_string()))?;
        Self::new(date, hour)
    }

    /// Storage form of the time component, `HH:00`.
    #[must_use]
    pub fn hour_string(&self) -> String {
        format!("{:02}:00", self.hour)
    }

    #[must_use]
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl Display for SlotTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date_string(), self.hour_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_parses_both_hour_forms() {
        let a = SlotTime::parse("2026-09-01", "14:00").expect("parse");
        let b = SlotTime::parse("2026-09-01", "14").expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.hour_string(), "14:00");
        assert_eq!(a.to_string(), "2026-09-01 14:00");
    }

    #[test]
    fn slot_rejects_out_of_hours_and_bad_dates() {
        assert!(SlotTime::parse("2026-09-01", "7").is_err());
        assert!(SlotTime::parse("2026-09-01", "20:00").is_err());
        assert!(SlotTime::parse("01/09/2026", "10").is_err());
        assert!(SlotTime::parse("2026-13-01", "10").is_err());
    }
}

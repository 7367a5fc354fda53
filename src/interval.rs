// src/interval.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Month length used to keep `day_interval` in step with `month_interval`.
pub const DAYS_PER_MONTH: i64 = 30;

/// Largest month or day offset a cell may hold. Anything beyond is read as
/// malformed.
pub const MAX_OFFSET: i64 = 1_000_000_000_000;

/// Granularity a donor's dates are recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Day,
    Month,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Day => "day",
            Resolution::Month => "month",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Resolution::Day),
            "month" => Ok(Resolution::Month),
            other => Err(format!("unknown date resolution '{}'", other)),
        }
    }
}

/// An offset from the reference epoch (the anchor diagnosis), in months and
/// optionally in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub month_interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_interval: Option<i64>,
}

impl DateInterval {
    /// The anchor interval `{month_interval: 0, day_interval: 0}`.
    pub const ZERO: DateInterval = DateInterval {
        month_interval: 0,
        day_interval: Some(0),
    };

    pub fn new(month_interval: i64, day_interval: Option<i64>) -> Self {
        DateInterval { month_interval, day_interval }
    }

    /// Month offset with the matching day offset filled in.
    pub fn from_months(months: i64) -> Self {
        DateInterval::new(months, Some(months.saturating_mul(DAYS_PER_MONTH)))
    }

    pub fn has_day(&self) -> bool {
        self.day_interval.is_some()
    }

    pub fn is_zero(&self) -> bool {
        self.month_interval == 0 && self.day_interval.unwrap_or(0) == 0
    }

    /// Parse a table cell. Accepts the Python literal form written by the
    /// generator tooling (`{'month_interval': 20, 'day_interval': 600}`) as
    /// well as plain JSON. Empty or malformed cells give `None`.
    pub fn parse(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if trimmed.is_empty() || !trimmed.starts_with('{') {
            return None;
        }
        let value: Value = serde_json::from_str(&trimmed.replace('\'', "\"")).ok()?;
        let obj = value.as_object()?;
        let month_interval = whole_number(obj.get("month_interval")?)?;
        let day_interval = match obj.get("day_interval") {
            None | Some(Value::Null) => None,
            Some(v) => Some(whole_number(v)?),
        };
        Some(DateInterval { month_interval, day_interval })
    }

    /// Add `delta` months (or days at day resolution). A result that would
    /// be negative becomes the zero interval; one that does not fit an `i64`
    /// leaves the interval unchanged.
    pub fn shift(self, delta: i64, resolution: Resolution) -> Self {
        match resolution {
            Resolution::Month => {
                let Some(months) = self.month_interval.checked_add(delta) else {
                    return self;
                };
                if months < 0 {
                    return self.zeroed();
                }
                let day_interval = match self.day_interval {
                    Some(_) => match months.checked_mul(DAYS_PER_MONTH) {
                        Some(days) => Some(days),
                        None => return self,
                    },
                    None => None,
                };
                DateInterval { month_interval: months, day_interval }
            }
            Resolution::Day => {
                let Some(days) = self
                    .day_interval
                    .or_else(|| self.month_interval.checked_mul(DAYS_PER_MONTH))
                    .and_then(|d| d.checked_add(delta))
                else {
                    return self;
                };
                if days < 0 {
                    return DateInterval::ZERO;
                }
                DateInterval {
                    month_interval: days.div_euclid(DAYS_PER_MONTH),
                    day_interval: Some(days),
                }
            }
        }
    }

    fn zeroed(self) -> Self {
        DateInterval {
            month_interval: 0,
            day_interval: self.day_interval.map(|_| 0),
        }
    }

    /// Render in the cell form the rest of the toolchain reads back.
    pub fn to_cell(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day_interval {
            Some(day) => write!(
                f,
                "{{'month_interval': {}, 'day_interval': {}}}",
                self.month_interval, day
            ),
            None => write!(f, "{{'month_interval': {}}}", self.month_interval),
        }
    }
}

fn whole_number(value: &Value) -> Option<i64> {
    let n = match value.as_i64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if !f.is_finite() || f.fract() != 0.0 || f.abs() > MAX_OFFSET as f64 {
                return None;
            }
            f as i64
        }
    };
    (-MAX_OFFSET..=MAX_OFFSET).contains(&n).then_some(n)
}

/// Month component of a cell, `None` when the cell is empty or malformed.
pub fn month_of(cell: &str) -> Option<i64> {
    DateInterval::parse(cell).map(|i| i.month_interval)
}

/// Shift the interval held in `cell`. Malformed or empty cells come back
/// unchanged.
pub fn shift_cell(cell: &str, delta: i64, resolution: Resolution) -> String {
    match DateInterval::parse(cell) {
        Some(interval) => interval.shift(delta, resolution).to_cell(),
        None => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_and_json_forms() {
        let py = DateInterval::parse("{'month_interval': 20, 'day_interval': 600}");
        assert_eq!(py, Some(DateInterval::new(20, Some(600))));

        let json = DateInterval::parse(r#"{"month_interval": 7}"#);
        assert_eq!(json, Some(DateInterval::new(7, None)));

        let float = DateInterval::parse("{'month_interval': 3.0, 'day_interval': 90.0}");
        assert_eq!(float, Some(DateInterval::new(3, Some(90))));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(DateInterval::parse(""), None);
        assert_eq!(DateInterval::parse("   "), None);
        assert_eq!(DateInterval::parse("twenty"), None);
        assert_eq!(DateInterval::parse("{'day_interval': 600}"), None);
        assert_eq!(DateInterval::parse("{'month_interval': 'x'}"), None);
        assert_eq!(DateInterval::parse("{'month_interval': 2.5}"), None);
        assert_eq!(month_of("nan"), None);
    }

    #[test]
    fn test_huge_offsets_are_malformed() {
        assert_eq!(DateInterval::parse("{'month_interval': 1e300, 'day_interval': 0}"), None);
        assert_eq!(DateInterval::parse("{'month_interval': 9223372036854775807}"), None);
        assert_eq!(DateInterval::parse("{'month_interval': 1, 'day_interval': -9223372036854775808}"), None);

        let cell = "{'month_interval': 1e300, 'day_interval': 0}";
        assert_eq!(shift_cell(cell, 1, Resolution::Month), cell);
        assert_eq!(shift_cell(cell, 1, Resolution::Day), cell);
        assert_eq!(month_of(cell), None);
    }

    #[test]
    fn test_shift_overflow_leaves_interval_unchanged() {
        let max = DateInterval::new(i64::MAX, Some(0));
        assert_eq!(max.shift(1, Resolution::Month), max);
        assert_eq!(max.shift(-1, Resolution::Month), max);

        let no_day = DateInterval::new(i64::MAX, None);
        assert_eq!(no_day.shift(1, Resolution::Day), no_day);
        assert_eq!(no_day.shift(-1, Resolution::Month), DateInterval::new(i64::MAX - 1, None));
    }

    #[test]
    fn test_negative_birth_offsets_parse() {
        let birth = DateInterval::parse("{'month_interval': -700, 'day_interval': -21292}").unwrap();
        assert_eq!(birth.month_interval, -700);
        assert_eq!(birth.day_interval, Some(-21292));
    }

    #[test]
    fn test_shift_by_month_recomputes_days() {
        let i = DateInterval::new(25, Some(750));
        assert_eq!(i.shift(-10, Resolution::Month), DateInterval::new(15, Some(450)));

        let no_day = DateInterval::new(4, None);
        assert_eq!(no_day.shift(3, Resolution::Month), DateInterval::new(7, None));
    }

    #[test]
    fn test_shift_by_day() {
        let i = DateInterval::new(1, Some(45));
        assert_eq!(i.shift(20, Resolution::Day), DateInterval::new(2, Some(65)));

        let no_day = DateInterval::new(2, None);
        assert_eq!(no_day.shift(-15, Resolution::Day), DateInterval::new(1, Some(45)));
    }

    #[test]
    fn test_shift_never_negative() {
        for start in [0_i64, 1, 5, 30, 120] {
            for delta in [-500_i64, -31, -1, 0, 1, 17] {
                let m = DateInterval::from_months(start).shift(delta, Resolution::Month);
                assert!(m.month_interval >= 0, "month went negative for {start}{delta:+}");
                assert!(m.day_interval.unwrap() >= 0);

                let d = DateInterval::from_months(start).shift(delta, Resolution::Day);
                assert!(d.month_interval >= 0 && d.day_interval.unwrap() >= 0);
            }
        }
        assert_eq!(DateInterval::new(3, Some(90)).shift(-4, Resolution::Month), DateInterval::ZERO);
        assert_eq!(DateInterval::new(3, None).shift(-4, Resolution::Month), DateInterval::new(0, None));
    }

    #[test]
    fn test_cell_helpers() {
        assert_eq!(month_of("{'month_interval': 42, 'day_interval': 1260}"), Some(42));
        assert_eq!(shift_cell("", 5, Resolution::Month), "");
        assert_eq!(shift_cell("garbage", 5, Resolution::Month), "garbage");
        assert_eq!(
            shift_cell("{'month_interval': 1, 'day_interval': 30}", 5, Resolution::Month),
            "{'month_interval': 6, 'day_interval': 180}"
        );
    }

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("Day".parse::<Resolution>(), Ok(Resolution::Day));
        assert_eq!(" month ".parse::<Resolution>(), Ok(Resolution::Month));
        assert!("week".parse::<Resolution>().is_err());
    }
}

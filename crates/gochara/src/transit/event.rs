use crate::search::Interval;
use crate::transit::condition::{HouseRef, SignRef};
use crate::transit::rule::{Category, RuleId};
use chrono::TimeZone;
use serde::Serialize;
use std::fmt;

const ROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One discovered interval of one rule instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub category: Category,
    pub rule: RuleId,
    pub rule_label: String,
    pub body: String,
    pub interval: Interval,
    pub sign: SignRef,
    pub house: HouseRef,
    pub window: String,
    pub description: String,
}

/// Flat output row with times in the caller's timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub category: Category,
    pub rule: String,
    pub body: String,
    pub start: String,
    pub end: String,
    pub sign: SignRef,
    pub house: HouseRef,
    pub window: String,
    pub description: String,
}

impl Event {
    pub fn to_row<Tz>(&self, tz: &Tz) -> EventRow
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        EventRow {
            category: self.category,
            rule: self.rule_label.clone(),
            body: self.body.clone(),
            start: self
                .interval
                .start
                .with_timezone(tz)
                .format(ROW_TIME_FORMAT)
                .to_string(),
            end: self
                .interval
                .end
                .with_timezone(tz)
                .format(ROW_TIME_FORMAT)
                .to_string(),
            sign: self.sign,
            house: self.house,
            window: self.window.clone(),
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vedic::Sign;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_row_uses_caller_timezone() {
        let event = Event {
            category: Category::Expense,
            rule: RuleId::Loss5,
            rule_label: "Loss #5".to_string(),
            body: "Mercury/Mars".to_string(),
            interval: Interval {
                start: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 1, 3, 6, 15, 0).unwrap(),
            },
            sign: SignRef::Pair(Sign::Taurus, Sign::Sagittarius),
            house: HouseRef::Pair(2, 9),
            window: "6/8 Relation".to_string(),
            description: "6L (Mercury) and 8L (Mars) in 6/8 relationship → EXPENSE".to_string(),
        };
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let row = event.to_row(&ist);
        assert_eq!(row.start, "2024-01-02 01:30");
        assert_eq!(row.end, "2024-01-03 11:45");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["category"], "Expense");
        assert_eq!(json["sign"], "Taurus / Sagittarius");
        assert_eq!(json["house"], "2 / 9");
    }

    #[test]
    fn test_single_house_is_numeric() {
        let json = serde_json::to_value(HouseRef::Single(11)).unwrap();
        assert_eq!(json, serde_json::json!(11));
    }
}

use crate::ephemeris::Body;
use crate::muhurtha::evaluator::MuhurthaMoment;
use crate::muhurtha::grade::Grade;
use crate::vedic::dms_short;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

const ROW_TIME_FORMAT: &str = "%I:%M %p";
const ROW_DATE_FORMAT: &str = "%a, %d %b";

/// A run of consecutive passing moments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuhurthaWindow {
    pub start: DateTime<Utc>,
    /// First failing instant, or the end of the scanned day.
    pub end: DateTime<Utc>,
    /// Earliest moment with the highest score.
    pub best: MuhurthaMoment,
    pub scores: Vec<u8>,
}

impl MuhurthaWindow {
    pub fn open(moment: MuhurthaMoment) -> Self {
        Self {
            start: moment.instant,
            end: moment.instant,
            scores: vec![moment.score()],
            best: moment,
        }
    }

    pub fn extend(&mut self, moment: MuhurthaMoment) {
        self.scores.push(moment.score());
        self.end = moment.instant;
        if moment.score() > self.best.score() {
            self.best = moment;
        }
    }

    pub fn close(mut self, end: DateTime<Utc>) -> Self {
        self.end = end;
        self
    }

    pub fn best_score(&self) -> u8 {
        self.best.score()
    }

    pub fn grade(&self) -> Grade {
        self.best.grade
    }

    /// Mean score, rounded to two places.
    pub fn average_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.scores.iter().map(|s| *s as u32).sum();
        let mean = sum as f64 / self.scores.len() as f64;
        (mean * 100.0).round() / 100.0
    }

    /// Whole minutes, truncated.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn duration_label(&self) -> String {
        let minutes = self.duration_minutes();
        if minutes < 60 {
            format!("{} min", minutes)
        } else {
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
    }

    pub fn to_row<Tz>(&self, activity: &str, tz: &Tz) -> WindowRow
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let start = self.start.with_timezone(tz);
        let ascendant = &self.best.ascendant;
        WindowRow {
            activity: activity.to_string(),
            date: start.format(ROW_DATE_FORMAT).to_string(),
            start: start.format(ROW_TIME_FORMAT).to_string(),
            end: self.end.with_timezone(tz).format(ROW_TIME_FORMAT).to_string(),
            duration: self.duration_label(),
            best_score: self.best_score(),
            grade: self.grade().label().to_string(),
            average_score: self.average_score(),
            rules_pass: self.best.rules_pass,
            ascendant: format!("{} {}", ascendant.sign(), dms_short(ascendant.degree())),
            lagna_lord: self.best.lagna_lord,
        }
    }
}

/// Flat output row with times in the caller's timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub activity: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub best_score: u8,
    pub grade: String,
    pub average_score: f64,
    pub rules_pass: u8,
    pub ascendant: String,
    pub lagna_lord: Body,
}

use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::calendar::parse_date_string;

/// Plan days in display order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// Upper bound on how many days a single entry may mark busy.
const MAX_ENTRY_SPAN_DAYS: usize = 366;

pub fn day_name(day: Weekday) -> &'static str {
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

/// One scheduled item in the weekly plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlanEntry {
    pub fn new(task: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            task_id: None,
            start: start.into(),
            end: end.into(),
            completed: false,
            notes: None,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        leading_date(&self.start)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        leading_date(&self.end)
    }

    /// Every calendar date the entry covers. An unreadable or earlier end
    /// collapses the range to the start date.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let Some(start) = self.start_date() else {
            return Vec::new();
        };
        let end = self.end_date().filter(|end| *end >= start).unwrap_or(start);
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .take(MAX_ENTRY_SPAN_DAYS)
            .collect()
    }
}

// Accepts both "2026-10-19" and "2026-10-19T09:00".
fn leading_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    parse_date_string(head).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub monday: Vec<PlanEntry>,
    #[serde(default)]
    pub tuesday: Vec<PlanEntry>,
    #[serde(default)]
    pub wednesday: Vec<PlanEntry>,
    #[serde(default)]
    pub thursday: Vec<PlanEntry>,
    #[serde(default)]
    pub friday: Vec<PlanEntry>,
    #[serde(default)]
    pub saturday: Vec<PlanEntry>,
    #[serde(default)]
    pub sunday: Vec<PlanEntry>,
}

impl WeeklyPlan {
    pub fn day(&self, day: Weekday) -> &[PlanEntry] {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut Vec<PlanEntry> {
        match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[PlanEntry])> {
        WEEK.into_iter().map(move |day| (day, self.day(day)))
    }

    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.iter().flat_map(|(_, entries)| entries.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another plan's entries after the existing ones, day by day.
    pub fn append(&mut self, other: WeeklyPlan) {
        let WeeklyPlan {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        } = other;
        self.monday.extend(monday);
        self.tuesday.extend(tuesday);
        self.wednesday.extend(wednesday);
        self.thursday.extend(thursday);
        self.friday.extend(friday);
        self.saturday.extend(saturday);
        self.sunday.extend(sunday);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&PlanEntry) -> bool) {
        for day in WEEK {
            self.day_mut(day).retain(|entry| keep(entry));
        }
    }

    /// Dates touched by at least one entry, for marking the month grid.
    pub fn busy_days(&self) -> HashSet<NaiveDate> {
        self.entries().flat_map(PlanEntry::dates).collect()
    }
}

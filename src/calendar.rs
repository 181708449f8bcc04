use crate::models::Activity;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Weekday};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

/// Every date shown by a month grid: whole Sunday-to-Saturday weeks
/// covering `month` (1-based) of `year`.
pub fn generate_calendar_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidYear(year))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or(CalendarError::InvalidYear(year))?;

    let start = first
        .checked_sub_days(Days::new(u64::from(first.weekday().num_days_from_sunday())))
        .ok_or(CalendarError::InvalidYear(year))?;
    let end = last
        .checked_add_days(Days::new(u64::from(6 - last.weekday().num_days_from_sunday())))
        .ok_or(CalendarError::InvalidYear(year))?;

    Ok(start.iter_days().take_while(|day| *day <= end).collect())
}

pub fn generate_week_days(start: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take(7).collect()
}

/// Sunday of the week containing `date`. Saturates at `NaiveDate::MIN`.
pub fn get_week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MIN)
}

/// `YYYY-MM-DD` from the calendar fields of `datetime` in its own zone.
pub fn format_local_date<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String {
    date_key(datetime.date_naive())
}

pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Strict `YYYY-MM-DD` with a four-digit year; signed or extended years are rejected.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| (1..=9999).contains(&date.year()))
}

pub fn activities_on<'a>(activities: &'a [Activity], date: NaiveDate) -> Vec<&'a Activity> {
    let key = date_key(date);
    activities
        .iter()
        .filter(|activity| activity.date == key)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Month,
    Week,
}

impl ViewMode {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("week") {
            ViewMode::Week
        } else {
            ViewMode::Month
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Month => "month",
            ViewMode::Week => "week",
        }
    }
}

/// Which range the scheduler shows. Month anchors are the 1st of the
/// month, week anchors are a Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub mode: ViewMode,
    pub anchor: NaiveDate,
}

impl CalendarCursor {
    pub fn new(mode: ViewMode, date: NaiveDate) -> Self {
        let anchor = match mode {
            ViewMode::Month => date.with_day(1).unwrap_or(date),
            ViewMode::Week => get_week_start(date),
        };
        Self { mode, anchor }
    }

    pub fn prev(self) -> Self {
        match self.mode {
            ViewMode::Month => Self::new(
                self.mode,
                self.anchor
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(self.anchor),
            ),
            ViewMode::Week => Self::new(
                self.mode,
                self.anchor.checked_sub_days(Days::new(7)).unwrap_or(self.anchor),
            ),
        }
    }

    pub fn next(self) -> Self {
        match self.mode {
            ViewMode::Month => Self::new(
                self.mode,
                self.anchor
                    .checked_add_months(Months::new(1))
                    .unwrap_or(self.anchor),
            ),
            ViewMode::Week => Self::new(
                self.mode,
                self.anchor.checked_add_days(Days::new(7)).unwrap_or(self.anchor),
            ),
        }
    }

    pub fn today(self, today: NaiveDate) -> Self {
        Self::new(self.mode, today)
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        match self.mode {
            ViewMode::Month => generate_calendar_days(self.anchor.year(), self.anchor.month())
                .unwrap_or_else(|_| generate_week_days(get_week_start(self.anchor))),
            ViewMode::Week => generate_week_days(self.anchor),
        }
    }

    /// First and last date rendered.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        let days = self.days();
        let first = days.first().copied().unwrap_or(self.anchor);
        let last = days.last().copied().unwrap_or(self.anchor);
        (first, last)
    }

    pub fn title(&self) -> String {
        match self.mode {
            ViewMode::Month => self.anchor.format("%B %Y").to_string(),
            ViewMode::Week => {
                let end = self.anchor.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                format!("{} - {}", self.anchor.format("%b %-d"), end.format("%b %-d, %Y"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: String,
    pub day: u32,
    pub weekday: String,
    pub in_month: bool,
    pub is_today: bool,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub mode: ViewMode,
    pub title: String,
    pub anchor: String,
    pub prev: String,
    pub next: String,
    pub weeks: Vec<Vec<DayCell>>,
}

impl CalendarView {
    pub fn cell(&self, date: &str) -> Option<&DayCell> {
        self.weeks.iter().flatten().find(|cell| cell.date == date)
    }
}

/// Buckets `activities` onto the cells of the cursor's range.
pub fn build_view(cursor: CalendarCursor, today: NaiveDate, activities: &[Activity]) -> CalendarView {
    let mut by_date: HashMap<&str, Vec<&Activity>> = HashMap::new();
    for activity in activities {
        by_date.entry(activity.date.as_str()).or_default().push(activity);
    }

    let cells: Vec<DayCell> = cursor
        .days()
        .into_iter()
        .map(|date| {
            let key = date_key(date);
            let mut day_activities: Vec<Activity> = by_date
                .get(key.as_str())
                .map(|found| found.iter().map(|activity| (*activity).clone()).collect())
                .unwrap_or_default();
            day_activities.sort_by(|a, b| a.start_time.cmp(&b.start_time));
            DayCell {
                in_month: cursor.mode == ViewMode::Week || date.month() == cursor.anchor.month(),
                is_today: date == today,
                day: date.day(),
                weekday: weekday_label(date.weekday()).to_string(),
                date: key,
                activities: day_activities,
            }
        })
        .collect();

    CalendarView {
        mode: cursor.mode,
        title: cursor.title(),
        anchor: date_key(cursor.anchor),
        prev: date_key(cursor.prev().anchor),
        next: date_key(cursor.next().anchor),
        weeks: cells.chunks(7).map(<[DayCell]>::to_vec).collect(),
    }
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

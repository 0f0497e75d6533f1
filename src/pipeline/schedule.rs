//! Which windows the scheduled driver runs on a given day.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{
    is_month_end, is_sunday, leftover_weekly_range_for_month_end, monthly_window, weekly_window,
};
use crate::correlation::Window;

/// A single window run decided by [`plan_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedRun {
    Weekly { today: NaiveDate },
    LeftoverWeekly {
        start: NaiveDate,
        end: NaiveDate,
        processing_date: NaiveDate,
    },
    Monthly { today: NaiveDate },
}

impl PlannedRun {
    pub fn window(&self) -> Window {
        match *self {
            PlannedRun::Weekly { today } => {
                let (start, end) = weekly_window(today);
                Window::week(start, end, today)
            }
            PlannedRun::LeftoverWeekly {
                start,
                end,
                processing_date,
            } => Window::week(start, end, processing_date),
            PlannedRun::Monthly { today } => {
                let (start, end) = monthly_window(today);
                Window::month(start, end, today)
            }
        }
    }
}

/// Sundays run the trailing week. Month ends run the days after the last
/// Sunday (when there are any) and then the whole month.
pub fn plan_for(today: NaiveDate) -> Vec<PlannedRun> {
    let mut runs = Vec::new();

    if is_sunday(today) {
        runs.push(PlannedRun::Weekly { today });
    }

    if is_month_end(today) {
        if let Some((start, end)) = leftover_weekly_range_for_month_end(today) {
            runs.push(PlannedRun::LeftoverWeekly {
                start,
                end,
                processing_date: today,
            });
        }
        runs.push(PlannedRun::Monthly { today });
    }

    runs
}

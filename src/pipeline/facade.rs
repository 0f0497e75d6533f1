//! Public entry points for the weekly, monthly, and backfill runs.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::correlation::Window;
use crate::error::Result;
use crate::pipeline::processor::WindowProcessor;
use crate::pipeline::schedule::{PlannedRun, plan_for};
use crate::store::CorrelationStore;

/// What one window run wrote, for logging and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub window: Window,
    pub written: usize,
}

pub struct PearsonPipeline<S> {
    store: S,
    processor: WindowProcessor,
}

impl<S: CorrelationStore> PearsonPipeline<S> {
    pub fn new(store: S, city_id: i64, location_id: i64) -> Self {
        Self {
            store,
            processor: WindowProcessor::new(city_id, location_id),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Trailing week ending at `today`, clamped to `today`'s month.
    pub fn run_weekly(&mut self, today: NaiveDate) -> Result<usize> {
        self.run(&PlannedRun::Weekly { today })
    }

    /// Week-labelled run over explicit bounds, used to backfill leftover days.
    pub fn run_weekly_custom(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        processing_date: NaiveDate,
    ) -> Result<usize> {
        self.run(&PlannedRun::LeftoverWeekly {
            start,
            end,
            processing_date,
        })
    }

    /// The whole calendar month containing `today`.
    pub fn run_monthly(&mut self, today: NaiveDate) -> Result<usize> {
        self.run(&PlannedRun::Monthly { today })
    }

    pub fn run(&mut self, planned: &PlannedRun) -> Result<usize> {
        self.run_window(&planned.window())
    }

    pub fn run_window(&mut self, window: &Window) -> Result<usize> {
        self.processor.process_range(&mut self.store, window)
    }

    /// Runs everything [`plan_for`] schedules on `today`, in order.
    ///
    /// Stops at the first window that fails; earlier windows stay committed.
    pub fn run_schedule(&mut self, today: NaiveDate) -> Result<Vec<RunSummary>> {
        let plan = plan_for(today);
        if plan.is_empty() {
            info!(%today, "Nothing scheduled today");
        }

        let mut summaries = Vec::with_capacity(plan.len());
        for planned in plan {
            let window = planned.window();
            let written = self.run_window(&window)?;
            summaries.push(RunSummary { window, written });
        }
        Ok(summaries)
    }
}

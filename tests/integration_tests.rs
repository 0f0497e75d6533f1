use airweather::correlation::Classification;
use airweather::pipeline::PearsonPipeline;
use airweather::store::SqliteStore;
use chrono::{Datelike, Days, NaiveDate};
use rusqlite::params;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    pipeline: PearsonPipeline<SqliteStore>,
    linear_metric: i64,
    flat_metric: i64,
    agg_location: i64,
}

/// October 2025 for Jakarta: pm25 tracks temperature exactly, pm10 never moves.
fn october_fixture() -> Fixture {
    let store = SqliteStore::open_in_memory().unwrap();
    store.init_schema().unwrap();
    let (city_id, station) = store.register_location("Jakarta", "JKT_DKI1").unwrap();
    let (_, agg_location) = store.register_location("Jakarta", "CITY_AGG_JKT").unwrap();
    let linear_metric = store.add_metric("suhu_avg", "pm25").unwrap();
    let flat_metric = store.add_metric("kelembapan_avg", "pm10").unwrap();

    let conn = store.connection();
    let mut day = date(2025, 10, 1);
    while day.month() == 10 {
        let x = day.day() as f64;
        for (code, value) in [("suhu_avg", 25.0 + x * 0.3), ("kelembapan_avg", 60.0 + x)] {
            conn.execute(
                "INSERT INTO weather_observation (location_id, weatherobs_date, weatherattr_id, weatherobs_value)
                 SELECT ?1, ?2, weatherattr_id, ?3 FROM weather_attribute WHERE weatherattr_code = ?4",
                params![station, day, value, code],
            )
            .unwrap();
        }
        for (code, value) in [("pm25", 2.0 * x + 1.0), ("pm10", 40.0)] {
            conn.execute(
                "INSERT INTO pollutant_observation (location_id, pollobs_date, pollutantattr_id, pollobs_value)
                 SELECT ?1, ?2, pollutantattr_id, ?3 FROM pollutant_attribute WHERE pollutantattr_code = ?4",
                params![station, day, value, code],
            )
            .unwrap();
        }
        day = day + Days::new(1);
    }

    Fixture {
        pipeline: PearsonPipeline::new(store, city_id, agg_location),
        linear_metric,
        flat_metric,
        agg_location,
    }
}

#[test]
fn test_monthly_run_classifies_each_metric() {
    let mut fx = october_fixture();

    let written = fx.pipeline.run_monthly(date(2025, 10, 31)).unwrap();
    assert_eq!(written, 2);

    let results = fx.pipeline.store().results_for_period("MONTH_202510").unwrap();
    assert_eq!(results.len(), 2);

    let linear = &results[0];
    assert_eq!(linear.metric_id, fx.linear_metric);
    assert_eq!(linear.location_id, fx.agg_location);
    assert_eq!(linear.classification, Classification::Stable);
    assert_eq!(linear.sample_count, 31);
    assert_eq!(linear.processing_date, date(2025, 10, 31));

    let flat = &results[1];
    assert_eq!(flat.metric_id, fx.flat_metric);
    assert_eq!(flat.classification, Classification::Inconclusive);
    assert_eq!(flat.sample_count, 31);
}

#[test]
fn test_rerunning_a_window_replaces_rather_than_duplicates() {
    let mut fx = october_fixture();

    fx.pipeline.run_monthly(date(2025, 10, 15)).unwrap();
    fx.pipeline.run_monthly(date(2025, 10, 31)).unwrap();

    let results = fx.pipeline.store().results_for_period("MONTH_202510").unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.processing_date == date(2025, 10, 31)));

    let total: i64 = fx
        .pipeline
        .store()
        .connection()
        .query_row("SELECT COUNT(*) FROM correlation_result", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn test_sunday_weekly_run_uses_trailing_seven_days() {
    let mut fx = october_fixture();

    let written = fx.pipeline.run_weekly(date(2025, 10, 26)).unwrap();
    assert_eq!(written, 2);

    let results = fx
        .pipeline
        .store()
        .results_for_period("WEEK_2025-10-20_2025-10-26")
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].classification, Classification::Stable);
    assert_eq!(results[0].sample_count, 7);
}

#[test]
fn test_weekly_run_clamps_to_month_start() {
    let mut fx = october_fixture();

    fx.pipeline.run_weekly(date(2025, 10, 3)).unwrap();

    // three days is below the weekly sample gate
    let results = fx
        .pipeline
        .store()
        .results_for_period("WEEK_2025-10-01_2025-10-03")
        .unwrap();
    assert_eq!(results[0].sample_count, 3);
    assert_eq!(results[0].classification, Classification::Inconclusive);
}

#[test]
fn test_month_end_schedule_runs_leftover_then_month() {
    let mut fx = october_fixture();

    let summaries = fx.pipeline.run_schedule(date(2025, 10, 31)).unwrap();
    assert_eq!(summaries.len(), 2);

    let leftover = &summaries[0];
    assert_eq!(leftover.window.period_label, "WEEK_2025-10-27_2025-10-31");
    assert_eq!(leftover.window.start, date(2025, 10, 27));
    assert_eq!(leftover.window.end, date(2025, 10, 31));
    assert_eq!(leftover.written, 2);

    let month = &summaries[1];
    assert_eq!(month.window.period_label, "MONTH_202510");
    assert_eq!(month.written, 2);

    let leftover_rows = fx
        .pipeline
        .store()
        .results_for_period("WEEK_2025-10-27_2025-10-31")
        .unwrap();
    assert_eq!(leftover_rows[0].sample_count, 5);
    assert_eq!(leftover_rows[0].classification, Classification::Stable);
    assert_eq!(leftover_rows[0].processing_date, date(2025, 10, 31));
}

#[test]
fn test_custom_week_backfill() {
    let mut fx = october_fixture();

    let written = fx
        .pipeline
        .run_weekly_custom(date(2025, 10, 6), date(2025, 10, 12), date(2025, 11, 2))
        .unwrap();
    assert_eq!(written, 2);

    let results = fx
        .pipeline
        .store()
        .results_for_period("WEEK_2025-10-06_2025-10-12")
        .unwrap();
    assert_eq!(results[0].processing_date, date(2025, 11, 2));
}

#[test]
fn test_window_without_data_writes_nothing() {
    let mut fx = october_fixture();

    let written = fx.pipeline.run_monthly(date(2025, 12, 15)).unwrap();
    assert_eq!(written, 0);
    assert!(
        fx.pipeline
            .store()
            .results_for_period("MONTH_202512")
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_ordinary_weekday_schedule_is_empty() {
    let mut fx = october_fixture();
    assert!(fx.pipeline.run_schedule(date(2025, 10, 15)).unwrap().is_empty());
}

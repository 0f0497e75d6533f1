//! SQLite-backed [`CorrelationStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::debug;

use super::{CorrelationStore, WindowScope};
use crate::config::{POLLUTANT_CODES, WEATHER_RENAME};
use crate::correlation::{Classification, ClassificationResult, DailyAggregateRow};
use crate::error::StoreError;

const SCHEMA_SQL: &str = include_str!("schema.sql");

// The day series is the union of dates seen on either side, so a day with
// only weather or only pollutant data still produces a row. The city filter
// sits inside the averages for the same reason.
const DAILY_AGGREGATES_SQL: &str = "
    SELECT
        cm.corrmet_id,
        d.dt AS obs_date,
        AVG(CASE WHEN lw.city_id = ?3 THEN wo.weatherobs_value END) AS wx_val,
        AVG(CASE WHEN lp.city_id = ?3 THEN po.pollobs_value END) AS py_val
    FROM correlation_metrics cm
    JOIN (
        SELECT weatherobs_date AS dt
        FROM weather_observation
        WHERE weatherobs_date BETWEEN ?1 AND ?2
        UNION
        SELECT pollobs_date AS dt
        FROM pollutant_observation
        WHERE pollobs_date BETWEEN ?1 AND ?2
    ) d
    LEFT JOIN weather_observation wo
        ON wo.weatherattr_id = cm.weather_x
        AND wo.weatherobs_date = d.dt
    LEFT JOIN location lw
        ON lw.location_id = wo.location_id
    LEFT JOIN pollutant_observation po
        ON po.pollutantattr_id = cm.pollutant_y
        AND po.pollobs_date = d.dt
    LEFT JOIN location lp
        ON lp.location_id = po.location_id
    WHERE cm.is_active = 1
    GROUP BY cm.corrmet_id, d.dt
    ORDER BY cm.corrmet_id, d.dt";

// Re-running a window replaces the earlier row for the same key.
const INSERT_RESULT_SQL: &str = "
    INSERT INTO correlation_result
        (location_id, corrmet_id, period_name, processing_date, val_result, n_samples)
    SELECT ?1, ?2, ?3, ?4, cf.corrflag_id, ?6
    FROM correlation_flag cf
    WHERE cf.corrflag_desc = ?5
    ON CONFLICT (location_id, corrmet_id, period_name) DO UPDATE SET
        processing_date = excluded.processing_date,
        val_result = excluded.val_result,
        n_samples = excluded.n_samples";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Creates all tables and seeds flags and attribute codes. Safe to re-run.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;

        let mut flag = self
            .conn
            .prepare("INSERT OR IGNORE INTO correlation_flag (corrflag_desc) VALUES (?1)")?;
        for c in Classification::ALL {
            flag.execute([c.as_str()])?;
        }

        let mut weather = self
            .conn
            .prepare("INSERT OR IGNORE INTO weather_attribute (weatherattr_code) VALUES (?1)")?;
        for (_, code) in WEATHER_RENAME {
            weather.execute([code])?;
        }

        let mut pollutant = self.conn.prepare(
            "INSERT OR IGNORE INTO pollutant_attribute (pollutantattr_code) VALUES (?1)",
        )?;
        for code in POLLUTANT_CODES {
            pollutant.execute([code])?;
        }

        debug!("Schema initialised");
        Ok(())
    }

    /// Ensures the city and a location under it exist; returns `(city_id, location_id)`.
    pub fn register_location(
        &self,
        city_name: &str,
        location_code: &str,
    ) -> Result<(i64, i64), StoreError> {
        self.conn.execute(
            "INSERT INTO city (name)
             SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM city WHERE LOWER(name) = LOWER(?1))",
            [city_name],
        )?;
        let city_id: i64 = self.conn.query_row(
            "SELECT city_id FROM city WHERE LOWER(name) = LOWER(?1) LIMIT 1",
            [city_name],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO location (city_id, location_code) VALUES (?1, ?2)",
            params![city_id, location_code],
        )?;
        let location_id: i64 = self.conn.query_row(
            "SELECT location_id FROM location WHERE location_code = ?1",
            [location_code],
            |row| row.get(0),
        )?;

        Ok((city_id, location_id))
    }

    /// Defines an active correlation metric between two attribute codes.
    ///
    /// Returns the existing id when the pair is already defined.
    pub fn add_metric(
        &self,
        weather_code: &str,
        pollutant_code: &str,
    ) -> Result<i64, StoreError> {
        let weather_id: i64 = self.conn.query_row(
            "SELECT weatherattr_id FROM weather_attribute WHERE LOWER(weatherattr_code) = LOWER(?1)",
            [weather_code],
            |row| row.get(0),
        )?;
        let pollutant_id: i64 = self.conn.query_row(
            "SELECT pollutantattr_id FROM pollutant_attribute
             WHERE LOWER(pollutantattr_code) = LOWER(?1)",
            [pollutant_code],
            |row| row.get(0),
        )?;

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT corrmet_id FROM correlation_metrics WHERE weather_x = ?1 AND pollutant_y = ?2",
                params![weather_id, pollutant_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO correlation_metrics (weather_x, pollutant_y, is_active) VALUES (?1, ?2, 1)",
            params![weather_id, pollutant_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Stored results for one period label, ordered by metric id.
    pub fn results_for_period(
        &self,
        period_label: &str,
    ) -> Result<Vec<ClassificationResult>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT cr.location_id, cr.corrmet_id, cr.period_name, cr.processing_date,
                    cf.corrflag_desc, cr.n_samples
             FROM correlation_result cr
             JOIN correlation_flag cf ON cf.corrflag_id = cr.val_result
             WHERE cr.period_name = ?1
             ORDER BY cr.corrmet_id",
        )?;
        let rows = stmt.query_map([period_label], parse_result_row)?;
        let results = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }
}

fn parse_result_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClassificationResult> {
    let desc: String = row.get(4)?;
    let classification = desc.parse::<Classification>().map_err(|label| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown classification label '{label}'").into(),
        )
    })?;
    let n_samples: i64 = row.get(5)?;

    Ok(ClassificationResult {
        location_id: row.get(0)?,
        metric_id: row.get(1)?,
        period_label: row.get(2)?,
        processing_date: row.get(3)?,
        classification,
        sample_count: n_samples as usize,
    })
}

impl CorrelationStore for SqliteStore {
    type Scope<'a> = SqliteScope<'a>;

    fn begin(&mut self) -> Result<Self::Scope<'_>, StoreError> {
        Ok(SqliteScope {
            tx: self.conn.transaction()?,
        })
    }
}

/// A window's transaction. Dropping it uncommitted rolls back.
pub struct SqliteScope<'a> {
    tx: Transaction<'a>,
}

impl WindowScope for SqliteScope<'_> {
    fn fetch_daily_aggregates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        city_id: i64,
    ) -> Result<Vec<DailyAggregateRow>, StoreError> {
        let mut stmt = self.tx.prepare_cached(DAILY_AGGREGATES_SQL)?;
        let rows = stmt.query_map(params![start, end, city_id], |row| {
            Ok(DailyAggregateRow {
                metric_id: row.get(0)?,
                observation_date: row.get(1)?,
                weather_value: row.get(2)?,
                pollutant_value: row.get(3)?,
            })
        })?;
        let aggregates = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(aggregates)
    }

    fn insert_classification_result(
        &mut self,
        result: &ClassificationResult,
    ) -> Result<(), StoreError> {
        let label = result.classification.as_str();
        let changed = self.tx.execute(
            INSERT_RESULT_SQL,
            params![
                result.location_id,
                result.metric_id,
                result.period_label,
                result.processing_date,
                label,
                result.sample_count as i64,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownLabel(label.to_string()));
        }
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.commit()?)
    }
}

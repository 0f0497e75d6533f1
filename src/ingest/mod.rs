//! Loads daily weather and ISPU CSV files into the observation tables.
//!
//! Both files are validated, merged by date, gap-filled, and written in a
//! single transaction for the first location of the city named in the file
//! names. Moving files between incoming/archived/failed directories is left to
//! the caller.

pub mod transform;
pub mod validate;

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{POLLUTANT_CODES, REQUIRED_ISPU_COLS, REQUIRED_WEATHER_COLS, WEATHER_RENAME};
use crate::error::IngestError;
use transform::{ColumnMap, DailyRecord, fill_gaps, merge_outer_by_date};
use validate::{ensure_files_exist, infer_city_from_filename, validate_columns};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub city: String,
    pub city_id: i64,
    pub location_id: i64,
    pub merged_rows: usize,
    pub bad_date_rows: usize,
    pub weather_inserted: usize,
    pub pollutant_inserted: usize,
}

/// Runs the whole load for one weather/ISPU file pair under `incoming_dir`.
#[tracing::instrument(skip(conn, incoming_dir))]
pub fn run_ingest(
    conn: &mut Connection,
    incoming_dir: &Path,
    weather_csv: &str,
    ispu_csv: &str,
) -> Result<IngestReport, IngestError> {
    let (weather_path, ispu_path) = ensure_files_exist(incoming_dir, weather_csv, ispu_csv)?;

    let city_w = infer_city_from_filename(&weather_path)?;
    let city_i = infer_city_from_filename(&ispu_path)?;
    if !city_w.eq_ignore_ascii_case(&city_i) {
        return Err(IngestError::CityMismatch {
            weather: city_w,
            ispu: city_i,
        });
    }

    let weather_cols: Vec<(&str, &'static str)> = WEATHER_RENAME.to_vec();
    let pollutant_cols: Vec<(&str, &'static str)> =
        POLLUTANT_CODES.iter().map(|c| (*c, *c)).collect();

    let (weather, bad_w) = read_records(
        &weather_path,
        REQUIRED_WEATHER_COLS,
        "TANGGAL",
        &weather_cols,
    )?;
    let (ispu, bad_i) =
        read_records(&ispu_path, REQUIRED_ISPU_COLS, "tanggal", &pollutant_cols)?;

    let city_id = resolve_city_id(conn, &city_w)?;
    let location_id = resolve_location_id(conn, city_id)?;
    info!(city_id, location_id, city = %city_w, "Resolved city and location");

    let mut merged = merge_outer_by_date(weather, ispu);
    let codes: Vec<&'static str> = weather_cols
        .iter()
        .chain(pollutant_cols.iter())
        .map(|(_, code)| *code)
        .collect();
    fill_gaps(&mut merged, &codes);

    let bad_date_rows = bad_w + bad_i;
    if bad_date_rows > 0 {
        warn!(bad_date_rows, "Dropped rows with invalid dates");
    }
    info!(merged_rows = merged.len(), "Merged weather and ISPU rows");

    let tx = conn.transaction()?;
    let (weather_inserted, pollutant_inserted) = load_observations(&tx, location_id, &merged)?;
    tx.commit()?;

    info!(weather_inserted, pollutant_inserted, "Ingest completed");
    Ok(IngestReport {
        city: city_w,
        city_id,
        location_id,
        merged_rows: merged.len(),
        bad_date_rows,
        weather_inserted,
        pollutant_inserted,
    })
}

/// Reads every row of `path`; returns the parsed rows and the count of rows
/// dropped for an unparsable date.
fn read_records(
    path: &Path,
    required: &[&str],
    date_col: &str,
    columns: &[(&str, &'static str)],
) -> Result<(Vec<DailyRecord>, usize), IngestError> {
    let csv_err = |e| IngestError::Csv(path.to_path_buf(), e);

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();
    validate_columns(path, &headers, required)?;

    let map =
        ColumnMap::new(&headers, date_col, columns).ok_or_else(|| IngestError::MissingColumns {
            file: path.display().to_string(),
            missing: vec![date_col.to_string()],
        })?;

    let mut records = Vec::new();
    let mut bad = 0;
    for row in rdr.records() {
        let row = row.map_err(csv_err)?;
        match map.record(&row) {
            Some(rec) => records.push(rec),
            None => bad += 1,
        }
    }
    Ok((records, bad))
}

fn resolve_city_id(conn: &Connection, city_name: &str) -> Result<i64, IngestError> {
    conn.query_row(
        "SELECT city_id FROM city WHERE LOWER(name) = LOWER(?1) LIMIT 1",
        [city_name],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| IngestError::UnknownCity(city_name.to_string()))
}

fn resolve_location_id(conn: &Connection, city_id: i64) -> Result<i64, IngestError> {
    conn.query_row(
        "SELECT location_id FROM location WHERE city_id = ?1 ORDER BY location_id LIMIT 1",
        [city_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(IngestError::NoLocation(city_id))
}

fn attribute_ids(tx: &Transaction<'_>, sql: &str) -> Result<HashMap<String, i64>, IngestError> {
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(1)?.to_lowercase(), row.get::<_, i64>(0)?))
    })?;
    let ids = rows.collect::<Result<HashMap<_, _>, _>>()?;
    Ok(ids)
}

/// Inserts one observation per (row, known attribute), ignoring rows that
/// already exist. Values still missing after gap filling are stored as 0.
fn load_observations(
    tx: &Transaction<'_>,
    location_id: i64,
    rows: &[DailyRecord],
) -> Result<(usize, usize), IngestError> {
    let weather_ids = attribute_ids(
        tx,
        "SELECT weatherattr_id, weatherattr_code FROM weather_attribute",
    )?;
    let pollutant_ids = attribute_ids(
        tx,
        "SELECT pollutantattr_id, pollutantattr_code FROM pollutant_attribute",
    )?;

    let mut w_stmt = tx.prepare(
        "INSERT OR IGNORE INTO weather_observation
             (location_id, weatherobs_date, weatherattr_id, weatherobs_value)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut p_stmt = tx.prepare(
        "INSERT OR IGNORE INTO pollutant_observation
             (location_id, pollobs_date, pollutantattr_id, pollobs_value)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    let (mut weather, mut pollutant) = (0, 0);
    for row in rows {
        for (code, value) in &row.values {
            let value = value.unwrap_or(0.0);
            if let Some(attr) = weather_ids.get(*code) {
                weather += w_stmt.execute(params![location_id, row.date, attr, value])?;
            } else if let Some(attr) = pollutant_ids.get(*code) {
                pollutant += p_stmt.execute(params![location_id, row.date, attr, value])?;
            }
        }
    }
    Ok((weather, pollutant))
}

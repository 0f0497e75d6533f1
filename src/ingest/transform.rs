//! Row parsing, missing-value normalisation, outer merge, and gap filling.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

/// Sentinels the source files use for "no reading".
const SPECIAL_MISSING: &[&str] = &["8888", "9999", "-999", "-9999", "na", "n/a", "null", "none"];

/// One dated row of measurements keyed by canonical attribute code.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub values: BTreeMap<&'static str, Option<f64>>,
}

/// `None` for blanks and special missing markers, the trimmed text otherwise.
pub fn normalize_missing(raw: &str) -> Option<&str> {
    let v = raw.trim();
    if v.is_empty() || SPECIAL_MISSING.iter().any(|m| m.eq_ignore_ascii_case(v)) {
        None
    } else {
        Some(v)
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    normalize_missing(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, or a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let v = normalize_missing(raw)?;
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Maps source columns to codes by header position.
pub struct ColumnMap {
    date_idx: usize,
    columns: Vec<(usize, &'static str)>,
}

impl ColumnMap {
    /// `None` if the date column is absent; absent value columns are ignored.
    pub fn new(
        headers: &StringRecord,
        date_col: &str,
        columns: &[(&str, &'static str)],
    ) -> Option<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        Some(Self {
            date_idx: position(date_col)?,
            columns: columns
                .iter()
                .filter_map(|(col, code)| Some((position(col)?, *code)))
                .collect(),
        })
    }

    /// `None` when the date does not parse.
    pub fn record(&self, row: &StringRecord) -> Option<DailyRecord> {
        let date = parse_date(row.get(self.date_idx)?)?;
        let values = self
            .columns
            .iter()
            .map(|(idx, code)| (*code, row.get(*idx).and_then(parse_number)))
            .collect();
        Some(DailyRecord { date, values })
    }
}

/// Full outer join on date, sorted by date.
///
/// Several rows on the same date from both sides combine pairwise; a date
/// present on one side only keeps that side's values.
pub fn merge_outer_by_date(left: Vec<DailyRecord>, right: Vec<DailyRecord>) -> Vec<DailyRecord> {
    let mut by_date: BTreeMap<NaiveDate, (Vec<DailyRecord>, Vec<DailyRecord>)> = BTreeMap::new();
    for rec in left {
        by_date.entry(rec.date).or_default().0.push(rec);
    }
    for rec in right {
        by_date.entry(rec.date).or_default().1.push(rec);
    }

    let mut merged = Vec::new();
    for (_, (ls, rs)) in by_date {
        match (ls.is_empty(), rs.is_empty()) {
            (false, true) => merged.extend(ls),
            (true, false) => merged.extend(rs),
            _ => {
                for l in &ls {
                    for r in &rs {
                        let mut values = l.values.clone();
                        values.extend(r.values.iter().map(|(k, v)| (*k, *v)));
                        merged.push(DailyRecord {
                            date: l.date,
                            values,
                        });
                    }
                }
            }
        }
    }
    merged
}

/// Forward-fills then back-fills each code across the date-ordered rows.
pub fn fill_gaps(rows: &mut [DailyRecord], codes: &[&'static str]) {
    for &code in codes {
        let mut last = None;
        for row in rows.iter_mut() {
            match row.values.get(&code).copied().flatten() {
                Some(v) => last = Some(v),
                None => {
                    row.values.insert(code, last);
                }
            }
        }
        let mut next = None;
        for row in rows.iter_mut().rev() {
            match row.values.get(&code).copied().flatten() {
                Some(v) => next = Some(v),
                None => {
                    row.values.insert(code, next);
                }
            }
        }
    }
}

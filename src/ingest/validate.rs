//! File and column checks run before any CSV row is parsed.

use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::IngestError;

/// Resolves both names under `incoming_dir` and checks they exist.
pub fn ensure_files_exist(
    incoming_dir: &Path,
    weather_name: &str,
    ispu_name: &str,
) -> Result<(PathBuf, PathBuf), IngestError> {
    let weather = incoming_dir.join(weather_name);
    let ispu = incoming_dir.join(ispu_name);
    for path in [&weather, &ispu] {
        if !path.is_file() {
            return Err(IngestError::MissingFile(path.clone()));
        }
    }
    Ok((weather, ispu))
}

/// The city is the last `_`-separated token of the file stem, e.g.
/// `cuaca_harian_jakarta.csv` -> `jakarta`.
pub fn infer_city_from_filename(path: &Path) -> Result<String, IngestError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IngestError::NotCsv(path.to_path_buf()))?;
    if !name.to_ascii_lowercase().ends_with(".csv") {
        return Err(IngestError::NotCsv(path.to_path_buf()));
    }

    let stem = &name[..name.len() - 4];
    let city = stem.rsplit('_').next().unwrap_or_default().trim();
    if city.is_empty() {
        return Err(IngestError::NoCityToken(path.to_path_buf()));
    }
    Ok(city.to_string())
}

/// Fails with every required column absent from `headers`. Extra columns are allowed.
pub fn validate_columns(
    file: &Path,
    headers: &StringRecord,
    required: &[&str],
) -> Result<(), IngestError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(IngestError::MissingColumns {
        file: file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_city_from_filename() {
        let city =
            infer_city_from_filename(Path::new("INCOMING/cuaca_harian_jakarta.csv")).unwrap();
        assert_eq!(city, "jakarta");
        let city = infer_city_from_filename(Path::new("ISPU_HARIAN_Jakarta.CSV")).unwrap();
        assert_eq!(city, "Jakarta");
    }

    #[test]
    fn test_infer_city_rejects_non_csv_and_empty_token() {
        assert!(matches!(
            infer_city_from_filename(Path::new("cuaca_jakarta.xlsx")),
            Err(IngestError::NotCsv(_))
        ));
        assert!(matches!(
            infer_city_from_filename(Path::new("cuaca_harian_.csv")),
            Err(IngestError::NoCityToken(_))
        ));
    }

    #[test]
    fn test_validate_columns_lists_missing() {
        let headers = StringRecord::from(vec!["tanggal", "pm25", "extra"]);
        let err = validate_columns(
            Path::new("ispu_harian_jakarta.csv"),
            &headers,
            &["tanggal", "pm25", "pm10", "so2"],
        )
        .unwrap_err();
        match err {
            IngestError::MissingColumns { file, missing } => {
                assert_eq!(file, "ispu_harian_jakarta.csv");
                assert_eq!(missing, vec!["pm10", "so2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ensure_files_exist_reports_missing() {
        let err =
            ensure_files_exist(Path::new("/nonexistent-dir"), "a_x.csv", "b_x.csv").unwrap_err();
        assert!(matches!(err, IngestError::MissingFile(p) if p.ends_with("a_x.csv")));
    }
}

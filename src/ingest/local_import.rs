//! Local historic bulk importer (spec §4.7): per-station delta CSVs plus a
//! `daily-summaries-latest.tar.gz` archive, both living in
//! `ImportSettings::historic_dir`, with a resumable `(key -> mtime_ms)` state
//! file so a re-run is a no-op over unchanged inputs.

use crate::errors::IngestError;
use crate::ingest::run_guard::IngestRunGuard;
use crate::ingest::IngestContext;
use crate::model::normalize_station_id;
use crate::store::DailySummaryStore;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

pub const JOB_NAME: &str = "local_import";

const TARBALL_STATE_KEY: &str = "__daily_summaries_tarball__";
const TARBALL_NAME: &str = "daily-summaries-latest.tar.gz";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct ImportState {
    #[serde(flatten)]
    last_seen_ms: HashMap<String, i64>,
}

impl ImportState {
    fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn save(&self, path: &Path) -> std::io::Result<()> {
        let body = serde_json::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, body)
    }

    fn is_unchanged(&self, key: &str, mtime_ms: i64) -> bool {
        self.last_seen_ms.get(key).is_some_and(|seen| *seen >= mtime_ms)
    }

    fn mark_seen(&mut self, key: &str, mtime_ms: i64) {
        self.last_seen_ms.insert(key.to_string(), mtime_ms);
    }
}

#[instrument(level = "info", skip(ctx), err)]
pub async fn run(ctx: &IngestContext) -> Result<(), IngestError> {
    let guard = IngestRunGuard::start(ctx.ingest_log.clone(), JOB_NAME).await?;

    let Some(dir) = ctx.settings.import.historic_dir.clone() else {
        guard.finish(Some("no historic_dir configured".to_string())).await?;
        return Ok(());
    };
    let state_path = PathBuf::from(&ctx.settings.import.state_file);
    let mut state = ImportState::load(&state_path);

    let mut rows_imported = 0usize;

    match import_per_station_csvs(ctx, &dir, &mut state).await {
        Ok(n) => {
            rows_imported += n;
            guard.record_event("LOCAL", "per_station_csv", Some(200), None, None, None).await;
        },
        Err(e) => guard.note_item_failure("LOCAL", "per_station_csv", e.as_ref()).await,
    }

    match import_tarball(ctx, &dir, &mut state).await {
        Ok(n) => {
            rows_imported += n;
            guard.record_event("LOCAL", TARBALL_NAME, Some(200), None, None, None).await;
        },
        Err(e) => guard.note_item_failure("LOCAL", TARBALL_NAME, e.as_ref()).await,
    }

    if let Err(e) = state.save(&state_path) {
        tracing::warn!(error = %e, path = %state_path.display(), "failed to persist import state file");
    }

    guard.finish(Some(format!("{rows_imported} rows imported"))).await?;
    Ok(())
}

async fn import_per_station_csvs(
    ctx: &IngestContext, dir: &str, state: &mut ImportState,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let mut total = 0usize;
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return Err(Box::new(e)),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let station_key = normalize_station_id(stem);

        let mtime_ms = mtime_millis(&path)?;
        if state.is_unchanged(&station_key, mtime_ms) {
            continue;
        }

        let file = File::open(&path)?;
        let mut dbmax_cache = HashMap::new();
        let (rows, max_date) = ingest_wide_csv(&ctx.daily, BufReader::new(file), &mut dbmax_cache).await?;
        total += rows;

        state.mark_seen(&station_key, mtime_ms);

        if let Some(max_date) = max_date {
            relocate_to_date_dir(dir, &path, max_date);
        }
    }

    Ok(total)
}

async fn import_tarball(
    ctx: &IngestContext, dir: &str, state: &mut ImportState,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let path = Path::new(dir).join(TARBALL_NAME);
    if !path.exists() {
        return Ok(0);
    }

    let mtime_ms = mtime_millis(&path)?;
    if state.is_unchanged(TARBALL_STATE_KEY, mtime_ms) {
        return Ok(0);
    }

    let file = File::open(&path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut dbmax_cache = HashMap::new();
    let mut total = 0usize;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.to_path_buf();
        if entry_path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let mut contents = String::new();
        entry.read_to_string(&mut contents)?;
        let (rows, _) = ingest_wide_csv(&ctx.daily, contents.as_bytes(), &mut dbmax_cache).await?;
        total += rows;
    }

    state.mark_seen(TARBALL_STATE_KEY, mtime_ms);
    relocate_tarball(dir, &path);

    Ok(total)
}

/// Parses a "wide" CSV (header carries `STATION`, `DATE`, and at least one of
/// `PRCP`/`TMAX`/`TMIN`) and upserts each row newer than the per-station
/// `dbMax`, using `dbmax_cache` to avoid repeated DB lookups across rows for
/// the same station within one file (spec §4.7 step 3, tar.gz algorithm).
async fn ingest_wide_csv<R: Read>(
    daily: &DailySummaryStore, reader: R, dbmax_cache: &mut HashMap<String, Option<NaiveDate>>,
) -> Result<(usize, Option<NaiveDate>), Box<dyn std::error::Error + Send + Sync>> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let columns = match WideColumns::detect(&headers) {
        Some(columns) => columns,
        None => {
            tracing::warn!("CSV header is not a recognised wide schema, skipping file");
            return Ok((0, None));
        },
    };

    let mut rows_written = 0usize;
    let mut max_date_seen = None;

    for record in csv_reader.records() {
        let record = record?;
        let Some(station_raw) = record.get(columns.station) else { continue };
        let station_id = normalize_station_id(station_raw);

        let Some(date_raw) = record.get(columns.date) else { continue };
        let Ok(date) = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d") else { continue };

        if !dbmax_cache.contains_key(&station_id) {
            let db_max = daily.max_date(&station_id).await?;
            dbmax_cache.insert(station_id.clone(), db_max);
        }
        if let Some(Some(db_max)) = dbmax_cache.get(&station_id) {
            if date <= *db_max {
                continue;
            }
        }

        let tmax_c = columns.tmax.and_then(|i| record.get(i)).and_then(parse_tenths);
        let tmin_c = columns.tmin.and_then(|i| record.get(i)).and_then(parse_tenths);
        let prcp_mm = columns.prcp.and_then(|i| record.get(i)).and_then(parse_tenths);

        let raw_json = serde_json::to_value(record.iter().collect::<Vec<_>>()).ok();

        daily.upsert(&station_id, date, tmax_c, tmin_c, prcp_mm, raw_json).await?;

        dbmax_cache.insert(station_id, Some(date));
        rows_written += 1;
        max_date_seen = Some(max_date_seen.map_or(date, |m: NaiveDate| m.max(date)));
    }

    Ok((rows_written, max_date_seen))
}

fn parse_tenths(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().map(|v| v / 10.0)
}

struct WideColumns {
    station: usize,
    date: usize,
    tmax: Option<usize>,
    tmin: Option<usize>,
    prcp: Option<usize>,
}

impl WideColumns {
    fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let station = find("STATION")?;
        let date = find("DATE")?;
        let tmax = find("TMAX");
        let tmin = find("TMIN");
        let prcp = find("PRCP");
        if tmax.is_none() && tmin.is_none() && prcp.is_none() {
            return None;
        }
        Some(Self { station, date, tmax, tmin, prcp })
    }
}

fn mtime_millis(path: &Path) -> std::io::Result<i64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified()?;
    let since_epoch =
        modified.duration_since(std::time::UNIX_EPOCH).unwrap_or(std::time::Duration::ZERO);
    Ok(since_epoch.as_millis() as i64)
}

/// Moves a fully-processed per-station CSV into `<dir>/<max_date>/<filename>`.
/// A non-writable base directory is logged once and otherwise ignored (spec
/// §4.7 step 4): losing the ability to relocate a file must never lose data,
/// since the state file has already advanced.
fn relocate_to_date_dir(dir: &str, path: &Path, max_date: NaiveDate) {
    let dest_dir = Path::new(dir).join(max_date.to_string());
    if let Err(e) = std::fs::create_dir_all(&dest_dir) {
        tracing::warn!(error = %e, dir = %dest_dir.display(), "cannot create date subdirectory for consumed CSV");
        return;
    }
    let Some(filename) = path.file_name() else { return };
    if let Err(e) = std::fs::rename(path, dest_dir.join(filename)) {
        tracing::warn!(error = %e, path = %path.display(), "failed to relocate consumed CSV");
    }
}

fn relocate_tarball(dir: &str, path: &Path) {
    let dest_dir = Path::new(dir).join("oldDailys");
    if let Err(e) = std::fs::create_dir_all(&dest_dir) {
        tracing::warn!(error = %e, dir = %dest_dir.display(), "cannot create oldDailys directory");
        return;
    }
    let Some(filename) = path.file_name() else { return };
    if let Err(e) = std::fs::rename(path, dest_dir.join(filename)) {
        tracing::warn!(error = %e, path = %path.display(), "failed to relocate consumed tarball");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_columns_detect_requires_station_and_date() {
        let headers = csv::StringRecord::from(vec!["FOO", "BAR"]);
        assert!(WideColumns::detect(&headers).is_none());
    }

    #[test]
    fn test_wide_columns_detect_accepts_standard_header() {
        let headers = csv::StringRecord::from(vec!["STATION", "DATE", "PRCP", "TMAX", "TMIN"]);
        let columns = WideColumns::detect(&headers).expect("should detect wide schema");
        assert_eq!(columns.station, 0);
        assert_eq!(columns.date, 1);
    }

    #[test]
    fn test_parse_tenths_divides_by_ten() {
        assert_eq!(parse_tenths("250"), Some(25.0));
        assert_eq!(parse_tenths(""), None);
    }

    #[test]
    fn test_import_state_is_unchanged_for_older_or_equal_mtime() {
        let mut state = ImportState::default();
        state.mark_seen("GHCND:X", 1_000);
        assert!(state.is_unchanged("GHCND:X", 1_000));
        assert!(state.is_unchanged("GHCND:X", 500));
        assert!(!state.is_unchanged("GHCND:X", 1_500));
    }
}

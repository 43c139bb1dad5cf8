// src/loader.rs
//
// Retrieves the two source tables from a local file or a remote URL and
// turns them into typed records. Retrieval is fatal-on-failure (missing
// file, transport error, non-success status, missing column); individual
// cell values stay lenient and degrade to zero hours or a missing date.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::cache::TableCache;
use crate::ledger::LedgerRecord;
use crate::occurrence::AttendanceRecord;
use crate::ReportError;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Required columns of the attendance occurrences table, order-insensitive.
pub const ATTENDANCE_COLUMNS: [&str; 9] = [
    "Matricula",
    "Nome",
    "Data",
    "Estabelecimento",
    "Departamento",
    "Cargo",
    "Ocorrencia",
    "Justificativa",
    "Marcacoes",
];

/// Required columns of the hour-bank ledger table, order-insensitive.
pub const LEDGER_COLUMNS: [&str; 8] = [
    "Matricula",
    "Nome",
    "Estabelecimento",
    "Departamento",
    "Cargo",
    "SaldoFinal",
    "Pagamentos",
    "Descontos",
];

/// Where a table comes from. The `Display` form doubles as the source
/// identifier in error messages and as the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote {
        url: Url,
        /// Sheet/tab name within a multi-sheet workbook, forwarded as a
        /// `sheet` query parameter. Local files have no tabs.
        sheet: Option<String>,
    },
}

impl DataSource {
    /// Resolves a file suffix against a fixed base URL.
    pub fn remote(base: &Url, file: &str, sheet: Option<String>) -> Result<Self, ReportError> {
        Ok(Self::Remote {
            url: base.join(file)?,
            sheet,
        })
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote { url, sheet: None } => write!(f, "{}", url),
            Self::Remote {
                url,
                sheet: Some(sheet),
            } => write!(f, "{} [{}]", url, sheet),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Loads and caches the two tables. Each render cycle asks the loader for
/// a table and gets a shared snapshot; within the TTL window repeat views
/// hit the cache instead of the file system or the network. No automatic
/// retries: a failed fetch surfaces to the caller, who re-triggers.
pub struct ReportLoader {
    http: reqwest::Client,
    attendance_cache: TableCache<Vec<AttendanceRecord>>,
    ledger_cache: TableCache<Vec<LedgerRecord>>,
}

impl ReportLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            attendance_cache: TableCache::new(config.cache_ttl),
            ledger_cache: TableCache::new(config.cache_ttl),
        })
    }

    pub async fn load_attendance(
        &self,
        source: &DataSource,
    ) -> Result<Arc<Vec<AttendanceRecord>>, ReportError> {
        let key = source.to_string();
        if let Some(snapshot) = self.attendance_cache.get(&key) {
            debug!(source = %key, "attendance table served from cache");
            return Ok(snapshot);
        }
        let bytes = self.fetch(source).await?;
        let records = parse_attendance_csv(bytes.as_slice(), &key)?;
        info!(source = %key, rows = records.len(), "loaded attendance table");
        Ok(self.attendance_cache.put(&key, records))
    }

    pub async fn load_ledger(
        &self,
        source: &DataSource,
    ) -> Result<Arc<Vec<LedgerRecord>>, ReportError> {
        let key = source.to_string();
        if let Some(snapshot) = self.ledger_cache.get(&key) {
            debug!(source = %key, "ledger table served from cache");
            return Ok(snapshot);
        }
        let bytes = self.fetch(source).await?;
        let records = parse_ledger_csv(bytes.as_slice(), &key)?;
        info!(source = %key, rows = records.len(), "loaded ledger table");
        Ok(self.ledger_cache.put(&key, records))
    }

    /// Drops any cached snapshot for this source, forcing the next load to
    /// hit the origin.
    pub fn invalidate(&self, source: &DataSource) {
        let key = source.to_string();
        self.attendance_cache.invalidate(&key);
        self.ledger_cache.invalidate(&key);
    }

    pub fn clear_cache(&self) {
        self.attendance_cache.clear();
        self.ledger_cache.clear();
    }

    async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, ReportError> {
        match source {
            DataSource::File(path) => std::fs::read(path).map_err(|e| ReportError::Io {
                source_id: source.to_string(),
                source: e,
            }),
            DataSource::Remote { url, sheet } => {
                let mut url = url.clone();
                if let Some(sheet) = sheet {
                    url.query_pairs_mut().append_pair("sheet", sheet);
                }
                debug!(url = %url, "fetching remote table");
                let response =
                    self.http
                        .get(url)
                        .send()
                        .await
                        .map_err(|e| ReportError::Http {
                            source_id: source.to_string(),
                            source: e,
                        })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ReportError::HttpStatus {
                        source_id: source.to_string(),
                        status,
                    });
                }
                let body = response.bytes().await.map_err(|e| ReportError::Http {
                    source_id: source.to_string(),
                    source: e,
                })?;
                Ok(body.to_vec())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AttendanceRow {
    #[serde(rename = "Matricula")]
    employee_id: String,
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Data")]
    date: String,
    #[serde(rename = "Estabelecimento")]
    establishment: String,
    #[serde(rename = "Departamento")]
    department: String,
    #[serde(rename = "Cargo")]
    role: String,
    #[serde(rename = "Ocorrencia")]
    occurrence: String,
    #[serde(rename = "Justificativa")]
    justification: String,
    #[serde(rename = "Marcacoes")]
    punch_marks: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Matricula")]
    employee_id: String,
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Estabelecimento")]
    establishment: String,
    #[serde(rename = "Departamento")]
    department: String,
    #[serde(rename = "Cargo")]
    role: String,
    #[serde(rename = "SaldoFinal")]
    final_balance: String,
    #[serde(rename = "Pagamentos")]
    payments: String,
    #[serde(rename = "Descontos")]
    deductions: String,
}

/// Parses the attendance table from CSV bytes. Column presence is checked
/// up front so a schema mismatch fails loud with the offending column
/// instead of surfacing as an empty aggregate later.
pub fn parse_attendance_csv<R: Read>(
    reader: R,
    source_id: &str,
) -> Result<Vec<AttendanceRecord>, ReportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    ensure_columns(&mut rdr, &ATTENDANCE_COLUMNS, source_id)?;

    let mut records = Vec::new();
    for row in rdr.deserialize::<AttendanceRow>() {
        let row = row.map_err(|e| ReportError::Csv {
            source_id: source_id.to_string(),
            source: e,
        })?;
        records.push(AttendanceRecord {
            employee_id: row.employee_id,
            name: row.name,
            establishment: row.establishment,
            department: row.department,
            role: row.role,
            date: parse_report_date(&row.date),
            occurrence: row.occurrence,
            justification: row.justification,
            punch_marks: row.punch_marks.filter(|m| !m.trim().is_empty()),
        });
    }
    Ok(records)
}

/// Parses the ledger table from CSV bytes, normalizing signs on the way
/// in. Same fail-loud schema policy as the attendance parser.
pub fn parse_ledger_csv<R: Read>(
    reader: R,
    source_id: &str,
) -> Result<Vec<LedgerRecord>, ReportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    ensure_columns(&mut rdr, &LEDGER_COLUMNS, source_id)?;

    let mut records = Vec::new();
    for row in rdr.deserialize::<LedgerRow>() {
        let row = row.map_err(|e| ReportError::Csv {
            source_id: source_id.to_string(),
            source: e,
        })?;
        records.push(LedgerRecord::from_raw(
            row.employee_id,
            row.name,
            row.establishment,
            row.department,
            row.role,
            &row.final_balance,
            &row.payments,
            &row.deductions,
        ));
    }
    Ok(records)
}

fn ensure_columns<R: Read>(
    rdr: &mut csv::Reader<R>,
    required: &[&str],
    source_id: &str,
) -> Result<(), ReportError> {
    let headers = rdr
        .headers()
        .map_err(|e| ReportError::Csv {
            source_id: source_id.to_string(),
            source: e,
        })?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(ReportError::MissingColumn {
                source_id: source_id.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Lenient date parsing: the sources mix day-first and ISO formats, and an
/// unparseable cell becomes `None` rather than an error.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    // Excel exports sometimes carry a midnight timestamp.
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(stamp.date());
        }
    }
    None
}

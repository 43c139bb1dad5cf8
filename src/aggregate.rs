// src/aggregate.rs
//
// Pure batch aggregation over classified attendance rows and normalized
// ledger rows: per-key flag counts, sign-partitioned hour sums, KPI
// totals, and the stable top-N ranking the charts consume.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ledger::LedgerRecord;
use crate::occurrence::AttendanceRecord;

/// Grouping dimension for the summary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Establishment,
    Department,
    /// Calendar day (ISO-formatted key). Rows without a parseable date
    /// are dropped from this grouping only.
    Date,
    /// Employee identity as the absence ranking shows it: name plus
    /// establishment and role.
    Employee,
}

fn attendance_group(record: &AttendanceRecord, key: GroupKey) -> Option<String> {
    match key {
        GroupKey::Establishment => Some(record.establishment.clone()),
        GroupKey::Department => Some(record.department.clone()),
        GroupKey::Date => record.date.map(|d| d.format("%Y-%m-%d").to_string()),
        GroupKey::Employee => Some(format!(
            "{} ({} / {})",
            record.name, record.establishment, record.role
        )),
    }
}

fn ledger_group(record: &LedgerRecord, key: GroupKey) -> Option<String> {
    match key {
        GroupKey::Establishment => Some(record.establishment.clone()),
        GroupKey::Department => Some(record.department.clone()),
        // The ledger is a per-period summary with no date column; date
        // grouping over it yields nothing.
        GroupKey::Date => None,
        GroupKey::Employee => Some(format!(
            "{} ({} / {})",
            record.name, record.establishment, record.role
        )),
    }
}

/// Per-key occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceSummary {
    pub key: String,
    pub unexcused_absences: u32,
    pub odd_punch_counts: u32,
    pub missing_punches: u32,
}

impl OccurrenceSummary {
    fn new(key: String) -> Self {
        Self {
            key,
            unexcused_absences: 0,
            odd_punch_counts: 0,
            missing_punches: 0,
        }
    }

    /// Combined count: absences + odd punches + missing punches, summed
    /// without deduplication.
    pub fn total_occurrences(&self) -> u32 {
        self.unexcused_absences + self.odd_punch_counts + self.missing_punches
    }
}

/// Groups attendance rows by `key` and sums each flag independently.
/// Keys appear in first-seen input order, which is also the tie order any
/// later stable ranking preserves.
pub fn summarize_occurrences(
    records: &[AttendanceRecord],
    key: GroupKey,
) -> Vec<OccurrenceSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<OccurrenceSummary> = Vec::new();

    for record in records {
        let Some(group) = attendance_group(record, key) else {
            continue;
        };
        let slot = *index.entry(group.clone()).or_insert_with(|| {
            summaries.push(OccurrenceSummary::new(group));
            summaries.len() - 1
        });
        let flags = record.flags();
        let summary = &mut summaries[slot];
        summary.unexcused_absences += flags.unexcused_absence as u32;
        summary.odd_punch_counts += flags.odd_punch_count as u32;
        summary.missing_punches += flags.missing_punch as u32;
    }

    summaries
}

/// Occurrence counts per calendar day, chronologically ascending, with
/// display-formatted (`DD/MM/YYYY`) keys. Rows without a date are skipped.
pub fn daily_evolution(records: &[AttendanceRecord]) -> Vec<OccurrenceSummary> {
    let mut by_day: BTreeMap<chrono::NaiveDate, OccurrenceSummary> = BTreeMap::new();

    for record in records {
        let Some(date) = record.date else {
            continue;
        };
        let flags = record.flags();
        let summary = by_day
            .entry(date)
            .or_insert_with(|| OccurrenceSummary::new(date.format("%d/%m/%Y").to_string()));
        summary.unexcused_absences += flags.unexcused_absence as u32;
        summary.odd_punch_counts += flags.odd_punch_count as u32;
        summary.missing_punches += flags.missing_punch as u32;
    }

    by_day.into_values().collect()
}

/// Per-key hour-bank sums. The positive/negative partitions sum only the
/// individually positive (resp. negative) source balances, not the sign of
/// the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub key: String,
    pub balance_hours: f64,
    pub positive_balance_hours: f64,
    pub negative_balance_hours: f64,
    pub payments_hours: f64,
    pub deductions_hours: f64,
}

impl LedgerSummary {
    fn new(key: String) -> Self {
        Self {
            key,
            balance_hours: 0.0,
            positive_balance_hours: 0.0,
            negative_balance_hours: 0.0,
            payments_hours: 0.0,
            deductions_hours: 0.0,
        }
    }
}

/// Groups ledger rows by `key` and sums the hour fields, partitioning the
/// balance by each record's own sign. Key order matches first appearance.
pub fn summarize_ledger(records: &[LedgerRecord], key: GroupKey) -> Vec<LedgerSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<LedgerSummary> = Vec::new();

    for record in records {
        let Some(group) = ledger_group(record, key) else {
            continue;
        };
        let slot = *index.entry(group.clone()).or_insert_with(|| {
            summaries.push(LedgerSummary::new(group));
            summaries.len() - 1
        });
        let summary = &mut summaries[slot];
        summary.balance_hours += record.final_balance_hours;
        if record.final_balance_hours > 0.0 {
            summary.positive_balance_hours += record.final_balance_hours;
        }
        if record.final_balance_hours < 0.0 {
            summary.negative_balance_hours += record.final_balance_hours;
        }
        summary.payments_hours += record.payments_hours;
        summary.deductions_hours += record.deductions_hours;
    }

    summaries
}

/// Stable top-N ranking for chart views: groups whose metric is not
/// positive are dropped, the rest sort descending by metric with ties
/// keeping input order. Debit rankings pass a negated metric. KPI totals
/// never go through this filter.
pub fn top_n<T: Clone>(rows: &[T], n: usize, metric: impl Fn(&T) -> f64) -> Vec<T> {
    let mut ranked: Vec<T> = rows.iter().filter(|row| metric(row) > 0.0).cloned().collect();
    ranked.sort_by(|a, b| metric(b).partial_cmp(&metric(a)).unwrap_or(Ordering::Equal));
    ranked.truncate(n);
    ranked
}

/// Dataset-wide occurrence totals. Always covers every record, filtered or
/// not; the zero-group chart filter does not apply here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccurrenceKpis {
    pub unexcused_absences: u32,
    pub odd_punch_counts: u32,
    pub missing_punches: u32,
}

impl OccurrenceKpis {
    /// Odd punches plus missing punches, the combined "irregular punch"
    /// headline number.
    pub fn punch_irregularities(&self) -> u32 {
        self.odd_punch_counts + self.missing_punches
    }

    pub fn total_occurrences(&self) -> u32 {
        self.unexcused_absences + self.punch_irregularities()
    }
}

pub fn occurrence_kpis(records: &[AttendanceRecord]) -> OccurrenceKpis {
    let mut kpis = OccurrenceKpis::default();
    for record in records {
        let flags = record.flags();
        kpis.unexcused_absences += flags.unexcused_absence as u32;
        kpis.odd_punch_counts += flags.odd_punch_count as u32;
        kpis.missing_punches += flags.missing_punch as u32;
    }
    kpis
}

/// Dataset-wide hour-bank totals. Headcount is denominated by the ledger
/// roster: distinct employee ids in this table, the authoritative
/// per-period employee list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerKpis {
    pub head_count: usize,
    pub positive_balance_hours: f64,
    pub negative_balance_hours: f64,
    pub payments_hours: f64,
    pub deductions_hours: f64,
}

pub fn ledger_kpis(records: &[LedgerRecord]) -> LedgerKpis {
    let mut kpis = LedgerKpis::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        seen.insert(record.employee_id.as_str());
        if record.final_balance_hours > 0.0 {
            kpis.positive_balance_hours += record.final_balance_hours;
        }
        if record.final_balance_hours < 0.0 {
            kpis.negative_balance_hours += record.final_balance_hours;
        }
        if record.payments_hours > 0.0 {
            kpis.payments_hours += record.payments_hours;
        }
        if record.deductions_hours < 0.0 {
            kpis.deductions_hours += record.deductions_hours;
        }
    }

    kpis.head_count = seen.len();
    kpis
}

/// Establishment/department restriction resolved by the presentation
/// layer. An empty selection on either axis means "no restriction", the
/// multiselect convention of the detail pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub establishments: Vec<String>,
    pub departments: Vec<String>,
}

impl RecordFilter {
    pub fn is_unrestricted(&self) -> bool {
        self.establishments.is_empty() && self.departments.is_empty()
    }

    pub fn matches(&self, establishment: &str, department: &str) -> bool {
        (self.establishments.is_empty()
            || self.establishments.iter().any(|e| e == establishment))
            && (self.departments.is_empty() || self.departments.iter().any(|d| d == department))
    }

    pub fn filter_attendance(&self, records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
        records
            .iter()
            .filter(|r| self.matches(&r.establishment, &r.department))
            .cloned()
            .collect()
    }

    pub fn filter_ledger(&self, records: &[LedgerRecord]) -> Vec<LedgerRecord> {
        records
            .iter()
            .filter(|r| self.matches(&r.establishment, &r.department))
            .cloned()
            .collect()
    }
}

/// Sorted distinct establishments, for filter options.
pub fn establishments(records: &[AttendanceRecord]) -> Vec<String> {
    let mut values: Vec<String> = records
        .iter()
        .map(|r| r.establishment.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    values.sort();
    values
}

/// Sorted distinct departments, scoped to an establishment selection when
/// one is active (department options narrow as establishments are picked).
pub fn departments(records: &[AttendanceRecord], selection: &[String]) -> Vec<String> {
    let mut values: Vec<String> = records
        .iter()
        .filter(|r| selection.is_empty() || selection.iter().any(|e| e == &r.establishment))
        .map(|r| r.department.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    values.sort();
    values
}

// src/report.rs
//
// Assembles the dashboard payload: KPI block, top-N rankings, the daily
// evolution series, and the row-level detail listings. The `Display` impl
// is a minimal text rendering standing in for the chart layer.

use std::fmt;

use chrono::NaiveDate;

use crate::aggregate::{
    daily_evolution, ledger_kpis, occurrence_kpis, summarize_ledger, summarize_occurrences,
    top_n, GroupKey, LedgerKpis, LedgerSummary, OccurrenceKpis, OccurrenceSummary,
};
use crate::duration::format_duration;
use crate::ledger::LedgerRecord;
use crate::occurrence::AttendanceRecord;

/// One row of the drill-down listings: who, and on which day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceDetail {
    pub name: String,
    pub date: Option<NaiveDate>,
}

impl OccurrenceDetail {
    fn display_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Everything one render cycle needs, computed in a single pass over the
/// two (already filtered) tables. Transient: built per request, discarded
/// after render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub occurrences: OccurrenceKpis,
    pub hour_bank: LedgerKpis,
    pub top_establishments_by_occurrences: Vec<OccurrenceSummary>,
    pub top_establishments_by_positive_balance: Vec<LedgerSummary>,
    pub top_establishments_by_payments: Vec<LedgerSummary>,
    pub top_establishments_by_deductions: Vec<LedgerSummary>,
    pub top_employees_by_absences: Vec<OccurrenceSummary>,
    pub daily_evolution: Vec<OccurrenceSummary>,
    pub absence_details: Vec<OccurrenceDetail>,
    pub punch_details: Vec<OccurrenceDetail>,
}

impl DashboardReport {
    pub fn build(
        attendance: &[AttendanceRecord],
        ledger: &[LedgerRecord],
        top: usize,
    ) -> Self {
        let by_establishment = summarize_occurrences(attendance, GroupKey::Establishment);
        let by_employee = summarize_occurrences(attendance, GroupKey::Employee);
        let ledger_by_establishment = summarize_ledger(ledger, GroupKey::Establishment);

        Self {
            occurrences: occurrence_kpis(attendance),
            hour_bank: ledger_kpis(ledger),
            top_establishments_by_occurrences: top_n(&by_establishment, top, |s| {
                s.total_occurrences() as f64
            }),
            top_establishments_by_positive_balance: top_n(&ledger_by_establishment, top, |s| {
                s.positive_balance_hours
            }),
            top_establishments_by_payments: top_n(&ledger_by_establishment, top, |s| {
                s.payments_hours
            }),
            // Debit ranking: most negative first, so rank on the negation.
            top_establishments_by_deductions: top_n(&ledger_by_establishment, top, |s| {
                -s.deductions_hours
            }),
            top_employees_by_absences: top_n(&by_employee, top, |s| {
                s.unexcused_absences as f64
            }),
            daily_evolution: daily_evolution(attendance),
            absence_details: details(attendance, |r| r.flags().unexcused_absence),
            punch_details: details(attendance, |r| {
                let flags = r.flags();
                flags.odd_punch_count || flags.missing_punch
            }),
        }
    }
}

fn details(
    records: &[AttendanceRecord],
    keep: impl Fn(&AttendanceRecord) -> bool,
) -> Vec<OccurrenceDetail> {
    let mut rows: Vec<OccurrenceDetail> = records
        .iter()
        .filter(|r| keep(r))
        .map(|r| OccurrenceDetail {
            name: r.name.clone(),
            date: r.date,
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.date.cmp(&b.date)));
    rows
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Key indicators ==")?;
        writeln!(f, "Employees (ledger roster): {}", self.hour_bank.head_count)?;
        writeln!(
            f,
            "Unexcused absences:        {}",
            self.occurrences.unexcused_absences
        )?;
        writeln!(
            f,
            "Punch irregularities:      {} (odd: {}, missing: {})",
            self.occurrences.punch_irregularities(),
            self.occurrences.odd_punch_counts,
            self.occurrences.missing_punches
        )?;
        writeln!(
            f,
            "Hour bank positive:        {} ({:+.2} h)",
            format_duration(Some(self.hour_bank.positive_balance_hours)),
            self.hour_bank.positive_balance_hours
        )?;
        writeln!(
            f,
            "Hour bank negative:        {} ({:+.2} h)",
            format_duration(Some(self.hour_bank.negative_balance_hours)),
            self.hour_bank.negative_balance_hours
        )?;
        writeln!(
            f,
            "Hours to pay:              {} ({:+.2} h)",
            format_duration(Some(self.hour_bank.payments_hours)),
            self.hour_bank.payments_hours
        )?;
        writeln!(
            f,
            "Hours to deduct:           {} ({:+.2} h)",
            format_duration(Some(self.hour_bank.deductions_hours)),
            self.hour_bank.deductions_hours
        )?;

        writeln!(f, "\n== Establishments by total occurrences ==")?;
        for summary in &self.top_establishments_by_occurrences {
            writeln!(
                f,
                "{:<40} {:>5} (absences {}, odd {}, missing {})",
                summary.key,
                summary.total_occurrences(),
                summary.unexcused_absences,
                summary.odd_punch_counts,
                summary.missing_punches
            )?;
        }

        writeln!(f, "\n== Establishments by positive hour-bank balance ==")?;
        for summary in &self.top_establishments_by_positive_balance {
            writeln!(
                f,
                "{:<40} {:>9}",
                summary.key,
                format_duration(Some(summary.positive_balance_hours))
            )?;
        }

        writeln!(f, "\n== Establishments by hours to pay ==")?;
        for summary in &self.top_establishments_by_payments {
            writeln!(
                f,
                "{:<40} {:>9}",
                summary.key,
                format_duration(Some(summary.payments_hours))
            )?;
        }

        writeln!(f, "\n== Establishments by hours to deduct ==")?;
        for summary in &self.top_establishments_by_deductions {
            writeln!(
                f,
                "{:<40} {:>9}",
                summary.key,
                format_duration(Some(summary.deductions_hours))
            )?;
        }

        writeln!(f, "\n== Employees by unexcused absences ==")?;
        for summary in &self.top_employees_by_absences {
            writeln!(f, "{:<55} {:>3}", summary.key, summary.unexcused_absences)?;
        }

        writeln!(f, "\n== Daily evolution ==")?;
        for summary in &self.daily_evolution {
            writeln!(
                f,
                "{}  absences {:>3}  odd {:>3}  missing {:>3}",
                summary.key,
                summary.unexcused_absences,
                summary.odd_punch_counts,
                summary.missing_punches
            )?;
        }

        writeln!(f, "\n== Unexcused absence details ==")?;
        for detail in &self.absence_details {
            writeln!(f, "{:<40} {}", detail.name, detail.display_date())?;
        }

        writeln!(f, "\n== Punch irregularity details ==")?;
        for detail in &self.punch_details {
            writeln!(f, "{:<40} {}", detail.name, detail.display_date())?;
        }

        Ok(())
    }
}

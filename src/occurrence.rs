// src/occurrence.rs
//
// Attendance occurrence records and the per-row classification flags the
// dashboards aggregate. All three classifiers are pure functions of the
// row; flags are derived on demand and never stored back into the source.

use chrono::NaiveDate;

/// Occurrence category meaning the entry clock punch is missing.
pub const MISSING_ENTRY_PUNCH: &str = "Sem marcação de entrada";
/// Occurrence category meaning the exit clock punch is missing.
pub const MISSING_EXIT_PUNCH: &str = "Sem marcação de saída";
/// Category used for both an absence occurrence and the "no justification
/// given" justification. The source encodes them with the same literal.
pub const ABSENCE: &str = "Falta";

/// One attendance occurrence row: one employee, one date.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub name: String,
    pub establishment: String,
    pub department: String,
    pub role: String,
    /// `None` when the source cell did not parse as a date. Such rows are
    /// excluded from date-grouped aggregates but still count everywhere else.
    pub date: Option<NaiveDate>,
    /// Free-text occurrence category, e.g. "Falta".
    pub occurrence: String,
    /// Free-text justification category.
    pub justification: String,
    /// Whitespace-separated clock punch timestamps, when present.
    pub punch_marks: Option<String>,
}

impl AttendanceRecord {
    /// Derives the classification flags for this row.
    pub fn flags(&self) -> OccurrenceFlags {
        OccurrenceFlags {
            odd_punch_count: is_odd_punch_count(self.punch_marks.as_deref()),
            missing_punch: is_missing_punch(&self.occurrence),
            unexcused_absence: is_unexcused_absence(&self.occurrence, &self.justification),
        }
    }
}

/// The three independent row-level flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccurrenceFlags {
    pub odd_punch_count: bool,
    pub missing_punch: bool,
    pub unexcused_absence: bool,
}

impl OccurrenceFlags {
    /// Combined occurrence count for this row. The flags are summed
    /// independently: a row that is both an odd punch and a missing punch
    /// counts twice, matching how the source reports totals.
    pub fn total(&self) -> u32 {
        self.odd_punch_count as u32 + self.missing_punch as u32 + self.unexcused_absence as u32
    }
}

/// True iff the punch-marks string holds an odd number of whitespace
/// separated tokens. An even punch count (in, out, in, out, ...) is the
/// valid case; odd means a clock-in or clock-out is missing that day.
/// A missing or empty marks cell is not flagged.
pub fn is_odd_punch_count(marks: Option<&str>) -> bool {
    match marks {
        Some(marks) => marks.split_whitespace().count() % 2 != 0,
        None => false,
    }
}

/// True iff the occurrence category is exactly one of the two fixed
/// missing-punch categories. Exact matching is deliberate; see DESIGN.md.
pub fn is_missing_punch(occurrence: &str) -> bool {
    occurrence == MISSING_ENTRY_PUNCH || occurrence == MISSING_EXIT_PUNCH
}

/// True iff the row is an absence whose justification field itself says
/// "Falta", i.e. no justification was given. Any other justification on an
/// absence row counts as excused. The same-literal pairing is a business
/// rule carried over verbatim from the source data.
pub fn is_unexcused_absence(occurrence: &str, justification: &str) -> bool {
    occurrence == ABSENCE && justification == ABSENCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_punch_count_checks_token_parity() {
        assert!(is_odd_punch_count(Some("08:00 12:00 13:00")));
        assert!(!is_odd_punch_count(Some("08:00 12:00 13:00 17:00")));
        assert!(!is_odd_punch_count(None));
        assert!(!is_odd_punch_count(Some("")));
        assert!(!is_odd_punch_count(Some("   ")));
        assert!(is_odd_punch_count(Some("  08:00  ")));
    }

    #[test]
    fn missing_punch_is_exact_match() {
        assert!(is_missing_punch(MISSING_ENTRY_PUNCH));
        assert!(is_missing_punch(MISSING_EXIT_PUNCH));
        assert!(!is_missing_punch("sem marcação de entrada"));
        assert!(!is_missing_punch("Sem marcação"));
        assert!(!is_missing_punch("Falta"));
    }

    #[test]
    fn unexcused_absence_requires_the_paired_literal() {
        assert!(is_unexcused_absence("Falta", "Falta"));
        assert!(!is_unexcused_absence("Falta", "Atestado"));
        assert!(!is_unexcused_absence("Atraso", "Falta"));
        assert!(!is_unexcused_absence("falta", "falta"));
    }

    #[test]
    fn flags_total_double_counts_overlap() {
        let flags = OccurrenceFlags {
            odd_punch_count: true,
            missing_punch: true,
            unexcused_absence: false,
        };
        assert_eq!(flags.total(), 2);
        assert_eq!(OccurrenceFlags::default().total(), 0);
    }
}

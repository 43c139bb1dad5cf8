// src/ledger.rs
//
// Hour-bank ledger records with the sign conventions enforced at
// construction: payments are credits (never negative), deductions are
// debits (never positive), and only the final balance keeps the sign the
// source gave it.

use crate::duration::parse_duration;

/// One hour-bank summary row: one employee for the reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub employee_id: String,
    pub name: String,
    pub establishment: String,
    pub department: String,
    pub role: String,
    /// Net hour-bank balance at period end; sign taken from the source.
    pub final_balance_hours: f64,
    /// Hours settled as payment. Invariant: `>= 0`.
    pub payments_hours: f64,
    /// Hours settled as deduction. Invariant: `<= 0`.
    pub deductions_hours: f64,
}

impl LedgerRecord {
    /// Builds a record from the raw textual duration cells, normalizing
    /// signs. The final balance is the only field whose source sign is
    /// trusted; payments are forced non-negative and deductions
    /// non-positive regardless of how the source signed them. Malformed
    /// cells fall through the codec's lenient parse and become zero.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        employee_id: String,
        name: String,
        establishment: String,
        department: String,
        role: String,
        final_balance_raw: &str,
        payments_raw: &str,
        deductions_raw: &str,
    ) -> Self {
        Self {
            employee_id,
            name,
            establishment,
            department,
            role,
            final_balance_hours: parse_duration(Some(final_balance_raw)),
            payments_hours: parse_duration(Some(payments_raw)).abs(),
            deductions_hours: -parse_duration(Some(deductions_raw)).abs(),
        }
    }
}

//! Plain-text rendering of dashboard results

use std::fmt::Write;

use crate::reader::{DashboardSnapshot, DiagnosisCount, MonthlyAggregate, RiskBucket};

/// Column widths: the widest of the header and every cell
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Left-aligned table with a dashed separator under the header.
///
/// ```text
/// MONTH    TOTAL
/// -------  -----
/// 2017-04  4
/// ```
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);
    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers.iter().map(|h| h.to_string()).collect()));
    let _ = writeln!(out, "{}", line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.clone()));
    }
    out
}

pub fn monthly_table(months: &[MonthlyAggregate]) -> String {
    let rows: Vec<Vec<String>> = months
        .iter()
        .map(|m| {
            vec![
                m.month.clone(),
                m.total_admissions.to_string(),
                m.emergency_cases.to_string(),
                m.opd_cases.to_string(),
                m.count_long_icu.to_string(),
                m.count_cardiac_distress.to_string(),
                m.count_metabolic_risk.to_string(),
            ]
        })
        .collect();
    table(
        &[
            "MONTH",
            "ADMISSIONS",
            "EMERGENCY",
            "OPD",
            "LONG ICU",
            "CARDIAC DISTRESS",
            "METABOLIC RISK",
        ],
        &rows,
    )
}

/// Histogram with a bar scaled to the largest bucket
pub fn risk_table(buckets: &[RiskBucket]) -> String {
    const BAR_WIDTH: i64 = 40;
    let max = buckets.iter().map(|b| b.patients).max().unwrap_or(0);
    let rows: Vec<Vec<String>> = buckets
        .iter()
        .map(|b| {
            let len = if max > 0 { b.patients * BAR_WIDTH / max } else { 0 };
            vec![
                b.score.to_string(),
                b.patients.to_string(),
                "#".repeat(len as usize),
            ]
        })
        .collect();
    table(&["SCORE", "PATIENTS", ""], &rows)
}

pub fn diagnosis_table(diagnoses: &[DiagnosisCount]) -> String {
    let rows: Vec<Vec<String>> = diagnoses
        .iter()
        .map(|d| vec![d.diagnosis.clone(), d.count.to_string()])
        .collect();
    table(&["DIAGNOSIS", "COUNT"], &rows)
}

/// All sections with headings
pub fn snapshot(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    out.push_str("Admission trends\n\n");
    if snapshot.monthly.is_empty() {
        out.push_str("No admissions recorded.\n");
    } else {
        out.push_str(&monthly_table(&snapshot.monthly));
    }
    out.push_str("\nLifestyle risk scores\n\n");
    out.push_str(&risk_table(&snapshot.risk_distribution));
    out.push_str("\nDiagnoses\n\n");
    out.push_str(&diagnosis_table(&snapshot.diagnoses));
    out
}

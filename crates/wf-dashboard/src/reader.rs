//! Dashboard queries over `analytics_hdhi_dashboard` and `analytics_hdhi_clean`

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use wf_core::{CellValue, TableName};
use wf_db::{Database, QueryResult};

use crate::error::{DashboardError, DashboardResult};

/// Boolean diagnosis columns of the clean table, in display order
pub const DIAGNOSIS_COLUMNS: [&str; 9] = [
    "acs",
    "stemi",
    "heart_failure",
    "hfref",
    "hfnef",
    "cva_infarct",
    "cva_bleed",
    "aki",
    "shock",
];

/// Highest lifestyle risk score: one point per factor, seven factors
pub const MAX_RISK_SCORE: i64 = 7;

/// One month of `analytics_hdhi_dashboard`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyAggregate {
    pub month: String,
    pub total_admissions: i64,
    pub emergency_cases: i64,
    pub opd_cases: i64,
    pub count_long_icu: i64,
    pub count_cardiac_distress: i64,
    pub count_metabolic_risk: i64,
}

/// Patients with a given lifestyle risk score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskBucket {
    pub score: i64,
    pub patients: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisCount {
    pub diagnosis: String,
    pub count: i64,
}

/// Everything the dashboard shows, read in one go
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub monthly: Vec<MonthlyAggregate>,
    pub risk_distribution: Vec<RiskBucket>,
    pub diagnoses: Vec<DiagnosisCount>,
}

/// Read-only access to the derived tables.
///
/// Zero-row tables give empty or all-zero results. A table that was never
/// built is a [`DashboardError::MissingTable`].
pub struct DashboardReader {
    db: Arc<dyn Database>,
    dashboard_table: TableName,
    clean_table: TableName,
}

impl DashboardReader {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            dashboard_table: TableName::new("analytics_hdhi_dashboard"),
            clean_table: TableName::new("analytics_hdhi_clean"),
        }
    }

    pub fn with_tables(mut self, dashboard_table: TableName, clean_table: TableName) -> Self {
        self.dashboard_table = dashboard_table;
        self.clean_table = clean_table;
        self
    }

    async fn require(&self, table: &TableName) -> DashboardResult<()> {
        if self.db.relation_exists(table.as_str()).await? {
            Ok(())
        } else {
            Err(DashboardError::MissingTable {
                table: table.to_string(),
            })
        }
    }

    /// Monthly admission trends, oldest month first
    pub async fn monthly_trends(&self) -> DashboardResult<Vec<MonthlyAggregate>> {
        self.require(&self.dashboard_table).await?;
        let sql = format!(
            "SELECT CAST(month AS VARCHAR) AS month, \
             CAST(total_admissions AS BIGINT) AS total_admissions, \
             CAST(emergency_cases AS BIGINT) AS emergency_cases, \
             CAST(opd_cases AS BIGINT) AS opd_cases, \
             CAST(count_long_icu AS BIGINT) AS count_long_icu, \
             CAST(count_cardiac_distress AS BIGINT) AS count_cardiac_distress, \
             CAST(count_metabolic_risk AS BIGINT) AS count_metabolic_risk \
             FROM {} ORDER BY month",
            self.dashboard_table.quoted()
        );
        let result = self.db.query_rows(&sql).await?;

        result
            .rows
            .iter()
            .map(|row| {
                Ok(MonthlyAggregate {
                    month: text_cell(&result, row, "month")?,
                    total_admissions: int_cell(&result, row, "total_admissions")?,
                    emergency_cases: int_cell(&result, row, "emergency_cases")?,
                    opd_cases: int_cell(&result, row, "opd_cases")?,
                    count_long_icu: int_cell(&result, row, "count_long_icu")?,
                    count_cardiac_distress: int_cell(&result, row, "count_cardiac_distress")?,
                    count_metabolic_risk: int_cell(&result, row, "count_metabolic_risk")?,
                })
            })
            .collect()
    }

    /// Histogram of `lifestyle_risk_score` with one bucket per score.
    ///
    /// Scores 0 through [`MAX_RISK_SCORE`] are always present, zero-filled.
    pub async fn risk_distribution(&self) -> DashboardResult<Vec<RiskBucket>> {
        self.require(&self.clean_table).await?;
        let sql = format!(
            "SELECT CAST(lifestyle_risk_score AS BIGINT) AS score, \
             CAST(COUNT(*) AS BIGINT) AS patients \
             FROM {} WHERE lifestyle_risk_score IS NOT NULL \
             GROUP BY 1 ORDER BY 1",
            self.clean_table.quoted()
        );
        let result = self.db.query_rows(&sql).await?;

        let mut buckets: BTreeMap<i64, i64> = (0..=MAX_RISK_SCORE).map(|s| (s, 0)).collect();
        for row in &result.rows {
            let score = int_cell(&result, row, "score")?;
            let patients = int_cell(&result, row, "patients")?;
            *buckets.entry(score).or_insert(0) += patients;
        }

        Ok(buckets
            .into_iter()
            .map(|(score, patients)| RiskBucket { score, patients })
            .collect())
    }

    /// Count of patients flagged with each diagnosis in [`DIAGNOSIS_COLUMNS`]
    pub async fn diagnosis_counts(&self) -> DashboardResult<Vec<DiagnosisCount>> {
        self.require(&self.clean_table).await?;
        let sums: Vec<String> = DIAGNOSIS_COLUMNS
            .iter()
            .map(|col| {
                format!(
                    "CAST(COALESCE(SUM(CAST({col} AS INTEGER)), 0) AS BIGINT) AS {col}",
                    col = col
                )
            })
            .collect();
        let sql = format!(
            "SELECT {} FROM {}",
            sums.join(", "),
            self.clean_table.quoted()
        );
        let result = self.db.query_rows(&sql).await?;

        let Some(row) = result.rows.first() else {
            return Ok(DIAGNOSIS_COLUMNS
                .iter()
                .map(|d| DiagnosisCount {
                    diagnosis: d.to_string(),
                    count: 0,
                })
                .collect());
        };

        DIAGNOSIS_COLUMNS
            .iter()
            .map(|d| {
                Ok(DiagnosisCount {
                    diagnosis: d.to_string(),
                    count: int_cell(&result, row, d)?,
                })
            })
            .collect()
    }

    /// All three views
    pub async fn snapshot(&self) -> DashboardResult<DashboardSnapshot> {
        let snapshot = DashboardSnapshot {
            monthly: self.monthly_trends().await?,
            risk_distribution: self.risk_distribution().await?,
            diagnoses: self.diagnosis_counts().await?,
        };
        log::debug!(
            "Dashboard snapshot: {} months, {} diagnoses",
            snapshot.monthly.len(),
            snapshot.diagnoses.len()
        );
        Ok(snapshot)
    }
}

fn cell<'a>(
    result: &QueryResult,
    row: &'a [CellValue],
    column: &str,
) -> DashboardResult<&'a CellValue> {
    result
        .column_index(column)
        .and_then(|idx| row.get(idx))
        .ok_or_else(|| DashboardError::UnexpectedValue {
            column: column.to_string(),
            value: "<missing column>".to_string(),
        })
}

/// Integer cell; NULL counts as zero
fn int_cell(result: &QueryResult, row: &[CellValue], column: &str) -> DashboardResult<i64> {
    let value = cell(result, row, column)?;
    if value.is_null() {
        return Ok(0);
    }
    value.as_i64().ok_or_else(|| DashboardError::UnexpectedValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn text_cell(result: &QueryResult, row: &[CellValue], column: &str) -> DashboardResult<String> {
    let value = cell(result, row, column)?;
    match value {
        CellValue::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;

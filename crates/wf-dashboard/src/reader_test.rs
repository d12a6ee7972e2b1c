use super::*;
use wf_db::DuckDbBackend;

const CREATE_EMPTY: &str = "
    CREATE TABLE analytics_hdhi_dashboard (
        month VARCHAR, total_admissions BIGINT, emergency_cases BIGINT, opd_cases BIGINT,
        count_long_icu BIGINT, count_cardiac_distress BIGINT, count_metabolic_risk BIGINT
    );
    CREATE TABLE analytics_hdhi_clean (
        sno BIGINT, lifestyle_risk_score INTEGER,
        acs BOOLEAN, stemi BOOLEAN, heart_failure BOOLEAN, hfref BOOLEAN, hfnef BOOLEAN,
        cva_infarct BOOLEAN, cva_bleed BOOLEAN, aki BOOLEAN, shock BOOLEAN
    );
";

async fn reader_with(sql: &str) -> DashboardReader {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_in_transaction(CREATE_EMPTY).await.unwrap();
    if !sql.is_empty() {
        db.execute_in_transaction(sql).await.unwrap();
    }
    DashboardReader::new(Arc::new(db))
}

#[tokio::test]
async fn test_empty_tables_give_well_formed_results() {
    let reader = reader_with("").await;

    assert!(reader.monthly_trends().await.unwrap().is_empty());

    let risk = reader.risk_distribution().await.unwrap();
    assert_eq!(risk.len(), 8);
    assert!(risk.iter().all(|b| b.patients == 0));
    assert_eq!(risk.first().unwrap().score, 0);
    assert_eq!(risk.last().unwrap().score, MAX_RISK_SCORE);

    let diagnoses = reader.diagnosis_counts().await.unwrap();
    assert_eq!(diagnoses.len(), DIAGNOSIS_COLUMNS.len());
    assert!(diagnoses.iter().all(|d| d.count == 0));
}

#[tokio::test]
async fn test_monthly_trends_ordered_by_month() {
    let reader = reader_with(
        "INSERT INTO analytics_hdhi_dashboard VALUES
            ('2017-05', 3, 2, 1, 1, 1, 1),
            ('2017-04', 4, 3, 1, 2, 2, 2);",
    )
    .await;

    let months = reader.monthly_trends().await.unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2017-04");
    assert_eq!(
        months[1],
        MonthlyAggregate {
            month: "2017-05".into(),
            total_admissions: 3,
            emergency_cases: 2,
            opd_cases: 1,
            count_long_icu: 1,
            count_cardiac_distress: 1,
            count_metabolic_risk: 1,
        }
    );
}

#[tokio::test]
async fn test_risk_distribution_counts_scores() {
    let reader = reader_with(
        "INSERT INTO analytics_hdhi_clean (sno, lifestyle_risk_score) VALUES
            (1, 4), (2, 1), (3, 1), (4, 7), (5, NULL);",
    )
    .await;

    let risk = reader.risk_distribution().await.unwrap();
    let count = |score: i64| risk.iter().find(|b| b.score == score).unwrap().patients;
    assert_eq!(count(0), 0);
    assert_eq!(count(1), 2);
    assert_eq!(count(4), 1);
    assert_eq!(count(7), 1);
    assert_eq!(risk.iter().map(|b| b.patients).sum::<i64>(), 4);
}

#[tokio::test]
async fn test_diagnosis_counts_sum_flags() {
    let reader = reader_with(
        "INSERT INTO analytics_hdhi_clean VALUES
            (1, 4, true, true, false, false, false, false, false, false, false),
            (2, 1, false, false, true, true, false, false, false, true, false),
            (3, 1, true, NULL, true, false, true, false, false, false, true);",
    )
    .await;

    let diagnoses = reader.diagnosis_counts().await.unwrap();
    let count = |name: &str| diagnoses.iter().find(|d| d.diagnosis == name).unwrap().count;
    assert_eq!(count("acs"), 2);
    assert_eq!(count("stemi"), 1);
    assert_eq!(count("heart_failure"), 2);
    assert_eq!(count("hfnef"), 1);
    assert_eq!(count("cva_bleed"), 0);
    assert_eq!(count("shock"), 1);
    assert_eq!(diagnoses[0].diagnosis, "acs");
}

#[tokio::test]
async fn test_missing_table_reported() {
    let db = DuckDbBackend::in_memory().unwrap();
    let reader = DashboardReader::new(Arc::new(db));

    let err = reader.monthly_trends().await.unwrap_err();
    assert!(matches!(err, DashboardError::MissingTable { .. }));
    assert!(err.to_string().contains("analytics_hdhi_dashboard"));
}

#[tokio::test]
async fn test_custom_table_names() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_in_transaction(
        "CREATE SCHEMA reporting;
         CREATE TABLE reporting.dash AS SELECT * FROM (VALUES ('2018-01', 1, 1, 0, 0, 0, 0))
            t(month, total_admissions, emergency_cases, opd_cases, count_long_icu,
              count_cardiac_distress, count_metabolic_risk);",
    )
    .await
    .unwrap();
    let reader = DashboardReader::new(Arc::new(db)).with_tables(
        TableName::new("reporting.dash"),
        TableName::new("reporting.clean"),
    );

    let months = reader.monthly_trends().await.unwrap();
    assert_eq!(months[0].total_admissions, 1);
    assert!(reader.diagnosis_counts().await.is_err());
}

#[tokio::test]
async fn test_snapshot_collects_all_views() {
    let reader = reader_with(
        "INSERT INTO analytics_hdhi_dashboard VALUES ('2017-04', 1, 1, 0, 0, 0, 0);
         INSERT INTO analytics_hdhi_clean (sno, lifestyle_risk_score, acs) VALUES (1, 2, true);",
    )
    .await;

    let snapshot = reader.snapshot().await.unwrap();
    assert_eq!(snapshot.monthly.len(), 1);
    assert_eq!(snapshot.risk_distribution[2].patients, 1);
    assert_eq!(snapshot.diagnoses[0].count, 1);
}

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{alert, barangay, dengue_case, environmental_report};
use crate::store::AlertStatus;

/// Seeds the table-total gauges at startup so dashboards have a baseline
/// before any traffic arrives.
pub async fn init_metrics(db: &DatabaseConnection) {
    let barangay_count = barangay::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("denguewatch_barangays_total").set(barangay_count as f64);

    let case_count = dengue_case::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("denguewatch_cases_total").set(case_count as f64);

    let report_count = environmental_report::Entity::find()
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("denguewatch_reports_total").set(report_count as f64);

    let active_alert_count = alert::Entity::find()
        .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("denguewatch_active_alerts_total").set(active_alert_count as f64);

    tracing::info!(
        "Initialized metrics: Barangays={}, Cases={}, Reports={}, ActiveAlerts={}",
        barangay_count,
        case_count,
        report_count,
        active_alert_count
    );
}

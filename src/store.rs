use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{alert, barangay, dengue_case, environmental_report};

/// Internal alert severity scale. Persisted on alert rows; the public
/// dashboard uses a separate four-tier display scale (see risk_rank).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Active,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::Dismissed => "DISMISSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(AlertStatus::Active),
            "RESOLVED" => Some(AlertStatus::Resolved),
            "DISMISSED" => Some(AlertStatus::Dismissed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BarangaySummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub municipality: String,
    pub province: String,
    pub population: Option<i32>,
}

impl From<barangay::Model> for BarangaySummary {
    fn from(b: barangay::Model) -> Self {
        BarangaySummary {
            id: b.id,
            name: b.name,
            code: b.code,
            municipality: b.municipality,
            province: b.province,
            population: b.population,
        }
    }
}

pub struct NewAlert {
    pub barangay_id: Uuid,
    pub title: String,
    pub message: String,
    pub risk_level: RiskLevel,
    pub metadata: serde_json::Value,
}

pub struct AlertUpdate {
    pub message: String,
    pub risk_level: RiskLevel,
    pub metadata: serde_json::Value,
}

/// Query contract the surveillance core runs against. Injected so the early
/// warning and dashboard paths can be driven by an in-memory fake in tests.
/// All date ranges are inclusive on both ends.
#[async_trait]
pub trait SurveillanceStore: Send + Sync {
    async fn count_cases(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr>;

    /// Environmental reports with at least one risk flag set.
    async fn count_qualifying_reports(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr>;

    /// All environmental reports, qualifying or not.
    async fn count_reports(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr>;

    async fn barangay_name(&self, id: Uuid) -> Result<Option<String>, DbErr>;

    async fn list_barangays(&self) -> Result<Vec<BarangaySummary>, DbErr>;

    async fn find_active_alert(
        &self,
        barangay_id: Uuid,
        level: RiskLevel,
    ) -> Result<Option<alert::Model>, DbErr>;

    async fn create_alert(&self, fields: NewAlert) -> Result<alert::Model, DbErr>;

    async fn update_alert(&self, id: Uuid, fields: AlertUpdate) -> Result<alert::Model, DbErr>;

    async fn active_alerts_by_levels(
        &self,
        barangay_id: Uuid,
        levels: &[RiskLevel],
    ) -> Result<Vec<alert::Model>, DbErr>;

    async fn resolve_alert(&self, id: Uuid, resolved_at: NaiveDateTime) -> Result<(), DbErr>;

    async fn count_active_alerts(&self, barangay_id: Option<Uuid>) -> Result<u64, DbErr>;

    async fn most_recent_active_alert(
        &self,
        barangay_id: Uuid,
    ) -> Result<Option<alert::Model>, DbErr>;

    /// Latest ACTIVE alerts across all barangays, newest first, with the
    /// owning barangay attached for display.
    async fn recent_active_alerts(
        &self,
        limit: u64,
    ) -> Result<Vec<(alert::Model, Option<BarangaySummary>)>, DbErr>;

    /// Most recent updated_at across cases, reports and alerts.
    async fn last_activity_at(&self) -> Result<Option<NaiveDateTime>, DbErr>;
}

/// sea-orm backed store used by the running server.
#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        DbStore { db }
    }
}

fn risk_flag_condition() -> Condition {
    Condition::any()
        .add(environmental_report::Column::StagnantWater.eq(true))
        .add(environmental_report::Column::PoorWasteDisposal.eq(true))
        .add(environmental_report::Column::CloggedDrainage.eq(true))
        .add(environmental_report::Column::HousingCongestion.eq(true))
}

#[async_trait]
impl SurveillanceStore for DbStore {
    async fn count_cases(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let mut query = dengue_case::Entity::find()
            .filter(dengue_case::Column::DateReported.gte(from))
            .filter(dengue_case::Column::DateReported.lte(to));
        if let Some(id) = barangay_id {
            query = query.filter(dengue_case::Column::BarangayId.eq(id));
        }
        query.count(&self.db).await
    }

    async fn count_qualifying_reports(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let mut query = environmental_report::Entity::find()
            .filter(environmental_report::Column::DateReported.gte(from))
            .filter(environmental_report::Column::DateReported.lte(to))
            .filter(risk_flag_condition());
        if let Some(id) = barangay_id {
            query = query.filter(environmental_report::Column::BarangayId.eq(id));
        }
        query.count(&self.db).await
    }

    async fn count_reports(
        &self,
        barangay_id: Option<Uuid>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let mut query = environmental_report::Entity::find()
            .filter(environmental_report::Column::DateReported.gte(from))
            .filter(environmental_report::Column::DateReported.lte(to));
        if let Some(id) = barangay_id {
            query = query.filter(environmental_report::Column::BarangayId.eq(id));
        }
        query.count(&self.db).await
    }

    async fn barangay_name(&self, id: Uuid) -> Result<Option<String>, DbErr> {
        Ok(barangay::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(|b| b.name))
    }

    async fn list_barangays(&self) -> Result<Vec<BarangaySummary>, DbErr> {
        let rows = barangay::Entity::find()
            .order_by_asc(barangay::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(BarangaySummary::from).collect())
    }

    async fn find_active_alert(
        &self,
        barangay_id: Uuid,
        level: RiskLevel,
    ) -> Result<Option<alert::Model>, DbErr> {
        alert::Entity::find()
            .filter(alert::Column::BarangayId.eq(barangay_id))
            .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()))
            .filter(alert::Column::RiskLevel.eq(level.as_str()))
            .order_by_desc(alert::Column::TriggeredAt)
            .one(&self.db)
            .await
    }

    async fn create_alert(&self, fields: NewAlert) -> Result<alert::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let model = alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            barangay_id: Set(fields.barangay_id),
            title: Set(fields.title),
            message: Set(fields.message),
            risk_level: Set(fields.risk_level.as_str().to_string()),
            status: Set(AlertStatus::Active.as_str().to_string()),
            metadata: Set(fields.metadata),
            triggered_at: Set(now),
            resolved_at: Set(None),
            updated_at: Set(now),
        };
        model.insert(&self.db).await
    }

    async fn update_alert(&self, id: Uuid, fields: AlertUpdate) -> Result<alert::Model, DbErr> {
        let existing = alert::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("alert {}", id)))?;

        let mut active = existing.into_active_model();
        active.message = Set(fields.message);
        active.risk_level = Set(fields.risk_level.as_str().to_string());
        active.metadata = Set(fields.metadata);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await
    }

    async fn active_alerts_by_levels(
        &self,
        barangay_id: Uuid,
        levels: &[RiskLevel],
    ) -> Result<Vec<alert::Model>, DbErr> {
        let names: Vec<&str> = levels.iter().map(|l| l.as_str()).collect();
        alert::Entity::find()
            .filter(alert::Column::BarangayId.eq(barangay_id))
            .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()))
            .filter(alert::Column::RiskLevel.is_in(names))
            .all(&self.db)
            .await
    }

    async fn resolve_alert(&self, id: Uuid, resolved_at: NaiveDateTime) -> Result<(), DbErr> {
        let existing = alert::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("alert {}", id)))?;

        let mut active = existing.into_active_model();
        active.status = Set(AlertStatus::Resolved.as_str().to_string());
        active.resolved_at = Set(Some(resolved_at));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn count_active_alerts(&self, barangay_id: Option<Uuid>) -> Result<u64, DbErr> {
        let mut query = alert::Entity::find()
            .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()));
        if let Some(id) = barangay_id {
            query = query.filter(alert::Column::BarangayId.eq(id));
        }
        query.count(&self.db).await
    }

    async fn most_recent_active_alert(
        &self,
        barangay_id: Uuid,
    ) -> Result<Option<alert::Model>, DbErr> {
        alert::Entity::find()
            .filter(alert::Column::BarangayId.eq(barangay_id))
            .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()))
            .order_by_desc(alert::Column::TriggeredAt)
            .one(&self.db)
            .await
    }

    async fn recent_active_alerts(
        &self,
        limit: u64,
    ) -> Result<Vec<(alert::Model, Option<BarangaySummary>)>, DbErr> {
        let rows = alert::Entity::find()
            .filter(alert::Column::Status.eq(AlertStatus::Active.as_str()))
            .order_by_desc(alert::Column::TriggeredAt)
            .limit(limit)
            .find_also_related(barangay::Entity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(a, b)| (a, b.map(BarangaySummary::from)))
            .collect())
    }

    async fn last_activity_at(&self) -> Result<Option<NaiveDateTime>, DbErr> {
        let latest_case = dengue_case::Entity::find()
            .order_by_desc(dengue_case::Column::UpdatedAt)
            .one(&self.db)
            .await?
            .map(|c| c.updated_at);
        let latest_report = environmental_report::Entity::find()
            .order_by_desc(environmental_report::Column::UpdatedAt)
            .one(&self.db)
            .await?
            .map(|r| r.updated_at);
        let latest_alert = alert::Entity::find()
            .order_by_desc(alert::Column::UpdatedAt)
            .one(&self.db)
            .await?
            .map(|a| a.updated_at);

        Ok([latest_case, latest_report, latest_alert]
            .into_iter()
            .flatten()
            .max())
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        cases: Vec<(Uuid, NaiveDateTime, NaiveDateTime)>,
        reports: Vec<(Uuid, NaiveDateTime, bool, NaiveDateTime)>,
        barangays: Vec<BarangaySummary>,
        alerts: Vec<alert::Model>,
    }

    /// In-memory stand-in for DbStore. Records live in Vecs; date filtering
    /// mirrors the inclusive-range semantics of the SQL queries.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
        fail: AtomicBool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every subsequent call fails with a DbErr, for exercising the
        /// swallow-and-log boundary.
        pub fn fail_all(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        fn check_fail(&self) -> Result<(), DbErr> {
            if self.fail.load(Ordering::SeqCst) {
                Err(DbErr::Custom("store unavailable".into()))
            } else {
                Ok(())
            }
        }

        pub fn add_barangay(&self, name: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.inner.lock().unwrap().barangays.push(BarangaySummary {
                id,
                name: name.to_string(),
                code: format!("BRGY-{}", name.to_uppercase()),
                municipality: "Test Municipality".to_string(),
                province: "Test Province".to_string(),
                population: None,
            });
            id
        }

        pub fn add_cases(&self, barangay_id: Uuid, reported: NaiveDateTime, count: usize) {
            let mut inner = self.inner.lock().unwrap();
            for _ in 0..count {
                inner.cases.push((barangay_id, reported, reported));
            }
        }

        pub fn add_reports(
            &self,
            barangay_id: Uuid,
            reported: NaiveDateTime,
            qualifying: bool,
            count: usize,
        ) {
            let mut inner = self.inner.lock().unwrap();
            for _ in 0..count {
                inner
                    .reports
                    .push((barangay_id, reported, qualifying, reported));
            }
        }

        pub fn alerts(&self) -> Vec<alert::Model> {
            self.inner.lock().unwrap().alerts.clone()
        }

        pub fn active_alerts(&self) -> Vec<alert::Model> {
            self.inner
                .lock()
                .unwrap()
                .alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active.as_str())
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl SurveillanceStore for MemoryStore {
        async fn count_cases(
            &self,
            barangay_id: Option<Uuid>,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> Result<u64, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .cases
                .iter()
                .filter(|(b, d, _)| {
                    barangay_id.map_or(true, |id| *b == id) && *d >= from && *d <= to
                })
                .count() as u64)
        }

        async fn count_qualifying_reports(
            &self,
            barangay_id: Option<Uuid>,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> Result<u64, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .reports
                .iter()
                .filter(|(b, d, q, _)| {
                    *q && barangay_id.map_or(true, |id| *b == id) && *d >= from && *d <= to
                })
                .count() as u64)
        }

        async fn count_reports(
            &self,
            barangay_id: Option<Uuid>,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> Result<u64, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .reports
                .iter()
                .filter(|(b, d, _, _)| {
                    barangay_id.map_or(true, |id| *b == id) && *d >= from && *d <= to
                })
                .count() as u64)
        }

        async fn barangay_name(&self, id: Uuid) -> Result<Option<String>, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .barangays
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.name.clone()))
        }

        async fn list_barangays(&self) -> Result<Vec<BarangaySummary>, DbErr> {
            self.check_fail()?;
            Ok(self.inner.lock().unwrap().barangays.clone())
        }

        async fn find_active_alert(
            &self,
            barangay_id: Uuid,
            level: RiskLevel,
        ) -> Result<Option<alert::Model>, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .alerts
                .iter()
                .filter(|a| {
                    a.barangay_id == barangay_id
                        && a.status == AlertStatus::Active.as_str()
                        && a.risk_level == level.as_str()
                })
                .max_by_key(|a| a.triggered_at)
                .cloned())
        }

        async fn create_alert(&self, fields: NewAlert) -> Result<alert::Model, DbErr> {
            self.check_fail()?;
            let now = chrono::Utc::now().naive_utc();
            let model = alert::Model {
                id: Uuid::new_v4(),
                barangay_id: fields.barangay_id,
                title: fields.title,
                message: fields.message,
                risk_level: fields.risk_level.as_str().to_string(),
                status: AlertStatus::Active.as_str().to_string(),
                metadata: fields.metadata,
                triggered_at: now,
                resolved_at: None,
                updated_at: now,
            };
            self.inner.lock().unwrap().alerts.push(model.clone());
            Ok(model)
        }

        async fn update_alert(
            &self,
            id: Uuid,
            fields: AlertUpdate,
        ) -> Result<alert::Model, DbErr> {
            self.check_fail()?;
            let mut inner = self.inner.lock().unwrap();
            let alert = inner
                .alerts
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| DbErr::RecordNotFound(format!("alert {}", id)))?;
            alert.message = fields.message;
            alert.risk_level = fields.risk_level.as_str().to_string();
            alert.metadata = fields.metadata;
            alert.updated_at = chrono::Utc::now().naive_utc();
            Ok(alert.clone())
        }

        async fn active_alerts_by_levels(
            &self,
            barangay_id: Uuid,
            levels: &[RiskLevel],
        ) -> Result<Vec<alert::Model>, DbErr> {
            self.check_fail()?;
            let names: Vec<&str> = levels.iter().map(|l| l.as_str()).collect();
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .alerts
                .iter()
                .filter(|a| {
                    a.barangay_id == barangay_id
                        && a.status == AlertStatus::Active.as_str()
                        && names.contains(&a.risk_level.as_str())
                })
                .cloned()
                .collect())
        }

        async fn resolve_alert(
            &self,
            id: Uuid,
            resolved_at: NaiveDateTime,
        ) -> Result<(), DbErr> {
            self.check_fail()?;
            let mut inner = self.inner.lock().unwrap();
            let alert = inner
                .alerts
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| DbErr::RecordNotFound(format!("alert {}", id)))?;
            alert.status = AlertStatus::Resolved.as_str().to_string();
            alert.resolved_at = Some(resolved_at);
            alert.updated_at = resolved_at;
            Ok(())
        }

        async fn count_active_alerts(&self, barangay_id: Option<Uuid>) -> Result<u64, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .alerts
                .iter()
                .filter(|a| {
                    a.status == AlertStatus::Active.as_str()
                        && barangay_id.map_or(true, |id| a.barangay_id == id)
                })
                .count() as u64)
        }

        async fn most_recent_active_alert(
            &self,
            barangay_id: Uuid,
        ) -> Result<Option<alert::Model>, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .alerts
                .iter()
                .filter(|a| {
                    a.barangay_id == barangay_id && a.status == AlertStatus::Active.as_str()
                })
                .max_by_key(|a| a.triggered_at)
                .cloned())
        }

        async fn recent_active_alerts(
            &self,
            limit: u64,
        ) -> Result<Vec<(alert::Model, Option<BarangaySummary>)>, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            let mut active: Vec<alert::Model> = inner
                .alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active.as_str())
                .cloned()
                .collect();
            active.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
            active.truncate(limit as usize);
            Ok(active
                .into_iter()
                .map(|a| {
                    let barangay = inner
                        .barangays
                        .iter()
                        .find(|b| b.id == a.barangay_id)
                        .cloned();
                    (a, barangay)
                })
                .collect())
        }

        async fn last_activity_at(&self) -> Result<Option<NaiveDateTime>, DbErr> {
            self.check_fail()?;
            let inner = self.inner.lock().unwrap();
            let case_ts = inner.cases.iter().map(|(_, _, u)| *u).max();
            let report_ts = inner.reports.iter().map(|(_, _, _, u)| *u).max();
            let alert_ts = inner.alerts.iter().map(|a| a.updated_at).max();
            Ok([case_ts, report_ts, alert_ts].into_iter().flatten().max())
        }
    }
}

//! Trait-object storage for generated plans and tracked meal events.
//!
//! In-memory implementations back the service; the traits leave room for
//! a database-backed variant without touching the handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use meal_pipeline::{MealPlanData, TrackedMeal, TrackingStatus};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::types::PlanType;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// A generated plan as persisted: the canonical pipeline output plus the
/// request metadata around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMealPlan {
    pub id: String,
    pub user_id: String,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_calories: i64,
    pub plan: MealPlanData,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PlanStorage: Send + Sync {
    async fn save(&self, plan: StoredMealPlan) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<StoredMealPlan>>;
    /// All plans for a user, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredMealPlan>>;
    /// Latest plan whose date window covers `date`.
    async fn active_plan_for(&self, user_id: &str, date: NaiveDate)
    -> Result<Option<StoredMealPlan>>;
}

/// One recorded consumption event for a planned meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealTrackingRecord {
    pub id: String,
    pub user_id: String,
    pub tracking_date: NaiveDate,
    pub meal_type: String,
    pub dish_name: String,
    pub calories: Option<f64>,
    pub consumed_calories: Option<f64>,
    pub status: TrackingStatus,
    pub suggested_time: Option<String>,
    pub actual_time: Option<String>,
    pub modifications: Option<String>,
    pub portion_size: Option<String>,
}

impl MealTrackingRecord {
    /// Project the stored row into the analyzer's input shape.
    pub fn to_tracked_meal(&self) -> TrackedMeal {
        TrackedMeal {
            meal_type: self.meal_type.clone(),
            dish_name: self.dish_name.clone(),
            calories: self.calories,
            consumed_calories: self.consumed_calories,
            status: self.status,
            suggested_time: self.suggested_time.clone(),
            actual_time: self.actual_time.clone(),
            modifications: self.modifications.clone(),
            portion_size: self.portion_size.clone(),
        }
    }
}

#[async_trait]
pub trait TrackingStorage: Send + Sync {
    async fn save(&self, record: MealTrackingRecord) -> Result<()>;
    /// Events for one user and day, in insertion order.
    async fn list_for_date(&self, user_id: &str, date: NaiveDate)
    -> Result<Vec<MealTrackingRecord>>;
}

/// In-memory implementation of PlanStorage
pub struct InMemoryPlanStorage {
    plans: Arc<DashMap<String, StoredMealPlan>>,
}

impl InMemoryPlanStorage {
    pub fn new() -> Self {
        Self {
            plans: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryPlanStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanStorage for InMemoryPlanStorage {
    async fn save(&self, plan: StoredMealPlan) -> Result<()> {
        self.plans.insert(plan.id.clone(), plan);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredMealPlan>> {
        Ok(self.plans.get(id).map(|entry| entry.clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredMealPlan>> {
        let mut plans: Vec<StoredMealPlan> = self
            .plans
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn active_plan_for(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<StoredMealPlan>> {
        let plan = self
            .plans
            .iter()
            .filter(|entry| {
                entry.user_id == user_id
                    && entry.start_date <= date
                    && entry.end_date >= date
            })
            .map(|entry| entry.clone())
            .max_by_key(|plan| plan.created_at);
        Ok(plan)
    }
}

/// In-memory implementation of TrackingStorage
pub struct InMemoryTrackingStorage {
    records: Arc<DashMap<String, Vec<MealTrackingRecord>>>,
}

impl InMemoryTrackingStorage {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryTrackingStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingStorage for InMemoryTrackingStorage {
    async fn save(&self, record: MealTrackingRecord) -> Result<()> {
        self.records
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<MealTrackingRecord>> {
        let records = self
            .records
            .get(user_id)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|record| record.tracking_date == date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meal_pipeline::MealPlanData;

    fn plan(id: &str, user: &str, start: &str, end: &str, created_offset: i64) -> StoredMealPlan {
        StoredMealPlan {
            id: id.to_string(),
            user_id: user.to_string(),
            plan_type: PlanType::Daily,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            target_calories: 2000,
            plan: MealPlanData::empty(),
            model: "test-model".to_string(),
            created_at: Utc::now() + chrono::Duration::seconds(created_offset),
        }
    }

    fn record(user: &str, date: &str, meal_type: &str) -> MealTrackingRecord {
        MealTrackingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.to_string(),
            tracking_date: date.parse().unwrap(),
            meal_type: meal_type.to_string(),
            dish_name: "Dish".to_string(),
            calories: Some(300.0),
            consumed_calories: None,
            status: TrackingStatus::Ate,
            suggested_time: None,
            actual_time: None,
            modifications: None,
            portion_size: None,
        }
    }

    #[tokio::test]
    async fn plans_round_trip_and_list_newest_first() {
        let storage = InMemoryPlanStorage::new();
        storage
            .save(plan("p1", "u1", "2026-08-05", "2026-08-05", 0))
            .await
            .unwrap();
        storage
            .save(plan("p2", "u1", "2026-08-06", "2026-08-06", 10))
            .await
            .unwrap();
        storage
            .save(plan("p3", "other", "2026-08-06", "2026-08-06", 20))
            .await
            .unwrap();

        assert!(storage.get("p1").await.unwrap().is_some());
        assert!(storage.get("missing").await.unwrap().is_none());

        let plans = storage.list_for_user("u1").await.unwrap();
        let ids: Vec<&str> = plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn active_plan_picks_latest_covering_window() {
        let storage = InMemoryPlanStorage::new();
        storage
            .save(plan("old", "u1", "2026-08-01", "2026-08-07", 0))
            .await
            .unwrap();
        storage
            .save(plan("new", "u1", "2026-08-06", "2026-08-06", 10))
            .await
            .unwrap();
        storage
            .save(plan("outside", "u1", "2026-08-10", "2026-08-10", 20))
            .await
            .unwrap();

        let active = storage
            .active_plan_for("u1", "2026-08-06".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, "new");

        let none = storage
            .active_plan_for("u1", "2026-09-01".parse().unwrap())
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn trackings_filter_by_user_and_date() {
        let storage = InMemoryTrackingStorage::new();
        storage.save(record("u1", "2026-08-06", "breakfast")).await.unwrap();
        storage.save(record("u1", "2026-08-06", "lunch")).await.unwrap();
        storage.save(record("u1", "2026-08-05", "dinner")).await.unwrap();
        storage.save(record("u2", "2026-08-06", "snack")).await.unwrap();

        let records = storage
            .list_for_date("u1", "2026-08-06".parse().unwrap())
            .await
            .unwrap();
        let types: Vec<&str> = records.iter().map(|r| r.meal_type.as_str()).collect();
        assert_eq!(types, vec!["breakfast", "lunch"]);
    }

    #[test]
    fn record_projects_into_tracked_meal() {
        let record = record("u1", "2026-08-06", "breakfast");
        let tracked = record.to_tracked_meal();
        assert_eq!(tracked.meal_type, "breakfast");
        assert_eq!(tracked.calories, Some(300.0));
        assert_eq!(tracked.status, TrackingStatus::Ate);
    }
}

//! Persistence seams for profiles and prediction history
//!
//! The service talks to storage through async traits so the in-memory
//! implementations used here (and in tests) can be replaced by a database
//! backend without touching the service logic.

use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edu2job_core::{EducationSnapshot, Profile, RankedRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A user's profile as persisted, with its cached encoded form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user_id: String,
    pub profile: Profile,
    /// Encoded snapshot against the bundle named by its fingerprint;
    /// `None` until a bundle exists to encode against
    pub education_processed: Option<EducationSnapshot>,
}

/// One persisted prediction event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub user_id: String,
    /// Top-ranked role label at prediction time
    pub prediction: String,
    /// Confidence of the top-ranked role
    pub confidence: f64,
    pub top_predictions: Vec<RankedRole>,
    pub created_at: DateTime<Utc>,
    /// User rating 1 to 5, once submitted
    pub feedback: Option<i32>,
    pub flagged: bool,
}

/// Profile persistence seam
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert(&self, profile: StoredProfile) -> Result<(), ServiceError>;
    async fn get(&self, user_id: &str) -> Result<Option<StoredProfile>, ServiceError>;
}

/// Prediction-history persistence seam
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a new record, assigning its id
    async fn append(
        &self,
        user_id: &str,
        prediction: String,
        confidence: f64,
        top_predictions: Vec<RankedRole>,
    ) -> Result<HistoryRecord, ServiceError>;

    /// A user's records, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<HistoryRecord>, ServiceError>;

    async fn get(&self, id: u64) -> Result<Option<HistoryRecord>, ServiceError>;

    async fn set_feedback(&self, id: u64, rating: i32) -> Result<(), ServiceError>;

    async fn set_flagged(&self, id: u64, flagged: bool) -> Result<(), ServiceError>;
}

/// In-memory profile store
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<BTreeMap<String, StoredProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(&self, profile: StoredProfile) -> Result<(), ServiceError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<StoredProfile>, ServiceError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

/// In-memory history store with monotonically increasing record ids
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<HistoryRecord>>,
    next_id: AtomicU64,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(
        &self,
        user_id: &str,
        prediction: String,
        confidence: f64,
        top_predictions: Vec<RankedRole>,
    ) -> Result<HistoryRecord, ServiceError> {
        let record = HistoryRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            user_id: user_id.to_string(),
            prediction,
            confidence,
            top_predictions,
            created_at: Utc::now(),
            feedback: None,
            flagged: false,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<HistoryRecord>, ServiceError> {
        let records = self.records.read().await;
        let mut mine: Vec<HistoryRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        mine.reverse();
        Ok(mine)
    }

    async fn get(&self, id: u64) -> Result<Option<HistoryRecord>, ServiceError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn set_feedback(&self, id: u64, rating: i32) -> Result<(), ServiceError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.feedback = Some(rating);
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!("history record {id}"))),
        }
    }

    async fn set_flagged(&self, id: u64, flagged: bool) -> Result<(), ServiceError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.flagged = flagged;
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!("history record {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_ids_increase_and_listing_is_newest_first() {
        let store = InMemoryHistoryStore::new();
        let first = store
            .append("alice", "Data Scientist".into(), 81.2, vec![])
            .await
            .unwrap();
        let second = store
            .append("alice", "Backend Developer".into(), 44.0, vec![])
            .await
            .unwrap();
        store
            .append("bob", "QA Engineer".into(), 60.0, vec![])
            .await
            .unwrap();

        assert!(second.id > first.id);
        let listed = store.list("alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn feedback_on_missing_record_is_not_found() {
        let store = InMemoryHistoryStore::new();
        assert!(matches!(
            store.set_feedback(99, 5).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

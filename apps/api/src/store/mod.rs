//! Profile document store. The rest of the crate depends only on the
//! `ProfileStore` trait, carried in `AppState` as `Arc<dyn ProfileStore>`;
//! `PgProfileStore` is the PostgreSQL/JSONB implementation.
//!
//! Store failures are fatal for the current request: surfaced, not retried.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::Profile;

/// How a gender filter is applied to stored documents. Documents are
/// inconsistent about whether `Gender` is a scalar or a list, so candidate
/// queries run an array-containment pass first and fall back to scalar
/// equality when it finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Array containment: matches `["Female", ...]` documents.
    Primary,
    /// Scalar text equality: matches `"Female"` documents.
    Broadened,
}

#[derive(Debug, Clone)]
pub struct ProfileQuery {
    pub gender: String,
    pub mode: QueryMode,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    /// Candidate pool lookup. Results are returned in storage order, which
    /// downstream ranking relies on as the stable tie-break.
    async fn query(&self, filter: &ProfileQuery) -> Result<Vec<(Uuid, Profile)>, AppError>;

    /// Upserts a profile document. With `merge` the incoming document is
    /// overlaid onto the stored one; without it the document is replaced.
    async fn put(&self, user_id: Uuid, profile: &Profile, merge: bool) -> Result<(), AppError>;

    /// Appends a record to a named per-user collection.
    async fn append_record(
        &self,
        user_id: Uuid,
        collection: &str,
        record: &Value,
    ) -> Result<(), AppError>;

    /// Lists a per-user collection in insertion order.
    async fn list_records(&self, user_id: Uuid, collection: &str) -> Result<Vec<Value>, AppError>;
}

/// PostgreSQL-backed store over two JSONB tables:
/// `profiles (user_id, data, updated_at)` and
/// `user_records (id, user_id, collection, data, created_at)`.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a connection pool and wraps it.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let data: Option<Value> =
            sqlx::query_scalar("SELECT data FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        match data {
            Some(value) => {
                let profile = serde_json::from_value(value).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Stored profile for {user_id} is malformed: {e}"
                    ))
                })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn query(&self, filter: &ProfileQuery) -> Result<Vec<(Uuid, Profile)>, AppError> {
        let sql = match filter.mode {
            QueryMode::Primary => {
                "SELECT user_id, data FROM profiles \
                 WHERE jsonb_typeof(data->'UserID'->'BasicInfo'->'Gender') = 'array' \
                   AND data->'UserID'->'BasicInfo'->'Gender' @> to_jsonb($1::text) \
                 ORDER BY updated_at"
            }
            QueryMode::Broadened => {
                "SELECT user_id, data FROM profiles \
                 WHERE data->'UserID'->'BasicInfo'->>'Gender' = $1 \
                 ORDER BY updated_at"
            }
        };

        let rows: Vec<(Uuid, Value)> = sqlx::query_as(sql)
            .bind(&filter.gender)
            .fetch_all(&self.pool)
            .await?;

        // A single malformed document must not sink the whole candidate pool.
        let mut profiles = Vec::with_capacity(rows.len());
        for (user_id, value) in rows {
            match serde_json::from_value(value) {
                Ok(profile) => profiles.push((user_id, profile)),
                Err(e) => warn!("Skipping malformed profile document for {user_id}: {e}"),
            }
        }
        Ok(profiles)
    }

    async fn put(&self, user_id: Uuid, profile: &Profile, merge: bool) -> Result<(), AppError> {
        let data = serde_json::to_value(profile).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE
            SET data = CASE WHEN $3 THEN profiles.data || EXCLUDED.data ELSE EXCLUDED.data END,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(&data)
        .bind(merge)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_record(
        &self,
        user_id: Uuid,
        collection: &str,
        record: &Value,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_records (id, user_id, collection, data) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(collection)
        .bind(record)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_records(&self, user_id: Uuid, collection: &str) -> Result<Vec<Value>, AppError> {
        let rows: Vec<Value> = sqlx::query_scalar(
            "SELECT data FROM user_records \
             WHERE user_id = $1 AND collection = $2 \
             ORDER BY created_at",
        )
        .bind(user_id)
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::models::profile::TraitValue;

    /// In-memory `ProfileStore` mirroring the Postgres query semantics.
    /// Profiles keep insertion order so ranking tie-breaks are observable.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub profiles: Mutex<Vec<(Uuid, Profile)>>,
        pub records: Mutex<Vec<(Uuid, String, Value)>>,
    }

    impl MemoryStore {
        pub fn with_profiles(profiles: Vec<(Uuid, Profile)>) -> Self {
            Self {
                profiles: Mutex::new(profiles),
                records: Mutex::default(),
            }
        }
    }

    fn gender_matches(profile: &Profile, filter: &ProfileQuery) -> bool {
        match (&profile.user.basic_info.gender, filter.mode) {
            (Some(TraitValue::Many(gs)), QueryMode::Primary) => {
                gs.iter().any(|g| g == &filter.gender)
            }
            (Some(TraitValue::One(g)), QueryMode::Broadened) => g == &filter.gender,
            _ => false,
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryStore {
        async fn get(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| *id == user_id)
                .map(|(_, p)| p.clone()))
        }

        async fn query(&self, filter: &ProfileQuery) -> Result<Vec<(Uuid, Profile)>, AppError> {
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, p)| gender_matches(p, filter))
                .cloned()
                .collect())
        }

        async fn put(&self, user_id: Uuid, profile: &Profile, _merge: bool) -> Result<(), AppError> {
            let mut profiles = self.profiles.lock().unwrap();
            if let Some(slot) = profiles.iter_mut().find(|(id, _)| *id == user_id) {
                slot.1 = profile.clone();
            } else {
                profiles.push((user_id, profile.clone()));
            }
            Ok(())
        }

        async fn append_record(
            &self,
            user_id: Uuid,
            collection: &str,
            record: &Value,
        ) -> Result<(), AppError> {
            self.records
                .lock()
                .unwrap()
                .push((user_id, collection.to_string(), record.clone()));
            Ok(())
        }

        async fn list_records(
            &self,
            user_id: Uuid,
            collection: &str,
        ) -> Result<Vec<Value>, AppError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, name, _)| *id == user_id && name == collection)
                .map(|(_, _, data)| data.clone())
                .collect())
        }
    }
}

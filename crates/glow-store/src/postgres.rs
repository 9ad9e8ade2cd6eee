//! Postgres store

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use glow_core::{PaymentAttempt, PaymentStatus, ProfileHints, Tier, User, UserId};

use crate::error::StoreError;
use crate::ledger::{AdminStore, LedgerStore, VideoAsset};

const USER_COLUMNS: &str =
    "telegram_id, username, first_name, last_name, is_admin, has_access, created_at, updated_at";
const ATTEMPT_COLUMNS: &str =
    "charge_id, user_id, tier, amount_rub, currency, description, status, created_at, updated_at";

/// Postgres-backed store with embedded migrations
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, shared pools); does not run migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_user(row: &PgRow) -> User {
    User {
        id: UserId(row.get("telegram_id")),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_admin: row.get("is_admin"),
        has_access: row.get("has_access"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_attempt(row: &PgRow) -> Result<PaymentAttempt, StoreError> {
    let tier: String = row.get("tier");
    let status: String = row.get("status");
    let charge_id: String = row.get("charge_id");
    Ok(PaymentAttempt {
        tier: Tier::from_str(&tier)
            .ok_or_else(|| StoreError::Corrupt(format!("tier '{tier}' on charge {charge_id}")))?,
        status: PaymentStatus::parse(&status).ok_or_else(|| {
            StoreError::Corrupt(format!("status '{status}' on charge {charge_id}"))
        })?,
        charge_id,
        user_id: UserId(row.get("user_id")),
        amount_rub: row.get("amount_rub"),
        currency: row.get("currency"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn ensure_user(&self, id: UserId, hints: &ProfileHints) -> Result<User, StoreError> {
        // Concurrent first contacts for one telegram_id collapse into this
        // single upsert instead of surfacing a unique violation.
        let row = sqlx::query(&format!(
            r#"INSERT INTO users (telegram_id, username, first_name, last_name)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (telegram_id) DO UPDATE
               SET username = COALESCE(EXCLUDED.username, users.username),
                   first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                   last_name = COALESCE(EXCLUDED.last_name, users.last_name),
                   updated_at = NOW()
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id.as_i64())
        .bind(&hints.username)
        .bind(&hints.first_name)
        .bind(&hints.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_user(&row))
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn grant_access(&self, id: UserId) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET has_access = TRUE, updated_at = NOW() WHERE telegram_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &PaymentAttempt) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO payment_attempts
                   (charge_id, user_id, tier, amount_rub, currency, description, status, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(&attempt.charge_id)
        .bind(attempt.user_id.as_i64())
        .bind(attempt.tier.as_str())
        .bind(attempt.amount_rub)
        .bind(&attempt.currency)
        .bind(&attempt.description)
        .bind(attempt.status.as_str())
        .bind(attempt.created_at)
        .bind(attempt.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return Err(StoreError::Duplicate(attempt.charge_id.clone()));
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn attempt(&self, charge_id: &str) -> Result<Option<PaymentAttempt>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE charge_id = $1"
        ))
        .bind(charge_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_attempt).transpose()
    }

    async fn advance_status(
        &self,
        charge_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, StoreError> {
        // One conditional update: terminal rows and same-status duplicates
        // match zero rows, so racing deliveries cannot double-apply.
        let result = sqlx::query(
            r#"UPDATE payment_attempts
               SET status = $2, updated_at = NOW()
               WHERE charge_id = $1
                 AND status NOT IN ('succeeded', 'canceled')
                 AND status <> $2"#,
        )
        .bind(charge_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attempts_for_user(&self, id: UserId) -> Result<Vec<PaymentAttempt>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ATTEMPT_COLUMNS}
               FROM payment_attempts
               WHERE user_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_attempt).collect()
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn save_video(&self, video: &VideoAsset) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO video_assets (name, file_id, file_size, duration_secs, mime_type, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (name) DO UPDATE
               SET file_id = EXCLUDED.file_id,
                   file_size = EXCLUDED.file_size,
                   duration_secs = EXCLUDED.duration_secs,
                   mime_type = EXCLUDED.mime_type"#,
        )
        .bind(&video.name)
        .bind(&video.file_id)
        .bind(video.file_size)
        .bind(video.duration_secs)
        .bind(&video.mime_type)
        .bind(video.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn video(&self, name: &str) -> Result<Option<VideoAsset>, StoreError> {
        let row = sqlx::query(
            r#"SELECT name, file_id, file_size, duration_secs, mime_type, created_at
               FROM video_assets WHERE name = $1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| VideoAsset {
            name: r.get("name"),
            file_id: r.get("file_id"),
            file_size: r.get("file_size"),
            duration_secs: r.get("duration_secs"),
            mime_type: r.get("mime_type"),
            created_at: r.get("created_at"),
        }))
    }

    async fn open_upload_session(&self, admin: UserId, ttl: Duration) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO admin_upload_sessions (admin_id, expires_at)
               VALUES ($1, $2)
               ON CONFLICT (admin_id) DO UPDATE SET expires_at = EXCLUDED.expires_at"#,
        )
        .bind(admin.as_i64())
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_upload_session(&self, admin: UserId) -> Result<bool, StoreError> {
        // Delete-and-return consumes the row atomically; an expired row is
        // removed but reports no active session.
        let row = sqlx::query(
            "DELETE FROM admin_upload_sessions WHERE admin_id = $1 RETURNING expires_at",
        )
        .bind(admin.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| r.get::<chrono::DateTime<Utc>, _>("expires_at") > Utc::now())
            .unwrap_or(false))
    }

    async fn close_upload_session(&self, admin: UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM admin_upload_sessions WHERE admin_id = $1")
            .bind(admin.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

use super::{db_err, PgStorage};
use async_trait::async_trait;
use settle_common::domain::user::{KycStatus, User, UserRole, UserStatus};
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::UserId;
use sqlx::FromRow;

#[derive(FromRow)]
struct UserRow {
    external_id: uuid::Uuid,
    email: String,
    role: String,
    kyc_status: String,
    status: String,
    kyc_verified_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

fn parse_role(s: &str) -> UserRole {
    match s {
        "seller" => UserRole::Seller,
        "both" => UserRole::Both,
        "admin" => UserRole::Admin,
        _ => UserRole::Buyer,
    }
}

fn role_str(r: UserRole) -> &'static str {
    match r {
        UserRole::Buyer => "buyer",
        UserRole::Seller => "seller",
        UserRole::Both => "both",
        UserRole::Admin => "admin",
    }
}

fn parse_kyc(s: &str) -> KycStatus {
    match s {
        "pending" => KycStatus::Pending,
        "verified" => KycStatus::Verified,
        "rejected" => KycStatus::Rejected,
        _ => KycStatus::None,
    }
}

fn kyc_str(s: KycStatus) -> &'static str {
    match s {
        KycStatus::None => "none",
        KycStatus::Pending => "pending",
        KycStatus::Verified => "verified",
        KycStatus::Rejected => "rejected",
    }
}

fn parse_status(s: &str) -> UserStatus {
    match s {
        "suspended" => UserStatus::Suspended,
        "deleted" => UserStatus::Deleted,
        _ => UserStatus::Active,
    }
}

fn status_str(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "active",
        UserStatus::Suspended => "suspended",
        UserStatus::Deleted => "deleted",
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.external_id),
            email: row.email,
            role: parse_role(&row.role),
            kyc_status: parse_kyc(&row.kyc_status),
            status: parse_status(&row.status),
            kyc_verified_at: row.kyc_verified_at.map(|v| v as u64),
            created_at: row.created_at as u64,
            updated_at: row.updated_at as u64,
        }
    }
}

/// Filter + page parameters for `list_users` (§6: "GET /users (filter by
/// role, kyc_status; paginated)").
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub kyc_status: Option<KycStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn create_user(&self, email: &str, role: UserRole) -> CoreResult<User>;
    async fn get_user(&self, id: UserId) -> CoreResult<User>;
    async fn list_users(&self, filter: UserFilter) -> CoreResult<Vec<User>>;
    async fn update_email(&self, id: UserId, email: &str) -> CoreResult<User>;
    async fn set_user_role(&self, id: UserId, role: UserRole) -> CoreResult<User>;
    async fn set_kyc_status(&self, id: UserId, status: KycStatus, now: u64) -> CoreResult<User>;
    async fn set_user_status(&self, id: UserId, status: UserStatus) -> CoreResult<User>;
}

#[async_trait]
impl UserProvider for PgStorage {
    async fn create_user(&self, email: &str, role: UserRole) -> CoreResult<User> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (external_id, email, role, kyc_status, status, created_at, updated_at) \
             VALUES ($1, $2, $3, 'none', 'active', $4, $4)",
        )
        .bind(external_id)
        .bind(email)
        .bind(role_str(role))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("create_user", e))?;

        self.get_user(UserId(external_id)).await
    }

    async fn get_user(&self, id: UserId) -> CoreResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT external_id, email, role, kyc_status, status, kyc_verified_at, created_at, updated_at \
             FROM users WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_user", e))?
        .map(User::from)
        .ok_or_else(|| CoreError::NotFound(format!("user {id}")))
    }

    async fn list_users(&self, filter: UserFilter) -> CoreResult<Vec<User>> {
        let role = filter.role.map(role_str);
        let kyc_status = filter.kyc_status.map(kyc_str);
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT external_id, email, role, kyc_status, status, kyc_verified_at, created_at, updated_at \
             FROM users \
             WHERE ($1::text IS NULL OR role = $1) AND ($2::text IS NULL OR kyc_status = $2) \
             ORDER BY created_at LIMIT $3 OFFSET $4",
        )
        .bind(role)
        .bind(kyc_status)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_users", e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_email(&self, id: UserId, email: &str) -> CoreResult<User> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        sqlx::query("UPDATE users SET email = $1, updated_at = $2 WHERE external_id = $3")
            .bind(email)
            .bind(now)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("update_email", e))?;

        self.get_user(id).await
    }

    async fn set_user_role(&self, id: UserId, role: UserRole) -> CoreResult<User> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE external_id = $3")
            .bind(role_str(role))
            .bind(now)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_user_role", e))?;

        self.get_user(id).await
    }

    async fn set_kyc_status(&self, id: UserId, status: KycStatus, now: u64) -> CoreResult<User> {
        let now = now as i64;
        let bumps_verified_at = matches!(status, KycStatus::Verified);
        sqlx::query(
            "UPDATE users SET kyc_status = $1, updated_at = $2, \
             kyc_verified_at = CASE WHEN $3 AND kyc_verified_at IS NULL THEN $2 ELSE kyc_verified_at END \
             WHERE external_id = $4",
        )
        .bind(kyc_str(status))
        .bind(now)
        .bind(bumps_verified_at)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("set_kyc_status", e))?;

        self.get_user(id).await
    }

    /// Deleted is terminal (§3): the `status != 'deleted'` guard means a
    /// deleted user can never be un-deleted by a later status write, and a
    /// 0-row update reports the terminal-state conflict instead of
    /// silently re-fetching the (unchanged) user.
    async fn set_user_status(&self, id: UserId, status: UserStatus) -> CoreResult<User> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let updated = sqlx::query(
            "UPDATE users SET status = $1, updated_at = $2 \
             WHERE external_id = $3 AND status != 'deleted'",
        )
        .bind(status_str(status))
        .bind(now)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("set_user_status", e))?;

        if updated.rows_affected() == 0 {
            let existing = self.get_user(id).await?;
            if existing.status == UserStatus::Deleted {
                return Err(CoreError::Conflict(format!("user {id} is deleted")));
            }
            return Err(CoreError::NotFound(format!("user {id}")));
        }

        self.get_user(id).await
    }
}

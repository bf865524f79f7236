use super::{db_err, PgStorage};
use async_trait::async_trait;
use settle_common::crypto::Address;
use settle_common::domain::wallet::Wallet;
use settle_common::error::{CoreError, CoreResult};
use settle_common::ids::{UserId, WalletId};
use sqlx::FromRow;

#[derive(FromRow)]
struct WalletRow {
    external_id: uuid::Uuid,
    owner_user_id: uuid::Uuid,
    address: String,
    label: Option<String>,
    is_primary: bool,
    is_verified: bool,
    deleted_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = CoreError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        let address = Address::parse(&row.address).map_err(|_| CoreError::Internal)?;
        Ok(Wallet {
            id: WalletId(row.external_id),
            owner_user_id: UserId(row.owner_user_id),
            address,
            label: row.label,
            is_primary: row.is_primary,
            is_verified: row.is_verified,
            deleted_at: row.deleted_at.map(|v| v as u64),
            created_at: row.created_at as u64,
        })
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn add_wallet(&self, owner: UserId, address: Address, label: Option<String>) -> CoreResult<Wallet>;
    async fn get_wallet(&self, id: WalletId) -> CoreResult<Wallet>;
    async fn get_wallet_by_address(&self, address: Address) -> CoreResult<Wallet>;
    async fn list_wallets_by_user(&self, owner: UserId) -> CoreResult<Vec<Wallet>>;
    async fn set_label(&self, id: WalletId, label: Option<String>) -> CoreResult<Wallet>;
    async fn mark_verified(&self, id: WalletId) -> CoreResult<Wallet>;
    /// Sets `id` primary for its owner and demotes the previous primary
    /// in the same statement pair; fails with `Conflict` if `id` is not
    /// verified (§3: "setting primary requires Verified").
    async fn set_primary(&self, id: WalletId) -> CoreResult<Wallet>;
    async fn soft_delete_wallet(&self, id: WalletId, now: u64) -> CoreResult<()>;
}

#[async_trait]
impl WalletProvider for PgStorage {
    async fn add_wallet(&self, owner: UserId, address: Address, label: Option<String>) -> CoreResult<Wallet> {
        let now = settle_common::time::get_current_time_in_seconds() as i64;
        let external_id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO wallets (external_id, owner_user_id, address, label, is_primary, is_verified, created_at) \
             VALUES ($1, $2, $3, $4, false, false, $5)",
        )
        .bind(external_id)
        .bind(owner.0)
        .bind(address.to_string())
        .bind(label)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("add_wallet", e))?;

        self.get_wallet(WalletId(external_id)).await
    }

    async fn get_wallet(&self, id: WalletId) -> CoreResult<Wallet> {
        sqlx::query_as::<_, WalletRow>(
            "SELECT external_id, owner_user_id, address, label, is_primary, is_verified, deleted_at, created_at \
             FROM wallets WHERE external_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_wallet", e))?
        .ok_or_else(|| CoreError::NotFound(format!("wallet {id}")))?
        .try_into()
    }

    async fn get_wallet_by_address(&self, address: Address) -> CoreResult<Wallet> {
        sqlx::query_as::<_, WalletRow>(
            "SELECT external_id, owner_user_id, address, label, is_primary, is_verified, deleted_at, created_at \
             FROM wallets WHERE address = $1",
        )
        .bind(address.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_wallet_by_address", e))?
        .ok_or_else(|| CoreError::NotFound(format!("wallet {address}")))?
        .try_into()
    }

    async fn list_wallets_by_user(&self, owner: UserId) -> CoreResult<Vec<Wallet>> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT external_id, owner_user_id, address, label, is_primary, is_verified, deleted_at, created_at \
             FROM wallets WHERE owner_user_id = $1 ORDER BY created_at",
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_wallets_by_user", e))?;

        rows.into_iter().map(Wallet::try_from).collect()
    }

    async fn set_label(&self, id: WalletId, label: Option<String>) -> CoreResult<Wallet> {
        sqlx::query("UPDATE wallets SET label = $1 WHERE external_id = $2")
            .bind(label)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("set_label", e))?;

        self.get_wallet(id).await
    }

    async fn mark_verified(&self, id: WalletId) -> CoreResult<Wallet> {
        sqlx::query("UPDATE wallets SET is_verified = true WHERE external_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("mark_verified", e))?;

        self.get_wallet(id).await
    }

    async fn set_primary(&self, id: WalletId) -> CoreResult<Wallet> {
        let wallet = self.get_wallet(id).await?;
        if !wallet.is_verified {
            return Err(CoreError::Conflict("wallet must be verified before it can be primary".into()));
        }
        let mut tx = self.pool.begin().await.map_err(|e| db_err("set_primary:begin", e))?;
        sqlx::query("UPDATE wallets SET is_primary = false WHERE owner_user_id = $1 AND is_primary = true")
            .bind(wallet.owner_user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("set_primary:demote", e))?;
        sqlx::query("UPDATE wallets SET is_primary = true WHERE external_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("set_primary:promote", e))?;
        sqlx::query("UPDATE accounts SET primary_wallet_id = $1 WHERE owner_user_id = $2")
            .bind(id.0)
            .bind(wallet.owner_user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("set_primary:account_pointer", e))?;
        tx.commit().await.map_err(|e| db_err("set_primary:commit", e))?;

        self.get_wallet(id).await
    }

    async fn soft_delete_wallet(&self, id: WalletId, now: u64) -> CoreResult<()> {
        let wallet = self.get_wallet(id).await?;
        if wallet.is_primary {
            return Err(CoreError::Conflict("cannot delete the primary wallet".into()));
        }
        sqlx::query("UPDATE wallets SET deleted_at = $1 WHERE external_id = $2")
            .bind(now as i64)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("soft_delete_wallet", e))?;
        Ok(())
    }
}

/// Transaction-scoped wallet reads/writes for `verify` (§4.6: mark_verified,
/// the already-primary check, and the primary promotion all happen "under
/// the same unit of work").
pub async fn get_wallet_tx(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, id: WalletId) -> CoreResult<Wallet> {
    sqlx::query_as::<_, WalletRow>(
        "SELECT external_id, owner_user_id, address, label, is_primary, is_verified, deleted_at, created_at \
         FROM wallets WHERE external_id = $1",
    )
    .bind(id.0)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| db_err("get_wallet", e))?
    .ok_or_else(|| CoreError::NotFound(format!("wallet {id}")))?
    .try_into()
}

pub async fn list_wallets_by_user_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: UserId,
) -> CoreResult<Vec<Wallet>> {
    let rows = sqlx::query_as::<_, WalletRow>(
        "SELECT external_id, owner_user_id, address, label, is_primary, is_verified, deleted_at, created_at \
         FROM wallets WHERE owner_user_id = $1 ORDER BY created_at",
    )
    .bind(owner.0)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| db_err("list_wallets_by_user", e))?;

    rows.into_iter().map(Wallet::try_from).collect()
}

pub async fn mark_verified_tx(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, id: WalletId) -> CoreResult<Wallet> {
    sqlx::query("UPDATE wallets SET is_verified = true WHERE external_id = $1")
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("mark_verified", e))?;

    get_wallet_tx(tx, id).await
}

/// Same demote/promote/account-pointer sequence as `WalletProvider::set_primary`,
/// but against a caller-supplied transaction instead of opening its own.
pub async fn set_primary_tx(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, id: WalletId) -> CoreResult<Wallet> {
    let wallet = get_wallet_tx(tx, id).await?;
    if !wallet.is_verified {
        return Err(CoreError::Conflict("wallet must be verified before it can be primary".into()));
    }
    sqlx::query("UPDATE wallets SET is_primary = false WHERE owner_user_id = $1 AND is_primary = true")
        .bind(wallet.owner_user_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("set_primary:demote", e))?;
    sqlx::query("UPDATE wallets SET is_primary = true WHERE external_id = $1")
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("set_primary:promote", e))?;
    sqlx::query("UPDATE accounts SET primary_wallet_id = $1 WHERE owner_user_id = $2")
        .bind(id.0)
        .bind(wallet.owner_user_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("set_primary:account_pointer", e))?;

    get_wallet_tx(tx, id).await
}

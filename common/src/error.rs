use thiserror::Error;

/// Errors from the Account/Balance Engine (§4.2).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("insufficient available balance")]
    InsufficientBalance,
    #[error("insufficient held balance")]
    InsufficientHold,
    #[error("account is closed")]
    AccountClosed,
    #[error("optimistic version conflict after {attempts} attempts")]
    OptimisticConflict { attempts: u32 },
}

/// Errors from the Ledger Poster (§4.3).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger entries do not balance: debit={debit} credit={credit}")]
    Unbalanced { debit: String, credit: String },
    #[error("ledger entry amount must be > 0")]
    NonPositiveAmount,
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

/// Errors from the Signature Verifier + Nonce Store (§4.4).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature must be exactly 65 bytes")]
    InvalidSignatureLength,
    #[error("malformed wallet address")]
    InvalidAddress,
    #[error("signature timestamp is too old")]
    SignatureExpired,
    #[error("signature timestamp is in the future")]
    SignatureFuture,
    #[error("nonce already reserved or used")]
    NonceReused,
    #[error("recovered address does not match claimed wallet")]
    AddressMismatch,
    #[error("signature does not recover to a valid public key")]
    InvalidSignature,
}

/// Errors from the Distributed Lock (§4.5).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("lock on resource is held by another owner")]
    LockNotAcquired,
    #[error("lock is not held by this owner")]
    LockNotHeld,
}

/// Errors from the Aggregate State Machines (§4.6).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transition {event} is not admissible from state {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: String,
    pub event: String,
}

/// Errors from the Idempotency Cache (§4.8).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyError {
    #[error("idempotency key reused with a different request body")]
    Conflict,
}

/// Top-level error taxonomy (§7), used at the HTTP boundary to pick a status
/// code. Component errors convert into this via `From` so inner modules
/// never have to know about HTTP.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Idempotency(#[from] IdempotencyError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    StateTransition(#[from] InvalidStateTransition),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal,
    #[error("database error")]
    DbError,
    #[error("upstream chain error")]
    ChainError,
    #[error("upstream chain call timed out")]
    ChainTimeout,
}

impl CoreError {
    /// Stable machine-readable code, independent of the `Display` message,
    /// for the `{"error":{"code",...}}` envelope (§6).
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "InvalidInput",
            CoreError::NotFound(_) => "NotFound",
            CoreError::Conflict(_) => "Conflict",
            CoreError::Idempotency(IdempotencyError::Conflict) => "IdempotencyConflict",
            CoreError::Balance(BalanceError::InsufficientBalance) => "InsufficientBalance",
            CoreError::Balance(BalanceError::InsufficientHold) => "InsufficientHold",
            CoreError::Balance(BalanceError::AccountClosed) => "AccountClosed",
            CoreError::Balance(BalanceError::OptimisticConflict { .. }) => "OptimisticConflict",
            CoreError::Ledger(LedgerError::Unbalanced { .. }) => "Unbalanced",
            CoreError::Ledger(LedgerError::NonPositiveAmount) => "InvalidInput",
            CoreError::Ledger(LedgerError::Balance(_)) => "InsufficientBalance",
            CoreError::Signature(SignatureError::InvalidSignatureLength) => "InvalidSignatureLength",
            CoreError::Signature(SignatureError::InvalidAddress) => "InvalidInput",
            CoreError::Signature(SignatureError::SignatureExpired) => "SignatureExpired",
            CoreError::Signature(SignatureError::SignatureFuture) => "SignatureFuture",
            CoreError::Signature(SignatureError::NonceReused) => "NonceReused",
            CoreError::Signature(SignatureError::AddressMismatch) => "AddressMismatch",
            CoreError::Signature(SignatureError::InvalidSignature) => "InvalidSignature",
            CoreError::Lock(LockError::LockNotAcquired) => "LockNotAcquired",
            CoreError::Lock(LockError::LockNotHeld) => "LockNotHeld",
            CoreError::StateTransition(_) => "InvalidStateTransition",
            CoreError::Unauthorized => "Unauthorized",
            CoreError::Forbidden => "Forbidden",
            CoreError::Internal => "Internal",
            CoreError::DbError => "DBError",
            CoreError::ChainError => "ChainError",
            CoreError::ChainTimeout => "ChainTimeout",
        }
    }

    /// HTTP status for the §7 taxonomy. Where §7 lists two candidate
    /// statuses for a code (e.g. "InsufficientBalance/Stock → 400/422"),
    /// the business-rule-violation reading (422) is picked over the
    /// malformed-request reading (400), and lock contention is read as a
    /// client-retryable conflict (409) rather than service unavailability.
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::InvalidInput(_) => 400,
            CoreError::NotFound(_) => 404,
            CoreError::Conflict(_) => 409,
            CoreError::Idempotency(IdempotencyError::Conflict) => 409,
            CoreError::Balance(BalanceError::InsufficientBalance) => 422,
            CoreError::Balance(BalanceError::InsufficientHold) => 422,
            CoreError::Balance(BalanceError::AccountClosed) => 409,
            CoreError::Balance(BalanceError::OptimisticConflict { .. }) => 409,
            CoreError::Ledger(LedgerError::Unbalanced { .. }) => 400,
            CoreError::Ledger(LedgerError::NonPositiveAmount) => 400,
            CoreError::Ledger(LedgerError::Balance(_)) => 422,
            CoreError::Signature(_) => 400,
            CoreError::Lock(LockError::LockNotAcquired) => 409,
            CoreError::Lock(LockError::LockNotHeld) => 409,
            CoreError::StateTransition(_) => 422,
            CoreError::Unauthorized => 401,
            CoreError::Forbidden => 403,
            CoreError::Internal => 500,
            CoreError::DbError => 500,
            CoreError::ChainError => 502,
            CoreError::ChainTimeout => 504,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

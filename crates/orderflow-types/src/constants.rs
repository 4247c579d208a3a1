//! System-wide constants for the orderflow workflow.

/// Default minimum projected consumer profit (credit-limit floor).
pub const DEFAULT_MIN_PROFIT: i64 = -1000;

/// Default idempotency lock time-to-live in seconds.
pub const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 60;

/// Default lower bound of the simulated processing delay, in milliseconds.
pub const DEFAULT_DELAY_MIN_MS: u64 = 1_000;

/// Default upper bound (inclusive) of the simulated processing delay, in milliseconds.
pub const DEFAULT_DELAY_MAX_MS: u64 = 10_000;

/// Prefix of every idempotency lock key in the lock store.
pub const IDEMPOTENCY_KEY_PREFIX: &str = "idempotency:";

/// Value stored under an idempotency lock key.
pub const LOCKED_VALUE: &str = "locked";

/// Message carried by every successful response.
pub const SUCCESS_MESSAGE: &str = "success";

/// Client administration messages.
pub const CLIENT_ADDED_MESSAGE: &str = "Client was added successfully";
pub const CLIENT_UPDATED_MESSAGE: &str = "Client was updated successfully";
pub const CLIENT_DEACTIVATED_MESSAGE: &str = "Client was deactivated successfully";
pub const PROFITS_RESET_MESSAGE: &str = "All client profits were reset";
pub const PROFIT_SET_MESSAGE: &str = "Client profit was updated successfully";
pub const CLIENT_NOT_FOUND_MESSAGE: &str = "Client not found.";
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already registered.";

/// Order query messages.
pub const ORDER_NOT_FOUND_MESSAGE: &str = "Order not found.";

/// Returned when a store fails underneath an administrative operation.
pub const STORAGE_FAILURE_MESSAGE: &str = "Internal storage error.";

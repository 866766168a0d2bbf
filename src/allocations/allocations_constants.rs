/// Lifecycle states of an externally imported transaction
///
/// Imported and waiting to be split across portfolios.
pub const EXTERNAL_TRANSACTION_STATUS_PENDING: &str = "PENDING";

/// Split into holding-scoped transactions.
pub const EXTERNAL_TRANSACTION_STATUS_PROCESSED: &str = "PROCESSED";

/// Dividend kinds
///
/// Cash paid out to the investor. Always complete on entry.
pub const DIVIDEND_KIND_CASH: &str = "CASH";

/// Dividend reinvested into fund shares. Stays pending until the
/// reinvestment buy order details are known.
pub const DIVIDEND_KIND_STOCK: &str = "STOCK";

/// Lifecycle states
pub const DIVIDEND_STATUS_COMPLETED: &str = "COMPLETED";
pub const DIVIDEND_STATUS_PENDING: &str = "PENDING";

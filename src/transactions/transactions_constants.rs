/// Transaction types
///
/// Each constant represents one of the supported ledger row categories.
/// Purchase of fund shares. Increases the share count and cost basis.
pub const TRANSACTION_TYPE_BUY: &str = "BUY";

/// Disposal of fund shares against average cost. Decreases the share count
/// and cost basis and locks in a realized gain.
pub const TRANSACTION_TYPE_SELL: &str = "SELL";

/// Shares bought with the proceeds of a stock dividend. Managed by the
/// dividend lifecycle; accounted like a buy.
pub const TRANSACTION_TYPE_DIVIDEND_REINVESTMENT: &str = "DIVIDEND_REINVESTMENT";

/// Stand-alone charge on the holding. Display and audit only; never
/// touches shares or cost basis.
pub const TRANSACTION_TYPE_FEE: &str = "FEE";

/// Transaction types that change the share count
pub const SHARE_AFFECTING_TRANSACTION_TYPES: [&str; 3] = [
    TRANSACTION_TYPE_BUY,
    TRANSACTION_TYPE_SELL,
    TRANSACTION_TYPE_DIVIDEND_REINVESTMENT,
];

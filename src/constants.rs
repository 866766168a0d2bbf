/// Identifier used for the all-portfolios aggregate row
pub const PORTFOLIO_TOTAL_ID: &str = "TOTAL";

/// Decimal scale applied to every derived monetary amount
pub const ROUNDING_SCALE: u32 = 8;

/// Decimal precision for serialized values
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

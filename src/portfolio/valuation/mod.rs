pub(crate) mod batch_loader;
pub(crate) mod lookup_index;
pub(crate) mod valuation_model;
pub(crate) mod valuation_service;


pub use batch_loader::{BatchLoader, ValuationInputs};
pub use lookup_index::{PriceIndex, TransactionIndex};
pub use valuation_model::{
    DailyHoldingValuation, DailyPortfolioValuation, DailyValuationSummary, PositionSummary,
    ValuationSeries,
};
pub use valuation_service::ValuationService;

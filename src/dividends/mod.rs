// Module declarations
pub(crate) mod dividends_constants;
pub(crate) mod dividends_errors;
pub(crate) mod dividends_model;
pub(crate) mod dividends_repository;
pub(crate) mod dividends_service;
pub(crate) mod dividends_traits;


// Re-export the public interface
pub use dividends_constants::*;
pub use dividends_model::{
    Dividend, DividendDB, DividendKind, DividendStatus, DividendUpdate, NewDividend,
    ReinvestmentSync,
};
pub use dividends_repository::DividendRepository;
pub use dividends_service::DividendService;
pub use dividends_traits::{DividendRepositoryTrait, DividendServiceTrait};

// Re-export error types for convenience
pub use dividends_errors::DividendError;

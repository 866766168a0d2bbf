// Module declarations
pub(crate) mod transactions_constants;
pub(crate) mod transactions_errors;
pub(crate) mod transactions_model;
pub(crate) mod transactions_repository;
pub(crate) mod transactions_service;
pub(crate) mod transactions_traits;


// Re-export the public interface
pub use transactions_constants::*;
pub use transactions_model::{
    NewRealizedGain, NewTransaction, RealizedGain, RealizedGainDB, Transaction, TransactionDB,
    TransactionType, TransactionUpdate,
};
pub use transactions_repository::TransactionRepository;
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};

// Re-export error types for convenience
pub use transactions_errors::TransactionError;

// Module declarations
pub(crate) mod funds_errors;
pub(crate) mod funds_model;
pub(crate) mod funds_repository;
pub(crate) mod funds_traits;

// Re-export the public interface
pub use funds_model::{Fund, FundDB, NewFund};
pub use funds_repository::FundRepository;
pub use funds_traits::FundRepositoryTrait;

// Re-export error types for convenience
pub use funds_errors::{FundError, Result};

// Module declarations
pub(crate) mod allocations_constants;
pub(crate) mod allocations_errors;
pub(crate) mod allocations_model;
pub(crate) mod allocations_repository;
pub(crate) mod allocations_service;
pub(crate) mod allocations_traits;

#[cfg(test)]
mod allocations_service_tests;

// Re-export the public interface
pub use allocations_constants::*;
pub use allocations_model::{
    AllocationInput, AllocationOutcome, BulkAllocationItem, ExternalTransaction,
    ExternalTransactionDB, ExternalTransactionStatus, NewExternalTransaction,
};
pub use allocations_repository::AllocationRepository;
pub use allocations_service::AllocationService;
pub use allocations_traits::{AllocationRepositoryTrait, AllocationServiceTrait};

// Re-export error types for convenience
pub use allocations_errors::AllocationError;

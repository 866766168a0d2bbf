use super::funds_errors::Result;
use super::funds_model::{Fund, NewFund};

/// Trait defining the contract for fund repository operations.
pub trait FundRepositoryTrait: Send + Sync {
    fn get_by_id(&self, fund_id: &str) -> Result<Fund>;
    fn get_by_ids(&self, fund_ids: &[String]) -> Result<Vec<Fund>>;
    /// Resolves a fund by ISIN first, falling back to a symbol match.
    fn find_by_isin_or_symbol(&self, isin: Option<&str>, symbol: &str) -> Result<Option<Fund>>;
    fn create(&self, new_fund: NewFund) -> Result<Fund>;
    /// Resolves an existing fund or creates one from the provided input.
    fn get_or_create(&self, new_fund: NewFund) -> Result<Fund>;
}

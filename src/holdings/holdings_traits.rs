use super::holdings_errors::Result;
use super::holdings_model::{Holding, HoldingUpdate, NewHolding};

/// Trait defining the contract for holding repository operations.
pub trait HoldingRepositoryTrait: Send + Sync {
    fn get_by_id(&self, holding_id: &str) -> Result<Holding>;
    fn get_by_ids(&self, holding_ids: &[String]) -> Result<Vec<Holding>>;
    fn get_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Holding>>;
    fn find_by_portfolio_and_fund(
        &self,
        portfolio_id: &str,
        fund_id: &str,
    ) -> Result<Option<Holding>>;
    fn create(&self, new_holding: NewHolding) -> Result<Holding>;
    fn update(&self, holding_update: HoldingUpdate) -> Result<Holding>;
    /// Deletes a holding. Refuses while transactions or dividends reference
    /// it unless `force` is set, in which case the delete cascades to them.
    fn delete(&self, holding_id: &str, force: bool) -> Result<()>;
}

/// Trait defining the contract for holding service operations.
pub trait HoldingServiceTrait: Send + Sync {
    fn get_holding(&self, holding_id: &str) -> Result<Holding>;
    fn get_holdings(&self, holding_ids: &[String]) -> Result<Vec<Holding>>;
    fn get_portfolio_holdings(&self, portfolio_id: &str) -> Result<Vec<Holding>>;
    fn create_holding(&self, new_holding: NewHolding) -> Result<Holding>;
    fn update_holding(&self, holding_update: HoldingUpdate) -> Result<Holding>;
    fn delete_holding(&self, holding_id: &str, force: bool) -> Result<()>;
}

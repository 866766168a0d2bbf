use std::sync::Arc;

use super::holdings_errors::Result;
use super::holdings_model::{Holding, HoldingUpdate, NewHolding};
use super::holdings_traits::{HoldingRepositoryTrait, HoldingServiceTrait};

/// Service for managing holdings
pub struct HoldingService {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
}

impl HoldingService {
    /// Creates a new HoldingService instance
    pub fn new(holding_repository: Arc<dyn HoldingRepositoryTrait>) -> Self {
        Self { holding_repository }
    }
}

impl HoldingServiceTrait for HoldingService {
    fn get_holding(&self, holding_id: &str) -> Result<Holding> {
        self.holding_repository.get_by_id(holding_id)
    }

    fn get_holdings(&self, holding_ids: &[String]) -> Result<Vec<Holding>> {
        self.holding_repository.get_by_ids(holding_ids)
    }

    fn get_portfolio_holdings(&self, portfolio_id: &str) -> Result<Vec<Holding>> {
        self.holding_repository.get_by_portfolio(portfolio_id)
    }

    fn create_holding(&self, new_holding: NewHolding) -> Result<Holding> {
        self.holding_repository.create(new_holding)
    }

    fn update_holding(&self, holding_update: HoldingUpdate) -> Result<Holding> {
        self.holding_repository.update(holding_update)
    }

    fn delete_holding(&self, holding_id: &str, force: bool) -> Result<()> {
        self.holding_repository.delete(holding_id, force)
    }
}

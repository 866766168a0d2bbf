use std::sync::Arc;

use super::portfolios_errors::Result;
use super::portfolios_model::{NewPortfolio, Portfolio, PortfolioUpdate};
use super::portfolios_traits::{PortfolioRepositoryTrait, PortfolioServiceTrait};

/// Service for managing portfolios
pub struct PortfolioService {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
}

impl PortfolioService {
    /// Creates a new PortfolioService instance
    pub fn new(portfolio_repository: Arc<dyn PortfolioRepositoryTrait>) -> Self {
        Self {
            portfolio_repository,
        }
    }
}

impl PortfolioServiceTrait for PortfolioService {
    fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        self.portfolio_repository.create(new_portfolio)
    }

    fn update_portfolio(&self, portfolio_update: PortfolioUpdate) -> Result<Portfolio> {
        self.portfolio_repository.update(portfolio_update)
    }

    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio> {
        self.portfolio_repository.get_by_id(portfolio_id)
    }

    fn get_all_portfolios(&self) -> Result<Vec<Portfolio>> {
        self.portfolio_repository.list(None)
    }

    fn get_active_portfolios(&self) -> Result<Vec<Portfolio>> {
        self.portfolio_repository.list(Some(true))
    }

    fn delete_portfolio(&self, portfolio_id: &str) -> Result<()> {
        self.portfolio_repository.delete(portfolio_id)?;
        Ok(())
    }
}

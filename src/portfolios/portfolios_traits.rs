use super::portfolios_errors::Result;
use super::portfolios_model::{NewPortfolio, Portfolio, PortfolioUpdate};

/// Trait defining the contract for portfolio repository operations.
pub trait PortfolioRepositoryTrait: Send + Sync {
    fn create(&self, new_portfolio: NewPortfolio) -> Result<Portfolio>;
    fn update(&self, portfolio_update: PortfolioUpdate) -> Result<Portfolio>;
    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio>;
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Portfolio>>;
    fn delete(&self, portfolio_id: &str) -> Result<usize>;
}

/// Trait defining the contract for portfolio service operations.
pub trait PortfolioServiceTrait: Send + Sync {
    fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio>;
    fn update_portfolio(&self, portfolio_update: PortfolioUpdate) -> Result<Portfolio>;
    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio>;
    fn get_all_portfolios(&self) -> Result<Vec<Portfolio>>;
    fn get_active_portfolios(&self) -> Result<Vec<Portfolio>>;
    fn delete_portfolio(&self, portfolio_id: &str) -> Result<()>;
}

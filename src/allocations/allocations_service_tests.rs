#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::allocations::*;
    use crate::errors::{CalculatorError, Error};
    use crate::funds::{Fund, FundError, FundRepositoryTrait, NewFund};
    use crate::holdings::{
        Holding, HoldingError, HoldingRepositoryTrait, HoldingUpdate, NewHolding,
    };
    use crate::portfolios::{
        NewPortfolio, Portfolio, PortfolioError, PortfolioRepositoryTrait, PortfolioUpdate,
    };
    use crate::transactions::{
        NewRealizedGain, RealizedGain, Transaction, TransactionDB, TransactionError,
        TransactionRepositoryTrait, TRANSACTION_TYPE_BUY, TRANSACTION_TYPE_SELL,
    };

    // --- Mock backing store shared by every repository trait ---

    #[derive(Default)]
    struct MockStore {
        external: Mutex<Vec<ExternalTransaction>>,
        transactions: Mutex<Vec<Transaction>>,
        holdings: Mutex<Vec<Holding>>,
        funds: Mutex<Vec<Fund>>,
        portfolios: Vec<Portfolio>,
        gains: Mutex<HashMap<String, Decimal>>,
    }

    impl MockStore {
        fn with_portfolios(ids: &[&str]) -> Self {
            let now = chrono::Utc::now().naive_utc();
            MockStore {
                portfolios: ids
                    .iter()
                    .map(|id| Portfolio {
                        id: id.to_string(),
                        name: id.to_string(),
                        currency: "EUR".to_string(),
                        is_default: false,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    })
                    .collect(),
                ..Default::default()
            }
        }

        fn seed_external(&self, id: &str, transaction_type: &str, shares: Decimal) {
            let now = chrono::Utc::now().naive_utc();
            self.external.lock().unwrap().push(ExternalTransaction {
                id: id.to_string(),
                broker_ref: Some(format!("ref-{}", id)),
                isin: Some("IE00B4L5Y983".to_string()),
                symbol: "IWDA".to_string(),
                name: Some("World Index Fund".to_string()),
                transaction_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                transaction_type: transaction_type.to_string(),
                shares,
                price_per_share: dec!(25),
                fee_amount: dec!(10),
                currency: "EUR".to_string(),
                status: EXTERNAL_TRANSACTION_STATUS_PENDING.to_string(),
                created_at: now,
                updated_at: now,
            });
        }

        fn derived_for(&self, source_id: &str) -> Vec<Transaction> {
            self.transactions
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.source_transaction_id.as_deref() == Some(source_id))
                .cloned()
                .collect()
        }

        fn status_of(&self, source_id: &str) -> String {
            self.external
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == source_id)
                .map(|e| e.status.clone())
                .unwrap()
        }
    }

    impl AllocationRepositoryTrait for MockStore {
        fn get_external_transaction(
            &self,
            external_id: &str,
        ) -> std::result::Result<ExternalTransaction, AllocationError> {
            self.external
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == external_id)
                .cloned()
                .ok_or_else(|| AllocationError::NotFound(external_id.to_string()))
        }

        fn get_external_transactions(
            &self,
            status_filter: Option<&str>,
        ) -> std::result::Result<Vec<ExternalTransaction>, AllocationError> {
            Ok(self
                .external
                .lock()
                .unwrap()
                .iter()
                .filter(|e| status_filter.map_or(true, |status| e.status == status))
                .cloned()
                .collect())
        }

        fn create_external_transaction(
            &self,
            _new_external: NewExternalTransaction,
        ) -> std::result::Result<ExternalTransaction, AllocationError> {
            Err(AllocationError::DatabaseError("not implemented".to_string()))
        }

        fn apply_allocation(
            &self,
            external_id: &str,
            derived_rows: Vec<TransactionDB>,
            gain_plans: &[(String, Vec<NewRealizedGain>)],
        ) -> std::result::Result<(), AllocationError> {
            for row in derived_rows {
                self.transactions
                    .lock()
                    .unwrap()
                    .push(Transaction::from(row));
            }
            for (_, plan) in gain_plans {
                for gain in plan {
                    self.gains
                        .lock()
                        .unwrap()
                        .insert(gain.transaction_id.clone(), gain.amount);
                }
            }
            let mut external = self.external.lock().unwrap();
            if let Some(source) = external.iter_mut().find(|e| e.id == external_id) {
                source.status = EXTERNAL_TRANSACTION_STATUS_PROCESSED.to_string();
            }
            Ok(())
        }

        fn replace_allocation(
            &self,
            external_id: &str,
            derived_rows: Vec<TransactionDB>,
            gain_plans: &[(String, Vec<NewRealizedGain>)],
        ) -> std::result::Result<(), AllocationError> {
            self.transactions
                .lock()
                .unwrap()
                .retain(|t| t.source_transaction_id.as_deref() != Some(external_id));
            self.apply_allocation(external_id, derived_rows, gain_plans)
        }

        fn remove_allocation(
            &self,
            external_id: &str,
            _gain_plans: &[(String, Vec<NewRealizedGain>)],
        ) -> std::result::Result<(), AllocationError> {
            self.transactions
                .lock()
                .unwrap()
                .retain(|t| t.source_transaction_id.as_deref() != Some(external_id));
            let mut external = self.external.lock().unwrap();
            if let Some(source) = external.iter_mut().find(|e| e.id == external_id) {
                source.status = EXTERNAL_TRANSACTION_STATUS_PENDING.to_string();
            }
            Ok(())
        }
    }

    impl TransactionRepositoryTrait for MockStore {
        fn get_transaction(
            &self,
            transaction_id: &str,
        ) -> std::result::Result<Transaction, TransactionError> {
            self.transactions
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == transaction_id)
                .cloned()
                .ok_or_else(|| TransactionError::NotFound(transaction_id.to_string()))
        }

        fn get_transactions_for_holding(
            &self,
            holding_id: &str,
        ) -> std::result::Result<Vec<Transaction>, TransactionError> {
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.holding_id == holding_id)
                .cloned()
                .collect())
        }

        fn get_transactions_for_holdings(
            &self,
            holding_ids: &[String],
            _up_to: Option<NaiveDate>,
        ) -> std::result::Result<Vec<Transaction>, TransactionError> {
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .filter(|t| holding_ids.contains(&t.holding_id))
                .cloned()
                .collect())
        }

        fn get_transactions_for_source(
            &self,
            source_transaction_id: &str,
        ) -> std::result::Result<Vec<Transaction>, TransactionError> {
            Ok(self.derived_for(source_transaction_id))
        }

        fn get_realized_gain_for_transaction(
            &self,
            _transaction_id: &str,
        ) -> std::result::Result<Option<RealizedGain>, TransactionError> {
            Err(TransactionError::DatabaseError("not implemented".to_string()))
        }

        fn is_reinvestment_linked(
            &self,
            _transaction_id: &str,
        ) -> std::result::Result<bool, TransactionError> {
            Ok(false)
        }

        fn insert_transaction(
            &self,
            _transaction: TransactionDB,
            _gain_plan: &[NewRealizedGain],
        ) -> std::result::Result<Transaction, TransactionError> {
            Err(TransactionError::DatabaseError("not implemented".to_string()))
        }

        fn insert_transactions(
            &self,
            _rows: Vec<TransactionDB>,
            _gain_plans: &[(String, Vec<NewRealizedGain>)],
        ) -> std::result::Result<usize, TransactionError> {
            Err(TransactionError::DatabaseError("not implemented".to_string()))
        }

        fn update_transaction(
            &self,
            _transaction: TransactionDB,
            _gain_plan: &[NewRealizedGain],
        ) -> std::result::Result<Transaction, TransactionError> {
            Err(TransactionError::DatabaseError("not implemented".to_string()))
        }

        fn delete_transaction(
            &self,
            _transaction_id: &str,
            _gain_plan: &[NewRealizedGain],
        ) -> std::result::Result<Transaction, TransactionError> {
            Err(TransactionError::DatabaseError("not implemented".to_string()))
        }
    }

    impl HoldingRepositoryTrait for MockStore {
        fn get_by_id(&self, holding_id: &str) -> std::result::Result<Holding, HoldingError> {
            self.holdings
                .lock()
                .unwrap()
                .iter()
                .find(|h| h.id == holding_id)
                .cloned()
                .ok_or_else(|| HoldingError::NotFound(holding_id.to_string()))
        }

        fn get_by_ids(
            &self,
            holding_ids: &[String],
        ) -> std::result::Result<Vec<Holding>, HoldingError> {
            Ok(self
                .holdings
                .lock()
                .unwrap()
                .iter()
                .filter(|h| holding_ids.contains(&h.id))
                .cloned()
                .collect())
        }

        fn get_by_portfolio(
            &self,
            portfolio_id: &str,
        ) -> std::result::Result<Vec<Holding>, HoldingError> {
            Ok(self
                .holdings
                .lock()
                .unwrap()
                .iter()
                .filter(|h| h.portfolio_id == portfolio_id)
                .cloned()
                .collect())
        }

        fn find_by_portfolio_and_fund(
            &self,
            portfolio_id: &str,
            fund_id: &str,
        ) -> std::result::Result<Option<Holding>, HoldingError> {
            Ok(self
                .holdings
                .lock()
                .unwrap()
                .iter()
                .find(|h| h.portfolio_id == portfolio_id && h.fund_id == fund_id)
                .cloned())
        }

        fn create(&self, new_holding: NewHolding) -> std::result::Result<Holding, HoldingError> {
            let now = chrono::Utc::now().naive_utc();
            let holding = Holding {
                id: format!("holding-{}", new_holding.portfolio_id),
                portfolio_id: new_holding.portfolio_id,
                fund_id: new_holding.fund_id,
                currency: new_holding.currency,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            self.holdings.lock().unwrap().push(holding.clone());
            Ok(holding)
        }

        fn update(
            &self,
            _holding_update: HoldingUpdate,
        ) -> std::result::Result<Holding, HoldingError> {
            Err(HoldingError::DatabaseError("not implemented".to_string()))
        }

        fn delete(&self, _holding_id: &str, _force: bool) -> std::result::Result<(), HoldingError> {
            Err(HoldingError::DatabaseError("not implemented".to_string()))
        }
    }

    impl FundRepositoryTrait for MockStore {
        fn get_by_id(&self, fund_id: &str) -> std::result::Result<Fund, FundError> {
            self.funds
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.id == fund_id)
                .cloned()
                .ok_or_else(|| FundError::NotFound(fund_id.to_string()))
        }

        fn get_by_ids(&self, _fund_ids: &[String]) -> std::result::Result<Vec<Fund>, FundError> {
            Err(FundError::DatabaseError("not implemented".to_string()))
        }

        fn find_by_isin_or_symbol(
            &self,
            isin: Option<&str>,
            symbol: &str,
        ) -> std::result::Result<Option<Fund>, FundError> {
            let funds = self.funds.lock().unwrap();
            if let Some(isin_value) = isin {
                if let Some(fund) = funds.iter().find(|f| f.isin.as_deref() == Some(isin_value)) {
                    return Ok(Some(fund.clone()));
                }
            }
            Ok(funds.iter().find(|f| f.symbol == symbol).cloned())
        }

        fn create(&self, new_fund: NewFund) -> std::result::Result<Fund, FundError> {
            let now = chrono::Utc::now().naive_utc();
            let fund = Fund {
                id: format!("fund-{}", new_fund.symbol),
                isin: new_fund.isin,
                symbol: new_fund.symbol,
                name: new_fund.name,
                currency: new_fund.currency,
                created_at: now,
                updated_at: now,
            };
            self.funds.lock().unwrap().push(fund.clone());
            Ok(fund)
        }

        fn get_or_create(&self, new_fund: NewFund) -> std::result::Result<Fund, FundError> {
            if let Some(existing) =
                self.find_by_isin_or_symbol(new_fund.isin.as_deref(), &new_fund.symbol)?
            {
                return Ok(existing);
            }
            FundRepositoryTrait::create(self, new_fund)
        }
    }

    impl PortfolioRepositoryTrait for MockStore {
        fn create(
            &self,
            _new_portfolio: NewPortfolio,
        ) -> std::result::Result<Portfolio, PortfolioError> {
            Err(PortfolioError::DatabaseError("not implemented".to_string()))
        }

        fn update(
            &self,
            _portfolio_update: PortfolioUpdate,
        ) -> std::result::Result<Portfolio, PortfolioError> {
            Err(PortfolioError::DatabaseError("not implemented".to_string()))
        }

        fn get_by_id(&self, portfolio_id: &str) -> std::result::Result<Portfolio, PortfolioError> {
            self.portfolios
                .iter()
                .find(|p| p.id == portfolio_id)
                .cloned()
                .ok_or_else(|| {
                    PortfolioError::NotFound(format!(
                        "Portfolio with id {} not found",
                        portfolio_id
                    ))
                })
        }

        fn list(
            &self,
            _is_active_filter: Option<bool>,
        ) -> std::result::Result<Vec<Portfolio>, PortfolioError> {
            Ok(self.portfolios.clone())
        }

        fn delete(&self, _portfolio_id: &str) -> std::result::Result<usize, PortfolioError> {
            Err(PortfolioError::DatabaseError("not implemented".to_string()))
        }
    }

    // --- Helpers ---

    fn service() -> (AllocationService, Arc<MockStore>) {
        let store = Arc::new(MockStore::with_portfolios(&["A", "B"]));
        let service = AllocationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        (service, store)
    }

    fn split(pairs: &[(&str, Decimal)]) -> Vec<AllocationInput> {
        pairs
            .iter()
            .map(|(portfolio_id, percent)| AllocationInput {
                portfolio_id: portfolio_id.to_string(),
                percent: *percent,
            })
            .collect()
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_allocation_splits_shares_by_percentage() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        let outcome = service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(40))]))
            .await
            .unwrap();

        assert_eq!(outcome.created_transaction_ids.len(), 2);
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PROCESSED);

        let derived = store.derived_for("src-1");
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0].shares, dec!(60));
        assert_eq!(derived[1].shares, dec!(40));
        // Fees split by the same percentages.
        assert_eq!(derived[0].fee_amount, dec!(6));
        assert_eq!(derived[1].fee_amount, dec!(4));
        assert!(derived.iter().all(|t| t.price_per_share == dec!(25)));

        // Target holdings were resolved per portfolio.
        assert_eq!(store.holdings.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_percentages_must_total_one_hundred() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        let result = service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(30))]))
            .await;

        match result {
            Err(Error::Allocation(AllocationError::InvalidPercentTotal(total))) => {
                assert_eq!(total, dec!(90));
            }
            other => panic!("expected percent total error, got {:?}", other),
        }
        assert!(store.derived_for("src-1").is_empty());
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PENDING);
    }

    #[tokio::test]
    async fn test_percent_total_tolerance_is_one_hundredth() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));
        store.seed_external("src-2", TRANSACTION_TYPE_BUY, dec!(100));

        // 100.01 passes.
        service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(40.01))]))
            .await
            .unwrap();

        // 100.02 does not.
        assert!(service
            .allocate("src-2", &split(&[("A", dec!(60)), ("B", dec!(40.02))]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_duplicate_portfolios_are_rejected() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        assert!(matches!(
            service
                .allocate("src-1", &split(&[("A", dec!(50)), ("A", dec!(50))]))
                .await,
            Err(Error::Allocation(AllocationError::InvalidAllocation(_)))
        ));
    }

    #[tokio::test]
    async fn test_source_must_be_pending() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        let allocations = split(&[("A", dec!(100))]);
        service.allocate("src-1", &allocations).await.unwrap();

        assert!(matches!(
            service.allocate("src-1", &allocations).await,
            Err(Error::Allocation(AllocationError::SourceNotPending(_)))
        ));
    }

    #[tokio::test]
    async fn test_modify_replaces_the_derived_rows() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(40))]))
            .await
            .unwrap();

        service
            .modify_allocations("src-1", &split(&[("A", dec!(100))]))
            .await
            .unwrap();

        let derived = store.derived_for("src-1");
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].shares, dec!(100));
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PROCESSED);
    }

    #[tokio::test]
    async fn test_modify_requires_a_processed_source() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        assert!(matches!(
            service
                .modify_allocations("src-1", &split(&[("A", dec!(100))]))
                .await,
            Err(Error::Allocation(AllocationError::SourceNotProcessed(_)))
        ));
    }

    #[tokio::test]
    async fn test_unallocate_reverts_the_source_to_pending() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));

        service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(40))]))
            .await
            .unwrap();
        service.unallocate("src-1").await.unwrap();

        assert!(store.derived_for("src-1").is_empty());
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PENDING);
    }

    #[tokio::test]
    async fn test_bulk_allocation_reports_each_source_separately() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_BUY, dec!(100));
        store.seed_external("src-2", TRANSACTION_TYPE_BUY, dec!(50));

        // The second source is already processed and must fail alone.
        service
            .allocate("src-2", &split(&[("A", dec!(100))]))
            .await
            .unwrap();

        let items = service
            .bulk_allocate(
                &["src-1".to_string(), "src-2".to_string()],
                &split(&[("A", dec!(60)), ("B", dec!(40))]),
            )
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].error.is_none());
        assert_eq!(items[0].created_transaction_ids.len(), 2);
        assert!(items[1].error.is_some());
        assert!(items[1].created_transaction_ids.is_empty());
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PROCESSED);
    }

    #[tokio::test]
    async fn test_allocating_a_sell_cannot_oversell_the_holding() {
        let (service, store) = service();
        store.seed_external("src-1", TRANSACTION_TYPE_SELL, dec!(100));

        // No shares were ever bought in either portfolio.
        let result = service
            .allocate("src-1", &split(&[("A", dec!(60)), ("B", dec!(40))]))
            .await;

        assert!(matches!(
            result,
            Err(Error::Calculator(CalculatorError::Oversell { .. }))
        ));
        assert!(store.derived_for("src-1").is_empty());
        assert_eq!(store.status_of("src-1"), EXTERNAL_TRANSACTION_STATUS_PENDING);
    }
}

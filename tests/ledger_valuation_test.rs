mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fundfolio_core::dividends::{
    DividendRepository, DividendService, DividendServiceTrait, DividendUpdate, NewDividend,
    DIVIDEND_KIND_STOCK, DIVIDEND_STATUS_COMPLETED, DIVIDEND_STATUS_PENDING,
};
use fundfolio_core::funds::{FundRepository, FundRepositoryTrait, NewFund};
use fundfolio_core::holdings::{HoldingRepository, HoldingRepositoryTrait, NewHolding};
use fundfolio_core::market_data::{MarketDataRepository, MarketDataRepositoryTrait, NewPricePoint};
use fundfolio_core::portfolio::valuation::ValuationService;
use fundfolio_core::portfolios::{NewPortfolio, PortfolioRepository, PortfolioRepositoryTrait};
use fundfolio_core::transactions::{
    NewTransaction, TransactionRepository, TransactionService, TransactionServiceTrait,
    TRANSACTION_TYPE_BUY, TRANSACTION_TYPE_SELL,
};

fn new_transaction(
    holding_id: &str,
    transaction_type: &str,
    date: &str,
    shares: Decimal,
    price: Decimal,
) -> NewTransaction {
    NewTransaction {
        id: None,
        holding_id: holding_id.to_string(),
        transaction_date: date.to_string(),
        transaction_type: transaction_type.to_string(),
        shares,
        price_per_share: price,
        fee_amount: Decimal::ZERO,
        currency: "EUR".to_string(),
        source_transaction_id: None,
        note: None,
    }
}

fn setup_holding(pool: &Arc<fundfolio_core::db::DbPool>) -> String {
    let portfolio = PortfolioRepository::new(pool.clone())
        .create(NewPortfolio {
            id: None,
            name: "Main".to_string(),
            currency: "EUR".to_string(),
            is_default: true,
            is_active: true,
        })
        .unwrap();

    let fund = FundRepository::new(pool.clone())
        .create(NewFund {
            id: None,
            isin: Some("IE00B4L5Y983".to_string()),
            symbol: "IWDA".to_string(),
            name: Some("World Index Fund".to_string()),
            currency: "EUR".to_string(),
        })
        .unwrap();

    let holding = HoldingRepository::new(pool.clone())
        .create(NewHolding {
            id: None,
            portfolio_id: portfolio.id,
            fund_id: fund.id.clone(),
            currency: "EUR".to_string(),
        })
        .unwrap();

    MarketDataRepository::new(pool.clone())
        .upsert_price_points(vec![
            NewPricePoint {
                fund_id: fund.id.clone(),
                price_date: "2024-01-01".to_string(),
                price: dec!(50),
                currency: "EUR".to_string(),
            },
            NewPricePoint {
                fund_id: fund.id,
                price_date: "2024-01-20".to_string(),
                price: dec!(70),
                currency: "EUR".to_string(),
            },
        ])
        .unwrap();

    holding.id
}

#[test]
fn test_ledger_to_valuation_round_trip() {
    let (pool, _guard) = common::setup_pool();
    let holding_id = setup_holding(&pool);

    let transaction_service = TransactionService::new(
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(HoldingRepository::new(pool.clone())),
    );

    tokio_test::block_on(transaction_service.create_transaction(new_transaction(
        &holding_id,
        TRANSACTION_TYPE_BUY,
        "2024-01-01",
        dec!(100),
        dec!(50),
    )))
    .unwrap();
    tokio_test::block_on(transaction_service.create_transaction(new_transaction(
        &holding_id,
        TRANSACTION_TYPE_BUY,
        "2024-01-10",
        dec!(50),
        dec!(60),
    )))
    .unwrap();
    let sell = tokio_test::block_on(transaction_service.create_transaction(new_transaction(
        &holding_id,
        TRANSACTION_TYPE_SELL,
        "2024-01-20",
        dec!(30),
        dec!(70),
    )))
    .unwrap();

    let gain = transaction_service
        .get_realized_gain(&sell.id)
        .unwrap()
        .unwrap();
    assert_eq!(gain.amount, dec!(500));

    let valuation_service = ValuationService::new(
        Arc::new(HoldingRepository::new(pool.clone())),
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(MarketDataRepository::new(pool.clone())),
        Arc::new(DividendRepository::new(pool.clone())),
    );

    let series = valuation_service
        .compute_series(
            &[holding_id.clone()],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        )
        .unwrap();

    assert_eq!(series.days.len(), 20);

    // Day 15 forward-fills the day-1 price.
    let day15 = &series.days[14].holdings[0];
    assert_eq!(day15.shares, dec!(150));
    assert_eq!(day15.cost_basis, dec!(8000));
    assert_eq!(day15.price, dec!(50));
    assert_eq!(day15.market_value, dec!(7500));

    let day20 = &series.days[19].holdings[0];
    assert_eq!(day20.shares, dec!(120));
    assert_eq!(day20.cost_basis, dec!(6400));
    assert_eq!(day20.realized_gain, dec!(500));
    assert_eq!(day20.market_value, dec!(8400));
    assert_eq!(day20.unrealized_gain, dec!(2000));

    assert_eq!(series.days[19].total.market_value, dec!(8400));

    // An oversized sell is rejected and leaves the ledger untouched.
    let oversell = tokio_test::block_on(transaction_service.create_transaction(
        new_transaction(
            &holding_id,
            TRANSACTION_TYPE_SELL,
            "2024-01-21",
            dec!(500),
            dec!(70),
        ),
    ));
    assert!(oversell.is_err());
    assert_eq!(
        transaction_service
            .get_transactions_for_holding(&holding_id)
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn test_holding_delete_requires_confirmation_once_ledgered() {
    let (pool, _guard) = common::setup_pool();
    let holding_id = setup_holding(&pool);

    let transaction_service = TransactionService::new(
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(HoldingRepository::new(pool.clone())),
    );
    tokio_test::block_on(transaction_service.create_transaction(new_transaction(
        &holding_id,
        TRANSACTION_TYPE_BUY,
        "2024-01-01",
        dec!(10),
        dec!(50),
    )))
    .unwrap();

    let holding_repository = HoldingRepository::new(pool.clone());
    assert!(matches!(
        holding_repository.delete(&holding_id, false),
        Err(fundfolio_core::holdings::HoldingError::HasLedgerEntries(_))
    ));

    // Confirmed deletion cascades to the ledger rows.
    holding_repository.delete(&holding_id, true).unwrap();
    assert!(holding_repository.get_by_id(&holding_id).is_err());
    assert!(transaction_service
        .get_transactions_for_holding(&holding_id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_stock_dividend_lifecycle_against_the_database() {
    let (pool, _guard) = common::setup_pool();
    let holding_id = setup_holding(&pool);

    let transaction_service = TransactionService::new(
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(HoldingRepository::new(pool.clone())),
    );
    tokio_test::block_on(transaction_service.create_transaction(new_transaction(
        &holding_id,
        TRANSACTION_TYPE_BUY,
        "2024-01-01",
        dec!(100),
        dec!(50),
    )))
    .unwrap();

    let dividend_service = DividendService::new(
        Arc::new(DividendRepository::new(pool.clone())),
        Arc::new(TransactionRepository::new(pool.clone())),
        Arc::new(HoldingRepository::new(pool.clone())),
    );

    let pending = tokio_test::block_on(dividend_service.create_dividend(NewDividend {
        id: None,
        holding_id: holding_id.clone(),
        record_date: "2024-01-15".to_string(),
        ex_dividend_date: "2024-01-13".to_string(),
        per_share_amount: dec!(0.75),
        dividend_type: DIVIDEND_KIND_STOCK.to_string(),
        buy_order_date: None,
        reinvestment_shares: None,
        reinvestment_price: None,
    }))
    .unwrap();

    assert_eq!(pending.status, DIVIDEND_STATUS_PENDING);
    assert_eq!(pending.shares_owned, dec!(100));
    assert_eq!(pending.total_amount, dec!(75));

    let completed = tokio_test::block_on(dividend_service.update_dividend(DividendUpdate {
        id: pending.id.clone(),
        holding_id: holding_id.clone(),
        record_date: "2024-01-15".to_string(),
        ex_dividend_date: "2024-01-13".to_string(),
        per_share_amount: dec!(0.75),
        dividend_type: DIVIDEND_KIND_STOCK.to_string(),
        buy_order_date: Some("2024-01-18".to_string()),
        reinvestment_shares: Some(dec!(1.5)),
        reinvestment_price: Some(dec!(50)),
    }))
    .unwrap();

    assert_eq!(completed.status, DIVIDEND_STATUS_COMPLETED);
    let linked = completed.reinvestment_transaction_id.clone().unwrap();
    let reinvestment = transaction_service.get_transaction(&linked).unwrap();
    assert_eq!(reinvestment.shares, dec!(1.5));

    let owned = dividend_service
        .shares_owned_at(&holding_id, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        .unwrap();
    assert_eq!(owned, dec!(101.5));

    // Deleting the dividend cascades to its reinvestment transaction.
    tokio_test::block_on(dividend_service.delete_dividend(&pending.id)).unwrap();
    assert!(transaction_service.get_transaction(&linked).is_err());
    assert_eq!(
        dividend_service
            .shares_owned_at(&holding_id, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
            .unwrap(),
        dec!(100)
    );
}

#[cfg(test)]
mod tests {
    use crate::errors::CalculatorError;
    use crate::portfolio::position::position_calculator::{apply_transaction, PositionCalculator};
    use crate::portfolio::position::PositionState;
    use crate::transactions::{
        Transaction, TRANSACTION_TYPE_BUY, TRANSACTION_TYPE_DIVIDEND_REINVESTMENT,
        TRANSACTION_TYPE_FEE, TRANSACTION_TYPE_SELL,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const HOLDING: &str = "holding-1";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    // `sequence` stands in for insertion order via created_at.
    fn transaction(
        id: &str,
        transaction_type: &str,
        day: u32,
        shares: Decimal,
        price: Decimal,
        sequence: u32,
    ) -> Transaction {
        let created_at = date(1)
            .and_hms_opt(12, 0, sequence)
            .unwrap();
        Transaction {
            id: id.to_string(),
            holding_id: HOLDING.to_string(),
            transaction_date: date(day),
            transaction_type: transaction_type.to_string(),
            shares,
            price_per_share: price,
            fee_amount: Decimal::ZERO,
            currency: "EUR".to_string(),
            source_transaction_id: None,
            note: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_buys_accumulate_shares_and_cost_basis() {
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            transaction("t2", TRANSACTION_TYPE_BUY, 10, dec!(50), dec!(60), 1),
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, dec!(150));
        assert_eq!(state.cost_basis, dec!(8000));
        assert_eq!(state.average_cost().round_dp(4), dec!(53.3333));
        assert_eq!(state.realized_gain, Decimal::ZERO);
    }

    #[test]
    fn test_sell_realizes_gain_against_average_cost() {
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            transaction("t2", TRANSACTION_TYPE_BUY, 10, dec!(50), dec!(60), 1),
            transaction("t3", TRANSACTION_TYPE_SELL, 20, dec!(30), dec!(70), 2),
        ];

        let (state, sell_gains) = PositionCalculator::new()
            .replay_with_sell_gains(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, dec!(120));
        assert_eq!(state.cost_basis, dec!(6400));
        assert_eq!(state.realized_gain, dec!(500));
        assert_eq!(sell_gains.len(), 1);
        assert_eq!(sell_gains[0].transaction_id, "t3");
        assert_eq!(sell_gains[0].amount, dec!(500));
    }

    #[test]
    fn test_oversell_is_rejected() {
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(10), dec!(50), 0),
            transaction("t2", TRANSACTION_TYPE_SELL, 2, dec!(20), dec!(55), 1),
        ];

        let result = PositionCalculator::new().replay(HOLDING, &ledger, None);

        match result {
            Err(CalculatorError::Oversell {
                requested,
                available,
                date: error_date,
            }) => {
                assert_eq!(requested, dec!(20));
                assert_eq!(available, dec!(10));
                assert_eq!(error_date, date(2));
            }
            other => panic!("expected oversell, got {:?}", other),
        }
    }

    #[test]
    fn test_oversell_leaves_state_untouched() {
        let buy = transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(10), dec!(50), 0);
        let oversell = transaction("t2", TRANSACTION_TYPE_SELL, 2, dec!(20), dec!(55), 1);

        let mut state = PositionState::new(HOLDING);
        apply_transaction(&mut state, &buy).unwrap();
        let before = state.clone();

        assert!(apply_transaction(&mut state, &oversell).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_sell_on_empty_position_is_rejected() {
        let ledger = vec![transaction(
            "t1",
            TRANSACTION_TYPE_SELL,
            1,
            dec!(1),
            dec!(10),
            0,
        )];

        assert!(PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .is_err());
    }

    #[test]
    fn test_full_liquidation_forces_cost_basis_to_zero() {
        // 3 shares at 10.01 leave a repeating-decimal average cost; the
        // final sell must not leave a rounding residue behind.
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(3), dec!(10.01), 0),
            transaction("t2", TRANSACTION_TYPE_SELL, 2, dec!(1), dec!(11), 1),
            transaction("t3", TRANSACTION_TYPE_SELL, 3, dec!(2), dec!(11), 2),
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, Decimal::ZERO);
        assert_eq!(state.cost_basis, Decimal::ZERO);
    }

    #[test]
    fn test_dividend_reinvestment_accumulates_like_a_buy() {
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            transaction(
                "t2",
                TRANSACTION_TYPE_DIVIDEND_REINVESTMENT,
                5,
                dec!(2),
                dec!(55),
                1,
            ),
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, dec!(102));
        assert_eq!(state.cost_basis, dec!(5110));
    }

    #[test]
    fn test_fee_rows_never_touch_shares_or_cost_basis() {
        let mut fee = transaction("t2", TRANSACTION_TYPE_FEE, 5, Decimal::ZERO, Decimal::ZERO, 1);
        fee.fee_amount = dec!(9.90);
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            fee,
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, dec!(100));
        assert_eq!(state.cost_basis, dec!(5000));
        assert_eq!(state.fees, dec!(9.90));
    }

    #[test]
    fn test_replay_as_of_excludes_later_transactions() {
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            transaction("t2", TRANSACTION_TYPE_BUY, 10, dec!(50), dec!(60), 1),
            transaction("t3", TRANSACTION_TYPE_SELL, 20, dec!(30), dec!(70), 2),
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, Some(date(15)))
            .unwrap();

        assert_eq!(state.shares, dec!(150));
        assert_eq!(state.realized_gain, Decimal::ZERO);
    }

    #[test]
    fn test_same_day_transactions_replay_in_insertion_order() {
        // Bought and fully sold the same day: valid only because the buy
        // was entered first.
        let ledger = vec![
            transaction("t2", TRANSACTION_TYPE_SELL, 1, dec!(10), dec!(12), 1),
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(10), dec!(10), 0),
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, Decimal::ZERO);
        assert_eq!(state.realized_gain, dec!(20));
    }

    #[test]
    fn test_transactions_of_other_holdings_are_ignored() {
        let mut foreign = transaction("t2", TRANSACTION_TYPE_BUY, 1, dec!(5), dec!(10), 1);
        foreign.holding_id = "holding-2".to_string();
        let ledger = vec![
            transaction("t1", TRANSACTION_TYPE_BUY, 1, dec!(100), dec!(50), 0),
            foreign,
        ];

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, dec!(100));
    }

    #[test]
    fn test_repeated_partial_sells_drain_cost_basis_exactly() {
        let mut ledger = vec![transaction(
            "buy",
            TRANSACTION_TYPE_BUY,
            1,
            dec!(7),
            dec!(33.37),
            0,
        )];
        for sequence in 1..=7 {
            ledger.push(transaction(
                &format!("sell-{}", sequence),
                TRANSACTION_TYPE_SELL,
                1 + sequence,
                dec!(1),
                dec!(40),
                sequence,
            ));
        }

        let state = PositionCalculator::new()
            .replay(HOLDING, &ledger, None)
            .unwrap();

        assert_eq!(state.shares, Decimal::ZERO);
        assert_eq!(state.cost_basis, Decimal::ZERO);
        // Total proceeds 280 against a total cost of 233.59.
        assert_eq!(state.realized_gain.round_dp(2), dec!(46.41));
    }
}

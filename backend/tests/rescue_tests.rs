//! Rescue radar tests for the Harvest Rescue Engine
//!
//! Flash pricing against elapsed shelf life, idempotent evaluation and the
//! single-winner claim.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::{
    evaluate_rescue, percent_life_used, EngineError, RescueLot, RescueParams, RescuePricing,
    RescueStatus, RescueStatusCell,
};

fn lot(shelf_life_hours: u32, price: i64) -> RescueLot {
    RescueLot {
        id: "rescue-tomato-1".to_string(),
        crop_key: "tomato".to_string(),
        crop_name: "Tomato".to_string(),
        quantity_kg: 300,
        shelf_life_hours,
        original_price_per_qtl: Decimal::from(price),
        rescue_channels: vec![
            "NGO community kitchens".to_string(),
            "Animal feed".to_string(),
        ],
    }
}

// ============================================================================
// Property 6: Flash pricing follows percent of life used
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn property_6_flash_price_threshold(
        shelf in 1u32..500,
        hours_tenths in 0u32..6_000,
        price in 1i64..100_000,
    ) {
        let hours = f64::from(hours_tenths) / 10.0;
        let params = RescueParams::default();
        let lot = lot(shelf, price);

        let item = evaluate_rescue(&lot, hours, &params).unwrap();
        let original = Decimal::from(price);
        if item.percent_life_used >= 80 {
            let flash = (original * Decimal::new(3, 1))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            prop_assert_eq!(item.flash_price_per_qtl, flash);
            prop_assert_eq!(item.pricing, RescuePricing::FlashSale);
        } else {
            prop_assert_eq!(item.flash_price_per_qtl, original);
            prop_assert_eq!(item.pricing, RescuePricing::Standard);
        }
        prop_assert_eq!(item.percent_life_used, percent_life_used(hours, shelf));
    }

    /// Evaluating twice at the same elapsed time gives the same item
    #[test]
    fn property_6_evaluation_is_idempotent(
        shelf in 1u32..500,
        hours_tenths in 0u32..6_000,
    ) {
        let hours = f64::from(hours_tenths) / 10.0;
        let params = RescueParams::default();
        let lot = lot(shelf, 750);
        prop_assert_eq!(
            evaluate_rescue(&lot, hours, &params).unwrap(),
            evaluate_rescue(&lot, hours, &params).unwrap()
        );
    }
}

#[test]
fn negative_price_never_prices_a_lot() {
    let err = evaluate_rescue(&lot(36, -750), 30.0, &RescueParams::default()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput { .. }));

    let mut empty = lot(36, 750);
    empty.quantity_kg = 0;
    assert!(matches!(
        evaluate_rescue(&empty, 30.0, &RescueParams::default()),
        Err(EngineError::InvalidInput { .. })
    ));
}

#[test]
fn scenario_b_flash_sale_at_83_percent() {
    let item = evaluate_rescue(&lot(36, 750), 30.0, &RescueParams::default()).unwrap();
    assert_eq!(item.percent_life_used, 83);
    assert_eq!(item.pricing, RescuePricing::FlashSale);
    assert_eq!(item.flash_price_per_qtl, Decimal::from(225));
    assert_eq!(item.status, RescueStatus::Active);
}

#[test]
fn full_shelf_life_reports_expired() {
    let item = evaluate_rescue(&lot(36, 750), 36.0, &RescueParams::default()).unwrap();
    assert_eq!(item.percent_life_used, 100);
    assert_eq!(item.status, RescueStatus::Expired);
    assert_eq!(item.hours_remaining, 0.0);
}

#[test]
fn empty_rescue_channels_rejected() {
    let mut lot = lot(36, 750);
    lot.rescue_channels.clear();
    assert!(matches!(
        evaluate_rescue(&lot, 1.0, &RescueParams::default()),
        Err(EngineError::InvalidInput { .. })
    ));
}

#[test]
fn negative_elapsed_hours_rejected() {
    assert!(evaluate_rescue(&lot(36, 750), -1.0, &RescueParams::default()).is_err());
}

// ============================================================================
// Claims
// ============================================================================

#[test]
fn concurrent_claims_have_one_winner() {
    let params = RescueParams::default();
    for _ in 0..20 {
        let cell = Arc::new(RescueStatusCell::new());
        let wins = Arc::new(AtomicUsize::new(0));
        let conflicts = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let wins = Arc::clone(&wins);
                let conflicts = Arc::clone(&conflicts);
                let params = params.clone();
                thread::spawn(move || match cell.try_claim(50, &params) {
                    Ok(()) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(EngineError::ConcurrencyConflict(_)) => {
                        conflicts.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(other) => panic!("unexpected error: {:?}", other),
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(conflicts.load(Ordering::SeqCst), 7);
        assert_eq!(cell.load(), RescueStatus::Claimed);
    }
}

#[test]
fn claim_after_expiry_fails() {
    let params = RescueParams::default();
    let cell = RescueStatusCell::new();
    assert!(matches!(
        cell.try_claim(100, &params),
        Err(EngineError::Expired(_))
    ));
    assert_eq!(cell.load(), RescueStatus::Expired);
}

#[test]
fn expiry_does_not_override_claim() {
    let params = RescueParams::default();
    let cell = RescueStatusCell::new();
    cell.try_claim(90, &params).unwrap();
    assert!(!cell.expire_if_due(120, &params));
    assert_eq!(cell.load(), RescueStatus::Claimed);
}

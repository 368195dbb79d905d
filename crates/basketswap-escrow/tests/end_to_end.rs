//! End-to-end tests for baskets and arranged swaps against a live ledger.
//!
//! Scenarios:
//! 1. Exactly funded basket commits; the commit beneficiary receives everything.
//! 2. One unit short: not ready, commit refused.
//! 3. Under-funded basket rolls back to the rollback beneficiary.
//! 4. Flaky asset during rollback: others recovered, commit locked, retry recovers.
//!
//! Plus two-party swaps through the arranger.

use std::sync::Arc;

use basketswap_escrow::{Basket, SwapArranger};
use basketswap_ledger::{FlakyMode, FlakyToken, Ledger, StandardToken};
use basketswap_types::*;
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn tok(symbol: &str) -> AssetId {
    AssetId::from(symbol)
}

/// Ledger with TOK1, TOK2, TOK3 and a flaky FLAKY token, plus a funded depositor.
struct World {
    ledger: Ledger,
    flaky: Arc<FlakyToken>,
    depositor: Address,
}

impl World {
    fn new() -> Self {
        init_tracing();
        let mut ledger = Ledger::new();
        for symbol in ["TOK1", "TOK2", "TOK3"] {
            ledger
                .register(Arc::new(StandardToken::new(symbol)))
                .expect("register token");
        }
        let flaky = Arc::new(FlakyToken::new("FLAKY", FlakyMode::Succeed));
        ledger.register(flaky.clone()).expect("register flaky");

        let depositor = Address::new();
        for asset in [AssetId::native(), tok("TOK1"), tok("TOK2"), tok("TOK3"), tok("FLAKY")] {
            ledger
                .mint(&asset, depositor, dec(10_000))
                .expect("mint to depositor");
        }
        Self {
            ledger,
            flaky,
            depositor,
        }
    }

    fn fund(&mut self, party: Address, asset: &AssetId, amount: i64) {
        self.ledger
            .mint(asset, party, dec(amount))
            .expect("mint to party");
    }

    fn deposit(&mut self, from: Address, to: Address, asset: &AssetId, amount: i64) {
        self.ledger
            .transfer(asset, from, to, dec(amount))
            .expect("deposit should succeed");
    }

    /// Balances of `holder` for the listed assets.
    fn balances(&self, holder: Address, assets: &[AssetId]) -> Vec<Decimal> {
        assets
            .iter()
            .map(|asset| self.ledger.balance(asset, holder))
            .collect()
    }
}

fn scenario_basket(bob: Address, carol: Address) -> Basket {
    Basket::create(
        Requirement::new(dec(30)).with("TOK1", dec(100)).with("TOK2", dec(20)),
        carol,
        bob,
    )
    .expect("valid basket")
}

// =============================================================================
// Scenario 1: exact funding commits
// =============================================================================
#[test]
fn scenario_1_exact_funding_commits() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let mut basket = scenario_basket(bob, carol);
    let assets = [AssetId::native(), tok("TOK1"), tok("TOK2")];

    assert!(!basket.is_ready_to_commit(&w.ledger));

    w.deposit(w.depositor, basket.address(), &tok("TOK1"), 100);
    w.deposit(w.depositor, basket.address(), &tok("TOK2"), 20);
    w.deposit(w.depositor, basket.address(), &AssetId::native(), 30);

    assert!(basket.is_ready_to_commit(&w.ledger));
    basket.commit(&mut w.ledger).expect("commit should succeed");

    assert_eq!(w.balances(carol, &assets), vec![dec(30), dec(100), dec(20)]);
    assert_eq!(
        w.balances(basket.address(), &assets),
        vec![Decimal::ZERO; 3]
    );
    assert_eq!(w.balances(bob, &assets), vec![Decimal::ZERO; 3]);
}

// =============================================================================
// Scenario 2: one unit short
// =============================================================================
#[test]
fn scenario_2_one_short_is_not_ready() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let mut basket = scenario_basket(bob, carol);

    w.deposit(w.depositor, basket.address(), &AssetId::native(), 30);
    w.deposit(w.depositor, basket.address(), &tok("TOK1"), 100);
    w.deposit(w.depositor, basket.address(), &tok("TOK2"), 19);

    assert!(!basket.is_ready_to_commit(&w.ledger));
    let err = basket.commit(&mut w.ledger).unwrap_err();
    assert!(matches!(err, BasketError::NotReady { .. }));
    assert_eq!(w.ledger.balance(&tok("TOK1"), carol), Decimal::ZERO);
    assert_eq!(basket.held(&w.ledger, &tok("TOK1")), dec(100));
}

// =============================================================================
// Scenario 3: under-funded rollback
// =============================================================================
#[test]
fn scenario_3_underfunded_rollback_refunds() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let mut basket = scenario_basket(bob, carol);
    let assets = [AssetId::native(), tok("TOK1"), tok("TOK2")];

    w.deposit(w.depositor, basket.address(), &AssetId::native(), 30);
    w.deposit(w.depositor, basket.address(), &tok("TOK1"), 100);
    w.deposit(w.depositor, basket.address(), &tok("TOK2"), 19);

    let report = basket.rollback(&mut w.ledger);
    assert!(report.is_complete());
    assert_eq!(w.balances(bob, &assets), vec![dec(30), dec(100), dec(19)]);
    assert_eq!(
        w.balances(basket.address(), &assets),
        vec![Decimal::ZERO; 3]
    );
    assert_eq!(w.balances(carol, &assets), vec![Decimal::ZERO; 3]);
}

// =============================================================================
// Scenario 4: flaky asset during rollback
// =============================================================================
#[test]
fn scenario_4_flaky_rollback_locks_and_retries() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let mut basket = Basket::create(
        Requirement::new(Decimal::ZERO)
            .with("TOK1", dec(100))
            .with("FLAKY", dec(20))
            .with("TOK3", dec(30)),
        carol,
        bob,
    )
    .expect("valid basket");
    let assets = [tok("TOK1"), tok("FLAKY"), tok("TOK3")];

    w.deposit(w.depositor, basket.address(), &tok("TOK1"), 100);
    w.deposit(w.depositor, basket.address(), &tok("FLAKY"), 20);
    w.deposit(w.depositor, basket.address(), &tok("TOK3"), 30);
    assert!(basket.is_ready_to_commit(&w.ledger));

    w.flaky.set_mode(FlakyMode::Reject);
    let report = basket.rollback(&mut w.ledger);
    assert!(!report.is_complete());
    assert_eq!(report.failed_assets(), vec![&tok("FLAKY")]);
    assert_eq!(
        w.balances(bob, &assets),
        vec![dec(100), Decimal::ZERO, dec(30)]
    );
    assert_eq!(
        w.balances(basket.address(), &assets),
        vec![Decimal::ZERO, dec(20), Decimal::ZERO]
    );

    // The asset recovers, but the basket stays locked.
    w.flaky.set_mode(FlakyMode::Succeed);
    let err = basket.commit(&mut w.ledger).unwrap_err();
    assert!(matches!(err, BasketError::Locked));

    let retry = basket.rollback(&mut w.ledger);
    assert!(retry.is_complete());
    assert_eq!(w.balances(bob, &assets), vec![dec(100), dec(20), dec(30)]);
    assert_eq!(
        w.balances(basket.address(), &assets),
        vec![Decimal::ZERO; 3]
    );
    assert_eq!(basket.state(), BasketState::RollingBack);
}

// =============================================================================
// Properties
// =============================================================================
#[test]
fn lock_survives_refunding_the_basket() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let mut basket = scenario_basket(bob, carol);
    basket.rollback(&mut w.ledger);

    for _ in 0..3 {
        w.deposit(w.depositor, basket.address(), &AssetId::native(), 30);
        w.deposit(w.depositor, basket.address(), &tok("TOK1"), 100);
        w.deposit(w.depositor, basket.address(), &tok("TOK2"), 20);
        assert!(basket.is_ready_to_commit(&w.ledger));
        assert!(matches!(
            basket.commit(&mut w.ledger).unwrap_err(),
            BasketError::Locked
        ));
        basket.rollback(&mut w.ledger);
    }
    assert_eq!(w.ledger.balance(&tok("TOK1"), bob), dec(300));
}

#[test]
fn repeated_rollback_with_random_failures_drains_basket() {
    let mut w = World::new();
    let bob = Address::new();
    let mut basket = Basket::create(
        Requirement::new(dec(5)).with("FLAKY", dec(50)).with("TOK1", dec(10)),
        Address::new(),
        bob,
    )
    .expect("valid basket");
    w.deposit(w.depositor, basket.address(), &AssetId::native(), 5);
    w.deposit(w.depositor, basket.address(), &tok("FLAKY"), 50);
    w.deposit(w.depositor, basket.address(), &tok("TOK1"), 10);
    w.flaky.set_mode(FlakyMode::FailWithProbability(0.5));

    let mut calls = 0;
    loop {
        calls += 1;
        let report = basket.rollback(&mut w.ledger);
        // Well-behaved assets are never held hostage by the flaky one.
        assert_eq!(basket.held(&w.ledger, &tok("TOK1")), Decimal::ZERO);
        if report.is_complete() {
            break;
        }
        assert!(calls < 200, "flaky asset never succeeded");
    }

    for asset in [AssetId::native(), tok("FLAKY"), tok("TOK1")] {
        assert_eq!(basket.held(&w.ledger, &asset), Decimal::ZERO);
    }
    assert_eq!(w.ledger.balance(&tok("FLAKY"), bob), dec(50));

    // Further calls are no-ops.
    let idle = basket.rollback(&mut w.ledger);
    assert!(
        idle.outcomes
            .iter()
            .all(|o| o.outcome == TransferOutcome::Empty)
    );
}

#[test]
fn supply_is_conserved_across_commit_and_rollback() {
    let mut w = World::new();
    let (bob, carol) = (Address::new(), Address::new());
    let supply_before: Vec<_> = [AssetId::native(), tok("TOK1"), tok("TOK2")]
        .iter()
        .map(|a| w.ledger.total_supply(a))
        .collect();

    let mut committed = scenario_basket(bob, carol);
    w.deposit(w.depositor, committed.address(), &AssetId::native(), 40);
    w.deposit(w.depositor, committed.address(), &tok("TOK1"), 100);
    w.deposit(w.depositor, committed.address(), &tok("TOK2"), 20);
    committed.commit(&mut w.ledger).expect("commit");

    let mut refunded = scenario_basket(bob, carol);
    w.deposit(w.depositor, refunded.address(), &tok("TOK2"), 7);
    refunded.rollback(&mut w.ledger);

    let supply_after: Vec<_> = [AssetId::native(), tok("TOK1"), tok("TOK2")]
        .iter()
        .map(|a| w.ledger.total_supply(a))
        .collect();
    assert_eq!(supply_before, supply_after);
    assert_eq!(committed.held(&w.ledger, &AssetId::native()), dec(10));
}

// =============================================================================
// Arranged swaps
// =============================================================================
#[test]
fn swap_both_sides_commit_exchanges_assets() {
    let mut w = World::new();
    let mut arranger = SwapArranger::new();
    let (alice, bob) = (Address::new(), Address::new());
    w.fund(alice, &tok("TOK1"), 500);
    w.fund(bob, &tok("TOK2"), 50);
    w.fund(bob, &AssetId::native(), 10);

    let index = arranger
        .arrange(
            alice,
            Requirement::new(Decimal::ZERO).with("TOK1", dec(200)),
            bob,
            Requirement::new(dec(10)).with("TOK2", dec(5)),
            0,
        )
        .expect("arrange");

    let left_load = arranger.get_left_load_address(index).expect("left");
    let right_load = arranger.get_right_load_address(index).expect("right");
    w.deposit(alice, left_load, &tok("TOK1"), 200);
    w.deposit(bob, right_load, &tok("TOK2"), 5);
    w.deposit(bob, right_load, &AssetId::native(), 10);

    let check = arranger.basket(index, Side::Right).expect("right").check(&w.ledger);
    assert!(check.can_commit());

    arranger
        .basket_mut(index, Side::Left)
        .expect("left")
        .commit(&mut w.ledger)
        .expect("left commit");
    arranger
        .basket_mut(index, Side::Right)
        .expect("right")
        .commit(&mut w.ledger)
        .expect("right commit");

    assert_eq!(w.ledger.balance(&tok("TOK1"), bob), dec(200));
    assert_eq!(w.ledger.balance(&tok("TOK2"), alice), dec(5));
    assert_eq!(w.ledger.balance(&AssetId::native(), alice), dec(10));
    assert_eq!(w.ledger.balance(&tok("TOK1"), alice), dec(300));
}

#[test]
fn swap_one_side_rolls_back_independently() {
    let mut w = World::new();
    let mut arranger = SwapArranger::new();
    let (alice, bob) = (Address::new(), Address::new());
    w.fund(alice, &tok("TOK1"), 200);
    w.fund(bob, &tok("TOK2"), 3);

    let index = arranger
        .arrange(
            alice,
            Requirement::new(Decimal::ZERO).with("TOK1", dec(200)),
            bob,
            Requirement::new(Decimal::ZERO).with("TOK2", dec(5)),
            42,
        )
        .expect("arrange");
    let left_load = arranger.get_left_load_address(index).expect("left");
    let right_load = arranger.get_right_load_address(index).expect("right");
    w.deposit(alice, left_load, &tok("TOK1"), 200);
    w.deposit(bob, right_load, &tok("TOK2"), 3);

    // Bob underfunded: his side cannot commit, so both refund.
    let right = arranger.basket_mut(index, Side::Right).expect("right");
    assert!(matches!(
        right.commit(&mut w.ledger).unwrap_err(),
        BasketError::NotReady { .. }
    ));
    right.rollback(&mut w.ledger);
    arranger
        .basket_mut(index, Side::Left)
        .expect("left")
        .rollback(&mut w.ledger);

    assert_eq!(w.ledger.balance(&tok("TOK1"), alice), dec(200));
    assert_eq!(w.ledger.balance(&tok("TOK2"), bob), dec(3));
    assert_eq!(w.ledger.balance(&tok("TOK1"), bob), Decimal::ZERO);
    assert_eq!(arranger.swap(index).expect("swap").deadline, 42);
}

#[test]
fn lookups_for_unknown_swap_fail() {
    let arranger = SwapArranger::new();
    assert!(matches!(
        arranger.get_left_load_address(SwapIndex(0)).unwrap_err(),
        BasketError::UnknownSwap(SwapIndex(0))
    ));
    assert!(matches!(
        arranger.get_right_load_address(SwapIndex(7)).unwrap_err(),
        BasketError::UnknownSwap(SwapIndex(7))
    ));
}

#[test]
fn arranger_from_json_config() {
    let config = ArrangerConfig::from_json_str(
        r#"{"address": "00000000-0000-0000-0000-000000000009",
            "validation": {"allow_empty": true}}"#,
    )
    .expect("config");
    let mut arranger = SwapArranger::with_config(config);
    let index = arranger
        .arrange(
            Address::new(),
            Requirement::default(),
            Address::new(),
            Requirement::default(),
            0,
        )
        .expect("empty swap allowed");
    let expected = Address::derive_basket(
        Address::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9]),
        index,
        Side::Left,
    );
    assert_eq!(arranger.get_left_load_address(index).expect("left"), expected);
}

#[test]
fn swap_record_serializes() {
    let mut arranger = SwapArranger::new();
    let index = arranger
        .arrange(
            Address::new(),
            Requirement::new(dec(1)),
            Address::new(),
            Requirement::new(dec(2)),
            99,
        )
        .expect("arrange");
    let swap = arranger.swap(index).expect("swap");
    let json = serde_json::to_value(swap).expect("serialize");
    assert_eq!(json["index"], 0);
    assert_eq!(json["deadline"], 99);
    assert_eq!(json["left"]["state"], "Open");
    assert_eq!(
        json["left"]["address"],
        serde_json::to_value(swap.left.address()).expect("address")
    );
}

#[test]
fn arranged_basket_stays_locked_after_rollback() {
    let mut w = World::new();
    let mut arranger = SwapArranger::new();
    let (alice, bob) = (Address::new(), Address::new());
    let index = arranger
        .arrange(
            alice,
            Requirement::new(dec(10)),
            bob,
            Requirement::new(dec(10)),
            0,
        )
        .expect("arrange");
    let left_load = arranger.get_left_load_address(index).expect("left");

    arranger
        .basket_mut(index, Side::Left)
        .expect("left")
        .rollback(&mut w.ledger);
    w.deposit(w.depositor, left_load, &AssetId::native(), 10);

    // Every route to the stored basket sees the same latch.
    assert!(arranger.swap(index).expect("swap").left.is_locked());
    assert!(!arranger.basket(index, Side::Left).expect("left").check(&w.ledger).can_commit());
    let err = arranger
        .swap_mut(index)
        .expect("swap")
        .basket_mut(Side::Left)
        .commit(&mut w.ledger)
        .unwrap_err();
    assert!(matches!(err, BasketError::Locked));
    assert_eq!(w.ledger.balance(&AssetId::native(), bob), Decimal::ZERO);
}

#[test]
fn aborting_asset_in_swap_leaves_other_holdings_recoverable() {
    let mut w = World::new();
    let mut arranger = SwapArranger::new();
    let (alice, bob) = (Address::new(), Address::new());
    w.fund(alice, &tok("FLAKY"), 20);
    w.fund(alice, &tok("TOK3"), 30);
    let index = arranger
        .arrange(
            alice,
            Requirement::new(Decimal::ZERO)
                .with("FLAKY", dec(20))
                .with("TOK3", dec(30)),
            bob,
            Requirement::new(dec(1)),
            0,
        )
        .expect("arrange");
    let left_load = arranger.get_left_load_address(index).expect("left");
    w.deposit(alice, left_load, &tok("FLAKY"), 20);
    w.deposit(alice, left_load, &tok("TOK3"), 30);

    w.flaky.set_mode(FlakyMode::Panic);
    let left = arranger.basket_mut(index, Side::Left).expect("left");
    let report = left.rollback(&mut w.ledger);
    assert_eq!(report.failed_assets(), vec![&tok("FLAKY")]);
    assert_eq!(w.ledger.balance(&tok("TOK3"), alice), dec(30));

    w.flaky.set_mode(FlakyMode::Succeed);
    assert!(left.rollback(&mut w.ledger).is_complete());
    assert_eq!(w.ledger.balance(&tok("FLAKY"), alice), dec(20));
}

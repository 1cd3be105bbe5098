use stakefolio::domain::{
    PoolId, Position, PositionId, PositionStatus, Rewards, TimeMs, MS_PER_DAY,
};
use stakefolio::engine::{accrual, lifecycle, portfolio, risk, RiskLevel};
use stakefolio::{Decimal, TxHash};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn tx(n: u64) -> TxHash {
    format!("0x{:064x}", n).parse().unwrap()
}

fn position(pool: u32, principal: &str) -> Position {
    Position {
        id: PositionId::generate(),
        owner: "0x1111111111111111111111111111111111111111".parse().unwrap(),
        pool_id: PoolId::new(pool),
        pool_name: format!("Pool {}", pool),
        token_symbol: "ETH".parse().unwrap(),
        principal: d(principal),
        apy: d("10"),
        lock_period_days: 0,
        rewards: Rewards::zeroed(TimeMs::new(0)),
        status: PositionStatus::Active,
        stake_event: None,
        unstake_event: None,
        last_claim_event: None,
        staking_started_at: TimeMs::new(0),
        staking_ended_at: None,
        network: "ethereum".to_string(),
        auto_compound: false,
        version: 0,
        created_at: TimeMs::new(0),
    }
}

#[test]
fn test_seven_days_at_five_point_two_percent() {
    let reward = accrual::accrue(d("2.5"), d("5.2"), TimeMs::new(0), TimeMs::new(7 * MS_PER_DAY));
    let diff = (reward - d("0.002493150684931506849315068")).abs();
    assert!(diff < d("0.000000000001"), "got {}", reward);
}

#[test]
fn test_distribution_by_pool() {
    let positions = vec![position(1, "100"), position(1, "200"), position(2, "300")];
    let distribution = portfolio::portfolio_distribution(&positions);
    assert_eq!(distribution.len(), 2);
    assert!(distribution.iter().all(|e| e.percentage == d("50")));
}

#[test]
fn test_single_position_is_fully_concentrated() {
    let metrics = risk::risk_metrics(&[position(1, "500")]);
    assert_eq!(metrics.concentration_risk, d("100"));
    assert_eq!(metrics.diversification_score, Decimal::zero());
    assert_eq!(metrics.risk_level, RiskLevel::High);
}

#[test]
fn test_claim_settles_accrual_before_paying_out() {
    let mut p = position(1, "100");
    p.rewards.earned = d("0.05");
    p.rewards.pending = d("0.05");
    // 2.7375 days at 100 * 10% accrues another 0.075
    let now = TimeMs::new(236_520_000);

    let claimed = lifecycle::claim(&mut p, tx(1), None, now).unwrap();
    assert_eq!(claimed, d("0.125"));
    assert_eq!(p.rewards.earned, d("0.125"));
    assert_eq!(p.rewards.pending, Decimal::zero());
    assert_eq!(p.rewards.claimed, d("0.125"));
}

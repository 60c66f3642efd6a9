// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use bootstrap_incentives::{
    compute_view, epoch::PeriodStatus, estimate_stream_apr, BootstrapConfig, BootstrapSnapshot,
    EpochPhase, IncentivesError, LstColumn, ScopeKind, SortDirection, SortState, StreamAmounts,
    ViewPublisher, WeekWindowPolicy, MAINNET, NO_CHANGE_LST,
};
use chrono::{TimeZone, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use tokio::sync::watch;

const LST_A: Address = address!("0x00000000000000000000000000000000000000aa");
const LST_B: Address = address!("0x00000000000000000000000000000000000000bb");

fn fixture() -> BootstrapSnapshot {
    BootstrapSnapshot::from_json(include_str!("fixtures/epoch2_voting.json")).unwrap()
}

#[test]
fn voting_phase_view() {
    let view = compute_view(&fixture(), &MAINNET);

    assert_eq!(view.epoch, 2);
    assert_eq!(view.current_epoch, 2);
    assert_eq!(view.epoch_range.start_time, 1_698_883_200);
    assert_eq!(view.phase.phase, EpochPhase::Voting);
    assert_eq!(view.vote_countdown, "ends in 6d 00h 00m 00s");

    // Epoch 1 record skipped, missing depositor and oversized decimals rejected.
    let rejected: Vec<_> = view.rejected.iter().map(|rejected| rejected.error.clone()).collect();
    assert_eq!(
        rejected,
        [
            IncentivesError::MissingField { index: 4, field: "depositor" },
            IncentivesError::InvalidDecimals(24),
        ]
    );

    let protocol = view.incentives.groups(ScopeKind::Protocol);
    assert_eq!(protocol[&LST_A].normalized_sum, Decimal::from(4000));
    assert_eq!(protocol[&LST_B].normalized_sum, Decimal::from(500));
    assert_eq!(protocol[&LST_B].usd_per_vote_unit, Decimal::from(5));
    let per_vote = protocol[&LST_A].usd_per_vote_unit.to_f64().unwrap();
    assert!((per_vote - 4000.0 / 300.0).abs() < 1e-9);

    // 4000 USD per epoch on 300 votes priced at 2 USD.
    let expected_apr = 4000.0 * 31_557_600.0 / 2_419_200.0 / 600.0 * 100.0;
    assert!((protocol[&LST_A].estimated_apr - expected_apr).abs() < 1e-6);

    assert_eq!(view.incentives.total_usd(ScopeKind::User), Decimal::from(1500));
    let user: Vec<_> =
        view.user_ranking.iter().map(|row| (row.lst, row.total_incentive_usd)).collect();
    assert_eq!(
        user,
        [(NO_CHANGE_LST, Decimal::ZERO), (LST_A, Decimal::from(1500)), (LST_B, Decimal::ZERO)]
    );

    let protocol_order: Vec<_> = view.protocol_ranking.iter().map(|row| row.lst).collect();
    assert_eq!(protocol_order, [NO_CHANGE_LST, LST_A, LST_B]);

    let shares: Vec<_> = view.votes.by_lst.iter().map(|votes| (votes.lst, votes.share)).collect();
    assert_eq!(shares, [(LST_B, Decimal::new(25, 2)), (LST_A, Decimal::new(75, 2))]);
    assert_eq!(view.votes.total_votes.normalized().unwrap(), Decimal::from(400));
    assert_eq!(
        view.votes.viewer_vote_power.map(|power| power.normalized_or_zero()),
        Some(Decimal::from(7))
    );

    assert_eq!(view.periods.whitelist, PeriodStatus::Ended);
    assert!(matches!(view.periods.incentive, PeriodStatus::Active { .. }));
    assert_eq!(view.periods.deposit, PeriodStatus::ComingSoon);
    assert_eq!(view.periods.vote.to_string(), "6d 00h 00m 00s");

    // Friday 2023-11-24 00:00:00 UTC: 7 streamed on 400 unlocked, 172_799 seconds left in the week.
    let stream_apr = view.stream_apr.unwrap();
    assert!((stream_apr - 7.0 * 31_557_600.0 / 172_799.0 / 400.0 * 100.0).abs() < 1e-9);
}

#[test]
fn resorting_keeps_no_change_first() {
    let mut snapshot = fixture();
    snapshot.lst_sort = Some(SortState::by(LstColumn::TotalIncentive, SortDirection::Ascending));
    let view = compute_view(&snapshot, &MAINNET);
    let order: Vec<_> = view.protocol_ranking.iter().map(|row| row.lst).collect();
    assert_eq!(order, [NO_CHANGE_LST, LST_B, LST_A]);
}

#[test]
fn idle_lsts_can_be_hidden() {
    let mut snapshot = fixture();
    snapshot.viewer = Some(address!("0x0000000000000000000000000000000000000003"));
    let config = BootstrapConfig::builder().include_idle_lsts(false).build().unwrap();

    let view = compute_view(&snapshot, &config);
    assert!(view.incentives.user.is_empty());
    // Whitelisted LSTs are still listed, with zero values.
    assert_eq!(view.user_ranking.len(), 3);
    assert!(view.user_ranking.iter().all(|row| row.total_incentive_usd.is_zero()));
}

#[test]
fn malformed_snapshot_is_an_error() {
    let err = BootstrapSnapshot::from_json("{\"now\": \"soon\"}").unwrap_err();
    assert!(err.to_string().contains("Failed to parse bootstrap snapshot"));
}

#[test]
fn stream_apr_over_remaining_week() {
    // Wednesday 2023-09-13 12:00:00 UTC, 302_399 seconds before Saturday 23:59:59.
    let now = Utc.with_ymd_and_hms(2023, 9, 13, 12, 0, 0).unwrap();
    let amounts = StreamAmounts {
        streaming: U256::from(7u64) * U256::from(10u64).pow(U256::from(18)),
        unlocked: U256::from(1000u64) * U256::from(10u64).pow(U256::from(18)),
    };

    let apr = estimate_stream_apr(&amounts, &now, WeekWindowPolicy::RemainingInWeek);
    let expected = 7.0 * 31_557_600.0 / 302_399.0 / 1000.0 * 100.0;
    assert!((apr - expected).abs() < 1e-9);

    let empty = StreamAmounts { streaming: amounts.streaming, unlocked: U256::ZERO };
    assert_eq!(estimate_stream_apr(&empty, &now, WeekWindowPolicy::SundayAnchored), 0.0);
}

#[tokio::test]
async fn publisher_follows_snapshots() -> anyhow::Result<()> {
    let (sender, receiver) = watch::channel(Arc::new(fixture()));
    let publisher = ViewPublisher::spawn(MAINNET, receiver)?;
    let mut views = publisher.subscribe();
    assert_eq!(publisher.latest().phase.phase, EpochPhase::Voting);

    // Move into the lock period.
    let mut snapshot = fixture();
    snapshot.now = 1_701_302_400;
    sender.send(Arc::new(snapshot))?;
    views.changed().await?;
    {
        let view = views.borrow_and_update();
        assert_eq!(view.current_epoch, 3);
        assert_eq!(view.phase.phase, EpochPhase::Locked);
        assert_eq!(view.vote_countdown, "ends in 0d 00h 00m 00s");
    }

    drop(sender);
    publisher.join().await
}

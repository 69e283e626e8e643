//! Tournament Tests for Arena Ledger
//!
//! Tests for the tournament lifecycle including:
//! - Creation validation
//! - Joining (fees, capacity, duplicates, bans)
//! - Normal-mode result submission and verification
//! - Kill-mode result posting and verification
//! - Clash Squad rejection
//! - Status transitions and deletion


use arena_ledger::{
    ErrorKind, KillClaim, LedgerError, PrizeTier, TournamentMode, TournamentPatch, TournamentStatus, Verdict,
    VerificationStatus,
};
use rust_decimal::Decimal;
use test_helpers::{inr, new_tournament, TestLedger};

// ============================================================================
// CREATION TESTS
// ============================================================================

#[test]
fn test_create_tournament_starts_upcoming() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(50, 10, 10);

    assert_eq!(t.status, TournamentStatus::Upcoming);
    assert!(t.participants.is_empty());
    assert_eq!(ledger.engine.tournaments().len(), 1);
}

#[test]
fn test_prize_table_must_total_one_hundred() {
    let ledger = TestLedger::new();
    let mode = TournamentMode::Normal {
        prize_table: vec![
            PrizeTier { rank: 1, percentage: inr(60) },
            PrizeTier { rank: 2, percentage: inr(30) },
        ],
    };
    let err = ledger
        .engine
        .create_tournament(ledger.admin, new_tournament(50, 10, 10, mode))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_duplicate_prize_ranks_rejected() {
    let ledger = TestLedger::new();
    let mode = TournamentMode::Normal {
        prize_table: vec![
            PrizeTier { rank: 1, percentage: inr(50) },
            PrizeTier { rank: 1, percentage: inr(50) },
        ],
    };
    let err = ledger
        .engine
        .create_tournament(ledger.admin, new_tournament(50, 10, 10, mode))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_zero_capacity_rejected() {
    let ledger = TestLedger::new();
    let mode = TournamentMode::Kill { per_kill_reward: inr(5) };
    let err = ledger
        .engine
        .create_tournament(ledger.admin, new_tournament(50, 0, 0, mode))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_player_cannot_create_tournament() {
    let ledger = TestLedger::new();
    let mallory = ledger.player("mallory");
    let mode = TournamentMode::Kill { per_kill_reward: inr(5) };

    let err = ledger
        .engine
        .create_tournament(mallory, new_tournament(50, 10, 0, mode))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert!(ledger.engine.tournaments().is_empty());
}

// ============================================================================
// JOIN TESTS
// ============================================================================

#[test]
fn test_join_debits_entry_fee_with_priority() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(50, 10, 10);
    let alice = ledger.funded_player("alice", 40, 100, 20);

    ledger.engine.join_tournament(t.id, alice, false).unwrap();

    let wallet = ledger.engine.wallet(alice).unwrap();
    assert_eq!(wallet.bonus, inr(0));
    assert_eq!(wallet.deposited, inr(10));
    assert_eq!(wallet.winnable, inr(100));
    assert!(ledger.engine.tournament(t.id).unwrap().is_participant(alice));
}

#[test]
fn test_join_records_last_device() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(0, 10, 0);
    let alice = ledger.player("alice");
    let bob = ledger.player("bob");
    ledger.engine.record_device(alice, "Pixel 8 / Android 15").unwrap();

    let a = ledger.engine.join_tournament(t.id, alice, false).unwrap();
    let b = ledger.engine.join_tournament(t.id, bob, true).unwrap();

    assert_eq!(a.device_info, "Pixel 8 / Android 15");
    assert_eq!(b.device_info, "N/A");
    assert!(b.emulator_declaration);
}

#[test]
fn test_free_tournament_needs_no_balance() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(0, 10, 10);
    let alice = ledger.player("alice");

    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    assert_eq!(ledger.balance(alice), inr(0));
}

#[test]
fn test_fifty_first_join_hits_capacity() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(10, 50, 10);

    for i in 0..50 {
        let p = ledger.funded_player(&format!("player{i}"), 10, 0, 0);
        ledger.engine.join_tournament(t.id, p, false).unwrap();
    }

    let late = ledger.funded_player("late", 10, 0, 0);
    let err = ledger.engine.join_tournament(t.id, late, false).unwrap_err();
    assert_eq!(err, LedgerError::Capacity { capacity: 50 });
    assert_eq!(ledger.balance(late), inr(10));
    assert_eq!(ledger.engine.tournament(t.id).unwrap().participants.len(), 50);
}

#[test]
fn test_join_twice_is_duplicate() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(20, 10, 10);
    let alice = ledger.funded_player("alice", 100, 0, 0);

    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    let err = ledger.engine.join_tournament(t.id, alice, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateAction);
    assert_eq!(ledger.balance(alice), inr(80));
}

#[test]
fn test_join_without_funds_changes_nothing() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(50, 10, 10);
    let alice = ledger.funded_player("alice", 30, 0, 10);

    let err = ledger.engine.join_tournament(t.id, alice, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(ledger.balance(alice), inr(40));
    assert!(ledger.engine.tournament(t.id).unwrap().participants.is_empty());
}

#[test]
fn test_banned_player_cannot_join() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(10, 10, 10);
    let alice = ledger.funded_player("alice", 100, 0, 0);
    ledger
        .engine
        .set_ban(ledger.admin, alice, true, Some("cheating".to_string()))
        .unwrap();

    let err = ledger.engine.join_tournament(t.id, alice, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_eq!(ledger.balance(alice), inr(100));
}

#[test]
fn test_cannot_join_started_tournament() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(10, 10, 10);
    let alice = ledger.funded_player("alice", 100, 0, 0);
    ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Live)
        .unwrap();

    let err = ledger.engine.join_tournament(t.id, alice, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

// ============================================================================
// NORMAL MODE RESULT TESTS
// ============================================================================

/// Ten players at ₹50 with 10% commission: pool 450, rank 1 takes 50%.
fn started_normal_tournament(ledger: &TestLedger) -> (u64, Vec<u64>) {
    let t = ledger.normal_tournament(50, 10, 10);
    let players: Vec<u64> = (0..10)
        .map(|i| {
            let p = ledger.funded_player(&format!("p{i}"), 50, 0, 0);
            ledger.engine.join_tournament(t.id, p, false).unwrap();
            p
        })
        .collect();
    ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Live)
        .unwrap();
    (t.id, players)
}

#[test]
fn test_prize_pool_after_commission() {
    let ledger = TestLedger::new();
    let (tid, _) = started_normal_tournament(&ledger);

    assert_eq!(ledger.engine.prize_pool(tid).unwrap(), inr(450));
    assert_eq!(ledger.engine.tournament(tid).unwrap().prize_for_rank(1), inr(225));
    assert_eq!(ledger.engine.tournament(tid).unwrap().prize_for_rank(4), inr(0));
}

#[test]
fn test_verified_rank_pays_winnable() {
    let ledger = TestLedger::new();
    let (tid, players) = started_normal_tournament(&ledger);
    let winner = players[0];

    let result = ledger
        .engine
        .submit_normal_result(tid, winner, 1, Some("shots/winner.png".to_string()))
        .unwrap();
    assert_eq!(result.status, VerificationStatus::Pending);

    let settled = ledger
        .engine
        .verify_normal_result(ledger.admin, result.id, Verdict::Verified)
        .unwrap();
    assert_eq!(settled.status, VerificationStatus::Verified);
    assert_eq!(settled.winnings, Some(inr(225)));

    let wallet = ledger.engine.wallet(winner).unwrap();
    assert_eq!(wallet.winnable, inr(225));
}

#[test]
fn test_second_verification_is_already_resolved() {
    let ledger = TestLedger::new();
    let (tid, players) = started_normal_tournament(&ledger);
    let result = ledger.engine.submit_normal_result(tid, players[1], 2, None).unwrap();

    ledger
        .engine
        .verify_normal_result(ledger.admin, result.id, Verdict::Verified)
        .unwrap();
    let err = ledger
        .engine
        .verify_normal_result(ledger.admin, result.id, Verdict::Verified)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);

    // 30% of 450, paid once
    assert_eq!(ledger.engine.wallet(players[1]).unwrap().winnable, inr(135));
}

#[test]
fn test_rejected_result_pays_nothing_and_allows_resubmission() {
    let ledger = TestLedger::new();
    let (tid, players) = started_normal_tournament(&ledger);
    let result = ledger.engine.submit_normal_result(tid, players[2], 1, None).unwrap();

    let settled = ledger
        .engine
        .verify_normal_result(ledger.admin, result.id, Verdict::Rejected)
        .unwrap();
    assert_eq!(settled.status, VerificationStatus::Rejected);
    assert_eq!(settled.winnings, None);
    assert_eq!(ledger.balance(players[2]), inr(0));

    ledger.engine.submit_normal_result(tid, players[2], 3, None).unwrap();
}

#[test]
fn test_duplicate_pending_submission_rejected() {
    let ledger = TestLedger::new();
    let (tid, players) = started_normal_tournament(&ledger);
    ledger.engine.submit_normal_result(tid, players[0], 1, None).unwrap();

    let err = ledger.engine.submit_normal_result(tid, players[0], 2, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateAction);
}

#[test]
fn test_non_participant_cannot_submit() {
    let ledger = TestLedger::new();
    let (tid, _) = started_normal_tournament(&ledger);
    let outsider = ledger.player("outsider");

    let err = ledger.engine.submit_normal_result(tid, outsider, 1, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_submit_before_start_rejected() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(0, 10, 0);
    let alice = ledger.player("alice");
    ledger.engine.join_tournament(t.id, alice, false).unwrap();

    let err = ledger.engine.submit_normal_result(t.id, alice, 1, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_pending_results_listing() {
    let ledger = TestLedger::new();
    let (tid, players) = started_normal_tournament(&ledger);
    let first = ledger.engine.submit_normal_result(tid, players[0], 1, None).unwrap();
    ledger.engine.submit_normal_result(tid, players[1], 2, None).unwrap();

    ledger
        .engine
        .verify_normal_result(ledger.admin, first.id, Verdict::Verified)
        .unwrap();

    assert_eq!(ledger.engine.pending_results().len(), 1);
    assert_eq!(ledger.engine.results_for_tournament(tid).len(), 2);
}

// ============================================================================
// KILL MODE TESTS
// ============================================================================

#[test]
fn test_kill_results_flow() {
    let ledger = TestLedger::new();
    let t = ledger.kill_tournament(20, 10, 5, 15);
    let alice = ledger.funded_player("alice", 20, 0, 0);
    let bob = ledger.funded_player("bob", 20, 0, 0);
    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    ledger.engine.join_tournament(t.id, bob, false).unwrap();

    let posted = ledger
        .engine
        .set_kill_results(
            ledger.admin,
            t.id,
            vec![
                KillClaim { user_id: alice, kills: 7, screenshot_path: None },
                KillClaim { user_id: bob, kills: 20, screenshot_path: None },
            ],
        )
        .unwrap();

    assert_eq!(posted[0].winnings, inr(35));
    assert!(!posted[0].flagged);
    assert!(posted[1].flagged);
    assert!(posted.iter().all(|r| r.status == VerificationStatus::PendingVerification));
    assert_eq!(ledger.engine.tournament(t.id).unwrap().status, TournamentStatus::Completed);

    ledger
        .engine
        .verify_kill_result(ledger.admin, t.id, alice, Verdict::Verified)
        .unwrap();
    ledger
        .engine
        .verify_kill_result(ledger.admin, t.id, bob, Verdict::Rejected)
        .unwrap();

    assert_eq!(ledger.engine.wallet(alice).unwrap().winnable, inr(35));
    assert_eq!(ledger.balance(bob), inr(0));

    let err = ledger
        .engine
        .verify_kill_result(ledger.admin, t.id, alice, Verdict::Verified)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    assert_eq!(ledger.engine.wallet(alice).unwrap().winnable, inr(35));
}

#[test]
fn test_kill_results_posted_once() {
    let ledger = TestLedger::new();
    let t = ledger.kill_tournament(0, 10, 5, 0);
    let alice = ledger.player("alice");
    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    let claims = || vec![KillClaim { user_id: alice, kills: 3, screenshot_path: None }];

    ledger.engine.set_kill_results(ledger.admin, t.id, claims()).unwrap();
    let err = ledger
        .engine
        .set_kill_results(ledger.admin, t.id, claims())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
}

#[test]
fn test_empty_kill_post_does_not_complete_tournament() {
    let ledger = TestLedger::new();
    let t = ledger.kill_tournament(0, 10, 5, 0);
    let alice = ledger.player("alice");
    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    let claims = || vec![KillClaim { user_id: alice, kills: 3, screenshot_path: None }];

    let err = ledger
        .engine
        .set_kill_results(ledger.admin, t.id, Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_ne!(ledger.engine.tournament(t.id).unwrap().status, TournamentStatus::Completed);

    let posted = ledger.engine.set_kill_results(ledger.admin, t.id, claims()).unwrap();
    assert_eq!(posted.len(), 1);
    let err = ledger
        .engine
        .set_kill_results(ledger.admin, t.id, claims())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    assert_eq!(ledger.engine.tournament(t.id).unwrap().kill_results.len(), 1);
}

#[test]
fn test_unrepresentable_kill_reward_rejected() {
    let ledger = TestLedger::new();
    let mode = TournamentMode::Kill { per_kill_reward: Decimal::MAX };
    let err = ledger
        .engine
        .create_tournament(ledger.admin, new_tournament(0, 10, 0, mode))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAmount);
}

#[test]
fn test_kill_results_for_outsider_rejected() {
    let ledger = TestLedger::new();
    let t = ledger.kill_tournament(0, 10, 5, 0);
    let outsider = ledger.player("outsider");

    let err = ledger
        .engine
        .set_kill_results(
            ledger.admin,
            t.id,
            vec![KillClaim { user_id: outsider, kills: 3, screenshot_path: None }],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_eq!(ledger.engine.tournament(t.id).unwrap().status, TournamentStatus::Upcoming);
}

#[test]
fn test_kill_tournament_refuses_rank_submission() {
    let ledger = TestLedger::new();
    let t = ledger.kill_tournament(0, 10, 5, 0);
    let alice = ledger.player("alice");
    ledger.engine.join_tournament(t.id, alice, false).unwrap();

    let err = ledger.engine.submit_normal_result(t.id, alice, 1, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

// ============================================================================
// CLASH SQUAD TESTS
// ============================================================================

#[test]
fn test_clash_squad_has_no_settlement_path() {
    let ledger = TestLedger::new();
    let t = ledger.tournament(10, 8, 10, TournamentMode::ClashSquad { rounds_to_win: 4 });
    let alice = ledger.funded_player("alice", 10, 0, 0);
    ledger.engine.join_tournament(t.id, alice, false).unwrap();
    ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Live)
        .unwrap();

    let err = ledger.engine.submit_normal_result(t.id, alice, 1, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = ledger
        .engine
        .set_kill_results(
            ledger.admin,
            t.id,
            vec![KillClaim { user_id: alice, kills: 1, screenshot_path: None }],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

// ============================================================================
// STATUS AND DELETION TESTS
// ============================================================================

#[test]
fn test_status_moves_forward_only() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(0, 10, 0);

    ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Live)
        .unwrap();
    let err = ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Upcoming)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Completed)
        .unwrap();
    let err = ledger
        .engine
        .set_tournament_status(ledger.admin, t.id, TournamentStatus::Completed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
}

#[test]
fn test_update_tournament_metadata() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(0, 10, 0);

    let updated = ledger
        .engine
        .update_tournament(
            ledger.admin,
            t.id,
            TournamentPatch {
                room_id: Some("ROOM42".to_string()),
                room_password: Some("hunter2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.room_id.as_deref(), Some("ROOM42"));
    assert_eq!(updated.entry_fee, t.entry_fee);
}

#[test]
fn test_delete_keeps_collected_fees() {
    let ledger = TestLedger::new();
    let t = ledger.normal_tournament(25, 10, 10);
    let alice = ledger.funded_player("alice", 25, 0, 0);
    ledger.engine.join_tournament(t.id, alice, false).unwrap();

    ledger.engine.delete_tournament(ledger.admin, t.id).unwrap();

    assert_eq!(ledger.balance(alice), inr(0));
    let err = ledger.engine.tournament(t.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

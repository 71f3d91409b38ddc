//! Simulation Step Engine
//!
//! One step = at most one candidate kill followed by round-end evaluation.
//! Every piece of randomness comes from the caller-supplied [`SimRng`] and
//! timestamps from the caller, so every step is replayable in tests.
//!
//! The engine never publishes anything itself. It returns the ordered list
//! of notifications the step produced; the scheduler turns those into
//! broadcasts and handles the live-to-finished registry move.

use tracing::debug;

use crate::core::rng::SimRng;
use crate::game::state::{KillEvent, MatchState, RoundHistoryEntry, TeamSlot};
use crate::{MAX_ROUNDS, ROUNDS_TO_WIN, SIDE_SWAP_ROUND};

/// Chance that a kill targets the killer's own team.
pub const TEAM_KILL_PERCENT: u64 = 5;
/// Chance that a kill is a headshot.
pub const HEADSHOT_PERCENT: u64 = 40;
/// Chance that a kill carries an assist.
pub const ASSIST_PERCENT: u64 = 40;

/// One notification produced by a simulation step, in publish order.
#[derive(Clone, Debug)]
pub enum StepNotice {
    /// State changed; snapshot taken at the moment of the change.
    Update(MatchState),
    /// The match just finished. The caller must move it out of the live
    /// set before publishing this.
    Finished(MatchState),
}

/// Run one simulation step against a live match.
///
/// Simulates a single kill when both rosters still have someone standing,
/// then evaluates round end and match termination. Returns the snapshots
/// to publish, in order. A finished match yields nothing.
pub fn simulate_step(state: &mut MatchState, rng: &mut SimRng, now_ms: i64) -> Vec<StepNotice> {
    if state.finished {
        return Vec::new();
    }

    let mut notices = Vec::new();

    if simulate_kill(state, rng, now_ms) {
        notices.push(StepNotice::Update(state.clone()));
    }

    evaluate_round_end(state, &mut notices);
    notices
}

/// Pick a killer and victim, record the kill. Returns false when fewer
/// than two players are standing and no kill can happen.
fn simulate_kill(state: &mut MatchState, rng: &mut SimRng, now_ms: i64) -> bool {
    let living = state.living_players();
    if living.len() < 2 {
        return false;
    }

    let (killer_slot, killer_idx) = living[rng.next_index(living.len())];

    // Team-kill roll; falls back to the opposing pool when the killer has
    // no living teammate left.
    let mut victim_pool: Vec<(TeamSlot, usize)> = if rng.percent(TEAM_KILL_PERCENT) {
        living
            .iter()
            .copied()
            .filter(|&(slot, idx)| slot == killer_slot && idx != killer_idx)
            .collect()
    } else {
        Vec::new()
    };
    if victim_pool.is_empty() {
        victim_pool = living
            .iter()
            .copied()
            .filter(|&(slot, _)| slot != killer_slot)
            .collect();
    }
    if victim_pool.is_empty() {
        return false;
    }

    let (victim_slot, victim_idx) = victim_pool[rng.next_index(victim_pool.len())];

    let headshot = rng.percent(HEADSHOT_PERCENT);

    // Assist roll resolves against the killer's living teammates; a
    // successful roll with nobody eligible records no assist.
    let assist_idx = if rng.percent(ASSIST_PERCENT) {
        let teammates: Vec<usize> = state
            .team(killer_slot)
            .living_indices()
            .into_iter()
            .filter(|&i| i != killer_idx && !(killer_slot == victim_slot && i == victim_idx))
            .collect();
        rng.choose(&teammates).copied()
    } else {
        None
    };

    // Feed labels always show a cross-team fight: the victim gets the
    // label opposite the killer's even on a team kill.
    let killer_side = state.team(killer_slot).side;
    let victim_side = killer_side.opposite();

    {
        let killer = &mut state.team_mut(killer_slot).players[killer_idx];
        killer.kills += 1;
        if headshot {
            killer.headshots += 1;
        }
    }
    let assist_id = assist_idx.map(|i| {
        let helper = &mut state.team_mut(killer_slot).players[i];
        helper.assists += 1;
        helper.id
    });
    {
        let victim = &mut state.team_mut(victim_slot).players[victim_idx];
        victim.deaths += 1;
        victim.dead = true;
    }

    let killer = &state.team(killer_slot).players[killer_idx];
    let victim = &state.team(victim_slot).players[victim_idx];
    let event = KillEvent {
        killer_id: killer.id,
        killer_name: killer.name.clone(),
        killer_side,
        victim_id: victim.id,
        victim_name: victim.name.clone(),
        victim_side,
        weapon_id: killer.weapon_id,
        timestamp: now_ms,
        headshot,
        assist_id,
    };

    debug!(
        match_id = %state.match_id,
        killer = %event.killer_name,
        victim = %event.victim_name,
        headshot,
        "kill simulated"
    );

    state.push_kill(event);
    true
}

/// Resolve the round if a team got wiped, then check match termination.
fn evaluate_round_end(state: &mut MatchState, notices: &mut Vec<StepNotice>) {
    let (alive1, alive2) = state.alive_counts();
    if alive1 >= 1 && alive2 >= 1 {
        return;
    }

    // A simultaneous wipe advances the round without a winner or a
    // history entry.
    let winner = match (alive1, alive2) {
        (0, 0) => None,
        (_, 0) => Some(TeamSlot::Team1),
        (0, _) => Some(TeamSlot::Team2),
        _ => unreachable!(),
    };

    if let Some(slot) = winner {
        state.team_mut(slot).win_rounds += 1;
        state.rounds_history.push(RoundHistoryEntry {
            round: state.round,
            team1_win_rounds: state.team1.win_rounds,
            team2_win_rounds: state.team2.win_rounds,
            winner: slot,
            kill_events: state.current_round_kill_events.clone(),
        });
    }

    state.round += 1;
    if state.round == SIDE_SWAP_ROUND {
        state.team1.side = state.team1.side.opposite();
        state.team2.side = state.team2.side.opposite();
    }
    state.reset_round();

    debug!(
        match_id = %state.match_id,
        round = state.round,
        score = format!("{}:{}", state.team1.win_rounds, state.team2.win_rounds),
        "round resolved"
    );

    notices.push(StepNotice::Update(state.clone()));

    if state.team1.win_rounds >= ROUNDS_TO_WIN
        || state.team2.win_rounds >= ROUNDS_TO_WIN
        || state.round > MAX_ROUNDS
    {
        state.finished = true;
        notices.push(StepNotice::Update(state.clone()));
        notices.push(StepNotice::Finished(state.clone()));
    }
}

// =============================================================================
// TESTS
// =============================================================================

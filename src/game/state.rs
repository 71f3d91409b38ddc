//! Match State Definitions
//!
//! All value types for one simulated match: players, teams, kill events,
//! round history, and the match itself. Snapshots of these types are what
//! the server pushes to subscribers, so everything here serializes to the
//! camelCase JSON the clients expect.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::rng::SimRng;
use crate::game::catalog;
use crate::{KILL_FEED_CAPACITY, ROUND_TIMER_SECS, STARTING_MONEY};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique match identifier (UUID, serialized as a string).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique player identifier (UUID, serialized as a string).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// SIDES AND TEAM SLOTS
// =============================================================================

/// Team posture, swapped once per match at the half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Counter-terrorist side.
    #[serde(rename = "CT")]
    Ct,
    /// Terrorist side.
    #[serde(rename = "TT")]
    Tt,
}

impl Side {
    /// The other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Ct => Side::Tt,
            Side::Tt => Side::Ct,
        }
    }
}

/// Which of a match's two teams a player or round winner belongs to.
///
/// Stable across the side swap - `Team1` is always the team created from
/// the first roster, whatever side it currently plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamSlot {
    /// First roster, starts CT.
    Team1,
    /// Second roster, starts TT.
    Team2,
}

impl TeamSlot {
    /// The opposing slot.
    pub fn opposite(self) -> TeamSlot {
        match self {
            TeamSlot::Team1 => TeamSlot::Team2,
            TeamSlot::Team2 => TeamSlot::Team1,
        }
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single combatant. Owned exclusively by its [`Team`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cumulative kills across all rounds.
    pub kills: u32,
    /// Cumulative deaths.
    pub deaths: u32,
    /// Cumulative assists.
    pub assists: u32,
    /// Cumulative headshot kills.
    pub headshots: u32,
    /// Economy balance.
    pub money_count: u32,
    /// Dead this round; cleared at every round reset.
    pub dead: bool,
    /// Currently equipped weapon id.
    pub weapon_id: u32,
}

impl Player {
    /// Create a player with zeroed stats and a random starting weapon.
    pub fn new(name: impl Into<String>, rng: &mut SimRng) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            kills: 0,
            deaths: 0,
            assists: 0,
            headshots: 0,
            money_count: STARTING_MONEY,
            dead: false,
            weapon_id: catalog::random_weapon_id(rng),
        }
    }
}

// =============================================================================
// TEAM STATE
// =============================================================================

/// One squad: name, current side, score, and its fixed roster.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Team display name.
    pub name: String,
    /// Current side; swapped at the half.
    pub side: Side,
    /// Rounds won so far. Never decreases.
    pub win_rounds: u32,
    /// Ordered roster, fixed after match creation.
    pub players: Vec<Player>,
}

impl Team {
    /// Build a team from a roster, truncated to `roster_size` names.
    fn new(
        name: String,
        side: Side,
        player_names: &[String],
        roster_size: usize,
        rng: &mut SimRng,
    ) -> Self {
        let players = player_names
            .iter()
            .take(roster_size)
            .map(|n| Player::new(n.clone(), rng))
            .collect();

        Self {
            name,
            side,
            win_rounds: 0,
            players,
        }
    }

    /// Number of players still alive this round.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| !p.dead).count()
    }

    /// Indices of living players.
    pub fn living_indices(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.dead)
            .map(|(i, _)| i)
            .collect()
    }
}

// =============================================================================
// KILL EVENTS AND ROUND HISTORY
// =============================================================================

/// One kill, immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillEvent {
    /// Who got the kill.
    pub killer_id: PlayerId,
    /// Killer display name.
    pub killer_name: String,
    /// Side of the killer's team at event time.
    pub killer_side: Side,
    /// Who died.
    pub victim_id: PlayerId,
    /// Victim display name.
    pub victim_name: String,
    /// Label shown for the victim; always the opposite of `killer_side`,
    /// even when the kill hit a teammate.
    pub victim_side: Side,
    /// Weapon the killer had equipped.
    pub weapon_id: u32,
    /// Unix milliseconds when the kill was simulated.
    pub timestamp: i64,
    /// Whether the kill was a headshot.
    pub headshot: bool,
    /// Teammate credited with the assist, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist_id: Option<PlayerId>,
}

/// Permanent summary of one resolved round. Appended exactly once per
/// round that produced a winner; a simultaneous wipe appends nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundHistoryEntry {
    /// Round number that just ended.
    pub round: u32,
    /// Team1's win tally after this round.
    pub team1_win_rounds: u32,
    /// Team2's win tally after this round.
    pub team2_win_rounds: u32,
    /// Which team won the round.
    pub winner: TeamSlot,
    /// Every kill recorded during the round, in order.
    pub kill_events: Vec<KillEvent>,
}

// =============================================================================
// MATCH CREATION PARAMETERS
// =============================================================================

/// Roster request for one team.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamParams {
    /// Team display name.
    pub name: String,
    /// Player display names; truncated to `team_players_count`.
    pub players: Vec<String>,
}

/// Parameters for creating a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchParams {
    /// Requested map id; unknown ids fall back to the default map.
    pub map_id: u32,
    /// First team (starts CT).
    pub team1: TeamParams,
    /// Second team (starts TT).
    pub team2: TeamParams,
    /// Roster size per team.
    pub team_players_count: u32,
}

/// Rejected-creation signal for malformed construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateMatchError {
    /// A team name was empty.
    #[error("team name must not be empty")]
    EmptyTeamName,

    /// A team roster had no player names.
    #[error("team roster must not be empty")]
    EmptyRoster,

    /// Requested roster size was zero.
    #[error("teamPlayersCount must be at least 1")]
    ZeroRosterSize,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of one match.
///
/// Mutated only by the simulation step (`game::step`); everyone else reads
/// snapshots. The match registry owns storage and the live/finished split.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    /// Unique match id.
    pub match_id: MatchId,
    /// Resolved map id (after default fallback).
    pub map_id: u32,
    /// Round countdown display value; reset to 90 at each round start.
    pub timer: u32,
    /// Current round number, starting at 1. Strictly increasing.
    pub round: u32,
    /// Roster size per team.
    pub mode: u32,
    /// First team (starts CT).
    pub team1: Team,
    /// Second team (starts TT).
    pub team2: Team,
    /// Sliding window of the most recent kills, bounded at 15.
    pub kill_feed: VecDeque<KillEvent>,
    /// Kills in the round currently being played; cleared at round reset.
    pub current_round_kill_events: Vec<KillEvent>,
    /// Append-only per-round summaries.
    pub rounds_history: Vec<RoundHistoryEntry>,
    /// Set exactly once; a finished match is never mutated again.
    pub finished: bool,
}

impl MatchState {
    /// Build a match per the construction contract.
    ///
    /// Team1 starts CT, team2 TT. Rosters are truncated to the requested
    /// size, every player gets zero stats and a random catalog weapon, and
    /// an unknown map id resolves to the default map.
    pub fn new(params: CreateMatchParams, rng: &mut SimRng) -> Result<Self, CreateMatchError> {
        if params.team_players_count == 0 {
            return Err(CreateMatchError::ZeroRosterSize);
        }
        if params.team1.name.trim().is_empty() || params.team2.name.trim().is_empty() {
            return Err(CreateMatchError::EmptyTeamName);
        }
        if params.team1.players.is_empty() || params.team2.players.is_empty() {
            return Err(CreateMatchError::EmptyRoster);
        }

        let roster_size = params.team_players_count as usize;
        let map = catalog::resolve_map(params.map_id);

        Ok(Self {
            match_id: MatchId::new(),
            map_id: map.id,
            timer: ROUND_TIMER_SECS,
            round: 1,
            mode: params.team_players_count,
            team1: Team::new(
                params.team1.name,
                Side::Ct,
                &params.team1.players,
                roster_size,
                rng,
            ),
            team2: Team::new(
                params.team2.name,
                Side::Tt,
                &params.team2.players,
                roster_size,
                rng,
            ),
            kill_feed: VecDeque::new(),
            current_round_kill_events: Vec::new(),
            rounds_history: Vec::new(),
            finished: false,
        })
    }

    /// Borrow a team by slot.
    pub fn team(&self, slot: TeamSlot) -> &Team {
        match slot {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }

    /// Mutably borrow a team by slot.
    pub fn team_mut(&mut self, slot: TeamSlot) -> &mut Team {
        match slot {
            TeamSlot::Team1 => &mut self.team1,
            TeamSlot::Team2 => &mut self.team2,
        }
    }

    /// Living players on both teams, as `(slot, roster index)` pairs.
    pub fn living_players(&self) -> Vec<(TeamSlot, usize)> {
        let mut living = Vec::with_capacity(self.team1.players.len() + self.team2.players.len());
        for idx in self.team1.living_indices() {
            living.push((TeamSlot::Team1, idx));
        }
        for idx in self.team2.living_indices() {
            living.push((TeamSlot::Team2, idx));
        }
        living
    }

    /// Alive counts as `(team1, team2)`.
    pub fn alive_counts(&self) -> (usize, usize) {
        (self.team1.alive_count(), self.team2.alive_count())
    }

    /// Record a kill on the feed and the current round buffer.
    ///
    /// The feed is a sliding window: once past capacity the oldest entry
    /// is evicted.
    pub fn push_kill(&mut self, event: KillEvent) {
        self.current_round_kill_events.push(event.clone());
        self.kill_feed.push_back(event);
        while self.kill_feed.len() > KILL_FEED_CAPACITY {
            self.kill_feed.pop_front();
        }
    }

    /// Round-reset contract: revive everyone, restart the timer, clear the
    /// round's kill buffer. Invoked on every round resolution.
    pub fn reset_round(&mut self) {
        for p in self
            .team1
            .players
            .iter_mut()
            .chain(self.team2.players.iter_mut())
        {
            p.dead = false;
        }
        self.timer = ROUND_TIMER_SECS;
        self.current_round_kill_events.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn params(roster: &[&str], count: u32) -> CreateMatchParams {
        CreateMatchParams {
            map_id: 1,
            team1: TeamParams {
                name: "Alpha".to_string(),
                players: roster.iter().map(|s| s.to_string()).collect(),
            },
            team2: TeamParams {
                name: "Bravo".to_string(),
                players: roster.iter().map(|s| format!("{s}-b")).collect(),
            },
            team_players_count: count,
        }
    }

    #[test]
    fn test_construction_contract() {
        let mut rng = SimRng::new(1);
        let state = MatchState::new(params(&["a", "b", "c", "d", "e"], 5), &mut rng).unwrap();

        assert_eq!(state.timer, ROUND_TIMER_SECS);
        assert_eq!(state.round, 1);
        assert_eq!(state.mode, 5);
        assert_eq!(state.team1.side, Side::Ct);
        assert_eq!(state.team2.side, Side::Tt);
        assert!(!state.finished);
        assert!(state.kill_feed.is_empty());
        assert!(state.rounds_history.is_empty());

        for p in state.team1.players.iter().chain(state.team2.players.iter()) {
            assert_eq!(p.kills, 0);
            assert_eq!(p.deaths, 0);
            assert_eq!(p.assists, 0);
            assert_eq!(p.headshots, 0);
            assert_eq!(p.money_count, STARTING_MONEY);
            assert!(!p.dead);
            assert!(catalog::weapon(p.weapon_id).is_some());
        }
    }

    #[test]
    fn test_roster_truncated_to_requested_size() {
        let mut rng = SimRng::new(2);
        let state = MatchState::new(params(&["a", "b", "c", "d", "e"], 2), &mut rng).unwrap();

        assert_eq!(state.team1.players.len(), 2);
        assert_eq!(state.team2.players.len(), 2);
        assert_eq!(state.team1.players[0].name, "a");
        assert_eq!(state.team1.players[1].name, "b");
    }

    #[test]
    fn test_short_roster_is_kept_whole() {
        let mut rng = SimRng::new(3);
        let state = MatchState::new(params(&["solo"], 5), &mut rng).unwrap();

        assert_eq!(state.team1.players.len(), 1);
    }

    #[test]
    fn test_unknown_map_id_falls_back() {
        let mut rng = SimRng::new(4);
        let mut p = params(&["a"], 1);
        p.map_id = 999;

        let state = MatchState::new(p, &mut rng).unwrap();
        assert_eq!(state.map_id, catalog::default_map().id);
    }

    #[test]
    fn test_validation_rejects_bad_params() {
        let mut rng = SimRng::new(5);

        let mut p = params(&["a"], 0);
        assert_eq!(
            MatchState::new(p.clone(), &mut rng).unwrap_err(),
            CreateMatchError::ZeroRosterSize
        );

        p.team_players_count = 1;
        p.team1.name = "  ".to_string();
        assert_eq!(
            MatchState::new(p.clone(), &mut rng).unwrap_err(),
            CreateMatchError::EmptyTeamName
        );

        p.team1.name = "Alpha".to_string();
        p.team2.players.clear();
        assert_eq!(
            MatchState::new(p, &mut rng).unwrap_err(),
            CreateMatchError::EmptyRoster
        );
    }

    #[test]
    fn test_kill_feed_bounded_with_oldest_first_eviction() {
        let mut rng = SimRng::new(6);
        let mut state = MatchState::new(params(&["a"], 1), &mut rng).unwrap();

        for i in 0..20i64 {
            let killer = &state.team1.players[0];
            let victim = &state.team2.players[0];
            let event = KillEvent {
                killer_id: killer.id,
                killer_name: killer.name.clone(),
                killer_side: state.team1.side,
                victim_id: victim.id,
                victim_name: victim.name.clone(),
                victim_side: state.team2.side,
                weapon_id: killer.weapon_id,
                timestamp: i,
                headshot: false,
                assist_id: None,
            };
            state.push_kill(event);
        }

        assert_eq!(state.kill_feed.len(), KILL_FEED_CAPACITY);
        // Oldest five (timestamps 0..4) evicted, front is timestamp 5
        assert_eq!(state.kill_feed.front().unwrap().timestamp, 5);
        assert_eq!(state.kill_feed.back().unwrap().timestamp, 19);
        // Round buffer is unbounded within a round
        assert_eq!(state.current_round_kill_events.len(), 20);
    }

    #[test]
    fn test_reset_round_contract() {
        let mut rng = SimRng::new(7);
        let mut state = MatchState::new(params(&["a", "b"], 2), &mut rng).unwrap();

        state.team1.players[0].dead = true;
        state.team2.players[1].dead = true;
        state.timer = 12;
        state.current_round_kill_events.push(KillEvent {
            killer_id: state.team1.players[0].id,
            killer_name: "a".to_string(),
            killer_side: Side::Ct,
            victim_id: state.team2.players[0].id,
            victim_name: "a-b".to_string(),
            victim_side: Side::Tt,
            weapon_id: 1,
            timestamp: 0,
            headshot: false,
            assist_id: None,
        });

        state.reset_round();

        assert!(state
            .team1
            .players
            .iter()
            .chain(state.team2.players.iter())
            .all(|p| !p.dead));
        assert_eq!(state.timer, ROUND_TIMER_SECS);
        assert!(state.current_round_kill_events.is_empty());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let mut rng = SimRng::new(8);
        let state = MatchState::new(params(&["a"], 1), &mut rng).unwrap();
        let json = serde_json::to_string(&state).unwrap();

        assert!(json.contains("\"matchId\""));
        assert!(json.contains("\"killFeed\""));
        assert!(json.contains("\"winRounds\""));
        assert!(json.contains("\"moneyCount\""));
        assert!(json.contains("\"CT\""));
        assert!(json.contains("\"TT\""));
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Ct.opposite(), Side::Tt);
        assert_eq!(Side::Tt.opposite(), Side::Ct);
        assert_eq!(TeamSlot::Team1.opposite(), TeamSlot::Team2);
    }
}

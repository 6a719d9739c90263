//! Candidate discovery for one duo
//!
//! A candidate is a match id that appears in both players' recent histories.
//! Candidates are evaluated against the tracked queue, the event window and
//! team membership; a rejected candidate is remembered so it is never fetched
//! again.

use crate::rank::RankInfo;
use crate::telemetry::{MatchDetails, ParticipantStats};
use crate::types::{DuoId, MatchId, MatchRecord, PlayerGameStats, PlayerRecord, PlayerSlot};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Why a shared match does not count for the duo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRejection {
    WrongQueue { expected: u16, actual: u16 },
    BeforeEventStart,
    MissingParticipant(PlayerSlot),
    OpposingTeams,
}

impl CandidateRejection {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateRejection::WrongQueue { .. } => "wrong_queue",
            CandidateRejection::BeforeEventStart => "before_event_start",
            CandidateRejection::MissingParticipant(_) => "missing_participant",
            CandidateRejection::OpposingTeams => "opposing_teams",
        }
    }
}

impl std::fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateRejection::WrongQueue { expected, actual } => {
                write!(f, "queue {} is not the tracked queue {}", actual, expected)
            }
            CandidateRejection::BeforeEventStart => write!(f, "played before the event started"),
            CandidateRejection::MissingParticipant(slot) => {
                write!(f, "{} is not a participant", slot)
            }
            CandidateRejection::OpposingTeams => write!(f, "players were on opposing teams"),
        }
    }
}

/// Filters every candidate must pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryFilter {
    pub queue_id: u16,
    pub event_start: Option<DateTime<Utc>>,
}

/// Both players' lines in an accepted match
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub details: &'a MatchDetails,
    pub noob: &'a ParticipantStats,
    pub carry: &'a ParticipantStats,
}

/// Ids present in both histories, oldest first.
///
/// Histories arrive newest first, so the noob's list is walked backwards.
pub fn shared_match_ids(noob_ids: &[MatchId], carry_ids: &[MatchId]) -> Vec<MatchId> {
    let carry: HashSet<&MatchId> = carry_ids.iter().collect();
    let mut seen = HashSet::new();

    noob_ids
        .iter()
        .rev()
        .filter(|id| carry.contains(id) && seen.insert(*id))
        .cloned()
        .collect()
}

pub fn evaluate_candidate<'a>(
    details: &'a MatchDetails,
    filter: &DiscoveryFilter,
    noob: &PlayerRecord,
    carry: &PlayerRecord,
) -> Result<Candidate<'a>, CandidateRejection> {
    if details.queue_id != filter.queue_id {
        return Err(CandidateRejection::WrongQueue {
            expected: filter.queue_id,
            actual: details.queue_id,
        });
    }

    if let Some(event_start) = filter.event_start {
        if details.game_creation < event_start {
            return Err(CandidateRejection::BeforeEventStart);
        }
    }

    let noob_line = details
        .participant(&noob.puuid)
        .ok_or(CandidateRejection::MissingParticipant(PlayerSlot::Noob))?;
    let carry_line = details
        .participant(&carry.puuid)
        .ok_or(CandidateRejection::MissingParticipant(PlayerSlot::Carry))?;

    if noob_line.team_id != carry_line.team_id {
        return Err(CandidateRejection::OpposingTeams);
    }

    Ok(Candidate {
        details,
        noob: noob_line,
        carry: carry_line,
    })
}

/// Scoring input for one player; `rank_before` is the rank stored at discovery
pub fn player_game_stats(
    player: &PlayerRecord,
    line: &ParticipantStats,
    rank_after: RankInfo,
) -> PlayerGameStats {
    PlayerGameStats {
        player_id: player.id.clone(),
        champion_name: line.champion_name.clone(),
        kills: line.kills,
        deaths: line.deaths,
        assists: line.assists,
        team_id: line.team_id,
        off_role: player.is_off_role(line.team_position),
        off_champion: player.is_off_champion(&line.champion_name),
        double_kills: Some(line.double_kills),
        triple_kills: Some(line.triple_kills),
        quadra_kills: Some(line.quadra_kills),
        penta_kills: Some(line.penta_kills),
        first_blood: Some(line.first_blood),
        rank_before: player.rank,
        rank_after,
    }
}

/// Build the stored record for an accepted candidate
pub fn match_record(
    duo_id: &DuoId,
    candidate: &Candidate<'_>,
    noob: PlayerGameStats,
    carry: PlayerGameStats,
    discovered_at: DateTime<Utc>,
) -> MatchRecord {
    let line = candidate.noob;

    MatchRecord {
        match_id: candidate.details.match_id.clone(),
        duo_id: duo_id.clone(),
        win: line.win,
        remake: line.early_surrender,
        surrender: line.surrender && !line.win,
        duration_secs: candidate.details.duration_secs,
        game_creation: candidate.details.game_creation,
        noob,
        carry,
        scored: false,
        points_awarded: 0,
        discovered_at,
    }
}

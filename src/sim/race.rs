//! Race level rotation
//!
//! Maps rotate in ring order. Reaching the target scores a point and starts
//! a transition: old scores, new scores, then the next map. Wrapping back to
//! map 0 first declares a winner and clears the scores.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::TileGrid;
use crate::consts::{SCORE_FLASH_TICKS, WINNER_BANNER_TICKS};

/// Per-player score; `previous` is what the old-score flash shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub active: u32,
    pub previous: u32,
}

/// Where the level rotation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Playing,
    /// Old scores on screen
    ShowingOldScore { ticks_left: u32 },
    /// New scores on screen
    ShowingNewScore { ticks_left: u32 },
    /// Winner banner after a full rotation (`None` = tie)
    ShowingWinner { ticks_left: u32, winner: Option<usize> },
}

/// What the caller has to act on after `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEvent {
    Idle,
    NewScoreShown,
    WinnerDeclared(Option<usize>),
    /// Switch to this map, respawn players and reset the camera
    LoadMap(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStateMachine {
    map_index: usize,
    map_count: usize,
    phase: RacePhase,
    scores: Vec<Score>,
}

impl LevelStateMachine {
    pub fn new(players: usize, map_count: usize) -> Self {
        Self {
            map_index: 0,
            map_count: map_count.max(1),
            phase: RacePhase::Playing,
            scores: vec![Score::default(); players],
        }
    }

    #[inline]
    pub fn map_index(&self) -> usize {
        self.map_index
    }

    #[inline]
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    #[inline]
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    /// A transition is under way; bodies are frozen
    pub fn pending_transition(&self) -> bool {
        self.phase != RacePhase::Playing
    }

    /// Score as currently displayed (old value during the first flash)
    pub fn displayed_score(&self, player: usize) -> u32 {
        let score = self.scores.get(player).copied().unwrap_or_default();
        match self.phase {
            RacePhase::ShowingOldScore { .. } => score.previous,
            _ => score.active,
        }
    }

    /// Player `player` touched the target. Ignored while a transition runs.
    pub fn on_target_reached(&mut self, player: usize) -> bool {
        if self.pending_transition() || player >= self.scores.len() {
            return false;
        }

        for (id, score) in self.scores.iter_mut().enumerate() {
            score.previous = score.active;
            if id == player {
                score.active += 1;
            }
        }

        log::info!(
            "Player {} reached the target on map {} (scores {:?})",
            player + 1,
            self.map_index,
            self.scores.iter().map(|s| s.active).collect::<Vec<_>>()
        );
        self.phase = RacePhase::ShowingOldScore {
            ticks_left: SCORE_FLASH_TICKS,
        };
        true
    }

    /// Highest active score; `None` on a tie or with no players
    pub fn winner(&self) -> Option<usize> {
        let best = self.scores.iter().map(|s| s.active).max()?;
        let mut leaders = self.scores.iter().enumerate().filter(|(_, s)| s.active == best);
        let (id, _) = leaders.next()?;
        if leaders.next().is_some() {
            return None;
        }
        Some(id)
    }

    /// Advance the transition by one tick
    pub fn update(&mut self) -> LevelEvent {
        match self.phase {
            RacePhase::Playing => LevelEvent::Idle,

            RacePhase::ShowingOldScore { ticks_left } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left > 0 {
                    self.phase = RacePhase::ShowingOldScore { ticks_left };
                    return LevelEvent::Idle;
                }
                self.phase = RacePhase::ShowingNewScore {
                    ticks_left: SCORE_FLASH_TICKS,
                };
                LevelEvent::NewScoreShown
            }

            RacePhase::ShowingNewScore { ticks_left } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left > 0 {
                    self.phase = RacePhase::ShowingNewScore { ticks_left };
                    return LevelEvent::Idle;
                }

                self.map_index = (self.map_index + 1) % self.map_count;
                if self.map_index != 0 {
                    self.phase = RacePhase::Playing;
                    return LevelEvent::LoadMap(self.map_index);
                }

                let winner = self.winner();
                match winner {
                    Some(id) => log::info!("Player {} wins the round", id + 1),
                    None => log::info!("Round ends in a tie"),
                }
                self.phase = RacePhase::ShowingWinner {
                    ticks_left: WINNER_BANNER_TICKS,
                    winner,
                };
                LevelEvent::WinnerDeclared(winner)
            }

            RacePhase::ShowingWinner { ticks_left, winner } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left > 0 {
                    self.phase = RacePhase::ShowingWinner { ticks_left, winner };
                    return LevelEvent::Idle;
                }
                self.scores.fill(Score::default());
                self.phase = RacePhase::Playing;
                LevelEvent::LoadMap(0)
            }
        }
    }
}

/// Pick a spawn cell and mark it taken.
///
/// Samples a small region anchored at (1, 1), `3..=5` rows by `3..=5`
/// columns, and takes the first free cell scanning from the far corner
/// back. Falls back to scanning the whole grid the same way.
pub fn pick_spawn_cell(available: &mut [Vec<bool>], rng: &mut impl Rng) -> Option<(usize, usize)> {
    let rows = rng.random_range(3..=5usize);
    let cols = rng.random_range(3..=5usize);

    let found = scan_descending(available, 1..=rows, 1..=cols).or_else(|| {
        let height = available.len();
        let width = available.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return None;
        }
        scan_descending(available, 0..=height - 1, 0..=width - 1)
    });

    if let Some((row, col)) = found {
        available[row][col] = false;
    }
    found
}

fn scan_descending(
    available: &[Vec<bool>],
    rows: std::ops::RangeInclusive<usize>,
    cols: std::ops::RangeInclusive<usize>,
) -> Option<(usize, usize)> {
    for row in rows.rev() {
        for col in cols.clone().rev() {
            if available.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false) {
                return Some((row, col));
            }
        }
    }
    None
}

/// Top-left corner of a player spawned in a cell
pub fn spawn_corner(grid: &TileGrid, row: usize, col: usize) -> Vec2 {
    grid.cell_rect(row, col).min + Vec2::splat(0.25 * grid.tile_size())
}

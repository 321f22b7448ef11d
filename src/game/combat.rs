//! Combat resolution for a landing move.
//!
//! Resolution always reads the destination cell as it is at landing time;
//! other moves and ticks may have changed it since the move was submitted.

use std::cmp::Ordering;

use serde::Serialize;

use super::board::{Board, Coord, Team};

/// What happened when a move landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombatOutcome {
    /// Unclaimed cell taken.
    Claimed,
    /// Troops added to a cell the attacker already held.
    Reinforced,
    /// Enemy cell taken. `cascaded` counts the other cells handed over when
    /// the defeated team lost its own home corner.
    Captured {
        /// Team that lost the cell.
        defeated: Team,
        /// Additional cells reassigned by the cascade.
        cascaded: usize,
    },
    /// Attack too weak; defender keeps the cell with fewer troops.
    Repelled {
        /// Team that held the cell.
        defender: Team,
    },
    /// Equal forces; the cell becomes unclaimed and empty.
    Neutralized {
        /// Team that held the cell.
        defender: Team,
    },
}

impl CombatOutcome {
    /// Stable label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Claimed => "claimed",
            Self::Reinforced => "reinforced",
            Self::Captured { .. } => "captured",
            Self::Repelled { .. } => "repelled",
            Self::Neutralized { .. } => "neutralized",
        }
    }
}

/// Lands `troops` of `attacker` on `target`.
///
/// Returns `None` when `target` is off the board.
pub fn resolve(board: &mut Board, target: Coord, attacker: Team, troops: u32) -> Option<CombatOutcome> {
    let cell = board.get_mut(target)?;
    let current = cell.owner;

    let outcome = match current {
        None => {
            cell.owner = Some(attacker);
            cell.troops = troops;
            cell.activate_spawn();
            CombatOutcome::Claimed
        }
        Some(owner) if owner == attacker => {
            cell.troops = cell.troops.saturating_add(troops);
            CombatOutcome::Reinforced
        }
        Some(defender) => match troops.cmp(&cell.troops) {
            Ordering::Greater => {
                cell.troops = troops - cell.troops;
                cell.owner = Some(attacker);
                cell.activate_spawn();
                // Only taking a team's own, still-held home corner eliminates
                // it. A corner that already changed hands does not cascade.
                let eliminates = cell.is_corner && cell.original_team == Some(defender);
                let cascaded = if eliminates {
                    cascade(board, defender, attacker)
                } else {
                    0
                };
                CombatOutcome::Captured {
                    defeated: defender,
                    cascaded,
                }
            }
            Ordering::Less => {
                cell.troops -= troops;
                CombatOutcome::Repelled { defender }
            }
            Ordering::Equal => {
                cell.owner = None;
                cell.troops = 0;
                CombatOutcome::Neutralized { defender }
            }
        },
    };

    Some(outcome)
}

/// Hands every cell of `defeated` to `victor`, activating spawns.
fn cascade(board: &mut Board, defeated: Team, victor: Team) -> usize {
    let mut reassigned = 0;
    for cell in board.cells_mut().filter(|c| c.owner == Some(defeated)) {
        cell.owner = Some(victor);
        cell.activate_spawn();
        reassigned += 1;
    }
    reassigned
}

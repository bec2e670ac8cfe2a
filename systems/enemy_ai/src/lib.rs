#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic enemy system that chases the human agent one move per turn.

use grid_duel_core::{AgentView, CellCoord, Command, Direction, Event, Grid, Side, Turn};
use grid_duel_world::find_path;

/// Chooses the cell the computer agent should walk toward.
///
/// Candidates are the four neighbours of `human` in [`Direction::ALL`] order.
/// Cells off the grid, obstacles and the human's own cell are skipped. The
/// candidate closest to `enemy` wins and the first enumerated candidate wins
/// ties. When no candidate survives `human` itself is returned, which the
/// pathfinder then refuses as the excluded cell.
#[must_use]
pub fn select_target(enemy: CellCoord, human: CellCoord, grid: &Grid) -> CellCoord {
    let mut best = human;
    let mut best_distance = u64::MAX;

    for direction in Direction::ALL {
        let Some(candidate) = human.step(direction, grid.size()) else {
            continue;
        };
        if candidate == human || grid.is_blocked(candidate) {
            continue;
        }

        let distance = enemy.squared_distance(candidate);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }

    best
}

/// Pure system that plans one computer move each time control passes to the
/// computer.
#[derive(Debug, Clone, Default)]
pub struct EnemyAi {
    turn: Turn,
    pending: bool,
    declined: bool,
}

impl EnemyAi {
    /// Creates a new enemy system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turn: Turn::Human,
            pending: false,
            declined: false,
        }
    }

    /// Indicates whether a move is still owed for the current computer turn.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes world events and the agent view to emit computer commands.
    ///
    /// While a move is owed a route toward [`select_target`] is requested.
    /// When no route exists the computer keeps the turn and plans again on the
    /// next call. A rejected route is retried on the call after the rejection.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        let mut rejected = false;
        for event in events {
            match event {
                Event::TurnChanged { turn } => {
                    self.turn = *turn;
                    self.pending = *turn == Turn::Computer;
                    self.declined = false;
                }
                Event::RouteRejected {
                    side: Side::Computer,
                    reason,
                } => {
                    log::warn!("computer route rejected: {reason:?}");
                    self.pending = self.turn == Turn::Computer;
                    rejected = true;
                }
                _ => {}
            }
        }

        if rejected || self.turn != Turn::Computer || !self.pending {
            return;
        }

        let (Some(enemy), Some(human)) = (agents.get(Side::Computer), agents.get(Side::Human))
        else {
            return;
        };
        if enemy.moving {
            return;
        }
        let (Some(enemy_cell), Some(human_cell)) = (enemy.cell, human.cell) else {
            return;
        };

        let target = select_target(enemy_cell, human_cell, grid);
        let route = find_path(
            enemy.position,
            grid.world_position(target),
            grid,
            human_cell,
        );
        if route.is_empty() {
            if !self.declined {
                log::info!("computer has no route toward {target}; holding the turn");
                self.declined = true;
            }
            return;
        }

        log::debug!("computer targets {target} next to human at {human_cell}");
        self.pending = false;
        out.push(Command::AssignRoute {
            side: Side::Computer,
            route,
        });
    }
}

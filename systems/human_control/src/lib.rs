#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system translating the player's chosen target point into route commands.

use glam::Vec3;
use grid_duel_core::{AgentView, Command, Event, Grid, Side, Turn};
use grid_duel_world::find_path;

/// Input snapshot distilled from adapter-provided pointer data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HumanInput {
    /// World-space point the player selected on this frame, if any.
    pub target: Option<Vec3>,
}

impl HumanInput {
    /// Creates an input descriptor selecting `target`.
    #[must_use]
    pub const fn select(target: Vec3) -> Self {
        Self {
            target: Some(target),
        }
    }
}

/// Human-control system that plans a route toward the selected point while the
/// human holds the turn.
#[derive(Debug, Clone, Default)]
pub struct HumanControl {
    turn: Turn,
}

impl HumanControl {
    /// Creates a new human-control system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { turn: Turn::Human }
    }

    /// Turn the system last observed.
    #[must_use]
    pub const fn turn(&self) -> Turn {
        self.turn
    }

    /// Consumes world events and the frame's input to emit route commands.
    ///
    /// Selections made outside the human's turn, while the human agent is
    /// still walking, or that lead nowhere are dropped without a command.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: HumanInput,
        agents: &AgentView,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::TurnChanged { turn } = event {
                self.turn = *turn;
            }
        }

        if self.turn != Turn::Human {
            return;
        }

        let Some(target) = input.target else {
            return;
        };
        let Some(human) = agents.get(Side::Human) else {
            return;
        };
        if human.moving {
            log::debug!("ignoring selection while the human agent is moving");
            return;
        }

        // Without an opponent on the board the agent's own cell is a harmless
        // exclusion: it is the search origin and never revisited.
        let Some(excluded) = agents
            .get(Side::Computer)
            .and_then(|computer| computer.cell)
            .or(human.cell)
        else {
            return;
        };

        let route = find_path(human.position, target, grid, excluded);
        if route.is_empty() {
            log::info!("no valid path found to {target}");
            return;
        }

        out.push(Command::AssignRoute {
            side: Side::Human,
            route,
        });
    }
}

//! Fixed-timestep driver that pumps commands and events between the world and
//! both control systems.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use glam::Vec3;
use grid_duel_core::{CellCoord, Command, Event, Side, Turn};
use grid_duel_rendering::{
    Color, Presentation, RenderingBackend, Scene, TileGridPresentation, TileInfo,
};
use grid_duel_system_enemy_ai::EnemyAi;
use grid_duel_system_human_control::{HumanControl, HumanInput};
use grid_duel_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::scenario::Scenario;

/// Unreachable selections in one turn after which the simulated player warns.
const SELECTION_WARNING_THRESHOLD: u32 = 16;

/// Fraction of the tile spacing by which simulated clicks stray from a tile centre.
const POINTER_JITTER: f32 = 0.4;

const TILE_COLOR: Color = Color::from_rgb_u8(200, 200, 200);
const CLEAR_COLOR: Color = Color::from_rgb_u8(24, 24, 24);

/// Deterministic stand-in for the player's pointer.
#[derive(Debug)]
pub(crate) struct SimulatedPointer {
    rng: ChaCha8Rng,
}

impl SimulatedPointer {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Picks a point over a random tile of the layout.
    pub(crate) fn next_click(&mut self, tiles: &TileGridPresentation) -> Vec3 {
        let cell = CellCoord::new(
            self.rng.gen_range(0..tiles.size),
            self.rng.gen_range(0..tiles.size),
        );
        let reach = tiles.spacing * POINTER_JITTER;
        let jitter = Vec3::new(
            self.rng.gen_range(-reach..=reach),
            0.0,
            self.rng.gen_range(-reach..=reach),
        );
        tiles.tile_position(cell) + jitter
    }
}

/// Outcome of a finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionSummary {
    pub(crate) ticks: u64,
    pub(crate) completed_turns: u64,
    pub(crate) moves: u32,
    pub(crate) human: Option<CellCoord>,
    pub(crate) computer: Option<CellCoord>,
}

/// Owns the world, both control systems and the simulated pointer.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    human: HumanControl,
    enemy: EnemyAi,
    pointer: SimulatedPointer,
    tiles: TileGridPresentation,
    dt: Duration,
    selection_attempts: u32,
    moves: u32,
    hovered: Option<TileInfo>,
}

impl Simulation {
    /// Builds the world for `scenario` and places both agents.
    pub(crate) fn new(scenario: &Scenario, seed: u64, dt: Duration) -> Result<Self> {
        if dt.is_zero() {
            bail!("tick duration must be positive");
        }

        let mut world =
            World::new(scenario.world_config()).context("invalid world configuration")?;
        for side in [Side::Human, Side::Computer] {
            let cell = scenario.agent(side).spawn;
            let mut events = Vec::new();
            world::apply(&mut world, Command::SpawnAgent { side, cell }, &mut events);
            if let Some(Event::SpawnRejected { reason, .. }) = events
                .iter()
                .find(|event| matches!(event, Event::SpawnRejected { .. }))
            {
                bail!("could not spawn {side:?} agent at {cell}: {reason:?}");
            }
            log::info!("{side:?} agent spawned at row {}, column {}", cell.x(), cell.z());
        }

        let tiles = TileGridPresentation::new(
            scenario.grid().size(),
            TileGridPresentation::DEFAULT_SPACING,
            TILE_COLOR,
        )
        .context("invalid tile layout")?;

        Ok(Self {
            world,
            human: HumanControl::new(),
            enemy: EnemyAi::new(),
            pointer: SimulatedPointer::new(seed),
            tiles,
            dt,
            selection_attempts: 0,
            moves: 0,
            hovered: None,
        })
    }

    /// Plays until `turns` turns completed or `max_ticks` ticks elapsed.
    ///
    /// A frame is presented whenever control changes hands, plus once at
    /// the start and once at the end.
    pub(crate) fn run(
        &mut self,
        turns: u64,
        max_ticks: u64,
        mut backend: Option<&mut dyn RenderingBackend>,
    ) -> Result<SessionSummary> {
        if let Some(backend) = backend.as_deref_mut() {
            backend.present(&self.presentation())?;
        }

        let mut ticks = 0;
        while query::completed_turns(&self.world) < turns {
            if ticks >= max_ticks {
                log::warn!("stopping after {ticks} ticks with {turns} turns requested");
                break;
            }

            let events = self.frame();
            ticks += 1;

            for event in &events {
                match event {
                    Event::TurnChanged { turn } => {
                        log::info!(
                            "turn {}: {:?} to move",
                            query::completed_turns(&self.world) + 1,
                            turn.side()
                        );
                        self.selection_attempts = 0;
                    }
                    Event::MoveCompleted { side } => {
                        log::debug!("{side:?} finished moving");
                        self.moves += 1;
                    }
                    _ => {}
                }
            }

            let turn_changed = events
                .iter()
                .any(|event| matches!(event, Event::TurnChanged { .. }));
            if turn_changed {
                if let Some(backend) = backend.as_deref_mut() {
                    backend.present(&self.presentation())?;
                }
            }
        }

        if let Some(backend) = backend {
            backend.present(&self.presentation())?;
        }

        let cell_of = |side| query::agent(&self.world, side).and_then(|snapshot| snapshot.cell);
        Ok(SessionSummary {
            ticks,
            completed_turns: query::completed_turns(&self.world),
            moves: self.moves,
            human: cell_of(Side::Human),
            computer: cell_of(Side::Computer),
        })
    }

    /// Runs a single frame: player input, then one tick of simulated time.
    fn frame(&mut self) -> Vec<Event> {
        let mut recorded = Vec::new();
        let mut input = HumanInput::default();

        if self.awaiting_human_selection() {
            let pointer = self.pointer.next_click(&self.tiles);
            self.hovered = self.tiles.tile_at(pointer);
            self.selection_attempts += 1;
            if self.selection_attempts == SELECTION_WARNING_THRESHOLD {
                log::warn!(
                    "no reachable selection after {} attempts; the human keeps the turn",
                    self.selection_attempts
                );
            }
            input = HumanInput::select(self.tiles.to_board(pointer));
        }
        self.pump(input, Vec::new(), &mut recorded);

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt: self.dt }, &mut events);
        recorded.extend(events.iter().cloned());
        self.pump(HumanInput::default(), events, &mut recorded);

        recorded
    }

    fn awaiting_human_selection(&self) -> bool {
        query::turn(&self.world) == Turn::Human
            && query::agent(&self.world, Side::Human).is_some_and(|human| !human.moving)
    }

    fn pump(
        &mut self,
        input: HumanInput,
        pending_events: Vec<Event>,
        recorded: &mut Vec<Event>,
    ) {
        let mut events = pending_events;
        let mut input = input;

        loop {
            let view = query::agent_view(&self.world);
            let mut commands = Vec::new();
            self.human.handle(
                &events,
                input,
                &view,
                query::grid(&self.world),
                &mut commands,
            );
            self.enemy
                .handle(&events, &view, query::grid(&self.world), &mut commands);
            input = HumanInput::default();

            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                let mut generated_events = Vec::new();
                world::apply(&mut self.world, command, &mut generated_events);
                recorded.extend(generated_events.iter().cloned());
                events.extend(generated_events);
            }
        }
    }

    /// Scene describing the current state of the session.
    pub(crate) fn scene(&self) -> Scene {
        Scene::capture(
            self.tiles,
            query::grid(&self.world),
            &query::agent_view(&self.world),
            query::turn(&self.world),
        )
        .with_hovered_tile(self.hovered)
    }

    fn presentation(&self) -> Presentation {
        let title = format!(
            "Grid Duel | turn {} | tick {}",
            query::completed_turns(&self.world) + 1,
            query::tick_index(&self.world)
        );
        Presentation::new(title, CLEAR_COLOR, self.scene())
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Duel.

mod agent;
mod navigation;
mod turn;

use std::time::Duration;

use grid_duel_core::{
    CellCoord, Command, ConfigurationError, Event, Grid, Route, RouteError, Side, SpawnError,
    DEFAULT_AGENT_SPEED,
};

pub use agent::{AgentState, MoveProgress};
pub use navigation::{find_cell_path, find_path};
pub use turn::TurnController;

/// Construction parameters for a [`World`]. Fixed for the whole session.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    grid: Grid,
    human_speed: f32,
    computer_speed: f32,
}

impl WorldConfig {
    /// Creates a configuration using the default speed for both agents.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            human_speed: DEFAULT_AGENT_SPEED,
            computer_speed: DEFAULT_AGENT_SPEED,
        }
    }

    /// Overrides the movement speed of one agent.
    #[must_use]
    pub fn with_speed(mut self, side: Side, speed: f32) -> Self {
        match side {
            Side::Human => self.human_speed = speed,
            Side::Computer => self.computer_speed = speed,
        }
        self
    }

    /// Board the session is played on.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Movement speed configured for `side`.
    #[must_use]
    pub const fn speed(&self, side: Side) -> f32 {
        match side {
            Side::Human => self.human_speed,
            Side::Computer => self.computer_speed,
        }
    }
}

/// Represents the authoritative Grid Duel world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    turn: TurnController,
    human: Agent,
    computer: Agent,
    tick_index: u64,
}

impl World {
    /// Creates a new world without any agents on the board.
    ///
    /// Fails when either configured speed is not finite and positive.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigurationError> {
        for side in [Side::Human, Side::Computer] {
            let speed = config.speed(side);
            if !speed.is_finite() || speed <= 0.0 {
                return Err(ConfigurationError::InvalidSpeed { side, speed });
            }
        }

        Ok(Self {
            human: Agent::unspawned(config.human_speed),
            computer: Agent::unspawned(config.computer_speed),
            grid: config.grid,
            turn: TurnController::new(),
            tick_index: 0,
        })
    }

    fn agent(&self, side: Side) -> &Agent {
        match side {
            Side::Human => &self.human,
            Side::Computer => &self.computer,
        }
    }

    fn agent_mut(&mut self, side: Side) -> &mut Agent {
        match side {
            Side::Human => &mut self.human,
            Side::Computer => &mut self.computer,
        }
    }

    fn occupied_cell(&self, side: Side) -> Option<CellCoord> {
        self.agent(side)
            .state
            .as_ref()
            .and_then(|state| self.grid.cell_at(state.position()))
    }

    fn spawn(&mut self, side: Side, cell: CellCoord, out_events: &mut Vec<Event>) {
        let rejection = if self.agent(side).state.is_some() {
            Some(SpawnError::AlreadySpawned)
        } else if !self.grid.contains(cell) {
            Some(SpawnError::OutOfBounds)
        } else if self.grid.is_blocked(cell) {
            Some(SpawnError::Obstacle)
        } else if self.occupied_cell(side.opponent()) == Some(cell) {
            Some(SpawnError::Occupied)
        } else {
            None
        };

        if let Some(reason) = rejection {
            log::warn!("refused to spawn {side:?} agent at {cell}: {reason:?}");
            out_events.push(Event::SpawnRejected { side, cell, reason });
            return;
        }

        let position = self.grid.world_position(cell);
        self.agent_mut(side).state = Some(AgentState::new(position));
        log::debug!("spawned {side:?} agent at {cell}");
        out_events.push(Event::AgentSpawned { side, cell });
    }

    fn assign_route(&mut self, side: Side, route: Route, out_events: &mut Vec<Event>) {
        let permitted = self.turn.permits(side);
        let agent = self.agent_mut(side);
        let outcome = match agent.state.as_mut() {
            None => Err(RouteError::AgentMissing),
            Some(_) if !permitted => Err(RouteError::NotYourTurn),
            Some(state) if state.is_moving() => Err(RouteError::AgentBusy),
            Some(_) if route.is_empty() => Err(RouteError::EmptyRoute),
            Some(state) => {
                let waypoints = route.len();
                state.follow(route);
                Ok(waypoints)
            }
        };

        match outcome {
            Ok(waypoints) => {
                log::debug!("{side:?} agent following {waypoints} waypoints");
                out_events.push(Event::RouteAssigned { side, waypoints });
            }
            Err(reason) => {
                log::warn!("refused route for {side:?} agent: {reason:?}");
                out_events.push(Event::RouteRejected { side, reason });
            }
        }
    }

    fn cancel_route(&mut self, side: Side, out_events: &mut Vec<Event>) {
        let grid = &self.grid;
        let agent = match side {
            Side::Human => &mut self.human,
            Side::Computer => &mut self.computer,
        };
        let Some(state) = agent.state.as_mut() else {
            return;
        };
        if !state.is_moving() {
            return;
        }

        let position = state.position();
        let rest = grid
            .cell_at(position)
            .map_or(position, |cell| grid.world_position(cell));
        state.cancel(rest);
        log::debug!("{side:?} agent stopped at {rest}");
        out_events.push(Event::RouteCancelled { side });
    }

    fn advance_active_agent(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let side = self.turn.current().side();
        let grid = &self.grid;
        let agent = match side {
            Side::Human => &mut self.human,
            Side::Computer => &mut self.computer,
        };
        let Some(state) = agent.state.as_mut() else {
            return;
        };

        let waypoint = state.next_waypoint();
        let progress = state.advance(agent.speed, dt);
        if state.next_waypoint() != waypoint {
            if let Some(cell) = waypoint.and_then(|point| grid.cell_at(point)) {
                out_events.push(Event::WaypointReached { side, cell });
            }
        }

        if progress == MoveProgress::Completed {
            out_events.push(Event::MoveCompleted { side });
        }
        if let Some(turn) = self.turn.observe(progress) {
            out_events.push(Event::TurnChanged { turn });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnAgent { side, cell } => world.spawn(side, cell, out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_active_agent(dt, out_events);
        }
        Command::AssignRoute { side, route } => world.assign_route(side, route, out_events),
        Command::CancelRoute { side } => world.cancel_route(side, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use grid_duel_core::{AgentSnapshot, AgentView, Grid, Side, Turn};

    use super::World;

    /// Provides read-only access to the board.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Turn currently in effect.
    #[must_use]
    pub fn turn(world: &World) -> Turn {
        world.turn.current()
    }

    /// Number of times control changed hands since the session started.
    #[must_use]
    pub fn completed_turns(world: &World) -> u64 {
        world.turn.completed_turns()
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a snapshot of a single agent, if spawned.
    #[must_use]
    pub fn agent(world: &World, side: Side) -> Option<AgentSnapshot> {
        let state = world.agent(side).state.as_ref()?;
        let position = state.position();
        Some(AgentSnapshot {
            side,
            position,
            cell: world.grid.cell_at(position),
            moving: state.is_moving(),
            remaining_waypoints: state.remaining_waypoints(),
        })
    }

    /// Captures a read-only view of both agents.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::new(agent(world, Side::Human), agent(world, Side::Computer))
    }
}

#[derive(Clone, Debug)]
struct Agent {
    speed: f32,
    state: Option<AgentState>,
}

impl Agent {
    fn unspawned(speed: f32) -> Self {
        Self { speed, state: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use grid_duel_core::{Turn, DEFAULT_ELEVATION};

    fn world_with(grid: Grid) -> World {
        World::new(WorldConfig::new(grid)).expect("valid configuration")
    }

    fn spawned_world() -> World {
        let mut world = world_with(Grid::open(10, DEFAULT_ELEVATION).expect("valid grid"));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnAgent {
                side: Side::Human,
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnAgent {
                side: Side::Computer,
                cell: CellCoord::new(9, 9),
            },
            &mut events,
        );
        world
    }

    fn route_to(world: &World, side: Side, goal: CellCoord) -> Route {
        let start = query::agent(world, side).expect("spawned").position;
        let excluded = query::agent(world, side.opponent())
            .and_then(|snapshot| snapshot.cell)
            .expect("opponent spawned");
        find_path(start, query::grid(world).world_position(goal), query::grid(world), excluded)
    }

    fn tick_until_idle(world: &mut World, events: &mut Vec<Event>) {
        for _ in 0..1_000 {
            apply(
                world,
                Command::Tick {
                    dt: Duration::from_millis(50),
                },
                events,
            );
            if events
                .iter()
                .any(|event| matches!(event, Event::MoveCompleted { .. }))
            {
                return;
            }
        }
        panic!("agent never finished moving");
    }

    #[test]
    fn world_rejects_non_positive_speed() {
        let config = WorldConfig::new(Grid::open(10, DEFAULT_ELEVATION).expect("valid grid"))
            .with_speed(Side::Computer, 0.0);

        let error = World::new(config).expect_err("zero speed must be rejected");

        assert_eq!(
            error,
            ConfigurationError::InvalidSpeed {
                side: Side::Computer,
                speed: 0.0,
            }
        );
    }

    #[test]
    fn spawn_validates_target_cell() {
        let grid = Grid::with_obstacles(10, DEFAULT_ELEVATION, [CellCoord::new(3, 3)])
            .expect("valid grid");
        let mut world = world_with(grid);
        let mut events = Vec::new();

        for (side, cell) in [
            (Side::Human, CellCoord::new(10, 0)),
            (Side::Human, CellCoord::new(3, 3)),
            (Side::Human, CellCoord::new(1, 1)),
            (Side::Human, CellCoord::new(2, 2)),
            (Side::Computer, CellCoord::new(1, 1)),
        ] {
            apply(&mut world, Command::SpawnAgent { side, cell }, &mut events);
        }

        assert_eq!(
            events,
            vec![
                Event::SpawnRejected {
                    side: Side::Human,
                    cell: CellCoord::new(10, 0),
                    reason: SpawnError::OutOfBounds,
                },
                Event::SpawnRejected {
                    side: Side::Human,
                    cell: CellCoord::new(3, 3),
                    reason: SpawnError::Obstacle,
                },
                Event::AgentSpawned {
                    side: Side::Human,
                    cell: CellCoord::new(1, 1),
                },
                Event::SpawnRejected {
                    side: Side::Human,
                    cell: CellCoord::new(2, 2),
                    reason: SpawnError::AlreadySpawned,
                },
                Event::SpawnRejected {
                    side: Side::Computer,
                    cell: CellCoord::new(1, 1),
                    reason: SpawnError::Occupied,
                },
            ]
        );
    }

    #[test]
    fn spawned_agent_sits_on_cell_centre() {
        let world = spawned_world();
        let human = query::agent(&world, Side::Human).expect("spawned");

        assert_eq!(human.position, Vec3::new(0.0, DEFAULT_ELEVATION, 0.0));
        assert_eq!(human.cell, Some(CellCoord::new(0, 0)));
        assert!(!human.moving);
    }

    #[test]
    fn out_of_turn_route_is_rejected() {
        let mut world = spawned_world();
        let route = route_to(&world, Side::Computer, CellCoord::new(8, 9));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Computer,
                route,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::RouteRejected {
                side: Side::Computer,
                reason: RouteError::NotYourTurn,
            }]
        );
    }

    #[test]
    fn empty_route_is_rejected_without_toggling() {
        let mut world = spawned_world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route: Route::empty(),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::RouteRejected {
                side: Side::Human,
                reason: RouteError::EmptyRoute,
            }]
        );
        assert_eq!(query::turn(&world), Turn::Human);
    }

    #[test]
    fn completed_move_toggles_turn_once() {
        let mut world = spawned_world();
        let route = route_to(&world, Side::Human, CellCoord::new(2, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::RouteAssigned {
                side: Side::Human,
                waypoints: 3,
            }]
        );

        events.clear();
        tick_until_idle(&mut world, &mut events);

        let toggles = events
            .iter()
            .filter(|event| matches!(event, Event::TurnChanged { .. }))
            .count();
        assert_eq!(toggles, 1);
        assert_eq!(query::turn(&world), Turn::Computer);
        assert_eq!(
            query::agent(&world, Side::Human).and_then(|snapshot| snapshot.cell),
            Some(CellCoord::new(2, 1))
        );
        let reached: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::WaypointReached { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect();
        assert_eq!(reached.len(), 3);
        assert_eq!(reached.last(), Some(&CellCoord::new(2, 1)));
    }

    #[test]
    fn ticks_only_move_the_active_agent() {
        let mut world = spawned_world();
        let route = route_to(&world, Side::Human, CellCoord::new(0, 3));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route,
            },
            &mut events,
        );
        let computer_before = query::agent(&world, Side::Computer).expect("spawned");

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );

        let human = query::agent(&world, Side::Human).expect("spawned");
        assert!(human.moving);
        assert!(human.position.z > 0.0);
        assert_eq!(
            query::agent(&world, Side::Computer).expect("spawned"),
            computer_before
        );
    }

    #[test]
    fn busy_agent_refuses_new_route_until_cancelled() {
        let mut world = spawned_world();
        let first = route_to(&world, Side::Human, CellCoord::new(0, 3));
        let second = route_to(&world, Side::Human, CellCoord::new(3, 0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route: first,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route: second.clone(),
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::RouteRejected {
                side: Side::Human,
                reason: RouteError::AgentBusy,
            })
        );

        events.clear();
        apply(&mut world, Command::CancelRoute { side: Side::Human }, &mut events);
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route: second,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::RouteCancelled { side: Side::Human },
                Event::RouteAssigned {
                    side: Side::Human,
                    waypoints: 3,
                },
            ]
        );
        assert_eq!(query::turn(&world), Turn::Human);
    }

    #[test]
    fn cancelled_agent_returns_to_cell_centre() {
        let mut world = spawned_world();
        let route = route_to(&world, Side::Human, CellCoord::new(0, 3));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route,
            },
            &mut events,
        );
        // 2.0 units/s for 0.35 s leaves the agent at z = 0.7, nearest (0, 1).
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(350),
            },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::CancelRoute { side: Side::Human }, &mut events);

        let human = query::agent(&world, Side::Human).expect("spawned");
        assert_eq!(events, vec![Event::RouteCancelled { side: Side::Human }]);
        assert_eq!(human.position, world.grid.world_position(CellCoord::new(0, 1)));
        assert_eq!(human.cell, Some(CellCoord::new(0, 1)));
        assert!(!human.moving);
        assert_eq!(query::turn(&world), Turn::Human);
        assert_eq!(query::completed_turns(&world), 0);
    }

    #[test]
    fn route_for_missing_agent_is_rejected() {
        let mut world = world_with(Grid::open(4, DEFAULT_ELEVATION).expect("valid grid"));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AssignRoute {
                side: Side::Human,
                route: Route::new(vec![Vec3::new(1.0, DEFAULT_ELEVATION, 0.0)]),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::RouteRejected {
                side: Side::Human,
                reason: RouteError::AgentMissing,
            }]
        );
    }
}

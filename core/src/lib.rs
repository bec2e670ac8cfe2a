#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Duel engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cells along each edge of the default board.
pub const DEFAULT_GRID_SIZE: u32 = 10;

/// Height at which route waypoints and agents sit above the board.
pub const DEFAULT_ELEVATION: f32 = 0.5;

/// Default movement speed of both agents in world units per second.
pub const DEFAULT_AGENT_SPEED: f32 = 2.0;

/// Identifies one of the two opposing agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Agent steered by the player.
    Human,
    /// Agent steered by the enemy AI.
    Computer,
}

impl Side {
    /// Returns the side facing this one.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Human => Self::Computer,
            Self::Computer => Self::Human,
        }
    }
}

/// Describes whose turn it currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// The human agent may request and perform a move.
    #[default]
    Human,
    /// The computer agent may request and perform a move.
    Computer,
}

impl Turn {
    /// Side permitted to act during this turn.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Human => Side::Human,
            Self::Computer => Side::Computer,
        }
    }

    /// Turn that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Human => Self::Computer,
            Self::Computer => Self::Human,
        }
    }

    /// Reports whether the provided side may act during this turn.
    #[must_use]
    pub fn permits(self, side: Side) -> bool {
        self.side() == side
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Places an agent on the board at the provided cell.
    SpawnAgent {
        /// Agent being placed.
        side: Side,
        /// Cell the agent should occupy.
        cell: CellCoord,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Hands a freshly planned route to an agent.
    AssignRoute {
        /// Agent that should follow the route.
        side: Side,
        /// Waypoints the agent walks through, start excluded.
        route: Route,
    },
    /// Abandons the route an agent is currently following.
    ///
    /// The agent is placed back on the centre of the cell it stands on and
    /// the turn does not change.
    CancelRoute {
        /// Agent whose route is dropped.
        side: Side,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent was placed on the board.
    AgentSpawned {
        /// Agent that was placed.
        side: Side,
        /// Cell the agent occupies.
        cell: CellCoord,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Agent that could not be placed.
        side: Side,
        /// Requested cell.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an agent accepted a route and started moving.
    RouteAssigned {
        /// Agent now following the route.
        side: Side,
        /// Number of waypoints in the accepted route.
        waypoints: usize,
    },
    /// Reports that a route assignment was refused.
    RouteRejected {
        /// Agent the route was intended for.
        side: Side,
        /// Specific reason the route was refused.
        reason: RouteError,
    },
    /// Confirms that an in-flight route was dropped.
    RouteCancelled {
        /// Agent whose route was dropped.
        side: Side,
    },
    /// Announces that an agent snapped onto a waypoint.
    WaypointReached {
        /// Agent that reached the waypoint.
        side: Side,
        /// Cell underneath the waypoint.
        cell: CellCoord,
    },
    /// Announces that an agent consumed the last waypoint of its route.
    MoveCompleted {
        /// Agent that finished moving.
        side: Side,
    },
    /// Announces that control moved to the other side.
    TurnChanged {
        /// Turn that became active.
        turn: Turn,
    },
}

/// Reasons a route assignment may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteError {
    /// The requesting side does not hold the turn.
    NotYourTurn,
    /// The agent is still walking a previous route.
    AgentBusy,
    /// The agent has not been spawned yet.
    AgentMissing,
    /// The route contained no waypoints.
    EmptyRoute,
}

/// Reasons a spawn request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The requested cell lies outside the board.
    OutOfBounds,
    /// The requested cell holds an obstacle.
    Obstacle,
    /// The opposing agent already stands on the requested cell.
    Occupied,
    /// The agent was spawned earlier in the session.
    AlreadySpawned,
}

/// Fatal configuration problems detected while building a grid or world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// The grid must contain at least one cell.
    #[error("grid size must be positive")]
    ZeroSize,
    /// The obstacle mask does not cover the declared grid exactly.
    #[error("obstacle mask holds {actual} cells but a {size}x{size} grid needs {expected}")]
    MaskLength {
        /// Declared edge length of the grid.
        size: u32,
        /// Number of cells the grid requires.
        expected: usize,
        /// Number of cells the mask provided.
        actual: usize,
    },
    /// The elevation offset must be a finite number.
    #[error("elevation {0} is not finite")]
    InvalidElevation(f32),
    /// Agent speeds must be finite and strictly positive.
    #[error("speed {speed} for {side:?} agent must be finite and positive")]
    InvalidSpeed {
        /// Agent the speed was configured for.
        side: Side,
        /// Rejected speed value.
        speed: f32,
    },
    /// A cell referenced during authoring lies outside the grid.
    #[error("cell {cell} lies outside the {size}x{size} grid")]
    CellOutOfBounds {
        /// Offending cell.
        cell: CellCoord,
        /// Edge length of the grid.
        size: u32,
    },
}

/// Location of a single grid cell.
///
/// `x` is the row and maps onto the world X axis; `z` is the column and maps
/// onto the world Z axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    z: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn z(&self) -> u32 {
        self.z
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Squared Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn squared_distance(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dz = u64::from(self.z.abs_diff(other.z));
        dx * dx + dz * dz
    }

    /// Neighbouring cell one step in `direction`, if it stays inside a
    /// `size`×`size` grid.
    #[must_use]
    pub fn step(self, direction: Direction, size: u32) -> Option<CellCoord> {
        let (x, z) = match direction {
            Direction::Left => (self.x.checked_sub(1)?, self.z),
            Direction::Right => (self.x.checked_add(1)?, self.z),
            Direction::Forward => (self.x, self.z.checked_add(1)?),
            Direction::Back => (self.x, self.z.checked_sub(1)?),
        };

        (x < size && z < size).then_some(CellCoord::new(x, z))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Axis-aligned movement directions on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
    /// Movement toward increasing `z`.
    Forward,
    /// Movement toward decreasing `z`.
    Back,
}

impl Direction {
    /// All directions in canonical enumeration order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Forward,
        Direction::Back,
    ];
}

/// Square board with a static obstacle mask and its world-space projection.
///
/// The mask is stored row-major: the cell `(x, z)` lives at index
/// `x * size + z`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: u32,
    obstacles: Vec<bool>,
    elevation: f32,
}

impl Grid {
    /// Builds a grid from an explicit obstacle mask.
    ///
    /// Fails when the mask length does not equal `size * size`, when `size`
    /// is zero, or when `elevation` is not finite.
    pub fn new(size: u32, obstacles: Vec<bool>, elevation: f32) -> Result<Self, ConfigurationError> {
        if size == 0 {
            return Err(ConfigurationError::ZeroSize);
        }
        if !elevation.is_finite() {
            return Err(ConfigurationError::InvalidElevation(elevation));
        }

        let expected = cell_count(size);
        if obstacles.len() != expected {
            return Err(ConfigurationError::MaskLength {
                size,
                expected,
                actual: obstacles.len(),
            });
        }

        Ok(Self {
            size,
            obstacles,
            elevation,
        })
    }

    /// Builds an obstacle-free grid.
    pub fn open(size: u32, elevation: f32) -> Result<Self, ConfigurationError> {
        Self::new(size, vec![false; cell_count(size)], elevation)
    }

    /// Builds a grid whose listed cells are obstacles.
    pub fn with_obstacles<I>(size: u32, elevation: f32, cells: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut grid = Self::open(size, elevation)?;
        for cell in cells {
            let index = grid
                .index(cell)
                .ok_or(ConfigurationError::CellOutOfBounds { cell, size })?;
            grid.obstacles[index] = true;
        }
        Ok(grid)
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Height applied to every world position derived from a cell.
    #[must_use]
    pub const fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Raw obstacle mask in row-major order.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.obstacles
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.size && cell.z() < self.size
    }

    /// Reports whether the cell holds an obstacle. Cells outside the grid are
    /// treated as blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.obstacles.get(index).copied())
            .unwrap_or(true)
    }

    /// Row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let x = usize::try_from(cell.x()).ok()?;
        let z = usize::try_from(cell.z()).ok()?;
        let size = usize::try_from(self.size).ok()?;
        x.checked_mul(size)?.checked_add(z)
    }

    /// Iterator over every obstacle cell in row-major order.
    pub fn obstacle_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let size = self.size;
        (0..size)
            .flat_map(move |x| (0..size).map(move |z| CellCoord::new(x, z)))
            .filter(|cell| self.is_blocked(*cell))
    }

    /// Projects a world position onto the cell underneath it.
    ///
    /// Each axis rounds to the nearest integer with exact halves rounding
    /// toward the larger coordinate. Returns `None` when the result falls
    /// outside the grid or the position is not finite.
    #[must_use]
    pub fn cell_at(&self, position: Vec3) -> Option<CellCoord> {
        let x = round_half_up(position.x)?;
        let z = round_half_up(position.z)?;
        let x = u32::try_from(x).ok()?;
        let z = u32::try_from(z).ok()?;
        let cell = CellCoord::new(x, z);
        self.contains(cell).then_some(cell)
    }

    /// Canonical world position of the cell's centre.
    #[must_use]
    pub fn world_position(&self, cell: CellCoord) -> Vec3 {
        Vec3::new(cell.x() as f32, self.elevation, cell.z() as f32)
    }
}

fn cell_count(size: u32) -> usize {
    let size = usize::try_from(size).unwrap_or(0);
    size.saturating_mul(size)
}

fn round_half_up(value: f32) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = (f64::from(value) + 0.5).floor();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Ordered world-space waypoints leading from just after the start cell to
/// the goal cell. An empty route means no path exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    waypoints: Vec<Vec3>,
}

impl Route {
    /// Creates a route from the provided waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self { waypoints }
    }

    /// Route carrying no waypoints.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Reports whether the route carries no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Waypoints in walking order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Final waypoint, if any.
    #[must_use]
    pub fn goal(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Consumes the route, yielding the waypoints.
    #[must_use]
    pub fn into_waypoints(self) -> Vec<Vec3> {
        self.waypoints
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Side the agent plays for.
    pub side: Side,
    /// Current world-space position.
    pub position: Vec3,
    /// Cell underneath the agent, if the position projects onto the grid.
    pub cell: Option<CellCoord>,
    /// Indicates whether the agent is walking a route.
    pub moving: bool,
    /// Number of waypoints left on the active route.
    pub remaining_waypoints: usize,
}

/// Read-only snapshot describing both agents.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentView {
    human: Option<AgentSnapshot>,
    computer: Option<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from per-side snapshots.
    #[must_use]
    pub const fn new(human: Option<AgentSnapshot>, computer: Option<AgentSnapshot>) -> Self {
        Self { human, computer }
    }

    /// Snapshot of the agent playing for `side`, if spawned.
    #[must_use]
    pub const fn get(&self, side: Side) -> Option<&AgentSnapshot> {
        match side {
            Side::Human => self.human.as_ref(),
            Side::Computer => self.computer.as_ref(),
        }
    }

    /// Iterator over the spawned agents, human first.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.human.iter().chain(self.computer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_stays_inside_grid() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::Left, 10), None);
        assert_eq!(corner.step(Direction::Back, 10), None);
        assert_eq!(corner.step(Direction::Right, 10), Some(CellCoord::new(1, 0)));
        assert_eq!(
            corner.step(Direction::Forward, 10),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(CellCoord::new(9, 9).step(Direction::Right, 10), None);
        assert_eq!(CellCoord::new(9, 9).step(Direction::Forward, 10), None);
    }

    #[test]
    fn grid_rejects_mismatched_mask() {
        let error = Grid::new(10, vec![false; 99], DEFAULT_ELEVATION)
            .expect_err("short mask must be rejected");
        assert_eq!(
            error,
            ConfigurationError::MaskLength {
                size: 10,
                expected: 100,
                actual: 99,
            }
        );
    }

    #[test]
    fn grid_rejects_zero_size_and_bad_elevation() {
        assert_eq!(
            Grid::open(0, DEFAULT_ELEVATION),
            Err(ConfigurationError::ZeroSize)
        );
        assert!(matches!(
            Grid::open(4, f32::NAN),
            Err(ConfigurationError::InvalidElevation(_))
        ));
    }

    #[test]
    fn obstacle_mask_is_row_major() {
        let grid = Grid::with_obstacles(10, DEFAULT_ELEVATION, [CellCoord::new(2, 7)])
            .expect("cell inside grid");
        assert!(grid.mask()[27]);
        assert!(grid.is_blocked(CellCoord::new(2, 7)));
        assert!(!grid.is_blocked(CellCoord::new(7, 2)));
        assert_eq!(grid.index(CellCoord::new(9, 9)), Some(99));
        assert_eq!(grid.index(CellCoord::new(10, 0)), None);
    }

    #[test]
    fn authoring_outside_grid_is_an_error() {
        let error = Grid::with_obstacles(3, DEFAULT_ELEVATION, [CellCoord::new(3, 0)])
            .expect_err("cell outside grid");
        assert!(matches!(error, ConfigurationError::CellOutOfBounds { .. }));
    }

    #[test]
    fn out_of_bounds_cells_are_blocked() {
        let grid = Grid::open(3, DEFAULT_ELEVATION).expect("valid grid");
        assert!(grid.is_blocked(CellCoord::new(3, 1)));
        assert!(!grid.is_blocked(CellCoord::new(2, 1)));
    }

    #[test]
    fn cell_at_rounds_halves_toward_larger_coordinate() {
        let grid = Grid::open(10, DEFAULT_ELEVATION).expect("valid grid");
        assert_eq!(
            grid.cell_at(Vec3::new(2.5, 0.0, 3.5)),
            Some(CellCoord::new(3, 4))
        );
        assert_eq!(
            grid.cell_at(Vec3::new(2.49, 9.0, 3.51)),
            Some(CellCoord::new(2, 4))
        );
        assert_eq!(
            grid.cell_at(Vec3::new(-0.5, 0.0, 0.0)),
            Some(CellCoord::new(0, 0))
        );
        assert_eq!(grid.cell_at(Vec3::new(-0.51, 0.0, 0.0)), None);
        assert_eq!(grid.cell_at(Vec3::new(9.5, 0.0, 0.0)), None);
        assert_eq!(grid.cell_at(Vec3::new(f32::NAN, 0.0, 0.0)), None);
    }

    #[test]
    fn world_position_applies_elevation() {
        let grid = Grid::open(10, 0.5).expect("valid grid");
        let position = grid.world_position(CellCoord::new(3, 4));
        assert_eq!(position, Vec3::new(3.0, 0.5, 4.0));
        assert_eq!(grid.cell_at(position), Some(CellCoord::new(3, 4)));
    }

    #[test]
    fn turn_alternates_between_sides() {
        assert_eq!(Turn::default(), Turn::Human);
        assert_eq!(Turn::Human.next(), Turn::Computer);
        assert_eq!(Turn::Computer.next(), Turn::Human);
        assert!(Turn::Computer.permits(Side::Computer));
        assert!(!Turn::Computer.permits(Side::Human));
        assert_eq!(Side::Human.opponent(), Side::Computer);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        let cell = CellCoord::new(5, 7);
        let bytes = bincode::serialize(&cell).expect("serialize");
        let restored: CellCoord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, cell);
    }
}

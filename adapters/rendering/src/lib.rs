#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grid Duel adapters.

use anyhow::Result as AnyResult;
use glam::Vec3;
use grid_duel_core::{AgentView, CellCoord, Grid, Side, Turn};
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Row and column of a board tile, as surfaced to the player when hovering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileInfo {
    row: u32,
    column: u32,
}

impl TileInfo {
    /// Creates a new tile descriptor.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Cell of the board this tile represents.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.row, self.column)
    }

    /// Text displayed while the tile is hovered.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Tile Position: Row {}, Column {}", self.row, self.column)
    }
}

impl From<CellCoord> for TileInfo {
    fn from(cell: CellCoord) -> Self {
        Self::new(cell.x(), cell.z())
    }
}

/// Describes the square tile board that can be rendered by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of tiles along each edge.
    pub size: u32,
    /// Distance between neighbouring tile centres in world units.
    pub spacing: f32,
    /// Color used when drawing tiles.
    pub tile_color: Color,
}

impl TileGridPresentation {
    /// Default distance between neighbouring tile centres.
    pub const DEFAULT_SPACING: f32 = 1.1;

    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `size` is zero or `spacing` is not a positive
    /// finite number.
    pub fn new(
        size: u32,
        spacing: f32,
        tile_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if size == 0 {
            return Err(RenderingError::InvalidGridSize { size });
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(RenderingError::InvalidTileSpacing { spacing });
        }

        Ok(Self {
            size,
            spacing,
            tile_color,
        })
    }

    /// Distance from the first to the last tile centre along one edge.
    #[must_use]
    pub fn extent(&self) -> f32 {
        self.size.saturating_sub(1) as f32 * self.spacing
    }

    /// World-space centre of the tile representing `cell`.
    #[must_use]
    pub fn tile_position(&self, cell: CellCoord) -> Vec3 {
        Vec3::new(
            cell.x() as f32 * self.spacing,
            0.0,
            cell.z() as f32 * self.spacing,
        )
    }

    /// Picks the tile nearest to a world-space pointer position.
    ///
    /// Returns `None` when the pointer lies beyond the board or is not finite.
    #[must_use]
    pub fn tile_at(&self, pointer: Vec3) -> Option<TileInfo> {
        let row = snap_axis(pointer.x / self.spacing, self.size)?;
        let column = snap_axis(pointer.z / self.spacing, self.size)?;
        Some(TileInfo::new(row, column))
    }

    /// Maps a pointer position over the tile layout onto board coordinates,
    /// where neighbouring cells are one unit apart.
    #[must_use]
    pub fn to_board(&self, pointer: Vec3) -> Vec3 {
        Vec3::new(pointer.x / self.spacing, pointer.y, pointer.z / self.spacing)
    }
}

fn snap_axis(value_in_tiles: f32, tiles: u32) -> Option<u32> {
    if !value_in_tiles.is_finite() {
        return None;
    }

    let snapped = (value_in_tiles + 0.5).floor();
    if snapped < 0.0 || snapped >= tiles as f32 {
        return None;
    }
    Some(snapped as u32)
}

/// Obstacle prop displayed above a blocked tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstaclePresentation {
    /// Cell the obstacle blocks.
    pub cell: CellCoord,
    /// World-space position of the prop.
    pub position: Vec3,
}

impl ObstaclePresentation {
    /// Height at which obstacle props are displayed above the board.
    pub const DISPLAY_HEIGHT: f32 = 0.67;

    /// Creates an obstacle prop for `cell`.
    #[must_use]
    pub fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            position: Vec3::new(cell.x() as f32, Self::DISPLAY_HEIGHT, cell.z() as f32),
        }
    }
}

/// Agent rendered at its current world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentPresentation {
    /// Side the agent plays for.
    pub side: Side,
    /// Current world-space position.
    pub position: Vec3,
    /// Cell underneath the agent, if any.
    pub cell: Option<CellCoord>,
    /// Indicates whether the agent is walking a route.
    pub moving: bool,
    /// Fill color of the agent's body.
    pub color: Color,
}

impl AgentPresentation {
    /// Body color used for the human agent.
    pub const HUMAN_COLOR: Color = Color::from_rgb_u8(52, 120, 246);

    /// Body color used for the computer agent.
    pub const COMPUTER_COLOR: Color = Color::from_rgb_u8(220, 60, 60);

    /// Amount by which a moving agent's color is lightened.
    pub const MOVING_HIGHLIGHT: f32 = 0.35;

    /// Body color assigned to `side`.
    #[must_use]
    pub const fn color_for(side: Side) -> Color {
        match side {
            Side::Human => Self::HUMAN_COLOR,
            Side::Computer => Self::COMPUTER_COLOR,
        }
    }

    /// Body color for `side`, lightened while the agent walks a route.
    #[must_use]
    pub fn shade(side: Side, moving: bool) -> Color {
        let color = Self::color_for(side);
        if moving {
            color.lighten(Self::MOVING_HIGHLIGHT)
        } else {
            color
        }
    }
}

/// Scene description combining the board, its obstacles and both agents.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile board that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// Obstacle props in row-major order.
    pub obstacles: Vec<ObstaclePresentation>,
    /// Agents currently on the board, human first.
    pub agents: Vec<AgentPresentation>,
    /// Turn currently in effect.
    pub turn: Turn,
    /// Tile under the pointer, if any.
    pub hovered_tile: Option<TileInfo>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        tile_grid: TileGridPresentation,
        obstacles: Vec<ObstaclePresentation>,
        agents: Vec<AgentPresentation>,
        turn: Turn,
        hovered_tile: Option<TileInfo>,
    ) -> Self {
        Self {
            tile_grid,
            obstacles,
            agents,
            turn,
            hovered_tile,
        }
    }

    /// Builds a scene from world snapshots.
    #[must_use]
    pub fn capture(
        tile_grid: TileGridPresentation,
        grid: &Grid,
        agents: &AgentView,
        turn: Turn,
    ) -> Self {
        let obstacles = grid.obstacle_cells().map(ObstaclePresentation::new).collect();
        let agents = agents
            .iter()
            .map(|snapshot| AgentPresentation {
                side: snapshot.side,
                position: snapshot.position,
                cell: snapshot.cell,
                moving: snapshot.moving,
                color: AgentPresentation::shade(snapshot.side, snapshot.moving),
            })
            .collect();

        Self::new(tile_grid, obstacles, agents, turn, None)
    }

    /// Replaces the hovered tile.
    #[must_use]
    pub fn with_hovered_tile(mut self, hovered_tile: Option<TileInfo>) -> Self {
        self.hovered_tile = hovered_tile;
        self
    }

    /// Label of the hovered tile, if any.
    #[must_use]
    pub fn hovered_label(&self) -> Option<String> {
        self.hovered_tile.map(|tile| tile.label())
    }

    /// Agent presentation for `side`, if it is on the board.
    #[must_use]
    pub fn agent(&self, side: Side) -> Option<&AgentPresentation> {
        self.agents.iter().find(|agent| agent.side == side)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown above the rendered frame.
    pub title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Grid Duel scenes.
pub trait RenderingBackend {
    /// Presents a single frame.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The board must contain at least one tile.
    InvalidGridSize {
        /// Provided size that failed validation.
        size: u32,
    },
    /// Tile spacing must be a positive finite distance.
    InvalidTileSpacing {
        /// Provided spacing that failed validation.
        spacing: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGridSize { size } => {
                write!(f, "grid size must be positive (received {size})")
            }
            Self::InvalidTileSpacing { spacing } => {
                write!(
                    f,
                    "tile spacing must be positive and finite (received {spacing})"
                )
            }
        }
    }
}

impl Error for RenderingError {}

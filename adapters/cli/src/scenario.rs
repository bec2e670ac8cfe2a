//! Scenario files describing the board and the starting setup of both agents.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use grid_duel_core::{
    CellCoord, Grid, Side, DEFAULT_AGENT_SPEED, DEFAULT_ELEVATION, DEFAULT_GRID_SIZE,
};
use grid_duel_world::WorldConfig;
use serde::Deserialize;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;
const OPEN_CELL: char = '.';
const OBSTACLE_CELL: char = '#';

/// Fully validated session setup.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Scenario {
    grid: Grid,
    human: AgentSetup,
    computer: AgentSetup,
}

/// Spawn cell and speed of a single agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AgentSetup {
    pub(crate) spawn: CellCoord,
    pub(crate) speed: f32,
}

impl Scenario {
    /// Obstacle-free default board with the agents in opposite corners.
    pub(crate) fn standard() -> Result<Self> {
        let grid = Grid::open(DEFAULT_GRID_SIZE, DEFAULT_ELEVATION)
            .context("failed to build the default grid")?;
        Self::new(
            grid,
            default_setup(Side::Human, DEFAULT_GRID_SIZE),
            default_setup(Side::Computer, DEFAULT_GRID_SIZE),
        )
    }

    /// Loads and validates the scenario stored at `path`.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        parse_scenario(&contents)
            .with_context(|| format!("invalid scenario in {}", path.display()))
    }

    fn new(grid: Grid, human: AgentSetup, computer: AgentSetup) -> Result<Self> {
        for (side, setup) in [(Side::Human, human), (Side::Computer, computer)] {
            if !grid.contains(setup.spawn) {
                bail!(
                    "{side:?} spawn {} lies outside the {}x{} grid",
                    setup.spawn,
                    grid.size(),
                    grid.size()
                );
            }
            if grid.is_blocked(setup.spawn) {
                bail!("{side:?} spawn {} is an obstacle", setup.spawn);
            }
        }
        if human.spawn == computer.spawn {
            bail!("both agents spawn on {}", human.spawn);
        }

        Ok(Self {
            grid,
            human,
            computer,
        })
    }

    /// Board the session is played on.
    pub(crate) fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Setup of the agent playing for `side`.
    pub(crate) fn agent(&self, side: Side) -> AgentSetup {
        match side {
            Side::Human => self.human,
            Side::Computer => self.computer,
        }
    }

    /// Replaces the board, keeping both agents.
    ///
    /// The new board must have the same size and must leave both spawn cells
    /// open.
    pub(crate) fn with_grid(self, grid: Grid) -> Result<Self> {
        if grid.size() != self.grid.size() {
            bail!(
                "layout is {}x{} but the scenario grid is {}x{}",
                grid.size(),
                grid.size(),
                self.grid.size(),
                self.grid.size()
            );
        }
        Self::new(grid, self.human, self.computer)
    }

    /// World configuration matching this scenario.
    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig::new(self.grid.clone())
            .with_speed(Side::Human, self.human.speed)
            .with_speed(Side::Computer, self.computer.speed)
    }
}

fn default_setup(side: Side, size: u32) -> AgentSetup {
    let far = size.saturating_sub(1);
    let spawn = match side {
        Side::Human => CellCoord::new(0, 0),
        Side::Computer => CellCoord::new(far, far),
    };
    AgentSetup {
        spawn,
        speed: DEFAULT_AGENT_SPEED,
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    grid: GridSection,
    #[serde(default)]
    human: AgentSection,
    #[serde(default)]
    computer: AgentSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GridSection {
    #[serde(default = "default_size")]
    size: u32,
    #[serde(default = "default_elevation")]
    elevation: f32,
    #[serde(default)]
    obstacles: Vec<String>,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            elevation: DEFAULT_ELEVATION,
            obstacles: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentSection {
    spawn: Option<[u32; 2]>,
    speed: Option<f32>,
}

impl AgentSection {
    fn resolve(&self, side: Side, size: u32) -> AgentSetup {
        let fallback = default_setup(side, size);
        AgentSetup {
            spawn: self
                .spawn
                .map_or(fallback.spawn, |[x, z]| CellCoord::new(x, z)),
            speed: self.speed.unwrap_or(fallback.speed),
        }
    }
}

fn default_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_elevation() -> f32 {
    DEFAULT_ELEVATION
}

fn parse_scenario(contents: &str) -> Result<Scenario> {
    let file: ScenarioFile =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if file.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            file.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }

    let size = file.grid.size;
    let mask = parse_obstacle_rows(&file.grid.obstacles, size)?;
    let grid = Grid::new(size, mask, file.grid.elevation).context("invalid grid section")?;

    Scenario::new(
        grid,
        file.human.resolve(Side::Human, size),
        file.computer.resolve(Side::Computer, size),
    )
}

/// Expands `'.'`/`'#'` rows into a row-major obstacle mask. No rows means an
/// open board.
fn parse_obstacle_rows(rows: &[String], size: u32) -> Result<Vec<bool>> {
    let width = usize::try_from(size).context("grid size does not fit in memory")?;
    if rows.is_empty() {
        return Ok(vec![false; width.saturating_mul(width)]);
    }
    if rows.len() != width {
        bail!("obstacle map has {} rows but the grid needs {width}", rows.len());
    }

    let mut mask = Vec::with_capacity(width.saturating_mul(width));
    for (row, line) in rows.iter().enumerate() {
        let cells: Vec<char> = line.trim().chars().collect();
        if cells.len() != width {
            bail!(
                "obstacle row {row} has {} cells but the grid needs {width}",
                cells.len()
            );
        }
        for (column, cell) in cells.into_iter().enumerate() {
            match cell {
                OPEN_CELL => mask.push(false),
                OBSTACLE_CELL => mask.push(true),
                other => bail!("unexpected `{other}` at row {row}, column {column}"),
            }
        }
    }

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scenario_reads_obstacles_row_major() {
        let scenario = parse_scenario(
            r##"
            version = 1

            [grid]
            size = 3
            elevation = 0.25
            obstacles = ["...", "..#", "#.."]

            [human]
            spawn = [0, 0]
            speed = 3.0

            [computer]
            spawn = [2, 2]
        "##,
        )
        .expect("scenario should parse");

        let obstacles: Vec<_> = scenario.grid().obstacle_cells().collect();
        assert_eq!(obstacles, vec![CellCoord::new(1, 2), CellCoord::new(2, 0)]);
        assert_eq!(scenario.grid().elevation(), 0.25);
        assert_eq!(scenario.agent(Side::Human).speed, 3.0);
        assert_eq!(scenario.agent(Side::Computer).speed, DEFAULT_AGENT_SPEED);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let scenario = parse_scenario("version = 1").expect("scenario should parse");

        assert_eq!(scenario, Scenario::standard().expect("standard scenario"));
        assert_eq!(scenario.agent(Side::Computer).spawn, CellCoord::new(9, 9));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let result = parse_scenario("version = 2");

        assert!(result.is_err(), "version 2 must be rejected");
    }

    #[test]
    fn malformed_obstacle_rows_are_rejected() {
        for rows in [
            r#"["..", "..", ".."]"#,
            r#"["...", "..", "..."]"#,
            r#"["...", ".x.", "..."]"#,
        ] {
            let contents = format!("version = 1\n[grid]\nsize = 3\nobstacles = {rows}\n");
            assert!(parse_scenario(&contents).is_err(), "{rows} must be rejected");
        }
    }

    #[test]
    fn spawn_on_obstacle_or_off_grid_is_rejected() {
        let on_obstacle = r##"
            version = 1
            [grid]
            size = 3
            obstacles = ["#..", "...", "..."]
        "##;
        let off_grid = r#"
            version = 1
            [grid]
            size = 3
            [computer]
            spawn = [3, 0]
        "#;
        let shared = r#"
            version = 1
            [computer]
            spawn = [0, 0]
        "#;

        assert!(parse_scenario(on_obstacle).is_err());
        assert!(parse_scenario(off_grid).is_err());
        assert!(parse_scenario(shared).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_scenario("version = 1\n[grid]\nwidth = 4\n");

        assert!(result.is_err(), "unknown keys must be rejected");
    }

    #[test]
    fn with_grid_requires_matching_size() {
        let scenario = Scenario::standard().expect("standard scenario");
        let smaller = Grid::open(5, DEFAULT_ELEVATION).expect("valid grid");

        assert!(scenario.clone().with_grid(smaller).is_err());

        let walled = Grid::with_obstacles(10, DEFAULT_ELEVATION, [CellCoord::new(5, 5)])
            .expect("valid grid");
        let replaced = scenario.with_grid(walled.clone()).expect("same size");
        assert_eq!(replaced.grid(), &walled);
    }
}

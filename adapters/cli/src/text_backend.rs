//! Plain-text rendering backend that draws the board as ASCII art.

use std::io::Write;

use anyhow::{Context, Result};
use grid_duel_core::{CellCoord, Side};
use grid_duel_rendering::{Presentation, RenderingBackend, Scene};

const OPEN_GLYPH: char = '.';
const OBSTACLE_GLYPH: char = '#';
const HUMAN_GLYPH: char = 'H';
const COMPUTER_GLYPH: char = 'C';

/// Writes every presented frame to the wrapped writer.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    out: W,
}

impl<W: Write> TextBackend<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> Result<()> {
        let frame = render_frame(presentation);
        self.out
            .write_all(frame.as_bytes())
            .context("failed to write frame")?;
        self.out.flush().context("failed to flush frame")
    }
}

/// Renders a frame with rows along the X axis and columns along the Z axis.
fn render_frame(presentation: &Presentation) -> String {
    let scene = &presentation.scene;
    let size = scene.tile_grid.size;
    let mut frame = format!(
        "== {} ==\n{:?} to move\n",
        presentation.title,
        scene.turn.side()
    );

    for x in 0..size {
        let row: String = (0..size)
            .map(|z| glyph_at(scene, CellCoord::new(x, z)))
            .collect();
        frame.push_str(&row);
        frame.push('\n');
    }

    if let Some(label) = scene.hovered_label() {
        frame.push_str(&label);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

fn glyph_at(scene: &Scene, cell: CellCoord) -> char {
    if let Some(agent) = scene.agents.iter().find(|agent| agent.cell == Some(cell)) {
        return match agent.side {
            Side::Human => HUMAN_GLYPH,
            Side::Computer => COMPUTER_GLYPH,
        };
    }
    if scene.obstacles.iter().any(|obstacle| obstacle.cell == cell) {
        OBSTACLE_GLYPH
    } else {
        OPEN_GLYPH
    }
}

//! Board layout generation
//!
//! Lays out the peg pyramid, the bin row and the walls for a given pyramid
//! height and viewport. Pure: identical inputs always yield identical geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BodyKind, Shape, StaticBody};
use super::multiplier::multiplier_for;
use crate::consts::*;

/// Inputs to board generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Rows of pegs (>= 1 by caller contract)
    pub pyramid_height: u32,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl BoardConfig {
    pub fn new(pyramid_height: u32, viewport: Vec2) -> Self {
        Self {
            pyramid_height,
            viewport,
        }
    }
}

/// A peg centre and the row it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PegPosition {
    pub row: u32,
    pub pos: Vec2,
}

/// A scoring bin beneath the pyramid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub index: usize,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub multiplier: u32,
}

impl Bin {
    pub fn shape(&self) -> Shape {
        Shape::rect(self.center, Vec2::new(self.width, self.height))
    }
}

/// Extent of the pyramid region balls fall through
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PyramidBounds {
    pub top: f32,
    /// Top edge of the bin row
    pub bottom: f32,
    /// x of the first peg in the bottom row
    pub left: f32,
    /// x of the last peg in the bottom row
    pub right: f32,
}

impl PyramidBounds {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Complete static geometry of a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub config: BoardConfig,
    pub ball_radius: f32,
    pub peg_radius: f32,
    pub wall_thickness: f32,
    /// Pegs ordered by row (top to bottom), then left to right
    pub pegs: Vec<PegPosition>,
    pub bins: Vec<Bin>,
    /// Four viewport edge walls
    pub walls: Vec<Shape>,
    /// Two invisible pyramid side boundaries (left, right)
    pub boundaries: Vec<Shape>,
    pub bounds: PyramidBounds,
}

impl BoardGeometry {
    pub fn generate(config: &BoardConfig) -> Self {
        generate(config)
    }

    /// Number of pegs in `row`
    pub fn pegs_in_row(row: u32) -> usize {
        row as usize + 2
    }

    /// Pegs of one row, left to right
    pub fn row(&self, row: u32) -> impl Iterator<Item = &PegPosition> {
        self.pegs.iter().filter(move |p| p.row == row)
    }

    pub fn bin(&self, index: usize) -> Option<&Bin> {
        self.bins.get(index)
    }

    /// Spawn position for a jitter in [-0.5, 0.5)
    pub fn spawn_point(&self, jitter: f32) -> Vec2 {
        let x = self.config.viewport.x / 2.0
            + jitter * self.bounds.width() * SPAWN_JITTER_FRACTION;
        Vec2::new(x, self.bounds.top - self.ball_radius)
    }

    /// All static bodies in registration order: walls, boundaries, pegs, bins
    pub fn static_bodies(&self) -> Vec<StaticBody> {
        let walls = self.walls.iter().map(|&shape| StaticBody {
            kind: BodyKind::Wall,
            shape,
            visible: true,
        });
        let boundaries = self.boundaries.iter().map(|&shape| StaticBody {
            kind: BodyKind::Boundary,
            shape,
            visible: false,
        });
        let pegs = self.pegs.iter().map(|peg| StaticBody {
            kind: BodyKind::Peg,
            shape: Shape::Circle {
                center: peg.pos,
                radius: self.peg_radius,
            },
            visible: true,
        });
        let bins = self.bins.iter().map(|bin| StaticBody {
            kind: BodyKind::Bin(bin.index),
            shape: bin.shape(),
            visible: true,
        });
        walls.chain(boundaries).chain(pegs).chain(bins).collect()
    }
}

/// Generate the full board geometry
pub fn generate(config: &BoardConfig) -> BoardGeometry {
    let height = config.pyramid_height;
    let viewport = config.viewport;
    let h = height.max(1) as f32;

    let game = viewport * PLAY_AREA_FRACTION;
    let ball_radius = (game.x / (h * 3.0)).min(game.y / (h * 4.0));
    let peg_radius = ball_radius * PEG_TO_BALL_RATIO;

    let vertical_spacing = game.y / (h + 1.0);
    let horizontal_spacing = peg_radius * PEG_SPACING_RADII;
    let top = viewport.y * MARGIN_FRACTION;

    let mut pegs = Vec::new();
    let mut max_row_width = 0.0_f32;
    for row in 0..height {
        let count = BoardGeometry::pegs_in_row(row);
        let row_width = (count - 1) as f32 * horizontal_spacing;
        max_row_width = max_row_width.max(row_width);
        let start_x = (viewport.x - row_width) / 2.0;
        let y = top + row as f32 * vertical_spacing;
        pegs.extend((0..count).map(|i| PegPosition {
            row,
            pos: Vec2::new(start_x + i as f32 * horizontal_spacing, y),
        }));
    }

    let bin_count = height as usize + 1;
    let bin_height = viewport.y * MARGIN_FRACTION;
    let bin_y = viewport.y - bin_height / 2.0;
    let bin_left = (viewport.x - max_row_width) / 2.0;
    let bins = (0..bin_count)
        .map(|index| Bin {
            index,
            center: Vec2::new(bin_left + horizontal_spacing * index as f32, bin_y),
            width: horizontal_spacing,
            height: bin_height,
            multiplier: multiplier_for(index, bin_count),
        })
        .collect();

    // Bottom row spans the full pyramid width
    let bottom_row = height.saturating_sub(1);
    let mut bottom_xs = pegs.iter().filter(|p| p.row == bottom_row).map(|p| p.pos.x);
    let left = bottom_xs.next().unwrap_or(viewport.x / 2.0);
    let right = bottom_xs.last().unwrap_or(left);
    let bounds = PyramidBounds {
        top,
        bottom: bin_y - bin_height / 2.0,
        left,
        right,
    };

    let wall_thickness = viewport.x * WALL_THICKNESS_FRACTION;
    let walls = vec![
        Shape::rect(Vec2::new(viewport.x / 2.0, 0.0), Vec2::new(viewport.x, wall_thickness)),
        Shape::rect(
            Vec2::new(viewport.x / 2.0, viewport.y),
            Vec2::new(viewport.x, wall_thickness),
        ),
        Shape::rect(Vec2::new(0.0, viewport.y / 2.0), Vec2::new(wall_thickness, viewport.y)),
        Shape::rect(
            Vec2::new(viewport.x, viewport.y / 2.0),
            Vec2::new(wall_thickness, viewport.y),
        ),
    ];

    let boundary_center_y = (bounds.top + bounds.bottom) / 2.0;
    let boundary_size = Vec2::new(wall_thickness, bounds.bottom - bounds.top);
    let boundaries = vec![
        Shape::rect(Vec2::new(bounds.left, boundary_center_y), boundary_size),
        Shape::rect(Vec2::new(bounds.right, boundary_center_y), boundary_size),
    ];

    BoardGeometry {
        config: *config,
        ball_radius,
        peg_radius,
        wall_thickness,
        pegs,
        bins,
        walls,
        boundaries,
        bounds,
    }
}

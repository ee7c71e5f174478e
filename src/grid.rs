use std::fmt;

use crate::constants::RECENT_AVOID_WINDOW;
use crate::types::{Cell, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    UnknownTile {
        row: usize,
        col: usize,
        tile: char,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Empty => write!(f, "map template has no rows"),
            TemplateError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "map template row {row} has width {found}, expected {expected}"
            ),
            TemplateError::UnknownTile { row, col, tile } => {
                write!(f, "unknown tile {tile:?} at ({col},{row})")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Clone, Debug)]
pub struct MapTemplate {
    rows: Vec<String>,
    width: i32,
    height: i32,
}

impl MapTemplate {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, TemplateError> {
        if rows.is_empty() {
            return Err(TemplateError::Empty);
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err(TemplateError::Empty);
        }
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(TemplateError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, tile) in row.chars().enumerate() {
                if !matches!(tile, '#' | '.' | ' ') {
                    return Err(TemplateError::UnknownTile {
                        row: y,
                        col: x,
                        tile,
                    });
                }
            }
        }

        Ok(Self {
            rows: rows.iter().map(|row| row.as_ref().to_string()).collect(),
            width: width as i32,
            height: rows.len() as i32,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn from_template(template: &MapTemplate) -> Self {
        let mut cells = Vec::with_capacity((template.width * template.height) as usize);
        for row in template.rows() {
            for tile in row.chars() {
                cells.push(match tile {
                    '#' => Cell::Wall,
                    '.' => Cell::Pickup,
                    _ => Cell::Empty,
                });
            }
        }
        Self {
            width: template.width,
            height: template.height,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_at(&self, pos: Vec2) -> Option<Cell> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some(self.cells[(pos.y * self.width + pos.x) as usize])
    }

    pub fn is_legal(&self, pos: Vec2) -> bool {
        matches!(self.cell_at(pos), Some(Cell::Pickup) | Some(Cell::Empty))
    }

    pub fn pickup_at(&self, pos: Vec2) -> bool {
        self.cell_at(pos) == Some(Cell::Pickup)
    }

    pub fn remaining_pickups(&self) -> i32 {
        self.cells.iter().filter(|cell| **cell == Cell::Pickup).count() as i32
    }

    /// Converts the pickup at `pos` to open floor. Returns whether a pickup
    /// was actually there.
    pub fn collect_pickup(&mut self, pos: Vec2) -> bool {
        if !self.pickup_at(pos) {
            return false;
        }
        self.cells[(pos.y * self.width + pos.x) as usize] = Cell::Empty;
        true
    }

    pub fn tile_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| match self.cells[(y * self.width + x) as usize] {
                        Cell::Wall => '#',
                        Cell::Pickup => '.',
                        Cell::Empty => ' ',
                    })
                    .collect()
            })
            .collect()
    }

    /// Single-step candidates from `pos` in fixed order (up, down, left,
    /// right). With `avoid_recent`, candidates among the last two entries of
    /// `recent` are dropped; if that empties a non-empty set the filter is
    /// retried off so a position with any open neighbor never yields nothing.
    pub fn legal_moves(&self, pos: Vec2, avoid_recent: bool, recent: &[Vec2]) -> Vec<Vec2> {
        let window = &recent[recent.len().saturating_sub(RECENT_AVOID_WINDOW)..];
        let mut moves = Vec::new();
        for next in neighbors_of(pos) {
            if !self.is_legal(next) {
                continue;
            }
            if avoid_recent && window.contains(&next) {
                continue;
            }
            moves.push(next);
        }
        if moves.is_empty() && avoid_recent {
            return self.legal_moves(pos, false, &[]);
        }
        moves
    }
}

pub fn neighbors_of(pos: Vec2) -> [Vec2; 4] {
    [
        Vec2 {
            x: pos.x,
            y: pos.y - 1,
        },
        Vec2 {
            x: pos.x,
            y: pos.y + 1,
        },
        Vec2 {
            x: pos.x - 1,
            y: pos.y,
        },
        Vec2 {
            x: pos.x + 1,
            y: pos.y,
        },
    ]
}

//! Canvas placement for new processors.
//!
//! New flows are laid out as a single column to the right of whatever the
//! group already contains, one row per processor in definition order.

use crate::client::Position;
use serde::{Deserialize, Serialize};

/// Layout constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Column used when the group is empty
    pub default_start_x: f64,
    /// Gap between the right-most existing processor and the new column
    pub spacing_x: f64,
    /// Y of the first row
    pub origin_y: f64,
    pub row_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_start_x: 100.0,
            spacing_x: 400.0,
            origin_y: 100.0,
            row_height: 200.0,
        }
    }
}

/// A computed column for one realization run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    column_x: f64,
    origin_y: f64,
    row_height: f64,
}

impl Layout {
    /// Place the new column right of every processor in `existing`
    pub fn from_topology(existing: &[Position], config: &LayoutConfig) -> Self {
        let column_x = existing
            .iter()
            .map(|p| p.x)
            .fold(None, |max: Option<f64>, x| Some(max.map_or(x, |m| m.max(x))))
            .map_or(config.default_start_x, |max_x| max_x + config.spacing_x);

        Self {
            column_x,
            origin_y: config.origin_y,
            row_height: config.row_height,
        }
    }

    /// Position of the processor at `index` in the definition
    pub fn position_for(&self, index: usize) -> Position {
        Position::new(self.column_x, self.origin_y + self.row_height * index as f64)
    }

    pub fn column_x(&self) -> f64 {
        self.column_x
    }
}

//! Graph-wide switches and tunables.
//!
//! Loaded from JSON (camelCase keys); every key is optional and falls back to the default below.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    pub grid_size: f64,
    pub grid_enabled: bool,
    /// Hit-test tolerance in screen pixels.
    pub tolerance: f64,
    pub min_fit_scale: f64,
    pub max_fit_scale: f64,
    pub zoom_factor: f64,

    pub allow_dangling_edges: bool,
    pub allow_loops: bool,
    pub multigraph: bool,
    pub connectable_edges: bool,

    pub cells_locked: bool,
    pub cells_movable: bool,
    pub cells_resizable: bool,
    pub cells_editable: bool,
    pub cells_deletable: bool,
    pub cells_bendable: bool,
    pub cells_disconnectable: bool,
    pub cells_cloneable: bool,
    pub cells_selectable: bool,
    pub vertex_labels_movable: bool,
    pub edge_labels_movable: bool,

    pub extend_parents: bool,
    pub extend_parents_on_add: bool,
    pub extend_parents_on_move: bool,
    pub constrain_children: bool,
    pub constrain_relative_children: bool,
    pub allow_negative_coordinates: bool,
    pub allow_overlap_parent: bool,
    pub disconnect_on_move: bool,
    pub reset_edges_on_move: bool,
    pub reset_edges_on_resize: bool,
    pub reset_edges_on_connect: bool,
    pub reset_view_on_root_change: bool,
    pub clone_invalid_edges: bool,
    pub recursive_resize: bool,
    pub collapse_to_preferred_size: bool,
    pub ports_enabled: bool,

    /// Edge style used for self-loops without an explicit `loop` style.
    pub default_loop_style: String,

    pub double_tap_timeout_ms: u64,
    pub double_tap_tolerance: f64,
    pub tap_and_hold_delay_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            grid_enabled: true,
            tolerance: 4.0,
            min_fit_scale: 0.1,
            max_fit_scale: 8.0,
            zoom_factor: 1.2,

            allow_dangling_edges: true,
            allow_loops: false,
            multigraph: true,
            connectable_edges: false,

            cells_locked: false,
            cells_movable: true,
            cells_resizable: true,
            cells_editable: true,
            cells_deletable: true,
            cells_bendable: true,
            cells_disconnectable: true,
            cells_cloneable: true,
            cells_selectable: true,
            vertex_labels_movable: false,
            edge_labels_movable: true,

            extend_parents: true,
            extend_parents_on_add: true,
            extend_parents_on_move: false,
            constrain_children: true,
            constrain_relative_children: false,
            allow_negative_coordinates: true,
            allow_overlap_parent: false,
            disconnect_on_move: true,
            reset_edges_on_move: false,
            reset_edges_on_resize: false,
            reset_edges_on_connect: true,
            reset_view_on_root_change: true,
            clone_invalid_edges: false,
            recursive_resize: false,
            collapse_to_preferred_size: true,
            ports_enabled: true,

            default_loop_style: "loopEdgeStyle".to_string(),

            double_tap_timeout_ms: 500,
            double_tap_tolerance: 25.0,
            tap_and_hold_delay_ms: 500,
        }
    }
}

impl GraphConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Rounds `value` to the grid when the grid is enabled.
    pub fn snap(&self, value: f64) -> f64 {
        if self.grid_enabled && self.grid_size > 0.0 {
            (value / self.grid_size).round() * self.grid_size
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GraphConfig::from_value(json!({"gridSize": 20, "allowLoops": true})).unwrap();
        assert_eq!(cfg.grid_size, 20.0);
        assert!(cfg.allow_loops);
        assert_eq!(cfg.tolerance, 4.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GraphConfig::from_json("{\"gridSize\": \"wide\"}").is_err());
    }

    #[test]
    fn snap_rounds_to_grid() {
        let cfg = GraphConfig::default();
        assert_eq!(cfg.snap(14.0), 10.0);
        assert_eq!(cfg.snap(16.0), 20.0);
        let off = GraphConfig {
            grid_enabled: false,
            ..Default::default()
        };
        assert_eq!(off.snap(14.0), 14.0);
    }
}

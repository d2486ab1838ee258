//! Connecting and disconnecting edges.

use super::{Graph, HashSet};
use crate::events::GraphEvent;
use trellis_core::geom::point;
use trellis_core::style::{ConnectionConstraint, keys};
use trellis_core::{CellId, Result};

impl Graph {
    /// Connects one end of `edge` to `terminal` (or disconnects it with `None`). A `Some`
    /// constraint rewrites the edge's exit/entry style; a constraint without a point clears it.
    pub fn connect_cell(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
        constraint: Option<ConnectionConstraint>,
    ) -> Result<CellId> {
        self.batch_update(|g| g.cell_connected(edge, terminal, source, constraint))?;
        Ok(edge)
    }

    pub(crate) fn cell_connected(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
        constraint: Option<ConnectionConstraint>,
    ) -> Result<()> {
        self.batch_update(|g| {
            let previous = g.model.terminal(edge, source);
            g.set_connection_constraint(edge, source, constraint)?;

            let mut terminal = terminal;
            if g.config.ports_enabled {
                let mut port = None;
                if let Some(t) = terminal {
                    if g.policy.is_port(g, t) {
                        port = Some(t.to_string());
                        terminal = g.policy.terminal_for_port(g, t, source);
                    }
                }
                let key = if source { keys::SOURCE_PORT } else { keys::TARGET_PORT };
                g.set_cell_styles(key, port.as_deref(), &[edge])?;
            }

            g.model.set_terminal(edge, terminal, source)?;
            if g.config.reset_edges_on_connect {
                g.reset_edge(edge)?;
            }
            g.fire(GraphEvent::CellConnected {
                edge,
                terminal,
                source,
                previous,
            });
            Ok(())
        })
    }

    /// Writes `constraint` into the edge style. `None` leaves the style untouched.
    pub fn set_connection_constraint(
        &mut self,
        edge: CellId,
        source: bool,
        constraint: Option<ConnectionConstraint>,
    ) -> Result<()> {
        let Some(constraint) = constraint else {
            return Ok(());
        };
        let (kx, ky, kdx, kdy, kp) = if source {
            (keys::EXIT_X, keys::EXIT_Y, keys::EXIT_DX, keys::EXIT_DY, keys::EXIT_PERIMETER)
        } else {
            (keys::ENTRY_X, keys::ENTRY_Y, keys::ENTRY_DX, keys::ENTRY_DY, keys::ENTRY_PERIMETER)
        };
        self.batch_update(|g| match constraint.point {
            None => {
                for key in [kx, ky, kdx, kdy, kp] {
                    g.set_cell_styles(key, None, &[edge])?;
                }
                Ok(())
            }
            Some(p) => {
                g.set_cell_styles(kx, Some(&p.x.to_string()), &[edge])?;
                g.set_cell_styles(ky, Some(&p.y.to_string()), &[edge])?;
                g.set_cell_styles(kdx, Some(&constraint.dx.to_string()), &[edge])?;
                g.set_cell_styles(kdy, Some(&constraint.dy.to_string()), &[edge])?;
                let perimeter = (!constraint.perimeter).then_some("0");
                g.set_cell_styles(kp, perimeter, &[edge])
            }
        })
    }

    /// Constraint of one end of `edge` as stored in its style.
    pub fn connection_constraint(&self, edge: CellId, source: bool) -> Option<ConnectionConstraint> {
        self.cell_style(edge).constraint(source)
    }

    /// Drops the waypoints of `edge`.
    pub fn reset_edge(&mut self, edge: CellId) -> Result<()> {
        match self.model.geometry(edge) {
            Some(geo) if !geo.points.is_empty() => {
                let mut geo = geo.clone();
                geo.points.clear();
                self.model.set_geometry(edge, Some(geo))
            }
            _ => Ok(()),
        }
    }

    /// Resets every edge connected to `cells` (or their descendants) that has a visible end
    /// outside `cells`.
    pub fn reset_edges(&mut self, cells: &[CellId]) -> Result<()> {
        let lookup: HashSet<CellId> = cells.iter().copied().collect();
        self.batch_update(|g| g.reset_edges_in(cells, &lookup))
    }

    fn reset_edges_in(&mut self, cells: &[CellId], lookup: &HashSet<CellId>) -> Result<()> {
        for &cell in cells {
            for edge in self.model.edges(cell).to_vec() {
                let ends = [true, false].map(|source| match self.view.get_state(edge) {
                    Some(state) => state.visible_terminal(source),
                    None => self.view.visible_terminal(&self.model, edge, source),
                });
                if ends.iter().any(|t| !t.is_some_and(|t| lookup.contains(&t))) {
                    self.reset_edge(edge)?;
                }
            }
            let children = self.model.children(cell).to_vec();
            self.reset_edges_in(&children, lookup)?;
        }
        Ok(())
    }

    /// Disconnects the edges in `cells` from terminals that are not moved along with them. The
    /// disconnected ends keep their current position as terminal points.
    pub fn disconnect_graph(&mut self, cells: &[CellId]) -> Result<()> {
        let lookup: HashSet<CellId> = cells.iter().copied().collect();
        let scale = self.view.scale();
        let tr = self.view.translate();
        self.batch_update(|g| {
            for &cell in cells {
                if !g.model.is_edge(cell) {
                    continue;
                }
                let Some(mut geo) = g.model.geometry(cell).cloned() else {
                    continue;
                };
                let Some(state) = g.view.get_state(cell) else {
                    continue;
                };
                let Some(pstate) = g.model.parent(cell).and_then(|p| g.view.get_state(p)) else {
                    continue;
                };
                let (dx, dy) = (-pstate.origin.x, -pstate.origin.y);
                let mut detach = Vec::new();
                for source in [true, false] {
                    let Some(terminal) = g.model.terminal(cell, source) else {
                        continue;
                    };
                    if !g.is_cell_disconnectable(cell, terminal, source)
                        || g.has_ancestor_in(terminal, &lookup)
                    {
                        continue;
                    }
                    let end = if source {
                        state.first_point()
                    } else {
                        state.last_point()
                    };
                    if let Some(pt) = end {
                        geo.set_terminal_point(
                            Some(point(pt.x / scale - tr.x + dx, pt.y / scale - tr.y + dy)),
                            source,
                        );
                    }
                    detach.push(source);
                }
                for source in detach {
                    g.model.set_terminal(cell, None, source)?;
                }
                g.model.set_geometry(cell, Some(geo))?;
            }
            Ok(())
        })
    }
}

//! Typed view of a merged style map.

use super::{StyleMap, keys};
use crate::geom::{Point, point};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    North,
    South,
    #[default]
    East,
    West,
}

impl Direction {
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "north" => Ok(Direction::North),
            "south" => Ok(Direction::South),
            "east" => Ok(Direction::East),
            "west" => Ok(Direction::West),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Elbow {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPosition {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalLabelPosition {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// A fractional attachment point on a terminal, optionally projected onto its perimeter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionConstraint {
    pub point: Option<Point>,
    pub perimeter: bool,
    pub dx: f64,
    pub dy: f64,
}

impl ConnectionConstraint {
    pub fn new(point: Option<Point>, perimeter: bool) -> Self {
        Self {
            point,
            perimeter,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedStyle {
    pub shape: Option<String>,
    pub perimeter: Option<String>,
    pub perimeter_spacing: f64,
    pub source_perimeter_spacing: f64,
    pub target_perimeter_spacing: f64,
    pub edge_style: Option<String>,
    pub no_edge_style: bool,
    pub loop_style: Option<String>,
    pub orthogonal: Option<bool>,
    pub elbow: Elbow,
    pub rotation: f64,
    pub flip_h: bool,
    pub flip_v: bool,
    pub direction: Option<Direction>,
    pub anchor_point_direction: bool,
    pub source_constraint: Option<ConnectionConstraint>,
    pub target_constraint: Option<ConnectionConstraint>,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub segment: Option<f64>,
    pub jetty_size: Option<f64>,
    pub routing_center_x: f64,
    pub routing_center_y: f64,
    pub label_position: LabelPosition,
    pub vertical_label_position: VerticalLabelPosition,
    pub label_width: Option<f64>,
    pub align: LabelPosition,
    pub movable: Option<bool>,
    pub resizable: Option<bool>,
    pub editable: Option<bool>,
    pub deletable: Option<bool>,
    pub bendable: Option<bool>,
    pub foldable: Option<bool>,
    pub connectable: Option<bool>,
    pub cloneable: Option<bool>,
    pub rotatable: Option<bool>,
    pub aspect_fixed: bool,
    pub resize_width: Option<bool>,
    pub resize_height: Option<bool>,
    pub overlap: f64,
    pub start_size: f64,
    /// The merged map, for keys without a typed field.
    pub raw: StyleMap,
}

impl ResolvedStyle {
    pub fn from_map(map: &StyleMap) -> Self {
        let r = Reader(map);
        Self {
            shape: r.string(keys::SHAPE),
            perimeter: r.string(keys::PERIMETER),
            perimeter_spacing: r.number(keys::PERIMETER_SPACING).unwrap_or(0.0),
            source_perimeter_spacing: r.number(keys::SOURCE_PERIMETER_SPACING).unwrap_or(0.0),
            target_perimeter_spacing: r.number(keys::TARGET_PERIMETER_SPACING).unwrap_or(0.0),
            edge_style: r.string(keys::EDGE_STYLE),
            no_edge_style: r.flag(keys::NO_EDGE_STYLE).unwrap_or(false),
            loop_style: r.string(keys::LOOP),
            orthogonal: r.flag(keys::ORTHOGONAL),
            elbow: match map.get(keys::ELBOW).map(String::as_str) {
                Some("vertical") => Elbow::Vertical,
                _ => Elbow::Horizontal,
            },
            rotation: r.number(keys::ROTATION).unwrap_or(0.0),
            flip_h: r.flag(keys::FLIP_H).unwrap_or(false),
            flip_v: r.flag(keys::FLIP_V).unwrap_or(false),
            direction: r.parsed(keys::DIRECTION),
            anchor_point_direction: r.flag(keys::ANCHOR_POINT_DIRECTION).unwrap_or(true),
            source_constraint: r.constraint(
                keys::EXIT_X,
                keys::EXIT_Y,
                keys::EXIT_PERIMETER,
                keys::EXIT_DX,
                keys::EXIT_DY,
            ),
            target_constraint: r.constraint(
                keys::ENTRY_X,
                keys::ENTRY_Y,
                keys::ENTRY_PERIMETER,
                keys::ENTRY_DX,
                keys::ENTRY_DY,
            ),
            source_port: r.string(keys::SOURCE_PORT),
            target_port: r.string(keys::TARGET_PORT),
            segment: r.number(keys::SEGMENT),
            jetty_size: r.number(keys::JETTY_SIZE),
            routing_center_x: r.number(keys::ROUTING_CENTER_X).unwrap_or(0.0),
            routing_center_y: r.number(keys::ROUTING_CENTER_Y).unwrap_or(0.0),
            label_position: match map.get(keys::LABEL_POSITION).map(String::as_str) {
                Some("left") => LabelPosition::Left,
                Some("right") => LabelPosition::Right,
                _ => LabelPosition::Center,
            },
            vertical_label_position: match map
                .get(keys::VERTICAL_LABEL_POSITION)
                .map(String::as_str)
            {
                Some("top") => VerticalLabelPosition::Top,
                Some("bottom") => VerticalLabelPosition::Bottom,
                _ => VerticalLabelPosition::Middle,
            },
            label_width: r.number(keys::LABEL_WIDTH),
            align: match map.get(keys::ALIGN).map(String::as_str) {
                Some("left") => LabelPosition::Left,
                Some("right") => LabelPosition::Right,
                _ => LabelPosition::Center,
            },
            movable: r.flag(keys::MOVABLE),
            resizable: r.flag(keys::RESIZABLE),
            editable: r.flag(keys::EDITABLE),
            deletable: r.flag(keys::DELETABLE),
            bendable: r.flag(keys::BENDABLE),
            foldable: r.flag(keys::FOLDABLE),
            connectable: r.flag(keys::CONNECTABLE),
            cloneable: r.flag(keys::CLONEABLE),
            rotatable: r.flag(keys::ROTATABLE),
            aspect_fixed: map.get(keys::ASPECT).is_some_and(|v| v == "fixed"),
            resize_width: r.flag(keys::RESIZE_WIDTH),
            resize_height: r.flag(keys::RESIZE_HEIGHT),
            overlap: r.number(keys::OVERLAP).unwrap_or(0.0),
            start_size: r.number(keys::START_SIZE).unwrap_or(0.0),
            raw: map.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn constraint(&self, source: bool) -> Option<ConnectionConstraint> {
        if source {
            self.source_constraint
        } else {
            self.target_constraint
        }
    }

    pub fn perimeter_spacing_for(&self, source: bool) -> f64 {
        if source {
            self.source_perimeter_spacing
        } else {
            self.target_perimeter_spacing
        }
    }

    pub fn port(&self, source: bool) -> Option<&str> {
        if source {
            self.source_port.as_deref()
        } else {
            self.target_port.as_deref()
        }
    }
}

struct Reader<'a>(&'a StyleMap);

impl Reader<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn number(&self, key: &str) -> Option<f64> {
        let raw = self.0.get(key)?;
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                tracing::warn!(key, value = %raw, "ignoring non-numeric style value");
                None
            }
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        let raw = self.0.get(key)?;
        match raw.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => {
                tracing::warn!(key, value = other, "ignoring non-boolean style value");
                None
            }
        }
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.0.get(key)?;
        let parsed = raw.parse::<T>().ok();
        if parsed.is_none() {
            tracing::warn!(key, value = %raw, "ignoring unknown style value");
        }
        parsed
    }

    fn constraint(
        &self,
        x: &str,
        y: &str,
        perimeter: &str,
        dx: &str,
        dy: &str,
    ) -> Option<ConnectionConstraint> {
        let (Some(px), Some(py)) = (self.number(x), self.number(y)) else {
            return None;
        };
        Some(ConnectionConstraint {
            point: Some(point(px, py)),
            perimeter: self.flag(perimeter).unwrap_or(true),
            dx: self.number(dx).unwrap_or(0.0),
            dy: self.number(dy).unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> StyleMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn constraint_requires_both_coordinates() {
        let s = ResolvedStyle::from_map(&map(&[("exitX", "1"), ("entryX", "0"), ("entryY", "0.5")]));
        assert_eq!(s.source_constraint, None);
        let c = s.target_constraint.unwrap();
        assert_eq!(c.point, Some(point(0.0, 0.5)));
        assert!(c.perimeter);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let s = ResolvedStyle::from_map(&map(&[
            ("rotation", "abc"),
            ("movable", "maybe"),
            ("direction", "up"),
        ]));
        assert_eq!(s.rotation, 0.0);
        assert_eq!(s.movable, None);
        assert_eq!(s.direction, None);
    }
}

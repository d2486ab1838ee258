//! Style sheets and style strings.
//!
//! A cell style is a string of the form `name;key=value;...`. Names pull in named styles from
//! the [`StyleSheet`], `key=value` pairs override single keys and `key=none` removes a key. The
//! merged [`StyleMap`] is resolved once per view state into a typed [`ResolvedStyle`].

mod resolved;

pub use resolved::{
    ConnectionConstraint, Direction, Elbow, LabelPosition, ResolvedStyle, VerticalLabelPosition,
};

use crate::model::{Cell, CellKind};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;

pub type StyleMap = IndexMap<String, String>;

pub mod keys {
    pub const PERIMETER: &str = "perimeter";
    pub const PERIMETER_SPACING: &str = "perimeterSpacing";
    pub const SOURCE_PERIMETER_SPACING: &str = "sourcePerimeterSpacing";
    pub const TARGET_PERIMETER_SPACING: &str = "targetPerimeterSpacing";
    pub const SHAPE: &str = "shape";
    pub const EDGE_STYLE: &str = "edgeStyle";
    pub const NO_EDGE_STYLE: &str = "noEdgeStyle";
    pub const LOOP: &str = "loop";
    pub const ORTHOGONAL_LOOP: &str = "orthogonalLoop";
    pub const ORTHOGONAL: &str = "orthogonal";
    pub const ELBOW: &str = "elbow";
    pub const ROTATION: &str = "rotation";
    pub const FLIP_H: &str = "flipH";
    pub const FLIP_V: &str = "flipV";
    pub const DIRECTION: &str = "direction";
    pub const ANCHOR_POINT_DIRECTION: &str = "anchorPointDirection";
    pub const EXIT_X: &str = "exitX";
    pub const EXIT_Y: &str = "exitY";
    pub const EXIT_DX: &str = "exitDx";
    pub const EXIT_DY: &str = "exitDy";
    pub const EXIT_PERIMETER: &str = "exitPerimeter";
    pub const ENTRY_X: &str = "entryX";
    pub const ENTRY_Y: &str = "entryY";
    pub const ENTRY_DX: &str = "entryDx";
    pub const ENTRY_DY: &str = "entryDy";
    pub const ENTRY_PERIMETER: &str = "entryPerimeter";
    pub const SOURCE_PORT: &str = "sourcePort";
    pub const TARGET_PORT: &str = "targetPort";
    pub const SEGMENT: &str = "segment";
    pub const JETTY_SIZE: &str = "jettySize";
    pub const ROUTING_CENTER_X: &str = "routingCenterX";
    pub const ROUTING_CENTER_Y: &str = "routingCenterY";
    pub const LABEL_POSITION: &str = "labelPosition";
    pub const VERTICAL_LABEL_POSITION: &str = "verticalLabelPosition";
    pub const LABEL_WIDTH: &str = "labelWidth";
    pub const ALIGN: &str = "align";
    pub const MOVABLE: &str = "movable";
    pub const RESIZABLE: &str = "resizable";
    pub const EDITABLE: &str = "editable";
    pub const DELETABLE: &str = "deletable";
    pub const BENDABLE: &str = "bendable";
    pub const FOLDABLE: &str = "foldable";
    pub const CONNECTABLE: &str = "connectable";
    pub const CLONEABLE: &str = "cloneable";
    pub const ROTATABLE: &str = "rotatable";
    pub const ASPECT: &str = "aspect";
    pub const RESIZE_WIDTH: &str = "resizeWidth";
    pub const RESIZE_HEIGHT: &str = "resizeHeight";
    pub const OVERLAP: &str = "overlap";
    pub const START_SIZE: &str = "startSize";
}

pub const DEFAULT_VERTEX: &str = "defaultVertex";
pub const DEFAULT_EDGE: &str = "defaultEdge";

/// Produces the merged style of a cell. Implemented by [`StyleSheet`]; views only depend on
/// this contract.
pub trait StyleResolver {
    fn cell_style(&self, cell: &Cell) -> StyleMap;
    fn default_vertex_style(&self) -> StyleMap;
    fn default_edge_style(&self) -> StyleMap;
}

#[derive(Debug, Clone)]
pub struct StyleSheet {
    styles: IndexMap<String, StyleMap>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let mut sheet = Self {
            styles: IndexMap::new(),
        };
        sheet.put_style(
            DEFAULT_VERTEX,
            StyleMap::from_iter([
                (keys::SHAPE.to_string(), "rectangle".to_string()),
                (keys::PERIMETER.to_string(), "rectanglePerimeter".to_string()),
            ]),
        );
        sheet.put_style(
            DEFAULT_EDGE,
            StyleMap::from_iter([(keys::SHAPE.to_string(), "connector".to_string())]),
        );
        sheet
    }
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_style(&mut self, name: impl Into<String>, style: StyleMap) {
        self.styles.insert(name.into(), style);
    }

    pub fn style(&self, name: &str) -> Option<&StyleMap> {
        self.styles.get(name)
    }

    /// Loads named styles from a JSON object of objects:
    /// `{"rounded": {"perimeter": "ellipsePerimeter"}}`.
    ///
    /// Non-string values are stored in their JSON form. String values starting with `=` are
    /// treated as expressions, see [`eval_expression`].
    pub fn load_json(&mut self, value: &Value) -> Result<()> {
        let Some(map) = value.as_object() else {
            return Ok(());
        };
        for (name, entries) in map {
            let Some(entries) = entries.as_object() else {
                tracing::warn!(style = %name, "ignoring non-object style entry");
                continue;
            };
            let mut style = self.styles.get(name).cloned().unwrap_or_default();
            for (key, v) in entries {
                let text = match v {
                    Value::String(s) => match s.strip_prefix('=') {
                        Some(expr) => match eval_expression(expr)? {
                            Some(Value::String(s)) => s,
                            Some(other) => other.to_string(),
                            None => continue,
                        },
                        None => s.clone(),
                    },
                    other => other.to_string(),
                };
                style.insert(key.clone(), text);
            }
            self.styles.insert(name.clone(), style);
        }
        Ok(())
    }

    /// Merges a style string on top of `base`.
    pub fn apply(&self, base: &StyleMap, style: Option<&str>) -> StyleMap {
        let mut out = base.clone();
        let Some(style) = style else {
            return out;
        };
        for token in style.split(';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, "none")) => {
                    out.shift_remove(key);
                }
                Some((key, value)) => {
                    out.insert(key.to_string(), value.to_string());
                }
                None => {
                    if let Some(named) = self.styles.get(token) {
                        for (k, v) in named {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                }
            }
        }
        out
    }
}

impl StyleResolver for StyleSheet {
    fn cell_style(&self, cell: &Cell) -> StyleMap {
        let base = match cell.kind() {
            CellKind::Edge => self.default_edge_style(),
            CellKind::Vertex => self.default_vertex_style(),
            CellKind::Structural => StyleMap::new(),
        };
        self.apply(&base, cell.style())
    }

    fn default_vertex_style(&self) -> StyleMap {
        self.styles.get(DEFAULT_VERTEX).cloned().unwrap_or_default()
    }

    fn default_edge_style(&self) -> StyleMap {
        self.styles.get(DEFAULT_EDGE).cloned().unwrap_or_default()
    }
}

/// Evaluates a style expression.
///
/// Only JSON literals are supported. Function definitions fail fast; anything else that does not
/// parse is logged and yields `None`.
pub fn eval_expression(expression: &str) -> Result<Option<Value>> {
    let trimmed = expression.trim();
    if trimmed.starts_with("function") || trimmed.contains("=>") {
        return Err(Error::UnsupportedExpression {
            expression: trimmed.to_string(),
        });
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => Ok(Some(v)),
        Err(err) => {
            tracing::warn!(expression = trimmed, %err, "failed to evaluate style expression");
            Ok(None)
        }
    }
}

/// Sets (or removes, with `None`) one key in a style string, keeping all other tokens in order.
/// A key or value containing `;` or `=` is rejected, as is an empty key.
pub fn set_style_value(
    style: Option<&str>,
    key: &str,
    value: Option<&str>,
) -> Result<Option<String>> {
    let malformed = |s: &str| s.contains([';', '=']);
    if key.is_empty() || malformed(key) || value.is_some_and(malformed) {
        return Err(Error::InvalidStyleValue {
            key: key.to_string(),
            value: value.unwrap_or_default().to_string(),
        });
    }
    let mut tokens: Vec<String> = Vec::new();
    let mut replaced = false;
    for token in style.unwrap_or_default().split(';') {
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((k, _)) if k == key => {
                if let Some(v) = value {
                    if !replaced {
                        tokens.push(format!("{key}={v}"));
                    }
                }
                replaced = true;
            }
            _ => tokens.push(token.to_string()),
        }
    }
    if !replaced {
        if let Some(v) = value {
            tokens.push(format!("{key}={v}"));
        }
    }
    Ok((!tokens.is_empty()).then(|| tokens.join(";")))
}

/// Reads a single key from a style string without resolving named styles.
pub fn style_value<'a>(style: Option<&'a str>, key: &str) -> Option<&'a str> {
    style?
        .split(';')
        .filter_map(|t| t.split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_merges_named_styles_and_removes_none() {
        let mut sheet = StyleSheet::new();
        sheet.put_style(
            "round",
            StyleMap::from_iter([("perimeter".to_string(), "ellipsePerimeter".to_string())]),
        );
        let out = sheet.apply(
            &sheet.default_vertex_style(),
            Some("round;rotation=45;shape=none"),
        );
        assert_eq!(out.get("perimeter").map(String::as_str), Some("ellipsePerimeter"));
        assert_eq!(out.get("rotation").map(String::as_str), Some("45"));
        assert!(!out.contains_key("shape"));
    }

    #[test]
    fn set_style_value_replaces_appends_and_removes() {
        let s = set_style_value(Some("round;exitX=0"), "exitX", Some("1")).unwrap();
        assert_eq!(s.as_deref(), Some("round;exitX=1"));
        let s = set_style_value(s.as_deref(), "exitY", Some("0.5")).unwrap();
        assert_eq!(s.as_deref(), Some("round;exitX=1;exitY=0.5"));
        let s = set_style_value(s.as_deref(), "exitX", None).unwrap();
        assert_eq!(s.as_deref(), Some("round;exitY=0.5"));
        assert_eq!(set_style_value(Some("a=1"), "a", None).unwrap(), None);
        assert_eq!(style_value(Some("round;exitY=0.5"), "exitY"), Some("0.5"));
    }

    #[test]
    fn set_style_value_rejects_separators() {
        let cases = [
            ("fill;x", Some("1")),
            ("fill", Some("a=b")),
            ("", None),
            ("k", Some("1;2")),
        ];
        for (key, value) in cases {
            assert!(matches!(
                set_style_value(Some("round"), key, value),
                Err(Error::InvalidStyleValue { .. })
            ));
        }
    }

    #[test]
    fn function_expressions_fail_fast() {
        assert!(matches!(
            eval_expression("function() { return 1; }"),
            Err(Error::UnsupportedExpression { .. })
        ));
        assert_eq!(eval_expression("42").ok().flatten(), Some(Value::from(42)));
        assert_eq!(eval_expression("not json").ok().flatten(), None);
    }
}

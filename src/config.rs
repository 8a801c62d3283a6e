// SPDX: CC0-1.0

//! Serializable plot and geometry configuration.

use crate::{
    eval::{Ident, IdentKey},
    geometry::GeometryItem,
    map::DEFAULT_PADDING,
    shell::most_similar,
    stdlib::{self, X},
    vars::VariableConfig,
    Domain, Number,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Colors assigned to functions that don't bring their own.
pub const PALETTE: &[&str] = &[
    "#2563eb", "#dc2626", "#16a34a", "#9333ea", "#ea580c", "#0891b2", "#db2777",
];

pub const DEFAULT_WIDTH: Number = 600.0;
pub const DEFAULT_HEIGHT: Number = 400.0;
pub const DEFAULT_GEOMETRY_WIDTH: Number = 400.0;
pub const DEFAULT_GEOMETRY_HEIGHT: Number = 300.0;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown preset '{name}'{}", hint(.suggestion))]
    UnknownPreset {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("{axis} domain [{min}, {max}] is empty")]
    EmptyDomain {
        axis: char,
        min: Number,
        max: Number,
    },
    #[error("variable '{key}' has a step of {step}, it must be positive")]
    BadStep { key: String, step: Number },
    #[error("variable '{key}' has min {min} above max {max}")]
    BadRange { key: String, min: Number, max: Number },
    #[error("variable '{key}' is named like a function or the free variable")]
    ReservedName { key: String },
    #[error("viewport {width}x{height} leaves no room inside the padding")]
    TinyViewport { width: Number, height: Number },
}

fn hint(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

fn default_range() -> [Number; 2] {
    [-5.0, 5.0]
}

fn default_true() -> bool {
    true
}

fn default_geometry_width() -> Number {
    DEFAULT_GEOMETRY_WIDTH
}

fn default_geometry_height() -> Number {
    DEFAULT_GEOMETRY_HEIGHT
}

fn default_axis_labels() -> [String; 2] {
    ["x".to_string(), "y".to_string()]
}

pub(crate) fn to_domain(x: [Number; 2], y: [Number; 2]) -> Domain {
    Domain::new(x[0]..x[1], y[0]..y[1])
}

fn check_axis(axis: char, range: [Number; 2]) -> Result<(), ConfigError> {
    let [min, max] = range;
    // also rejects NaN bounds
    if min < max {
        Ok(())
    } else {
        Err(ConfigError::EmptyDomain { axis, min, max })
    }
}

fn check_viewport(width: Number, height: Number) -> Result<(), ConfigError> {
    if width > 2.0 * DEFAULT_PADDING && height > 2.0 * DEFAULT_PADDING {
        Ok(())
    } else {
        Err(ConfigError::TinyViewport { width, height })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotFunction {
    pub expr: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub label: String,
}

impl PlotFunction {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            color: String::new(),
            label: String::new(),
        }
    }

    /// Fills in a palette color and a label derived from the expression.
    pub fn with_defaults(mut self, idx: usize) -> Self {
        if self.color.is_empty() {
            self.color = PALETTE[idx % PALETTE.len()].to_string();
        }
        if self.label.is_empty() {
            self.label = format!("y = {}", self.expr);
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    pub functions: Vec<PlotFunction>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableConfig>,
    #[serde(default = "default_range")]
    pub x_domain: [Number; 2],
    #[serde(default = "default_range")]
    pub y_domain: [Number; 2],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            functions: Vec::new(),
            variables: BTreeMap::new(),
            x_domain: default_range(),
            y_domain: default_range(),
        }
    }
}

impl PlotConfig {
    pub fn domain(&self) -> Domain {
        to_domain(self.x_domain, self.y_domain)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_axis('x', self.x_domain)?;
        check_axis('y', self.y_domain)?;
        let idents = stdlib::standard_idents();
        for (key, var) in &self.variables {
            // calls are resolved at parse time, so a function name can't be rebound
            let is_fun = matches!(
                idents.get(&IdentKey::Owned(key.clone())),
                Some(Ident::Fun(_))
            );
            if is_fun || key == X {
                return Err(ConfigError::ReservedName { key: key.clone() });
            }
            if !(var.step > 0.0) {
                return Err(ConfigError::BadStep {
                    key: key.clone(),
                    step: var.step,
                });
            }
            if !(var.min <= var.max) {
                return Err(ConfigError::BadRange {
                    key: key.clone(),
                    min: var.min,
                    max: var.max,
                });
            }
        }
        Ok(())
    }
}

/// A full configuration, or the name of a preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlotSpec {
    Preset(String),
    Config(PlotConfig),
}

impl PlotSpec {
    pub fn resolve(self) -> Result<PlotConfig, ConfigError> {
        match self {
            Self::Config(config) => Ok(config),
            Self::Preset(name) => preset(&name).ok_or_else(|| ConfigError::UnknownPreset {
                suggestion: most_similar(&name, PRESETS.iter().map(|p| p.name)),
                name,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Preset {
    pub name: &'static str,
    pub expr: &'static str,
    pub x_domain: [Number; 2],
    pub y_domain: [Number; 2],
}

const TRIG_X: [Number; 2] = [-6.5, 6.5];

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "linear",
        expr: "2*x + 1",
        x_domain: [-5.0, 5.0],
        y_domain: [-5.0, 5.0],
    },
    Preset {
        name: "quadratic",
        expr: "x*x - 2",
        x_domain: [-4.0, 4.0],
        y_domain: [-3.0, 6.0],
    },
    Preset {
        name: "cubic",
        expr: "x*x*x - 3*x",
        x_domain: [-3.0, 3.0],
        y_domain: [-5.0, 5.0],
    },
    Preset {
        name: "sqrt",
        expr: "Math.sqrt(x)",
        x_domain: [-1.0, 9.0],
        y_domain: [-1.0, 4.0],
    },
    Preset {
        name: "abs",
        expr: "Math.abs(x)",
        x_domain: [-5.0, 5.0],
        y_domain: [-1.0, 5.0],
    },
    Preset {
        name: "reciprocal",
        expr: "1/x",
        x_domain: [-5.0, 5.0],
        y_domain: [-5.0, 5.0],
    },
    Preset {
        name: "exponential",
        expr: "Math.exp(x)",
        x_domain: [-4.0, 3.0],
        y_domain: [-1.0, 10.0],
    },
    Preset {
        name: "logarithm",
        expr: "Math.log(x)",
        x_domain: [-1.0, 8.0],
        y_domain: [-4.0, 3.0],
    },
    Preset {
        name: "sin",
        expr: "Math.sin(x)",
        x_domain: TRIG_X,
        y_domain: [-1.5, 1.5],
    },
    Preset {
        name: "cos",
        expr: "Math.cos(x)",
        x_domain: TRIG_X,
        y_domain: [-1.5, 1.5],
    },
    Preset {
        name: "tan",
        expr: "Math.tan(x)",
        x_domain: TRIG_X,
        y_domain: [-5.0, 5.0],
    },
    Preset {
        name: "arcsin",
        expr: "Math.asin(x)",
        x_domain: [-1.5, 1.5],
        y_domain: [-2.0, 2.0],
    },
    Preset {
        name: "arccos",
        expr: "Math.acos(x)",
        x_domain: [-1.5, 1.5],
        y_domain: [-0.5, 3.5],
    },
    Preset {
        name: "arctan",
        expr: "Math.atan(x)",
        x_domain: [-8.0, 8.0],
        y_domain: [-2.0, 2.0],
    },
];

pub fn preset(name: &str) -> Option<PlotConfig> {
    PRESETS.iter().find(|p| p.name == name).map(|p| PlotConfig {
        functions: vec![PlotFunction::new(p.expr)],
        variables: BTreeMap::new(),
        x_domain: p.x_domain,
        y_domain: p.y_domain,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryConfig {
    pub items: Vec<GeometryItem>,
    #[serde(default = "default_range")]
    pub x_domain: [Number; 2],
    #[serde(default = "default_range")]
    pub y_domain: [Number; 2],
    #[serde(default = "default_geometry_width")]
    pub width: Number,
    #[serde(default = "default_geometry_height")]
    pub height: Number,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_true")]
    pub show_axes: bool,
    #[serde(default = "default_axis_labels")]
    pub axis_labels: [String; 2],
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hide_labels: bool,
}

impl GeometryConfig {
    pub fn new(items: Vec<GeometryItem>) -> Self {
        Self {
            items,
            x_domain: default_range(),
            y_domain: default_range(),
            width: DEFAULT_GEOMETRY_WIDTH,
            height: DEFAULT_GEOMETRY_HEIGHT,
            show_grid: true,
            show_axes: true,
            axis_labels: default_axis_labels(),
            title: None,
            hide_labels: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_axis('x', self.x_domain)?;
        check_axis('y', self.y_domain)?;
        check_viewport(self.width, self.height)
    }
}

// SPDX: CC0-1.0

//! The function plot widget: functions, slider variables, cached
//! intersections and the fullscreen explorer.

use crate::{
    config::{ConfigError, PlotConfig, PlotFunction},
    expr::{Bindings, Expr},
    intersect::{self, Intersection},
    map::{Mapper, DEFAULT_PADDING},
    probe::{self, ProbeState, Readout},
    sample::{self, Segment, PLOT_STEP_FACTOR},
    vars::{Notifier, SavedState, VarError, Variables},
    Domain, Number, Point,
};

/// Sampled polyline segments of one function.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub index: usize,
    pub label: String,
    pub color: String,
    pub segments: Vec<Segment>,
}

/// The enlarged view with live pointer tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct Explorer {
    pub mapper: Mapper,
    pub probe: ProbeState,
}

#[derive(Debug)]
pub struct FunctionPlot {
    // parallel, indexed by registration order
    functions: Vec<PlotFunction>,
    exprs: Vec<Expr>,
    domain: Domain,
    variables: Variables,
    // NOTE: None after a variable changes, filled on next access
    intersections: Option<Vec<Intersection>>,
    explorer: Option<Explorer>,
}

impl FunctionPlot {
    /// Builds a plot, replaying `saved` over the configured variable values.
    pub fn new(config: PlotConfig, saved: Option<&SavedState>) -> Result<Self, ConfigError> {
        config.validate()?;
        let domain = config.domain();
        let functions: Vec<PlotFunction> = config
            .functions
            .into_iter()
            .enumerate()
            .map(|(idx, function)| function.with_defaults(idx))
            .collect();
        let exprs = functions.iter().map(|f| Expr::compile(&f.expr)).collect();
        let mut variables = Variables::new(config.variables);
        if let Some(saved) = saved {
            variables.restore(saved);
        }
        Ok(Self {
            functions,
            exprs,
            domain,
            variables,
            intersections: None,
            explorer: None,
        })
    }

    pub fn set_notifier(&mut self, notify: Option<Notifier>) {
        self.variables.set_notifier(notify);
    }

    pub fn functions(&self) -> &[PlotFunction] {
        &self.functions
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    fn bindings(&self) -> Bindings {
        Bindings::new(&self.variables.values())
    }

    fn invalidate(&mut self, changed: bool) -> bool {
        if changed {
            self.intersections = None;
        }
        changed
    }

    /// Clamped write to a variable. Returns whether the value changed.
    pub fn set_variable(&mut self, key: &str, value: Number) -> Result<bool, VarError> {
        let changed = self.variables.set_value(key, value)?;
        Ok(self.invalidate(changed))
    }

    pub fn increment(&mut self, key: &str) -> Result<bool, VarError> {
        let changed = self.variables.increment(key)?;
        Ok(self.invalidate(changed))
    }

    pub fn decrement(&mut self, key: &str) -> Result<bool, VarError> {
        let changed = self.variables.decrement(key)?;
        Ok(self.invalidate(changed))
    }

    /// Values of every function at `x`, in registration order.
    pub fn values_at(&self, x: Number) -> Vec<Number> {
        let mut bindings = self.bindings();
        self.exprs
            .iter()
            .map(|expr| expr.eval(&mut bindings, x))
            .collect()
    }

    pub fn mapper(&self, width: Number, height: Number) -> Mapper {
        Mapper::new(self.domain.clone(), width, height, DEFAULT_PADDING)
    }

    pub fn curves(&self, mapper: &Mapper) -> Vec<Curve> {
        let mut bindings = self.bindings();
        self.functions
            .iter()
            .zip(&self.exprs)
            .enumerate()
            .map(|(index, (f, expr))| Curve {
                index,
                label: f.label.clone(),
                color: f.color.clone(),
                segments: sample::sample(expr, &mut bindings, mapper, PLOT_STEP_FACTOR),
            })
            .collect()
    }

    pub fn intersections(&mut self) -> &[Intersection] {
        if self.intersections.is_none() {
            let mut bindings = self.bindings();
            self.intersections = Some(intersect::find_intersections(
                &self.exprs,
                &self.domain.x,
                &mut bindings,
            ));
        }
        self.intersections.as_deref().unwrap_or_default()
    }

    pub fn open_explorer(&mut self, width: Number, height: Number) {
        self.explorer = Some(Explorer {
            mapper: self.mapper(width, height),
            probe: ProbeState::Idle,
        });
    }

    pub fn resize_explorer(&mut self, width: Number, height: Number) {
        let mapper = self.mapper(width, height);
        if let Some(ref mut explorer) = self.explorer {
            explorer.mapper = mapper;
        }
    }

    pub fn close_explorer(&mut self) {
        self.explorer = None;
    }

    pub fn explorer(&self) -> Option<&Explorer> {
        self.explorer.as_ref()
    }

    pub fn pointer_enter(&mut self, pointer: Point<Number>) {
        if let Some(ref mut explorer) = self.explorer {
            explorer.probe.enter(pointer);
        }
    }

    pub fn pointer_move(&mut self, pointer: Point<Number>) {
        if let Some(ref mut explorer) = self.explorer {
            explorer.probe.moved(pointer);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(ref mut explorer) = self.explorer {
            explorer.probe.leave();
        }
    }

    /// Tooltip for the current pointer, `None` unless the explorer is open
    /// and the pointer is inside it.
    pub fn readout(&mut self) -> Option<Readout> {
        let (mapper, pointer) = {
            let explorer = self.explorer.as_ref()?;
            (explorer.mapper.clone(), explorer.probe.pointer()?)
        };
        self.intersections();
        let hits = self.intersections.as_deref().unwrap_or_default();
        let (x, snapped) = probe::resolve(&mapper, pointer.x, hits);
        let vals = self.values_at(x);
        let rows = self
            .functions
            .iter()
            .zip(vals)
            .map(|(f, val)| (f.label.as_str(), f.color.as_str(), val));
        Some(Readout::new(&mapper, x, snapped, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{HostMessage, VariableConfig};
    use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

    fn lines() -> PlotConfig {
        let mut variables = BTreeMap::new();
        variables.insert(
            "a".to_string(),
            VariableConfig {
                min: -3.0,
                max: 3.0,
                step: 0.5,
                value: 1.0,
                label: Some("slope".to_string()),
            },
        );
        PlotConfig {
            functions: vec![PlotFunction::new("a*x"), PlotFunction::new("2-x")],
            variables,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn variables_invalidate_intersections() {
        let mut plot = FunctionPlot::new(lines(), None).unwrap();
        assert!((plot.intersections()[0].x - 1.0).abs() < 1e-6);
        assert_eq!(plot.set_variable("a", 3.0), Ok(true));
        // a*x = 2 - x at x = 2 / (a + 1)
        assert!((plot.intersections()[0].x - 0.5).abs() < 1e-6);
        assert_eq!(plot.decrement("a"), Ok(true));
        assert!((plot.intersections()[0].x - 2.0 / 3.5).abs() < 1e-6);
    }

    #[test]
    fn saved_state_restores_and_notifications_replay() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut plot = FunctionPlot::new(lines(), None).unwrap();
        let sink = Rc::clone(&sent);
        plot.set_notifier(Some(Box::new(move |msg: &HostMessage| {
            sink.borrow_mut().push(msg.clone())
        })));
        plot.set_variable("a", 2.5).unwrap();
        plot.set_variable("a", 2.5).unwrap();
        assert_eq!(sent.borrow().len(), 1);

        let HostMessage::UpdateState { state } = sent.borrow()[0].clone();
        let restored = FunctionPlot::new(lines(), Some(&state)).unwrap();
        assert_eq!(restored.variables().values(), plot.variables().values());
        assert_eq!(restored.values_at(2.0), plot.values_at(2.0));
    }

    #[test]
    fn readout_requires_open_explorer_and_pointer() {
        let mut plot = FunctionPlot::new(lines(), None).unwrap();
        plot.pointer_move(Point::new(100.0, 100.0));
        assert!(plot.readout().is_none());

        plot.open_explorer(1060.0, 630.0);
        assert!(plot.readout().is_none());

        // 100 px per unit, x = 1 sits at 630 px
        plot.pointer_enter(Point::new(634.0, 300.0));
        let readout = plot.readout().unwrap();
        assert_eq!(readout.intersection.map(|i| (i.f_idx1, i.f_idx2)), Some((0, 1)));
        assert!((readout.x - 1.0).abs() < 1e-6);
        assert!(readout.ys.iter().all(|row| row.highlighted));
        assert!((readout.ys[0].val - 1.0).abs() < 1e-6);

        // x = -2 sits at 330 px
        plot.pointer_move(Point::new(330.0, 300.0));
        let readout = plot.readout().unwrap();
        assert!(readout.intersection.is_none());
        assert!((readout.x + 2.0).abs() < 1e-9);
        assert!((readout.ys[1].val - 4.0).abs() < 1e-9);

        plot.pointer_leave();
        assert!(plot.readout().is_none());
        plot.pointer_enter(Point::new(330.0, 300.0));
        plot.close_explorer();
        assert!(plot.readout().is_none());
    }

    #[test]
    fn curves_follow_registration_order() {
        let plot = FunctionPlot::new(lines(), None).unwrap();
        let curves = plot.curves(&plot.mapper(400.0, 300.0));
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[1].index, 1);
        assert_eq!(curves[1].label, "y = 2-x");
        assert!(!curves[0].color.is_empty());
        assert_ne!(curves[0].color, curves[1].color);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PlotConfig {
            y_domain: [2.0, -2.0],
            ..lines()
        };
        assert!(FunctionPlot::new(config, None).is_err());
    }
}

// SPDX: CC0-1.0

use core::f64::consts::PI;
use function_plot::{
    config::{GeometryConfig, PlotConfig, PlotSpec},
    expr::{Bindings, Expr},
    geometry::Scene,
    map::{Mapper, DEFAULT_PADDING},
    plot::FunctionPlot,
    sample::{self, PLOT_STEP_FACTOR},
    vars::{HostMessage, SavedState},
    Domain, Point,
};
use std::{cell::RefCell, rc::Rc};

fn same_function_two_forms() -> PlotConfig {
    let spec: PlotSpec = serde_json::from_str(
        r##"{
            "functions": [
                {"expr": "Math.sin(x)+Math.cos(x)", "color": "#2563eb", "label": "sin + cos"},
                {"expr": "1.414*Math.sin(x+0.785)", "color": "#dc2626", "label": "shifted sine"}
            ],
            "xDomain": [-3.14, 6.28]
        }"##,
    )
    .unwrap();
    spec.resolve().unwrap()
}

#[test]
fn algebraic_forms_agree_everywhere() {
    let plot = FunctionPlot::new(same_function_two_forms(), None).unwrap();
    assert_eq!(plot.domain().y, -5.0..5.0);
    for k in 0..=200 {
        let x = -3.14 + 9.42 * k as f64 / 200.0;
        let vals = plot.values_at(x);
        assert!(vals.iter().all(|v| v.is_finite()));
        assert!((vals[0] - vals[1]).abs() < 1e-2, "x = {x}: {vals:?}");
    }
}

#[test]
fn intersections_repeat_with_the_period() {
    let mut plot = FunctionPlot::new(same_function_two_forms(), None).unwrap();
    let hits = plot.intersections().to_vec();
    // the two forms differ by a tiny sinusoid, which vanishes every half period
    assert!(hits.len() >= 2, "{hits:?}");
    assert!(hits.iter().all(|hit| (hit.f_idx1, hit.f_idx2) == (0, 1)));
    for pair in hits.windows(2) {
        assert!((pair[1].x - pair[0].x - PI).abs() < 0.05, "{hits:?}");
    }
    for pair in hits.windows(3) {
        assert!((pair[2].x - pair[0].x - 2.0 * PI).abs() < 0.05, "{hits:?}");
    }
}

#[test]
fn curves_are_unbroken_on_screen() {
    let plot = FunctionPlot::new(same_function_two_forms(), None).unwrap();
    let mapper = plot.mapper(600.0, 400.0);
    for curve in plot.curves(&mapper) {
        assert_eq!(curve.segments.len(), 1, "{}", curve.label);
    }
}

#[test]
fn host_messages_restore_the_session() {
    let spec: PlotSpec = serde_json::from_str(
        r#"{
            "functions": [{"expr": "a*x^2 + b"}],
            "variables": {
                "a": {"min": -2, "max": 2, "step": 0.5, "value": 1, "label": "stretch"},
                "b": {"min": -3, "max": 3, "step": 1, "value": 0}
            }
        }"#,
    )
    .unwrap();
    let config = spec.resolve().unwrap();

    let sent = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&sent);
    let mut plot = FunctionPlot::new(config.clone(), None).unwrap();
    plot.set_notifier(Some(Box::new(move |msg: &HostMessage| {
        sink.borrow_mut().push(serde_json::to_string(msg).unwrap())
    })));

    assert_eq!(plot.set_variable("a", 102.0), Ok(true));
    assert_eq!(plot.set_variable("a", 102.0), Ok(false));
    assert_eq!(plot.increment("b"), Ok(true));

    let sent = sent.borrow();
    assert_eq!(sent.len(), 2);
    let last: serde_json::Value = serde_json::from_str(&sent[1]).unwrap();
    assert_eq!(
        last,
        serde_json::json!({
            "action": "update_state",
            "payload": {"state": {"variables": {"a": 2.0, "b": 1.0}}}
        })
    );

    let HostMessage::UpdateState { state } = serde_json::from_str(&sent[1]).unwrap();
    let restored = FunctionPlot::new(config, Some(&state)).unwrap();
    assert_eq!(restored.variables().state(), plot.variables().state());
    assert_eq!(restored.values_at(1.5), [2.0 * 1.5 * 1.5 + 1.0]);
}

#[test]
fn unknown_saved_variables_are_ignored() {
    let config = PlotSpec::Preset("linear".to_string()).resolve().unwrap();
    let saved: SavedState = serde_json::from_str(r#"{"variables": {"nope": 4}}"#).unwrap();
    let plot = FunctionPlot::new(config, Some(&saved)).unwrap();
    assert!(plot.variables().get("nope").is_none());
}

#[test]
fn single_point_scene_fits_around_it() {
    let config: GeometryConfig = serde_json::from_str(
        r#"{
            "items": [
                {"type": "point", "x": 3, "y": 4, "label": "P"},
                {"type": "circle", "center": [0, 0]},
                {"type": "segment", "from": [1, 1]}
            ],
            "showAxes": false
        }"#,
    )
    .unwrap();
    let scene = Scene::new(&config).unwrap();
    let Domain { ref x, ref y } = scene.mapper.domain;
    assert!(x.start < 3.0 && 3.0 < x.end);
    assert!(y.start < 4.0 && 4.0 < y.end);
    assert!(3.0 - x.start > 0.0 && x.end - 3.0 > 0.0);
    // the malformed circle and segment are skipped
    assert_eq!(scene.drawables.len(), 1);
}

#[test]
fn scene_without_coordinates_keeps_configured_domain() {
    let config: GeometryConfig = serde_json::from_str(
        r#"{"items": [{"type": "function", "expr": "x^2"}], "xDomain": [-2, 2], "showAxes": false}"#,
    )
    .unwrap();
    let scene = Scene::new(&config).unwrap();
    assert_eq!(scene.mapper.domain, Domain::new(-2.0..2.0, -5.0..5.0));
    assert_eq!(scene.drawables.len(), 1);
}

#[test]
fn reciprocal_breaks_at_the_asymptote() {
    let mapper = Mapper::new(
        Domain::new(-4.0..4.0, -5.0..5.0),
        600.0,
        400.0,
        DEFAULT_PADDING,
    );
    let expr = Expr::compile("1/x");
    let mut bindings = Bindings::new(&Default::default());
    let segments = sample::sample(&expr, &mut bindings, &mapper, PLOT_STEP_FACTOR);
    assert!(segments.len() >= 2);
    let zero = mapper.map_x(0.0);
    for segment in &segments {
        let (first, last) = (segment[0], segment[segment.len() - 1]);
        assert!(last.x < zero || first.x > zero, "{first:?} .. {last:?}");
    }
    assert!(segments.iter().flatten().all(|p: &Point<f64>| p.y.is_finite()));
}

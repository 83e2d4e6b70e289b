mod common;

use common::pos;
use gpui::{point, px, size, Bounds, Pixels, Point};
use gpui_chart_overlays::gesture::{
    AxisStrips, DataProjector, GestureClassifier, GestureConfig, GestureContext, GestureEffect,
    GesturePhase, NoProjection, PlotIntent, PointerEvent, SurfaceGeometry,
};
use gpui_chart_overlays::host::PointerCapture;
use gpui_chart_overlays::{AxisTransform, DataPoint, DrawingContext, DrawingShape, DrawingTool, OverlayId, SurfaceId};

/// Maps x to index and y to price one to one.
struct Identity;

impl DataProjector for Identity {
    fn to_data(&self, position: Point<Pixels>) -> Option<DataPoint> {
        Some(DataPoint::new(f32::from(position.x) as f64, f32::from(position.y) as f64))
    }
}

fn geometry() -> SurfaceGeometry {
    SurfaceGeometry {
        bounds: Bounds::new(point(px(0.0), px(0.0)), size(px(920.0), px(430.0))),
        plot: Bounds::new(point(px(60.0), px(10.0)), size(px(800.0), px(400.0))),
        strips: AxisStrips::Left,
    }
}

fn surface() -> SurfaceId {
    OverlayId(1).into()
}

fn transform() -> AxisTransform {
    AxisTransform::new(1.0, 2.0, 1.0, 0.0, 10.0, 400.0)
}

fn ctx<'a>(
    intent: PlotIntent,
    drawing: DrawingContext,
    projector: &'a dyn DataProjector,
    capture: &'a PointerCapture,
) -> GestureContext<'a> {
    GestureContext {
        surface: surface(),
        geometry: geometry(),
        transform: Some(transform()),
        plot_intent: intent,
        drawing,
        projector,
        capture,
    }
}

fn scale_of(effects: &[GestureEffect]) -> Option<(f64, f64)> {
    effects.iter().find_map(|e| match e {
        GestureEffect::SetScale { zoom, offset, .. } => Some((*zoom, *offset)),
        _ => None,
    })
}

#[test]
fn test_small_motion_is_a_click() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    let down = g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    assert!(down.handled);
    assert_eq!(g.phase(), GesturePhase::Pending);

    let moved = g.pointer_move(PointerEvent::new(pos(402.0, 201.0)), &NoProjection);
    assert!(moved.effects.is_empty());
    assert_eq!(g.phase(), GesturePhase::Pending);

    let up = g.pointer_up(PointerEvent::released(pos(402.0, 201.0)), &NoProjection);
    assert_eq!(
        up.effects,
        vec![GestureEffect::Click {
            position: pos(400.0, 200.0)
        }]
    );
    assert_eq!(g.phase(), GesturePhase::Idle);
}

#[test]
fn test_axis_drag_down_100px_halves_zoom() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(30.0, 210.0)),
        ctx(PlotIntent::Ignore, DrawingContext::none(), &NoProjection, &capture),
    );
    let response = g.pointer_move(PointerEvent::new(pos(30.0, 310.0)), &NoProjection);
    assert_eq!(g.phase(), GesturePhase::ZoomDrag);

    let (zoom, offset) = scale_of(&response.effects).unwrap_or((f64::NAN, f64::NAN));
    assert!((zoom - 0.5).abs() < 1e-12);
    // Pressed at the vertical centre, so the centre stays put.
    assert!(offset.abs() < 1e-12);

    let up = g.pointer_up(PointerEvent::released(pos(30.0, 310.0)), &NoProjection);
    assert!(up.effects.is_empty());
}

#[test]
fn test_axis_drag_up_zooms_in_within_bounds() {
    let capture = PointerCapture::new();
    let config = GestureConfig::default();
    let mut g = GestureClassifier::new(config);
    g.pointer_down(
        PointerEvent::new(pos(30.0, 400.0)),
        ctx(PlotIntent::Ignore, DrawingContext::none(), &NoProjection, &capture),
    );
    let response = g.pointer_move(PointerEvent::new(pos(30.0, -10_000.0)), &NoProjection);
    let (zoom, _) = scale_of(&response.effects).unwrap_or((f64::NAN, f64::NAN));
    assert_eq!(zoom, config.zoom_bounds.1);
}

#[test]
fn test_double_click_on_axis_resets() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    let response = g.pointer_down(
        PointerEvent::double(pos(30.0, 200.0)),
        ctx(PlotIntent::Ignore, DrawingContext::none(), &NoProjection, &capture),
    );
    assert_eq!(response.effects, vec![GestureEffect::ResetScale]);
    assert!(!g.is_active());
}

#[test]
fn test_move_drag_shifts_offset_and_pans_host() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Move, DrawingContext::none(), &NoProjection, &capture),
    );
    let response = g.pointer_move(PointerEvent::new(pos(410.0, 240.0)), &NoProjection);
    assert_eq!(g.phase(), GesturePhase::MoveDrag);

    let (zoom, offset) = scale_of(&response.effects).unwrap_or((f64::NAN, f64::NAN));
    assert_eq!(zoom, 1.0);
    // 40 px of a 400 px plot showing a span of 1.0.
    assert!((offset - 0.1).abs() < 1e-9);
    assert!(response
        .effects
        .contains(&GestureEffect::PanHost { dx: px(10.0) }));

    // Horizontal pan is incremental.
    let response = g.pointer_move(PointerEvent::new(pos(415.0, 240.0)), &NoProjection);
    assert!(response
        .effects
        .contains(&GestureEffect::PanHost { dx: px(5.0) }));
}

#[test]
fn test_free_drag_only_pans() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    let response = g.pointer_move(PointerEvent::new(pos(380.0, 260.0)), &NoProjection);
    assert_eq!(g.phase(), GesturePhase::FreeDrag);
    assert_eq!(response.effects, vec![GestureEffect::PanHost { dx: px(-20.0) }]);
}

#[test]
fn test_ignored_press_starts_nothing() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    let response = g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Ignore, DrawingContext::none(), &NoProjection, &capture),
    );
    assert!(!response.handled);
    assert!(!g.is_active());

    let outside = g.pointer_down(
        PointerEvent::new(pos(400.0, 425.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    assert!(!outside.handled);
}

#[test]
fn test_one_shot_tool_commits_on_press() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    let color = gpui::red();
    let response = g.pointer_down(
        PointerEvent::new(pos(100.0, 50.0)),
        ctx(
            PlotIntent::Ignore,
            DrawingContext::with_tool(DrawingTool::Horizontal, color),
            &Identity,
            &capture,
        ),
    );
    assert_eq!(
        response.effects,
        vec![GestureEffect::Commit {
            shape: DrawingShape::Horizontal { price: 50.0 },
            color,
        }]
    );
    assert!(!g.is_active());
}

#[test]
fn test_two_point_tool_previews_then_commits() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    let color = gpui::blue();
    let down = g.pointer_down(
        PointerEvent::new(pos(100.0, 50.0)),
        ctx(
            PlotIntent::Free,
            DrawingContext::with_tool(DrawingTool::Trendline, color),
            &Identity,
            &capture,
        ),
    );
    assert!(matches!(down.effects.as_slice(), [GestureEffect::Preview(_)]));
    assert_eq!(g.phase(), GesturePhase::DrawDrag);

    let moved = g.pointer_move(PointerEvent::new(pos(200.0, 80.0)), &Identity);
    match moved.effects.as_slice() {
        [GestureEffect::Preview(p)] => assert_eq!(p.current, DataPoint::new(200.0, 80.0)),
        other => panic!("unexpected effects {other:?}"),
    }

    let up = g.pointer_up(PointerEvent::released(pos(210.0, 90.0)), &Identity);
    assert_eq!(
        up.effects,
        vec![
            GestureEffect::CancelPreview,
            GestureEffect::Commit {
                shape: DrawingShape::Trendline {
                    start_index: 100.0,
                    start_price: 50.0,
                    end_index: 210.0,
                    end_price: 90.0,
                },
                color,
            },
        ]
    );
}

#[test]
fn test_two_point_tool_without_travel_is_cancelled() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(100.0, 50.0)),
        ctx(
            PlotIntent::Free,
            DrawingContext::with_tool(DrawingTool::Rectangle, gpui::green()),
            &Identity,
            &capture,
        ),
    );
    let up = g.pointer_up(PointerEvent::released(pos(101.0, 50.0)), &Identity);
    assert_eq!(up.effects, vec![GestureEffect::CancelPreview]);
}

#[test]
fn test_move_without_button_ends_session() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    let response = g.pointer_move(PointerEvent::released(pos(400.0, 200.0)), &NoProjection);
    assert!(matches!(response.effects.as_slice(), [GestureEffect::Click { .. }]));
    assert!(!g.is_active());
}

#[test]
fn test_capture_follows_session() {
    let capture = PointerCapture::new();
    let mut g = GestureClassifier::new(GestureConfig::default());
    g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    assert!(capture.is_captured(surface()));
    assert_eq!(capture.active_count(), 1);

    g.cancel();
    assert!(!capture.is_captured(surface()));

    g.pointer_down(
        PointerEvent::new(pos(400.0, 200.0)),
        ctx(PlotIntent::Free, DrawingContext::none(), &NoProjection, &capture),
    );
    drop(g);
    assert_eq!(capture.active_count(), 0);
}

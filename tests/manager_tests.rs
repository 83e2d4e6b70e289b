mod common;

use common::{failing, history, minute_candles, pos, text_history, FakeHost, MINUTE, START};
use gpui_chart_overlays::data_types::color::parse_hex;
use gpui_chart_overlays::data_types::{EngineSnapshot, OverlaySettings};
use gpui_chart_overlays::gesture::{GesturePhase, PointerEvent};
use gpui_chart_overlays::rendering::SurfaceDiagnostic;
use gpui_chart_overlays::{
    ChartOverlays, EngineConfig, HostChart, OverlayError, OverlayId, OverlayManager, RedrawHub,
    SourceRef, Timeframe,
};

fn manager() -> OverlayManager {
    OverlayManager::new(EngineConfig::default()).unwrap()
}

fn engine(hub: &RedrawHub) -> ChartOverlays {
    ChartOverlays::new(EngineConfig::default(), hub).unwrap()
}

fn add(engine: &mut ChartOverlays, symbol: &str, base: f64) -> OverlayId {
    engine
        .overlays_mut()
        .add(symbol, &history(minute_candles(START, 500, base)), Timeframe::M1)
        .unwrap()
}

#[test]
fn test_duplicate_source_is_rejected() {
    let mut overlays = manager();
    let source = history(minute_candles(START, 10, 1.1));
    assert!(overlays.add("EURUSD", &source, Timeframe::M1).is_ok());
    assert!(matches!(
        overlays.add("EURUSD", &source, Timeframe::M1),
        Err(OverlayError::Duplicate(s)) if s == SourceRef::new("EURUSD")
    ));
    assert_eq!(overlays.len(), 1);
}

#[test]
fn test_in_flight_source_is_a_duplicate() {
    let mut overlays = manager();
    let pending = overlays.begin_add("EURUSD").unwrap();
    assert!(overlays.is_pending(&SourceRef::new("EURUSD")));
    assert!(matches!(overlays.begin_add("EURUSD"), Err(OverlayError::Duplicate(_))));

    // Abandoning the fetch releases the source.
    drop(pending);
    assert!(!overlays.is_pending(&SourceRef::new("EURUSD")));
    let pending = overlays.begin_add("EURUSD").unwrap();
    let fetched = history(minute_candles(START, 10, 1.1))(pending.source());
    assert!(overlays.complete_add(pending, fetched, Timeframe::M1).is_ok());
    assert_eq!(overlays.len(), 1);
}

#[test]
fn test_fetch_failure_leaves_state_unchanged() {
    let mut overlays = manager();
    let err = overlays.add("EURUSD", &failing("timeout"), Timeframe::M1);
    match err {
        Err(OverlayError::FetchFailure { source_ref, reason }) => {
            assert_eq!(source_ref, SourceRef::new("EURUSD"));
            assert!(reason.contains("timeout"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(overlays.is_empty());
    assert!(!overlays.is_pending(&SourceRef::new("EURUSD")));

    // Retrying works and gets the first palette colour.
    let id = overlays
        .add("EURUSD", &history(minute_candles(START, 10, 1.1)), Timeframe::M1)
        .unwrap();
    let palette = EngineConfig::default().palette_colors().unwrap_or_default();
    assert_eq!(overlays.get(id).map(|o| o.core.color), palette.first().copied());
}

#[test]
fn test_unparseable_source_still_registers() {
    let hub = RedrawHub::new();
    let host = FakeHost::eurusd();
    let mut engine = engine(&hub);
    let id = engine
        .overlays_mut()
        .add("BROKEN", &text_history("<html>502</html>"), Timeframe::M1)
        .unwrap();
    assert!(engine.overlays().get(id).is_some_and(|o| o.core.parse_failed()));

    let frame = engine.frame(&host);
    let report = frame.report.surface(id).cloned().unwrap();
    assert!(report.has(SurfaceDiagnostic::ParseFailure));
    assert_eq!(report.drawn_candles, 0);
}

#[test]
fn test_palette_reuses_freed_colours() {
    let mut overlays = manager();
    let palette = EngineConfig::default().palette_colors().unwrap_or_default();
    let ids: Vec<OverlayId> = ["A", "B", "C"]
        .into_iter()
        .map(|s| {
            overlays
                .add(s, &history(minute_candles(START, 10, 1.0)), Timeframe::M1)
                .unwrap()
        })
        .collect();
    let colors: Vec<_> = ids
        .iter()
        .filter_map(|id| overlays.get(*id).map(|o| o.core.color))
        .collect();
    assert_eq!(colors, palette[..3].to_vec());

    overlays.remove(ids[1]).unwrap();
    let d = overlays
        .add("D", &history(minute_candles(START, 10, 1.0)), Timeframe::M1)
        .unwrap();
    assert_eq!(overlays.get(d).map(|o| o.core.color), Some(palette[1]));
}

#[test]
fn test_unknown_ids_are_errors() {
    let mut overlays = manager();
    assert!(matches!(
        overlays.remove(OverlayId(99)),
        Err(OverlayError::UnknownSurface(_))
    ));
    assert!(overlays.set_visible(OverlayId(99), false).is_err());
}

#[test]
fn test_axis_zoom_touches_only_the_owner() {
    let hub = RedrawHub::new();
    let mut host = FakeHost::eurusd();
    let mut engine = engine(&hub);
    let a = add(&mut engine, "EURUSD", 1.1);
    let b = add(&mut engine, "USDJPY", 150.0);
    engine.frame(&host);

    // The left strip belongs to the last visible overlay.
    engine.pointer_down(PointerEvent::new(pos(30.0, 210.0)), &mut host);
    engine.pointer_move(PointerEvent::new(pos(30.0, 310.0)), &mut host);
    engine.pointer_up(PointerEvent::released(pos(30.0, 310.0)), &mut host);

    let scale = |id| engine.overlays().get(id).map(|o| o.core.scale);
    let b_scale = scale(b).unwrap();
    assert!(b_scale.is_manual());
    assert!((b_scale.zoom - 0.5).abs() < 1e-12);
    assert_eq!(scale(a).map(|s| (s.auto_scale, s.zoom)), Some((true, 1.0)));
    assert_eq!(host.panned, 0.0);

    // Double click on the axis restores the fitted scale.
    engine.pointer_down(PointerEvent::double(pos(30.0, 210.0)), &mut host);
    let b_scale = engine.overlays().get(b).map(|o| o.core.scale);
    assert_eq!(b_scale.map(|s| (s.auto_scale, s.zoom, s.offset)), Some((true, 1.0, 0.0)));
}

#[test]
fn test_click_on_line_toggles_selection() {
    let hub = RedrawHub::new();
    let mut host = FakeHost::eurusd();
    let mut engine = engine(&hub);
    let id = add(&mut engine, "EURUSD", 1.1);
    engine.frame(&host);

    let plot = host.plot_bounds();
    let (x, y) = {
        let overlay = engine.overlays().get(id).unwrap();
        let transform = overlay.core.current_transform(&host, plot, 0.1).unwrap();
        let close = overlay.core.candles()[450].c;
        (host.x_of(450), transform.price_to_y(close))
    };

    // Far from the line nothing happens.
    let miss = engine.pointer_down(PointerEvent::new(pos(x, 30.0)), &mut host);
    assert!(!miss.handled);

    engine.pointer_down(PointerEvent::new(pos(x, y)), &mut host);
    engine.pointer_up(PointerEvent::released(pos(x, y)), &mut host);
    assert_eq!(engine.overlays().selected(), Some(id));

    // Selected overlays take any press on the plot; a click deselects.
    engine.pointer_down(PointerEvent::new(pos(200.0, 30.0)), &mut host);
    engine.pointer_up(PointerEvent::released(pos(200.0, 30.0)), &mut host);
    assert_eq!(engine.overlays().selected(), None);
}

#[test]
fn test_click_selects_line_with_shifted_host_times() {
    let hub = RedrawHub::new();
    // Host bars stamped 20 s past the minute, overlay bars on the minute.
    let times = (0..500).map(|i| START + 20_000 + i * MINUTE).collect();
    let mut host = FakeHost::with_times(times, Timeframe::M1);
    let mut engine = engine(&hub);
    let id = add(&mut engine, "EURUSD", 1.1);
    let frame = engine.frame(&host);
    assert!(frame.report.surface(id).unwrap().drawn_candles > 0);

    let plot = host.plot_bounds();
    let (x, y) = {
        let overlay = engine.overlays().get(id).unwrap();
        let transform = overlay.core.current_transform(&host, plot, 0.1).unwrap();
        let close = overlay.core.candles()[450].c;
        (host.x_of(450), transform.price_to_y(close))
    };

    let down = engine.pointer_down(PointerEvent::new(pos(x, y)), &mut host);
    assert!(down.handled);
    engine.pointer_up(PointerEvent::released(pos(x, y)), &mut host);
    assert_eq!(engine.overlays().selected(), Some(id));
}

#[test]
fn test_remove_during_move_drag_is_inert() {
    let hub = RedrawHub::new();
    let mut host = FakeHost::eurusd();
    let mut engine = engine(&hub);
    let a = add(&mut engine, "EURUSD", 1.1);
    let b = add(&mut engine, "GBPUSD", 1.3);
    engine.frame(&host);
    engine.overlays_mut().select(Some(a));

    // Above both lines, so only the selection claims the press.
    engine.pointer_down(PointerEvent::new(pos(400.0, 25.0)), &mut host);
    engine.pointer_move(PointerEvent::new(pos(420.0, 65.0)), &mut host);
    assert_eq!(
        engine.overlays().get(a).map(|o| o.core.phase()),
        Some(GesturePhase::MoveDrag)
    );
    assert_eq!(host.panned, 20.0);
    assert_eq!(engine.capture().active_count(), 1);

    engine.overlays_mut().remove(a).unwrap();
    assert_eq!(engine.capture().active_count(), 0);

    let b_before = engine.overlays().get(b).map(|o| o.core.scale);
    let moved = engine.pointer_move(PointerEvent::new(pos(480.0, 125.0)), &mut host);
    let released = engine.pointer_up(PointerEvent::released(pos(480.0, 125.0)), &mut host);
    assert!(!moved.handled && !released.handled);
    assert_eq!(host.panned, 20.0);
    assert_eq!(engine.overlays().get(b).map(|o| o.core.scale), b_before);
    assert!(engine.frame(&host).surface(a).is_none());
}

#[test]
fn test_timeframe_change_resamples_from_raw() {
    let hub = RedrawHub::new();
    let mut engine = engine(&hub);
    let id = add(&mut engine, "EURUSD", 1.1);
    let bars = |engine: &ChartOverlays| engine.overlays().get(id).map(|o| o.core.candles().len());

    engine.set_timeframe(Timeframe::M5);
    let m5 = bars(&engine).unwrap_or(0);
    assert!((100..=101).contains(&m5), "{m5} bars");

    engine.set_timeframe(Timeframe::M1);
    assert_eq!(bars(&engine), Some(500));
}

#[test]
fn test_render_follows_host_timeframe() {
    let hub = RedrawHub::new();
    let mut engine = engine(&hub);
    let id = add(&mut engine, "EURUSD", 1.1);

    // 200 five-minute bars, the last 100 of them covering the overlay data.
    let times: Vec<i64> = (0..200)
        .map(|i| Timeframe::M5.bucket_start(START).unwrap() + (i - 100) * 5 * 60_000)
        .collect();
    let host = FakeHost::with_times(times, Timeframe::M5);
    let frame = engine.frame(&host);
    let report = frame.report.surface(id).cloned().unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(
        engine.overlays().get(id).and_then(|o| o.core.series().timeframe()),
        Some(Timeframe::M5)
    );
}

#[test]
fn test_settings_patch_is_validated() {
    let mut overlays = manager();
    let id = overlays
        .add("EURUSD", &history(minute_candles(START, 10, 1.1)), Timeframe::M1)
        .unwrap();

    let bad = OverlaySettings {
        line_width: Some(0.0),
        visible: Some(false),
        ..OverlaySettings::default()
    };
    assert!(matches!(
        overlays.apply_settings(id, &bad),
        Err(OverlayError::InvalidSettings(_))
    ));
    // Rejected patches change nothing.
    assert!(overlays.get(id).is_some_and(|o| o.core.visible));

    let good = OverlaySettings {
        line_width: Some(3.0),
        color: Some(gpui::red()),
        ..OverlaySettings::default()
    };
    overlays.apply_settings(id, &good).unwrap();
    let overlay = overlays.get(id).unwrap();
    assert_eq!((overlay.line_width, overlay.core.color), (3.0, gpui::red()));
}

#[test]
fn test_snapshot_round_trip() {
    let hub = RedrawHub::new();
    let mut host = FakeHost::eurusd();
    let mut engine = engine(&hub);
    add(&mut engine, "EURUSD", 1.1);
    add(&mut engine, "USDJPY", 150.0);
    engine.frame(&host);
    engine.pointer_down(PointerEvent::new(pos(30.0, 210.0)), &mut host);
    engine.pointer_move(PointerEvent::new(pos(30.0, 260.0)), &mut host);
    engine.pointer_up(PointerEvent::released(pos(30.0, 260.0)), &mut host);

    let json = engine.snapshot().to_json().unwrap();
    let snapshot = EngineSnapshot::from_json(&json).unwrap();

    let mut fresh = self::engine(&hub);
    add(&mut fresh, "EURUSD", 1.1);
    add(&mut fresh, "USDJPY", 150.0);
    assert!(fresh.restore(&snapshot).is_empty());
    let restored = fresh.snapshot().to_json().unwrap();
    assert_eq!(restored, json);

    // Sources that are not registered are reported, not fatal.
    let mut empty = self::engine(&hub);
    assert_eq!(empty.restore(&snapshot).len(), 2);
}

#[test]
fn test_engine_config_from_json() {
    let config = EngineConfig::from_json(r#"{ "drag_threshold_px": 5.0 }"#).unwrap();
    assert_eq!(config.drag_threshold_px, 5.0);
    assert_eq!(config.max_price_zoom, EngineConfig::default().max_price_zoom);

    assert!(EngineConfig::from_json(r#"{ "min_price_zoom": 0.0 }"#).is_err());
    assert!(EngineConfig::from_json(r##"{ "palette": ["#zzzzzz"] }"##).is_err());
    assert!(EngineConfig::from_json("not json").is_err());
}

#[test]
fn test_hex_colours_reject_signs_and_stray_characters() {
    assert!(parse_hex("#ff8000").is_ok());
    assert!(parse_hex("ff8000cc").is_ok());
    assert!(parse_hex("+fffff").is_err());
    assert!(parse_hex("#-fffff").is_err());
    assert!(parse_hex("#ff 800").is_err());
    assert!(EngineConfig::from_json(r##"{ "palette": ["+fffff"] }"##).is_err());
}

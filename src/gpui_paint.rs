// Replays a rendered frame onto a GPUI window.

use crate::rendering::{DrawCommand, Frame, SurfaceFrame, TextAnchor};
use gpui::*;

/// Paints every surface of `frame`, in order. Call from a canvas paint
/// callback after the host chart painted itself.
pub fn paint_frame(frame: &Frame, window: &mut Window, cx: &mut App) {
    for surface in &frame.surfaces {
        paint_surface(surface, window, cx);
    }
}

pub fn paint_surface(surface: &SurfaceFrame, window: &mut Window, cx: &mut App) {
    paint_commands(&surface.commands, window, cx);
}

fn paint_commands(commands: &[DrawCommand], window: &mut Window, cx: &mut App) {
    let mut i = 0;
    while i < commands.len() {
        match &commands[i] {
            DrawCommand::PushClip(bounds) => {
                let end = matching_pop(commands, i);
                let inner = &commands[i + 1..end];
                window.with_content_mask(Some(ContentMask { bounds: *bounds }), |window| {
                    paint_commands(inner, window, cx)
                });
                i = end + 1;
                continue;
            }
            DrawCommand::PopClip | DrawCommand::Layer(_) => {}
            DrawCommand::FillRect { bounds, color } => {
                window.paint_quad(fill(*bounds, *color));
            }
            DrawCommand::StrokeRect { bounds, color } => {
                window.paint_quad(outline(*bounds, *color, BorderStyle::Solid));
            }
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => {
                let mut builder = PathBuilder::stroke(*width);
                builder.move_to(*from);
                builder.line_to(*to);
                if let Ok(path) = builder.build() {
                    window.paint_path(path, *color);
                }
            }
            DrawCommand::Polyline {
                points,
                color,
                width,
            } => {
                if let Some((first, rest)) = points.split_first() {
                    let mut builder = PathBuilder::stroke(*width);
                    builder.move_to(*first);
                    for p in rest {
                        builder.line_to(*p);
                    }
                    if let Ok(path) = builder.build() {
                        window.paint_path(path, *color);
                    }
                }
            }
            DrawCommand::FillPolygon { points, color } => {
                if let Some((first, rest)) = points.split_first() {
                    let mut builder = PathBuilder::fill();
                    builder.move_to(*first);
                    for p in rest {
                        builder.line_to(*p);
                    }
                    builder.line_to(*first);
                    if let Ok(path) = builder.build() {
                        window.paint_path(path, *color);
                    }
                }
            }
            DrawCommand::Text {
                origin,
                text,
                size,
                color,
                anchor,
                width,
            } => paint_text(*origin, text, *size, *color, *anchor, *width, window, cx),
        }
        i += 1;
    }
}

/// Index of the `PopClip` closing the `PushClip` at `open`, or the end of
/// the slice if it is missing.
fn matching_pop(commands: &[DrawCommand], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, command) in commands.iter().enumerate().skip(open) {
        match command {
            DrawCommand::PushClip(_) => depth += 1,
            DrawCommand::PopClip => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    commands.len()
}

#[allow(clippy::too_many_arguments)]
fn paint_text(
    origin: Point<Pixels>,
    text: &str,
    font_size: Pixels,
    color: Hsla,
    anchor: TextAnchor,
    width: Option<Pixels>,
    window: &mut Window,
    cx: &mut App,
) {
    if text.is_empty() {
        return;
    }
    let run = TextRun {
        len: text.len(),
        font: TextStyle::default().font(),
        color,
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    let align = match anchor {
        TextAnchor::Left => TextAlign::Left,
        TextAnchor::Right => TextAlign::Right,
    };
    if let Ok(lines) = window.text_system().shape_text(
        SharedString::from(text.to_string()),
        font_size,
        &[run],
        None,
        None,
    ) {
        let mut origin = origin;
        for line in lines {
            let _ = line.paint(
                origin,
                font_size,
                align,
                width.map(|w| Bounds::new(origin, size(w, font_size))),
                window,
                cx,
            );
            origin.y += font_size;
        }
    }
}

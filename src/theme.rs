use gpui::*;

#[derive(Clone, Debug)]
pub struct ChartTheme {
    pub axis_background: Hsla,
    pub axis_line: Hsla,
    pub axis_label: Hsla,
    pub axis_label_size: Pixels,
    pub tick_line: Hsla,
    pub crosshair_line: Hsla,
    pub tag_background: Hsla,
    pub tag_text: Hsla,
    pub legend_text: Hsla,
    pub legend_size: Pixels,
    pub selection_outline: Hsla,
    /// Opacity of a two-point drawing while it is still being dragged.
    pub preview_opacity: f32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            axis_background: gpui::black().alpha(0.85),
            axis_line: gpui::white().alpha(0.2),
            axis_label: gpui::white().alpha(0.8),
            axis_label_size: px(11.0),
            tick_line: gpui::white().alpha(0.3),
            crosshair_line: gpui::white().alpha(0.3),
            tag_background: gpui::white(),
            tag_text: gpui::black(),
            legend_text: gpui::white().alpha(0.9),
            legend_size: px(12.0),
            selection_outline: gpui::white().alpha(0.5),
            preview_opacity: 0.5,
        }
    }
}

/// ViewController holds the arithmetic of interactions (price zoom, price
/// move, pane resize) independently of the GPUI infrastructure to facilitate
/// testing.
pub struct ViewController;

impl ViewController {
    /// Zoom after dragging the axis `dy_up` pixels upwards from where the
    /// gesture started. Dragging down (negative `dy_up`) zooms out.
    pub fn drag_zoom(start_zoom: f64, dy_up: f32, sensitivity: f64, bounds: (f64, f64)) -> f64 {
        Self::clamp_zoom(start_zoom * (1.0 + dy_up as f64 * sensitivity), bounds)
    }

    pub fn clamp_zoom(zoom: f64, (min, max): (f64, f64)) -> f64 {
        if zoom.is_nan() {
            return min;
        }
        zoom.clamp(min, max)
    }

    /// Offset that keeps the price under `pivot_ratio` (0 = top) fixed while
    /// the zoom goes from `start_zoom` to `new_zoom`.
    pub fn pivot_offset(
        start_offset: f64,
        base_span: f64,
        start_zoom: f64,
        new_zoom: f64,
        pivot_ratio: f64,
    ) -> f64 {
        let old_displayed = base_span / start_zoom;
        let new_displayed = base_span / new_zoom;
        start_offset + (old_displayed - new_displayed) * (0.5 - pivot_ratio)
    }

    /// Offset after dragging the plot `dy_down` pixels downwards. Pulling the
    /// plot down reveals higher prices.
    pub fn move_offset(start_offset: f64, dy_down: f32, displayed_span: f64, plot_height: f32) -> f64 {
        if plot_height <= 0.0 {
            return start_offset;
        }
        start_offset + dy_down as f64 * displayed_span / plot_height as f64
    }

    /// Moves the splitter between pane `index` and `index + 1` by
    /// `delta_pixels`. The sum of both heights is preserved and neither drops
    /// below `min_weight`.
    pub fn resize_panes(
        weights: &mut [f32],
        index: usize,
        delta_pixels: f32,
        pixels_per_weight: f32,
        min_weight: f32,
    ) {
        if index + 1 >= weights.len() || pixels_per_weight <= 0.0 {
            return;
        }

        let dw = delta_pixels / pixels_per_weight;
        let w1 = weights[index];
        let w2 = weights[index + 1];

        // We limit dw to respect the minima on both sides
        let actual_dw = if dw > 0.0 {
            // Splitter goes down: the upper pane grows
            dw.min(w2 - min_weight).max(0.0)
        } else {
            dw.max(-(w1 - min_weight)).min(0.0)
        };

        weights[index] = w1 + actual_dw;
        weights[index + 1] = w2 - actual_dw;
    }

    /// Height of a single pane after dragging its bottom edge.
    pub fn resize_single(weight: f32, delta_pixels: f32, pixels_per_weight: f32, min_weight: f32) -> f32 {
        if pixels_per_weight <= 0.0 {
            return weight;
        }
        (weight + delta_pixels / pixels_per_weight).max(min_weight)
    }
}

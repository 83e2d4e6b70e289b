use gpui::{point, px, size, Bounds, Pixels};

pub mod date_formatter;

pub trait PixelsExt {
    fn as_f32(&self) -> f32;
}

impl PixelsExt for Pixels {
    fn as_f32(&self) -> f32 {
        f32::from(*self)
    }
}

/// Carving axis strips and plot areas out of a surface rectangle.
pub trait BoundsExt {
    /// Shrinks horizontally, never below zero width.
    fn inset_x(&self, left: Pixels, right: Pixels) -> Bounds<Pixels>;

    /// Part of `self` left of `inner`, spanning `inner`'s height.
    fn strip_left_of(&self, inner: &Bounds<Pixels>) -> Bounds<Pixels>;

    /// Part of `self` right of `inner`, spanning `inner`'s height.
    fn strip_right_of(&self, inner: &Bounds<Pixels>) -> Bounds<Pixels>;
}

impl BoundsExt for Bounds<Pixels> {
    fn inset_x(&self, left: Pixels, right: Pixels) -> Bounds<Pixels> {
        let width = (self.size.width - left - right).as_f32().max(0.0);
        Bounds::new(
            point(self.origin.x + left, self.origin.y),
            size(px(width), self.size.height),
        )
    }

    fn strip_left_of(&self, inner: &Bounds<Pixels>) -> Bounds<Pixels> {
        let width = (inner.origin.x - self.origin.x).as_f32().max(0.0);
        Bounds::new(
            point(self.origin.x, inner.origin.y),
            size(px(width), inner.size.height),
        )
    }

    fn strip_right_of(&self, inner: &Bounds<Pixels>) -> Bounds<Pixels> {
        let inner_right = inner.origin.x + inner.size.width;
        let width = (self.origin.x + self.size.width - inner_right).as_f32().max(0.0);
        Bounds::new(
            point(inner_right, inner.origin.y),
            size(px(width), inner.size.height),
        )
    }
}

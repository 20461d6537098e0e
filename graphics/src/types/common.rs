//! Small value types shared by descriptors and attachments.

/// Size of a 2D texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square extent, as used by shadow maps.
    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn texel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True if either side is zero. Such textures cannot be created.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Value an attachment is cleared to at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Linear RGBA.
    Color([f32; 4]),
    Depth(f32),
}

impl ClearValue {
    /// All-zero moments, the empty shadow map.
    pub const ZERO_COLOR: Self = Self::Color([0.0; 4]);
    /// Depth at the far plane.
    pub const FAR_DEPTH: Self = Self::Depth(1.0);

    /// Opaque grey of the given level.
    pub fn grey(level: f32) -> Self {
        Self::Color([level, level, level, 1.0])
    }

    pub fn as_color(&self) -> Option<[f32; 4]> {
        match *self {
            Self::Color(rgba) => Some(rgba),
            Self::Depth(_) => None,
        }
    }

    pub fn as_depth(&self) -> Option<f32> {
        match *self {
            Self::Depth(depth) => Some(depth),
            Self::Color(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent() {
        let extent = Extent2d::square(2048);
        assert_eq!(extent.texel_count(), 2048 * 2048);
        assert!(!extent.is_empty());
        assert!(Extent2d::new(0, 600).is_empty());
    }

    #[test]
    fn test_clear_value_kinds() {
        assert_eq!(ClearValue::grey(0.15).as_color(), Some([0.15, 0.15, 0.15, 1.0]));
        assert_eq!(ClearValue::grey(0.15).as_depth(), None);
        assert_eq!(ClearValue::FAR_DEPTH.as_depth(), Some(1.0));
        assert_eq!(ClearValue::ZERO_COLOR.as_color(), Some([0.0; 4]));
    }
}

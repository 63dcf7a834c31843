//! Bounding-box geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle locating a detected word.
///
/// `x1`/`y1` are the top-left corner. Width and height are always
/// positive; use [`Rect::new`] to construct one from untrusted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x1: u32,
    y1: u32,
    width: u32,
    height: u32,
}

impl Rect {
    /// Create a rectangle, returning `None` for an empty box.
    pub fn new(x1: u32, y1: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x1,
            y1,
            width,
            height,
        })
    }

    /// Create a rectangle from signed OCR coordinates.
    ///
    /// A box reaching past the top or left frame edge is cut at that edge.
    /// Boxes with no pixels inside the frame yield `None`.
    pub fn from_signed(left: i64, top: i64, width: i64, height: i64) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let (x1, width) = clip_to_edge(left, width)?;
        let (y1, height) = clip_to_edge(top, height)?;
        Self::new(x1, y1, width, height)
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x1.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y1.saturating_add(self.height)
    }

    /// Same origin, size grown by `margin` in both dimensions.
    pub fn padded(&self, margin: u32) -> Self {
        Self {
            x1: self.x1,
            y1: self.y1,
            width: self.width.saturating_add(margin),
            height: self.height.saturating_add(margin),
        }
    }

    /// Whether the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 < other.right()
            && other.x1 < self.right()
            && self.y1 < other.bottom()
            && other.y1 < self.bottom()
    }
}

/// Origin and length of `start..start + len` clipped at zero.
fn clip_to_edge(start: i64, len: i64) -> Option<(u32, u32)> {
    let end = start.saturating_add(len);
    let start = start.max(0);
    if end <= start {
        return None;
    }
    Some((u32::try_from(start).ok()?, u32::try_from(end - start).ok()?))
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x1, self.y1
        )
    }
}

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in map units.
///
/// This is both the viewport model of a [`Map`](crate::Map) (the currently
/// visible part of the map plane) and the bounding box vocabulary of
/// datasources. The stored coordinates are always ordered
/// (`x_min <= x_max`, `y_min <= y_max`); constructing an extent from an
/// inverted box swaps the coordinates. Degenerate (zero-area) extents are
/// legal and render to empty output.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Extent {
    /// Creates a new extent, normalizing the coordinate order.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        let (x_min, x_max) = if x_min <= x_max {
            (x_min, x_max)
        } else {
            (x_max, x_min)
        };
        let (y_min, y_max) = if y_min <= y_max {
            (y_min, y_max)
        } else {
            (y_max, y_min)
        };

        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates an extent covering the single point `(x, y)`.
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Returns `None` if any of the coordinates is NaN or infinite.
    pub fn try_new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Option<Self> {
        if [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) {
            Some(Self::new(x_min, y_min, x_max, y_max))
        } else {
            None
        }
    }

    /// Left boundary.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Bottom boundary.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Right boundary.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Top boundary.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Width of the extent in map units.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the extent in map units.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// True if the extent covers no area.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Smallest extent containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// True if the two extents share at least one point. Touching edges count
    /// as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Expands the extent by `amount` map units on every side.
    pub fn buffer(&self, amount: f64) -> Self {
        Self::new(
            self.x_min - amount,
            self.y_min - amount,
            self.x_max + amount,
            self.y_max + amount,
        )
    }

    /// Grows the extent about its center so that its width to height ratio
    /// becomes `width / height`. The extent is never shrunk.
    pub(crate) fn fit_aspect_ratio(&self, width: u32, height: u32) -> Self {
        if height == 0 || self.is_degenerate() {
            return *self;
        }

        let target = width as f64 / height as f64;
        let current = self.width() / self.height();
        let cx = (self.x_min + self.x_max) / 2.0;
        let cy = (self.y_min + self.y_max) / 2.0;

        if current < target {
            let half_width = self.height() * target / 2.0;
            Self::new(cx - half_width, self.y_min, cx + half_width, self.y_max)
        } else {
            let half_height = self.width() / target / 2.0;
            Self::new(self.x_min, cy - half_height, self.x_max, cy + half_height)
        }
    }
}

impl From<geo_types::Rect<f64>> for Extent {
    fn from(rect: geo_types::Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

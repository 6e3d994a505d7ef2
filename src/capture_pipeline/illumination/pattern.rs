//! Illumination pattern identifiers

use std::fmt;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::illumination::layout::{
    Color, ColoredRect, IlluminationLayout, Rect, ScreenSize,
};

/// A named on-screen light configuration.
///
/// Each variant carries the integer identifier used by capture sequences and
/// configuration input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IlluminationPattern {
    /// Throwaway shot taken before the first real pattern. Has no pattern layout.
    Warmup,
    LeftHalf,
    RightHalf,
    TopHalf,
    BottomHalf,
    /// White square in the top right corner.
    CornerSquareA,
    /// White square on the left edge, a third of the way down.
    CornerSquareB,
    /// White square centred at the bottom edge.
    CornerSquareC,
    /// Magenta, blue, red and black quadrants.
    QuadrantsA,
    /// Black, red, blue and magenta quadrants.
    QuadrantsB,
    /// End of a sequence. Has no pattern layout.
    Off,
}

impl IlluminationPattern {
    pub const ALL: [IlluminationPattern; 11] = [
        IlluminationPattern::Warmup,
        IlluminationPattern::LeftHalf,
        IlluminationPattern::RightHalf,
        IlluminationPattern::TopHalf,
        IlluminationPattern::BottomHalf,
        IlluminationPattern::CornerSquareA,
        IlluminationPattern::CornerSquareB,
        IlluminationPattern::CornerSquareC,
        IlluminationPattern::QuadrantsA,
        IlluminationPattern::QuadrantsB,
        IlluminationPattern::Off,
    ];

    pub fn id(self) -> i32 {
        match self {
            IlluminationPattern::Warmup => -1,
            IlluminationPattern::LeftHalf => 0,
            IlluminationPattern::RightHalf => 1,
            IlluminationPattern::TopHalf => 2,
            IlluminationPattern::BottomHalf => 3,
            IlluminationPattern::CornerSquareA => 4,
            IlluminationPattern::CornerSquareB => 5,
            IlluminationPattern::CornerSquareC => 6,
            IlluminationPattern::QuadrantsA => 7,
            IlluminationPattern::QuadrantsB => 8,
            IlluminationPattern::Off => 10,
        }
    }

    pub fn from_id(id: i32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|pattern| pattern.id() == id)
            .ok_or(CaptureError::UnknownPattern(id))
    }

    pub fn name(self) -> &'static str {
        match self {
            IlluminationPattern::Warmup => "warmup",
            IlluminationPattern::LeftHalf => "left-half",
            IlluminationPattern::RightHalf => "right-half",
            IlluminationPattern::TopHalf => "top-half",
            IlluminationPattern::BottomHalf => "bottom-half",
            IlluminationPattern::CornerSquareA => "corner-square-a",
            IlluminationPattern::CornerSquareB => "corner-square-b",
            IlluminationPattern::CornerSquareC => "corner-square-c",
            IlluminationPattern::QuadrantsA => "quadrants-a",
            IlluminationPattern::QuadrantsB => "quadrants-b",
            IlluminationPattern::Off => "off",
        }
    }

    /// Computes the regions this pattern lights up on a screen of the given size.
    pub fn layout(self, screen: ScreenSize) -> IlluminationLayout {
        let ScreenSize { width: w, height: h } = screen;
        let full = Rect::new(0.0, 0.0, w, h);
        let square = w / 3.0;

        match self {
            IlluminationPattern::Warmup | IlluminationPattern::Off => IlluminationLayout::Blank,
            IlluminationPattern::LeftHalf => IlluminationLayout::Split {
                white: Rect::new(0.0, 0.0, w / 2.0, h),
                black: Rect::new(w / 2.0, 0.0, w / 2.0, h),
            },
            IlluminationPattern::RightHalf => IlluminationLayout::Split {
                white: Rect::new(w / 2.0, 0.0, w / 2.0, h),
                black: Rect::new(0.0, 0.0, w / 2.0, h),
            },
            IlluminationPattern::TopHalf => IlluminationLayout::Split {
                white: Rect::new(0.0, 0.0, w, h / 2.0),
                black: Rect::new(0.0, h / 2.0, w, h / 2.0),
            },
            IlluminationPattern::BottomHalf => IlluminationLayout::Split {
                white: Rect::new(0.0, h / 2.0, w, h / 2.0),
                black: Rect::new(0.0, 0.0, w, h / 2.0),
            },
            IlluminationPattern::CornerSquareA => IlluminationLayout::Split {
                white: Rect::new(w - square, 0.0, square, square),
                black: full,
            },
            IlluminationPattern::CornerSquareB => IlluminationLayout::Split {
                white: Rect::new(0.0, h / 3.0, square, square),
                black: full,
            },
            IlluminationPattern::CornerSquareC => IlluminationLayout::Split {
                white: Rect::new(square, h - square, square, square),
                black: full,
            },
            IlluminationPattern::QuadrantsA => quadrants(
                screen,
                [Color::MAGENTA, Color::BLUE, Color::RED, Color::BLACK],
            ),
            IlluminationPattern::QuadrantsB => quadrants(
                screen,
                [Color::BLACK, Color::RED, Color::BLUE, Color::MAGENTA],
            ),
        }
    }
}

// Colors are given top-left, top-right, bottom-left, bottom-right.
fn quadrants(screen: ScreenSize, colors: [Color; 4]) -> IlluminationLayout {
    let half_w = screen.width / 2.0;
    let half_h = screen.height / 2.0;
    let origins = [(0.0, 0.0), (half_w, 0.0), (0.0, half_h), (half_w, half_h)];

    let mut regions = [ColoredRect::default(); 4];
    for (region, ((x, y), color)) in regions.iter_mut().zip(origins.into_iter().zip(colors)) {
        *region = ColoredRect {
            rect: Rect::new(x, y, half_w, half_h),
            color,
        };
    }
    IlluminationLayout::Quadrants(regions)
}

impl TryFrom<i32> for IlluminationPattern {
    type Error = CaptureError;

    fn try_from(id: i32) -> Result<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for IlluminationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

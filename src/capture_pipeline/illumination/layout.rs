//! Screen geometry types for illumination layouts

/// Size of the illuminating screen in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl ScreenSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0 };
    pub const MAGENTA: Color = Color { r: 1.0, g: 0.0, b: 1.0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColoredRect {
    pub rect: Rect,
    pub color: Color,
}

/// What the display should show for one pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IlluminationLayout {
    /// No pattern layout. What the screen shows is up to the illumination
    /// service.
    Blank,
    /// A white region drawn over a black region.
    Split { white: Rect, black: Rect },
    /// Four solid-colored quadrants.
    Quadrants([ColoredRect; 4]),
}

impl IlluminationLayout {
    /// Color the layout assigns to a screen point. Points outside every
    /// region, and all of `Blank`, report black.
    pub fn color_at(&self, x: f32, y: f32) -> Color {
        match self {
            IlluminationLayout::Blank => Color::BLACK,
            IlluminationLayout::Split { white, .. } => {
                if white.contains(x, y) {
                    Color::WHITE
                } else {
                    Color::BLACK
                }
            }
            IlluminationLayout::Quadrants(regions) => regions
                .iter()
                .find(|region| region.rect.contains(x, y))
                .map(|region| region.color)
                .unwrap_or(Color::BLACK),
        }
    }
}

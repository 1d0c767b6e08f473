use image::GrayImage;
use std::fmt;
use std::str::FromStr;

/// Two-level mask: 255 = floor / carpet, 0 = everything else.
/// Dimensions always match the color image it belongs to.
pub type BinaryMask = GrayImage;

/// Per-pixel blend weights in [0, 255]
pub type AlphaChannel = GrayImage;

/// Anchor point of a floor region or carpet silhouette, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// How the texture is put into the room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Tile the texture over the whole floor quadrilateral
    Floor,
    /// Free-standing round rug seen at an angle
    CarpetEllipse,
    /// Rectangular rug with the far edge narrowed
    CarpetTrapezoid,
}

impl OverlayMode {
    pub fn is_carpet(self) -> bool {
        !matches!(self, OverlayMode::Floor)
    }

    /// Short tag used in output file names
    pub fn abbreviation(self) -> &'static str {
        match self {
            OverlayMode::Floor => "f",
            OverlayMode::CarpetEllipse => "e",
            OverlayMode::CarpetTrapezoid => "t",
        }
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlayMode::Floor => "floor",
            OverlayMode::CarpetEllipse => "carpet-ellipse",
            OverlayMode::CarpetTrapezoid => "carpet-trapezoid",
        };
        f.write_str(name)
    }
}

impl FromStr for OverlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" | "f" => Ok(OverlayMode::Floor),
            "carpet-ellipse" | "ellipse" | "e" => Ok(OverlayMode::CarpetEllipse),
            "carpet-trapezoid" | "trapezoid" | "t" => Ok(OverlayMode::CarpetTrapezoid),
            other => Err(format!(
                "invalid overlay mode '{other}', expected floor, carpet-ellipse or carpet-trapezoid"
            )),
        }
    }
}

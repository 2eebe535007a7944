//! Output image geometry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Long edge used when deriving a resolution from an aspect ratio
pub const ASPECT_BASE_EDGE: u32 = 1024;

/// Target output resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(2048, 2048)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Aspect ratio presets offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape4x3 => "4:3",
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
        }
    }

    /// Resolution with the long edge at [`ASPECT_BASE_EDGE`]
    pub fn resolution(&self) -> Resolution {
        let base = ASPECT_BASE_EDGE;
        match self {
            Self::Square => Resolution::new(base, base),
            Self::Landscape4x3 => Resolution::new(base, 768),
            Self::Landscape16x9 => Resolution::new(base, 576),
            Self::Portrait9x16 => Resolution::new(576, base),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1:1" => Ok(Self::Square),
            "4:3" => Ok(Self::Landscape4x3),
            "16:9" => Ok(Self::Landscape16x9),
            "9:16" => Ok(Self::Portrait9x16),
            other => Err(format!(
                "unsupported aspect ratio '{}' (expected 1:1, 4:3, 16:9 or 9:16)",
                other
            )),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_resolutions() {
        assert_eq!(AspectRatio::Square.resolution(), Resolution::new(1024, 1024));
        assert_eq!(AspectRatio::Landscape4x3.resolution(), Resolution::new(1024, 768));
        assert_eq!(AspectRatio::Landscape16x9.resolution(), Resolution::new(1024, 576));
        assert_eq!(AspectRatio::Portrait9x16.resolution(), Resolution::new(576, 1024));
    }

    #[test]
    fn test_parse_aspect_ratio() {
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Landscape16x9));
        assert_eq!(" 1:1 ".parse::<AspectRatio>(), Ok(AspectRatio::Square));
        assert!("3:2".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_default_resolution() {
        assert_eq!(Resolution::default().to_string(), "2048x2048");
    }
}

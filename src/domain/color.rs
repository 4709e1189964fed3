// Series display colors and the strategies that hand them out
use crate::domain::error::InsightError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| InsightError::InvalidColor(s.to_string()))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| InsightError::InvalidColor(s.to_string()))
        };

        Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Assigns a color to each newly seen series.
pub trait ColorPicker: Send + Sync {
    fn next_color(&mut self) -> Color;
}

/// Uniformly random RGB. Repeats are allowed.
pub struct RandomColorPicker {
    rng: StdRng,
}

impl RandomColorPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomColorPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPicker for RandomColorPicker {
    fn next_color(&mut self) -> Color {
        Color::rgb(self.rng.r#gen(), self.rng.r#gen(), self.rng.r#gen())
    }
}

/// Cycles through a fixed palette in order.
#[derive(Debug, Clone)]
pub struct PaletteColorPicker {
    palette: Vec<Color>,
    next: usize,
}

impl PaletteColorPicker {
    pub fn new(palette: Vec<Color>) -> Result<Self, InsightError> {
        if palette.is_empty() {
            return Err(InsightError::EmptyPalette);
        }
        Ok(Self { palette, next: 0 })
    }

    pub fn from_hex<S: AsRef<str>>(palette: &[S]) -> Result<Self, InsightError> {
        let colors = palette
            .iter()
            .map(|c| c.as_ref().parse())
            .collect::<Result<Vec<Color>, _>>()?;
        Self::new(colors)
    }
}

impl ColorPicker for PaletteColorPicker {
    fn next_color(&mut self) -> Color {
        let color = self.palette[self.next];
        self.next = (self.next + 1) % self.palette.len();
        color
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::errors::AppError;

/// An opaque RGB color, serialized as `#rrggbb`.
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

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Colors for each drawn data series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPalette {
    pub close: Color,
    pub sma_20: Color,
    pub sma_50: Color,
    pub ema_12: Color,
    pub ema_26: Color,
    pub ema_20: Color,
    pub bollinger_line: Color,
    pub bollinger_fill: Color,
    pub rsi: Color,
    pub macd: Color,
    pub macd_signal: Color,
}

/// A complete palette. Every semantic role is a required field, so a theme
/// missing one does not compile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThemeSpec {
    pub name: ThemeName,
    pub background: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub grid: Color,
    pub up: Color,
    pub down: Color,
    pub widget_background: Color,
    pub font_family: &'static str,
    pub series: SeriesPalette,
}

const LIGHT: ThemeSpec = ThemeSpec {
    name: ThemeName::Light,
    background: Color::rgb(0xff, 0xff, 0xff),
    text: Color::rgb(0x0c, 0x16, 0x25),
    text_secondary: Color::rgb(0x5b, 0x66, 0x78),
    grid: Color::rgb(0xe5, 0xe7, 0xeb),
    up: Color::rgb(0x0e, 0xa6, 0x6c),
    down: Color::rgb(0xe1, 0x1d, 0x48),
    widget_background: Color::rgb(0xf8, 0xfb, 0xff),
    font_family: "Helvetica, Arial, sans-serif",
    series: SeriesPalette {
        close: Color::rgb(0x1f, 0x77, 0xb4),
        sma_20: Color::rgb(0xff, 0x7f, 0x0e),
        sma_50: Color::rgb(0x94, 0x67, 0xbd),
        ema_12: Color::rgb(0x2c, 0xa0, 0x2c),
        ema_26: Color::rgb(0x8c, 0x56, 0x4b),
        ema_20: Color::rgb(0x00, 0x80, 0x00),
        bollinger_line: Color::rgb(0x7f, 0x7f, 0x7f),
        bollinger_fill: Color::rgb(0xad, 0xd8, 0xe6),
        rsi: Color::rgb(0x94, 0x67, 0xbd),
        macd: Color::rgb(0x1f, 0x77, 0xb4),
        macd_signal: Color::rgb(0xff, 0x7f, 0x0e),
    },
};

const DARK: ThemeSpec = ThemeSpec {
    name: ThemeName::Dark,
    background: Color::rgb(0x05, 0x09, 0x0f),
    text: Color::rgb(0xe6, 0xed, 0xf7),
    text_secondary: Color::rgb(0x7f, 0x8b, 0xa0),
    grid: Color::rgb(0x1f, 0x2a, 0x38),
    up: Color::rgb(0x3f, 0xb6, 0x8b),
    down: Color::rgb(0xf0, 0x63, 0x5c),
    widget_background: Color::rgb(0x0d, 0x15, 0x20),
    font_family: "Helvetica, Arial, sans-serif",
    series: SeriesPalette {
        close: Color::rgb(0x5c, 0xb0, 0xff),
        sma_20: Color::rgb(0xf7, 0xc8, 0x43),
        sma_50: Color::rgb(0xc0, 0x84, 0xfc),
        ema_12: Color::rgb(0x34, 0xd3, 0x99),
        ema_26: Color::rgb(0xfb, 0x92, 0x3c),
        ema_20: Color::rgb(0x4a, 0xde, 0x80),
        bollinger_line: Color::rgb(0x94, 0xa3, 0xb8),
        bollinger_fill: Color::rgb(0x33, 0x41, 0x55),
        rsi: Color::rgb(0xc0, 0x84, 0xfc),
        macd: Color::rgb(0x5c, 0xb0, 0xff),
        macd_signal: Color::rgb(0xf7, 0xc8, 0x43),
    },
};

const TERMINAL: ThemeSpec = ThemeSpec {
    name: ThemeName::Terminal,
    background: Color::rgb(0x00, 0x00, 0x00),
    text: Color::rgb(0x00, 0xff, 0x41),
    text_secondary: Color::rgb(0x00, 0x8f, 0x11),
    grid: Color::rgb(0x0d, 0x2b, 0x0d),
    up: Color::rgb(0x00, 0xff, 0x41),
    down: Color::rgb(0xff, 0x30, 0x30),
    widget_background: Color::rgb(0x0a, 0x0a, 0x0a),
    font_family: "Courier New, monospace",
    series: SeriesPalette {
        close: Color::rgb(0x00, 0xff, 0x41),
        sma_20: Color::rgb(0xff, 0xb0, 0x00),
        sma_50: Color::rgb(0x00, 0xbf, 0xff),
        ema_12: Color::rgb(0xff, 0xff, 0x00),
        ema_26: Color::rgb(0xff, 0x00, 0xff),
        ema_20: Color::rgb(0x7f, 0xff, 0xd4),
        bollinger_line: Color::rgb(0x00, 0x8f, 0x11),
        bollinger_fill: Color::rgb(0x00, 0x3b, 0x00),
        rsi: Color::rgb(0x00, 0xbf, 0xff),
        macd: Color::rgb(0x00, 0xff, 0x41),
        macd_signal: Color::rgb(0xff, 0xb0, 0x00),
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Light,
    Dark,
    Terminal,
}

impl ThemeName {
    pub const ALL: [ThemeName; 3] = [ThemeName::Light, ThemeName::Dark, ThemeName::Terminal];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Light => "light",
            ThemeName::Dark => "dark",
            ThemeName::Terminal => "terminal",
        }
    }

    pub fn spec(&self) -> &'static ThemeSpec {
        match self {
            ThemeName::Light => &LIGHT,
            ThemeName::Dark => &DARK,
            ThemeName::Terminal => &TERMINAL,
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeName::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownTheme(s.to_string()))
    }
}

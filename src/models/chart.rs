use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::theme::{Color, ThemeName};

/// Indicator toggles offered by the dashboard.
///
/// `SMA/EMA` draws SMA 20/50 and EMA 12/26. The standalone `SMA` and `EMA`
/// toggles draw a single span-20 overlay each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorGroup {
    #[serde(rename = "SMA/EMA")]
    MovingAverages,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "Bollinger Bands")]
    BollingerBands,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
}

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 6] = [
        IndicatorGroup::MovingAverages,
        IndicatorGroup::Sma,
        IndicatorGroup::Ema,
        IndicatorGroup::BollingerBands,
        IndicatorGroup::Rsi,
        IndicatorGroup::Macd,
    ];
}

/// Handle naming the time axis a panel is linked to. Panels holding the same
/// handle pan and zoom together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AxisId(pub String);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAxis {
    pub id: AxisId,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Price,
    Volume,
    Rsi,
    Macd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendLocation {
    TopLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickPolicy {
    Hide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub location: LegendLocation,
    pub click_policy: ClickPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
}

/// How a series is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Glyph {
    Line { color: Color, width: f32, dash: LineDash },
    /// One bar per point, each with its own fill.
    Bars { colors: Vec<Color>, width: f32 },
    /// Filled region between `lower` and `upper`.
    Band { fill: Color, alpha: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SeriesValues {
    Single { values: Vec<Option<f64>> },
    Range { lower: Vec<Option<f64>>, upper: Vec<Option<f64>> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnSeries {
    pub name: String,
    pub legend_label: Option<String>,
    pub glyph: Glyph,
    pub data: SeriesValues,
}

/// Horizontal marker at a fixed value, such as the RSI 70/30 bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub color: Color,
    pub dash: LineDash,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: Option<String>,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
    pub x_axis: AxisId,
    /// Fixed value range; `None` lets the renderer autoscale.
    pub y_range: Option<(f64, f64)>,
    pub background: Color,
    pub grid_color: Color,
    pub series: Vec<DrawnSeries>,
    pub reference_lines: Vec<ReferenceLine>,
    pub legend: Option<Legend>,
}

/// Declarative description of the whole multi-panel chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub theme: ThemeName,
    pub background: Color,
    pub text_color: Color,
    pub font_family: String,
    pub tools: Vec<String>,
    pub time_axis: TimeAxis,
    pub panels: Vec<Panel>,
}

impl ChartSpec {
    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

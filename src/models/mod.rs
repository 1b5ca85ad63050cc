pub mod bar;
pub mod chart;
pub mod series;
pub mod stats;
pub mod status;
pub mod theme;

pub use bar::{Bar, Period, Ticker};
pub use chart::{
    AxisId, ChartSpec, ClickPolicy, DrawnSeries, Glyph, IndicatorGroup, Legend, LegendLocation,
    LineDash, Panel, PanelKind, ReferenceLine, SeriesValues, TimeAxis,
};
pub use series::{Analysis, IndicatorColumn, IndicatorSet, Series};
pub use stats::{RsiSignal, StatsSummary};
pub use status::{StatusEntry, StatusLevel, StatusLog};
pub use theme::{Color, SeriesPalette, ThemeName, ThemeSpec};

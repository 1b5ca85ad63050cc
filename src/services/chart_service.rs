//! Builds the declarative multi-panel chart for an analysis.
//!
//! Every panel shares one time axis handle, and every color comes from the
//! active theme, so rebuilding with another theme changes styling only.

use crate::models::stats::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::models::{
    Analysis, AxisId, ChartSpec, ClickPolicy, Color, DrawnSeries, Glyph, IndicatorGroup, Legend,
    LegendLocation, LineDash, Panel, PanelKind, ReferenceLine, SeriesValues, ThemeName, ThemeSpec,
    TimeAxis,
};

pub const PRICE_PANEL_HEIGHT: u32 = 400;
pub const VOLUME_PANEL_HEIGHT: u32 = 150;
pub const OSCILLATOR_PANEL_HEIGHT: u32 = 180;

const TIME_AXIS_ID: &str = "shared-time";
const TOOLS: [&str; 5] = ["pan", "wheel_zoom", "box_zoom", "reset", "save"];

fn line(name: &str, label: Option<&str>, color: Color, width: f32, dash: LineDash, values: &[Option<f64>]) -> DrawnSeries {
    DrawnSeries {
        name: name.to_string(),
        legend_label: label.map(str::to_string),
        glyph: Glyph::Line { color, width, dash },
        data: SeriesValues::Single { values: values.to_vec() },
    }
}

fn panel(kind: PanelKind, height: u32, y_label: &str, axis: &AxisId, theme: &ThemeSpec) -> Panel {
    Panel {
        kind,
        title: None,
        height,
        x_label: "Date".to_string(),
        y_label: y_label.to_string(),
        x_axis: axis.clone(),
        y_range: None,
        background: theme.background,
        grid_color: theme.grid,
        series: Vec::new(),
        reference_lines: Vec::new(),
        legend: None,
    }
}

fn price_panel(analysis: &Analysis, groups: &[IndicatorGroup], axis: &AxisId, theme: &ThemeSpec) -> Panel {
    let ind = &analysis.indicators;
    let palette = &theme.series;
    let closes: Vec<Option<f64>> = analysis.series.bars().iter().map(|b| Some(b.close)).collect();

    let mut p = panel(PanelKind::Price, PRICE_PANEL_HEIGHT, "Price (USD)", axis, theme);
    p.title = Some(format!("{} Price Chart", analysis.ticker));
    p.legend = Some(Legend {
        location: LegendLocation::TopLeft,
        click_policy: ClickPolicy::Hide,
    });

    // Band goes first so the lines draw on top of the fill.
    if groups.contains(&IndicatorGroup::BollingerBands) {
        p.series.push(DrawnSeries {
            name: "BB_Band".to_string(),
            legend_label: Some("Bollinger Bands".to_string()),
            glyph: Glyph::Band { fill: palette.bollinger_fill, alpha: 0.2 },
            data: SeriesValues::Range {
                lower: ind.bb_lower.clone(),
                upper: ind.bb_upper.clone(),
            },
        });
        p.series.push(line("BB_Upper", None, palette.bollinger_line, 1.0, LineDash::Dashed, &ind.bb_upper));
        p.series.push(line("BB_Middle", None, palette.bollinger_line, 1.0, LineDash::Dotted, &ind.bb_middle));
        p.series.push(line("BB_Lower", None, palette.bollinger_line, 1.0, LineDash::Dashed, &ind.bb_lower));
    }

    p.series.push(line("Close", Some("Close"), palette.close, 2.0, LineDash::Solid, &closes));

    let all_averages = groups.contains(&IndicatorGroup::MovingAverages);
    if all_averages || groups.contains(&IndicatorGroup::Sma) {
        p.series.push(line("SMA_20", Some("SMA 20"), palette.sma_20, 1.5, LineDash::Solid, &ind.sma_20));
    }
    if all_averages {
        p.series.push(line("SMA_50", Some("SMA 50"), palette.sma_50, 1.5, LineDash::Solid, &ind.sma_50));
        p.series.push(line("EMA_12", Some("EMA 12"), palette.ema_12, 1.5, LineDash::Dashed, &ind.ema_12));
        p.series.push(line("EMA_26", Some("EMA 26"), palette.ema_26, 1.5, LineDash::Dashed, &ind.ema_26));
    }
    if groups.contains(&IndicatorGroup::Ema) {
        p.series.push(line("EMA_20", Some("EMA 20"), palette.ema_20, 1.5, LineDash::Solid, &ind.ema_20));
    }

    p
}

fn volume_panel(analysis: &Analysis, axis: &AxisId, theme: &ThemeSpec) -> Panel {
    let bars = analysis.series.bars();
    let mut p = panel(PanelKind::Volume, VOLUME_PANEL_HEIGHT, "Volume", axis, theme);

    p.series.push(DrawnSeries {
        name: "Volume".to_string(),
        legend_label: None,
        glyph: Glyph::Bars {
            colors: bars.iter().map(|b| if b.is_up() { theme.up } else { theme.down }).collect(),
            width: 0.8,
        },
        data: SeriesValues::Single {
            values: bars.iter().map(|b| Some(b.volume as f64)).collect(),
        },
    });

    p
}

fn rsi_panel(analysis: &Analysis, axis: &AxisId, theme: &ThemeSpec) -> Panel {
    let mut p = panel(PanelKind::Rsi, OSCILLATOR_PANEL_HEIGHT, "RSI", axis, theme);
    p.title = Some("RSI (14)".to_string());
    p.y_range = Some((0.0, 100.0));
    p.series.push(line("RSI", Some("RSI 14"), theme.series.rsi, 1.5, LineDash::Solid, &analysis.indicators.rsi_14));
    p.reference_lines = vec![
        ReferenceLine {
            value: RSI_OVERBOUGHT,
            color: theme.down,
            dash: LineDash::Dashed,
            label: "Overbought".to_string(),
        },
        ReferenceLine {
            value: RSI_OVERSOLD,
            color: theme.up,
            dash: LineDash::Dashed,
            label: "Oversold".to_string(),
        },
    ];
    p
}

fn macd_panel(analysis: &Analysis, axis: &AxisId, theme: &ThemeSpec) -> Panel {
    let ind = &analysis.indicators;
    let mut p = panel(PanelKind::Macd, OSCILLATOR_PANEL_HEIGHT, "MACD", axis, theme);
    p.title = Some("MACD (12, 26, 9)".to_string());
    p.legend = Some(Legend {
        location: LegendLocation::TopLeft,
        click_policy: ClickPolicy::Hide,
    });

    p.series.push(DrawnSeries {
        name: "MACD_Hist".to_string(),
        legend_label: Some("Histogram".to_string()),
        glyph: Glyph::Bars {
            colors: ind
                .macd_histogram
                .iter()
                .map(|h| if h.unwrap_or(0.0) >= 0.0 { theme.up } else { theme.down })
                .collect(),
            width: 0.8,
        },
        data: SeriesValues::Single { values: ind.macd_histogram.clone() },
    });
    p.series.push(line("MACD", Some("MACD"), theme.series.macd, 1.5, LineDash::Solid, &ind.macd));
    p.series.push(line("MACD_Signal", Some("Signal"), theme.series.macd_signal, 1.5, LineDash::Solid, &ind.macd_signal));
    p.reference_lines.push(ReferenceLine {
        value: 0.0,
        color: theme.text_secondary,
        dash: LineDash::Dotted,
        label: "Zero".to_string(),
    });
    p
}

/// Lays out the price panel, the volume panel, then one panel per requested
/// oscillator (RSI before MACD), all on one shared time axis.
pub fn compose(analysis: &Analysis, groups: &[IndicatorGroup], theme: ThemeName) -> ChartSpec {
    let spec = theme.spec();
    let axis = AxisId(TIME_AXIS_ID.to_string());

    let mut panels = vec![
        price_panel(analysis, groups, &axis, spec),
        volume_panel(analysis, &axis, spec),
    ];
    if groups.contains(&IndicatorGroup::Rsi) {
        panels.push(rsi_panel(analysis, &axis, spec));
    }
    if groups.contains(&IndicatorGroup::Macd) {
        panels.push(macd_panel(analysis, &axis, spec));
    }

    ChartSpec {
        title: format!("{} Price Chart", analysis.ticker),
        theme,
        background: spec.background,
        text_color: spec.text,
        font_family: spec.font_family.to_string(),
        tools: TOOLS.iter().map(|t| t.to_string()).collect(),
        time_axis: TimeAxis {
            id: axis,
            start: analysis.series.first_date(),
            end: analysis.series.last_date(),
            dates: analysis.series.dates(),
        },
        panels,
    }
}

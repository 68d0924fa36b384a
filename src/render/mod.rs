//! SVG charts for every dashboard panel.
//!
//! Each `draw_*` function works on any plotters backend; the `*_svg` helpers
//! render to an in-memory SVG document.

pub mod dashboard;
pub mod palette;

use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::aggregate::Panel;
use crate::audio::{AudioFeature, CorrelationMatrix, KeyModeChart};
use self::palette::{CATEGORY, Ramp, luminance};

/// Pixel size of bar and scatter charts.
pub const CHART_SIZE: (u32, u32) = (900, 500);
/// Pixel size of the correlation heatmap.
pub const HEATMAP_SIZE: (u32, u32) = (1000, 800);

const STREAMS_AXIS: &str = "Number of Streams (in billions)";
const MAX_LABEL_CHARS: usize = 28;
const MISSING_CELL: RGBColor = RGBColor(128, 128, 128);

/// Background and text colours shared by all charts.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// `None` leaves the background transparent.
    pub background: Option<RGBColor>,
    pub foreground: RGBColor,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Some(BLACK),
            foreground: WHITE,
        }
    }

    pub fn transparent() -> Self {
        Self {
            background: None,
            foreground: RGBColor(38, 38, 38),
        }
    }

    pub fn from_config(dark_background: bool) -> Self {
        if dark_background {
            Self::dark()
        } else {
            Self::transparent()
        }
    }

    fn fill<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        if let Some(bg) = self.background {
            root.fill(&bg)?;
        }
        Ok(())
    }

    fn caption_style(&self) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, 22.0, FontStyle::Bold).color(&self.foreground)
    }

    fn label_style(&self) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Normal).color(&self.foreground)
    }

    fn legend_background(&self) -> RGBAColor {
        self.background.unwrap_or(WHITE).mix(0.8)
    }
}

/// Horizontal bar chart of one ranked summary table, rank 1 at the top.
pub fn draw_ranked_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    panel: &Panel<'_>,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    theme.fill(root)?;
    let rows = &panel.table.rows;
    if rows.is_empty() {
        return draw_no_data(root, &panel.title, theme);
    }

    // Segmented axis over 0..=top gives `slots` categories
    let slots = rows.len().max(2);
    let top = slots as i32 - 1;
    let x_max = rows.iter().map(|r| r.value as f64).fold(0.0, f64::max).max(1.0) * 1.05;
    let names: Vec<String> = rows
        .iter()
        .map(|r| truncate_label(&r.key, MAX_LABEL_CHARS))
        .collect();
    let streams = panel.view.is_streams();

    let mut chart = ChartBuilder::on(root)
        .caption(&panel.title, theme.caption_style())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(210)
        .build_cartesian_2d(0f64..x_max, (0..top).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(slots)
        .x_desc(panel.metric_label)
        .y_desc(panel.key_label)
        .x_label_formatter(&|v| {
            if streams {
                format_streams(*v)
            } else {
                format!("{:.0}", v)
            }
        })
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(slot) => slot_label(&names, top - slot),
            _ => String::new(),
        })
        .axis_style(theme.foreground)
        .bold_line_style(theme.foreground.mix(0.15))
        .light_line_style(TRANSPARENT)
        .label_style(theme.label_style())
        .axis_desc_style(theme.label_style())
        .draw()?;

    let colors = Ramp::Magma.spread(rows.len());
    chart.draw_series(rows.iter().zip(colors).enumerate().map(|(i, (row, color))| {
        let slot = top - i as i32;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (row.value as f64, slot_end(slot, top)),
            ],
            color.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    Ok(())
}

/// Feature value against stream count, points coloured by the feature value.
pub fn draw_feature_scatter<DB>(
    root: &DrawingArea<DB, Shift>,
    feature: AudioFeature,
    points: &[(f64, f64)],
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    theme.fill(root)?;
    let title = format!("{} vs Number of Streams", feature.label());
    if points.is_empty() {
        return draw_no_data(root, &title, theme);
    }

    let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let pad = span * 0.05;
    let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(root)
        .caption(&title, theme.caption_style())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d((lo - pad)..(lo + span + pad), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(feature.label())
        .y_desc(STREAMS_AXIS)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format_streams(*v))
        .axis_style(theme.foreground)
        .bold_line_style(theme.foreground.mix(0.15))
        .light_line_style(TRANSPARENT)
        .label_style(theme.label_style())
        .axis_desc_style(theme.label_style())
        .draw()?;

    chart.draw_series(points.iter().map(|&(x, y)| {
        Circle::new((x, y), 4, Ramp::Plasma.at((x - lo) / span).filled())
    }))?;

    Ok(())
}

/// Mean streams per key, one bar per mode within each key.
pub fn draw_key_mode<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &KeyModeChart,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    theme.fill(root)?;
    let title = "Barplot of Streams by Key and Mode";
    if data.bars.is_empty() {
        return draw_no_data(root, title, theme);
    }

    let n_modes = data.modes.len();
    let slots = (data.keys.len() * n_modes).max(2);
    let top = slots as i32 - 1;
    let y_max = data.max_mean().max(1.0) * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(title, theme.caption_style())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d((0..top).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_desc("Key")
        .y_desc(STREAMS_AXIS)
        .x_label_formatter(&|v| match v {
            // Key name under the first bar of each group
            SegmentValue::CenterOf(slot) if *slot >= 0 && *slot as usize % n_modes == 0 => data
                .keys
                .get(*slot as usize / n_modes)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| format_streams(*v))
        .axis_style(theme.foreground)
        .bold_line_style(theme.foreground.mix(0.15))
        .light_line_style(TRANSPARENT)
        .label_style(theme.label_style())
        .axis_desc_style(theme.label_style())
        .draw()?;

    for (m, mode) in data.modes.iter().enumerate() {
        let color = CATEGORY[m % CATEGORY.len()];
        let bars: Vec<_> = data
            .keys
            .iter()
            .enumerate()
            .filter_map(|(k, key)| {
                let bar = data.bar(key, mode)?;
                let slot = (k * n_modes + m) as i32;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(slot), 0.0),
                        (slot_end(slot, top), bar.mean_streams),
                    ],
                    color.filled(),
                );
                rect.set_margin(0, 0, 2, 2);
                Some(rect)
            })
            .collect();

        chart
            .draw_series(bars)?
            .label(mode.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(theme.legend_background())
        .border_style(theme.foreground)
        .label_font(theme.label_style())
        .draw()?;

    Ok(())
}

/// Annotated correlation heatmap; undefined coefficients are drawn grey.
pub fn draw_correlation_heatmap<DB>(
    root: &DrawingArea<DB, Shift>,
    matrix: &CorrelationMatrix,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    theme.fill(root)?;
    let title = "Correlation Matrix for Audio Features";
    let n = matrix.features.len();
    if n == 0 {
        return draw_no_data(root, title, theme);
    }

    let slots = n.max(2);
    let top = slots as i32 - 1;
    let labels: Vec<String> = matrix.features.iter().map(|f| f.label().to_string()).collect();
    let (lo, hi) = matrix.range().unwrap_or((-1.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(title, theme.caption_style())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(150)
        .build_cartesian_2d((0..top).into_segmented(), (0..top).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(slots)
        .y_labels(slots)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(slot) => slot_label(&labels, *slot),
            _ => String::new(),
        })
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(slot) => slot_label(&labels, top - slot),
            _ => String::new(),
        })
        .axis_style(theme.foreground)
        .label_style(
            FontDesc::new(FontFamily::SansSerif, 12.0, FontStyle::Normal).color(&theme.foreground),
        )
        .draw()?;

    let mut cells = Vec::with_capacity(n * n);
    let mut notes = Vec::with_capacity(n * n);
    for (i, row) in matrix.values.iter().enumerate() {
        let y = top - i as i32;
        for (j, &r) in row.iter().enumerate() {
            let x = j as i32;
            let color = if r.is_finite() {
                Ramp::Mako.at((r - lo) / span)
            } else {
                MISSING_CELL
            };
            let mut cell = Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (slot_end(x, top), slot_end(y, top)),
                ],
                color.filled(),
            );
            cell.set_margin(1, 1, 1, 1);
            cells.push(cell);

            let ink = if luminance(color) > 0.5 { BLACK } else { WHITE };
            notes.push(Text::new(
                format_coefficient(r),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Normal)
                    .color(&ink)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ));
        }
    }
    chart.draw_series(cells)?;
    chart.draw_series(notes)?;

    Ok(())
}

/// Placeholder for a panel with nothing to plot.
fn draw_no_data<DB>(root: &DrawingArea<DB, Shift>, title: &str, theme: &Theme) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = root.dim_in_pixel();
    let centered = Pos::new(HPos::Center, VPos::Center);
    root.draw_text(
        title,
        &theme.caption_style().pos(Pos::new(HPos::Center, VPos::Top)),
        (w as i32 / 2, 15),
    )?;
    root.draw_text("No data", &theme.label_style().pos(centered), (w as i32 / 2, h as i32 / 2))?;
    Ok(())
}

/// Render a chart into an SVG document string.
pub fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

pub fn ranked_bars_svg(panel: &Panel<'_>, theme: &Theme) -> Result<String> {
    render_svg(CHART_SIZE, |root| draw_ranked_bars(root, panel, theme))
}

pub fn feature_scatter_svg(
    feature: AudioFeature,
    points: &[(f64, f64)],
    theme: &Theme,
) -> Result<String> {
    render_svg(CHART_SIZE, |root| draw_feature_scatter(root, feature, points, theme))
}

pub fn key_mode_svg(data: &KeyModeChart, theme: &Theme) -> Result<String> {
    render_svg(CHART_SIZE, |root| draw_key_mode(root, data, theme))
}

pub fn correlation_heatmap_svg(matrix: &CorrelationMatrix, theme: &Theme) -> Result<String> {
    render_svg(HEATMAP_SIZE, |root| draw_correlation_heatmap(root, matrix, theme))
}

/// Write a rendered chart to disk, creating parent directories.
pub fn write_svg(path: &Path, svg: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Axis label for stream counts: 2.5B, 840M, 12K.
pub fn format_streams(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.0}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.0}K", v / 1e3)
    } else {
        format!("{:.0}", v)
    }
}

pub fn format_coefficient(r: f64) -> String {
    if r.is_finite() {
        format!("{:.2}", r)
    } else {
        "nan".to_string()
    }
}

/// Shorten long names on a char boundary.
pub fn truncate_label(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn slot_label(labels: &[String], index: i32) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| labels.get(i))
        .cloned()
        .unwrap_or_default()
}

/// Upper edge of a category slot; the last slot runs to the plot edge.
fn slot_end(slot: i32, top: i32) -> SegmentValue<i32> {
    if slot >= top {
        SegmentValue::Last
    } else {
        SegmentValue::Exact(slot + 1)
    }
}

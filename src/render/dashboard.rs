//! Static HTML dashboard: every panel as an SVG file plus an `index.html`
//! that lays them out with the summary tables.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{
    Theme, correlation_heatmap_svg, feature_scatter_svg, format_streams, key_mode_svg,
    ranked_bars_svg, write_svg,
};
use crate::aggregate::{RankedTable, Summaries, SummaryView};
use crate::audio::{self, AudioFeature};
use crate::dataset::Dataset;

pub const PAGE_TITLE: &str = "Music Data Analysis Dashboard";

/// Which panels the page opens with.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub view: SummaryView,
    pub feature: AudioFeature,
    pub heatmap_features: Vec<AudioFeature>,
    pub theme: Theme,
}

/// Render every chart into `dir` and write the page. Returns the page path.
pub fn write_dashboard(
    dir: &Path,
    dataset: &Dataset,
    summaries: &Summaries,
    options: &DashboardOptions,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let theme = &options.theme;

    for view in SummaryView::ALL {
        let svg = ranked_bars_svg(&summaries.panel(view), theme)
            .with_context(|| format!("Failed to render {}", view.slug()))?;
        write_svg(&dir.join(summary_file(view)), &svg)?;
    }

    let points = audio::scatter_points(dataset, options.feature);
    let svg = feature_scatter_svg(options.feature, &points, theme)
        .context("Failed to render feature scatter")?;
    write_svg(&dir.join(scatter_file(options.feature)), &svg)?;

    let svg = key_mode_svg(&audio::key_mode_bars(dataset), theme)
        .context("Failed to render key/mode chart")?;
    write_svg(&dir.join("key_mode.svg"), &svg)?;

    let matrix = audio::correlation_matrix(dataset, &options.heatmap_features);
    let svg = correlation_heatmap_svg(&matrix, theme)
        .context("Failed to render correlation heatmap")?;
    write_svg(&dir.join("correlation.svg"), &svg)?;

    let index = dir.join("index.html");
    let file = File::create(&index).with_context(|| format!("Failed to create {}", index.display()))?;
    let mut writer = BufWriter::new(file);
    write_page(&mut writer, summaries, options)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write {}", index.display()))?;

    log::info!("Dashboard written to {}", index.display());
    Ok(index)
}

fn summary_file(view: SummaryView) -> String {
    format!("top_{}.svg", view.slug())
}

fn scatter_file(feature: AudioFeature) -> String {
    format!("scatter_{}.svg", feature.label().to_lowercase())
}

/// Write the page markup. Charts are referenced by relative file name.
pub fn write_page<W: Write>(
    writer: &mut W,
    summaries: &Summaries,
    options: &DashboardOptions,
) -> io::Result<()> {
    let (bg, fg) = match options.theme.background {
        Some(_) => ("#0e1117", "#fafafa"),
        None => ("#ffffff", "#262626"),
    };

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ background: {bg}; color: {fg}; font-family: sans-serif; margin: 2rem auto; max-width: 1100px; }}
        img {{ max-width: 100%; }}
        table {{ border-collapse: collapse; margin: 0.5rem 1.5rem 1.5rem 0; display: inline-table; vertical-align: top; }}
        th, td {{ padding: 0.2rem 0.6rem; border-bottom: 1px solid #444; text-align: left; }}
        td.num {{ text-align: right; }}
        .muted {{ opacity: 0.7; }}
    </style>
</head>
<body>
<h1>{title}</h1>
<h2>Top {limit} Visualizations</h2>
<img src="{summary}" alt="{summary_title}">
"#,
        title = PAGE_TITLE,
        bg = bg,
        fg = fg,
        limit = summaries.limit,
        summary = summary_file(options.view),
        summary_title = escape_html(&options.view.title(summaries.limit)),
    )?;

    for view in SummaryView::ALL {
        write_table(writer, &view.title(summaries.limit), view, summaries.table(view))?;
    }

    let feature = options.feature.label();
    write!(
        writer,
        r#"
<h2>Audio Features Analysis</h2>
<h3>Audio Features vs Number of Streams</h3>
<p class="muted">Explore how audio features like danceability, energy, and valence relate to the number of streams.</p>
<img src="{scatter}" alt="{feature} vs Number of Streams">
<h3>Barplot of Streams by Key and Mode</h3>
<p class="muted">This plot shows the distribution of streams based on the musical key and mode of the songs.</p>
<img src="key_mode.svg" alt="Barplot of Streams by Key and Mode">
<h3>Correlation Matrix for Audio Features</h3>
<p class="muted">Check the correlations between different audio features to see how they are related.</p>
<img src="correlation.svg" alt="Correlation Matrix for Audio Features">
</body>
</html>
"#,
        scatter = scatter_file(options.feature),
        feature = feature,
    )
}

fn write_table<W: Write>(
    writer: &mut W,
    caption: &str,
    view: SummaryView,
    table: &RankedTable,
) -> io::Result<()> {
    writeln!(writer, "<table>")?;
    writeln!(writer, "<caption>{}</caption>", escape_html(caption))?;
    writeln!(
        writer,
        "<tr><th>#</th><th>{}</th><th>{}</th></tr>",
        view.key_label(),
        view.metric_label()
    )?;
    for (i, row) in table.rows.iter().enumerate() {
        let value = if view.is_streams() {
            format_streams(row.value as f64)
        } else {
            row.value.to_string()
        };
        writeln!(
            writer,
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
            i + 1,
            escape_html(&row.key),
            value
        )?;
    }
    writeln!(writer, "</table>")
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

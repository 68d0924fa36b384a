use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::PathBuf;
use streamdash::aggregate::{Panel, Summaries, SummaryView};
use streamdash::audio::{self, AudioFeature};
use streamdash::dataset::{self, Dataset, LoadOptions};
use streamdash::render::{self, Theme};

#[derive(Parser)]
#[command(name = "streamdash", version, about = "Music streaming dataset explorer")]
struct Cli {
    /// Path to the cleaned dataset CSV
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewName {
    #[value(alias = "artists")]
    ArtistsByStreams,
    #[value(alias = "song-count")]
    ArtistsBySongCount,
    #[value(alias = "tracks")]
    TracksByStreams,
}

impl ViewName {
    fn view(&self) -> SummaryView {
        match self {
            Self::ArtistsByStreams => SummaryView::ArtistsByStreams,
            Self::ArtistsBySongCount => SummaryView::ArtistsBySongCount,
            Self::TracksByStreams => SummaryView::TracksByStreams,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FeatureName {
    Danceability,
    Valence,
    Energy,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    #[value(alias = "tempo")]
    Bpm,
}

impl FeatureName {
    fn feature(&self) -> AudioFeature {
        match self {
            Self::Danceability => AudioFeature::Danceability,
            Self::Valence => AudioFeature::Valence,
            Self::Energy => AudioFeature::Energy,
            Self::Acousticness => AudioFeature::Acousticness,
            Self::Instrumentalness => AudioFeature::Instrumentalness,
            Self::Liveness => AudioFeature::Liveness,
            Self::Speechiness => AudioFeature::Speechiness,
            Self::Bpm => AudioFeature::Bpm,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show a top-N summary table (artists by streams, by song count, or tracks)
    Top {
        /// Which summary to show
        #[arg(value_enum, default_value = "artists-by-streams")]
        view: ViewName,

        /// Number of rows (defaults to config top_n)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,

        /// Also render the bar chart to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Plot an audio feature against stream count
    Scatter {
        /// Feature on the x axis
        #[arg(value_enum, default_value = "danceability")]
        feature: FeatureName,

        /// Output SVG file
        #[arg(long, default_value = "scatter.svg")]
        svg: PathBuf,
    },

    /// Mean streams by musical key and mode
    KeyMode {
        /// Also render the bar chart to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Correlation matrix of the audio features
    Correlation {
        /// Include tempo (bpm) alongside the percentage features
        #[arg(long)]
        include_bpm: bool,

        /// Also render the heatmap to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Render every panel plus an index.html page
    Dashboard {
        /// Output directory (defaults to config output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Summary view featured at the top of the page
        #[arg(long, value_enum, default_value = "artists-by-streams")]
        view: ViewName,

        /// Feature for the scatter panel
        #[arg(long, value_enum, default_value = "danceability")]
        feature: FeatureName,

        /// Number of rows per summary table (defaults to config top_n)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Include tempo (bpm) in the correlation heatmap
        #[arg(long)]
        include_bpm: bool,
    },

    /// Show dataset statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = streamdash::config::AppConfig::load();
    let theme = Theme::from_config(config.dark_background);

    // Resolve dataset path: CLI > config > default
    let data_path = config.resolve_data_path(cli.data);
    log::info!("Dataset: {}", data_path.display());

    let options = LoadOptions {
        lenient_streams: config.lenient_streams,
    };
    let ds = dataset::load(&data_path, options)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    match cli.command {
        Commands::Top { view, limit, json, svg } => {
            let summaries = Summaries::compute(&ds, config.resolve_top_n(limit));
            let panel = summaries.panel(view.view());

            if json {
                let out = serde_json::to_string_pretty(panel.table)
                    .context("Failed to serialize table")?;
                println!("{}", out);
            } else if panel.table.is_empty() {
                println!("No rows in dataset.");
            } else {
                print_ranked_table(&panel);
            }

            if let Some(path) = svg {
                let chart = render::ranked_bars_svg(&panel, &theme).context("Render failed")?;
                render::write_svg(&path, &chart)?;
            }
        }

        Commands::Scatter { feature, svg } => {
            let feature = feature.feature();
            let points = audio::scatter_points(&ds, feature);
            if points.is_empty() {
                println!("No rows with both {} and streams.", feature.column());
            } else {
                let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
                let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
                println!(
                    "{} vs Number of Streams: {} points, {} range {:.0}..{:.0}",
                    feature.label(),
                    points.len(),
                    feature.column(),
                    lo,
                    hi
                );
            }
            let chart = render::feature_scatter_svg(feature, &points, &theme)
                .context("Render failed")?;
            render::write_svg(&svg, &chart)?;
        }

        Commands::KeyMode { svg } => {
            let chart = audio::key_mode_bars(&ds);
            if chart.bars.is_empty() {
                println!("No rows with both key and streams.");
            } else {
                println!("Mean streams by key and mode:");
                println!();
                println!("{:<6} {:<8} {:>7} {:>14}", "Key", "Mode", "Tracks", "Mean streams");
                println!("{}", "-".repeat(38));
                for bar in &chart.bars {
                    println!(
                        "{:<6} {:<8} {:>7} {:>14.0}",
                        bar.key, bar.mode, bar.tracks, bar.mean_streams
                    );
                }
            }

            if let Some(path) = svg {
                let out = render::key_mode_svg(&chart, &theme).context("Render failed")?;
                render::write_svg(&path, &out)?;
            }
        }

        Commands::Correlation { include_bpm, svg } => {
            let features = heatmap_features(include_bpm);
            let matrix = audio::correlation_matrix(&ds, &features);

            print!("{:<17}", "");
            for f in &matrix.features {
                print!(" {:>7}", abbreviate(f.label()));
            }
            println!();
            for (f, row) in matrix.features.iter().zip(&matrix.values) {
                print!("{:<17}", f.label());
                for r in row {
                    print!(" {:>7}", render::format_coefficient(*r));
                }
                println!();
            }

            if let Some(path) = svg {
                let out = render::correlation_heatmap_svg(&matrix, &theme)
                    .context("Render failed")?;
                render::write_svg(&path, &out)?;
            }
        }

        Commands::Dashboard { out, view, feature, limit, include_bpm } => {
            let dir = out.unwrap_or_else(|| config.output_dir.clone());
            let summaries = Summaries::compute(&ds, config.resolve_top_n(limit));
            let options = render::dashboard::DashboardOptions {
                view: view.view(),
                feature: feature.feature(),
                heatmap_features: heatmap_features(include_bpm),
                theme,
            };
            let index = render::dashboard::write_dashboard(&dir, &ds, &summaries, &options)
                .context("Dashboard generation failed")?;
            println!("Dashboard written to {}", index.display());
        }

        Commands::Stats => print_stats(&ds),
    }

    Ok(())
}

fn heatmap_features(include_bpm: bool) -> Vec<AudioFeature> {
    if include_bpm {
        AudioFeature::ALL.to_vec()
    } else {
        AudioFeature::PERCENTAGES.to_vec()
    }
}

/// First four letters, for matrix column headers.
fn abbreviate(label: &str) -> String {
    label.chars().take(4).collect()
}

/// Print a ranked summary table.
fn print_ranked_table(panel: &Panel<'_>) {
    println!("{}:", panel.title);
    println!();
    println!("{:>3}  {:<40} {:>16}", "#", panel.key_label, panel.metric_label);
    println!("{}", "-".repeat(62));

    for (i, row) in panel.table.rows.iter().enumerate() {
        println!(
            "{:>3}  {:<40} {:>16}",
            i + 1,
            render::truncate_label(&row.key, 40),
            row.value
        );
    }
}

/// Print dataset statistics.
fn print_stats(ds: &Dataset) {
    let artists: HashSet<&str> = ds.credits().iter().flatten().map(String::as_str).collect();
    let names: HashSet<&str> = ds.tracks().iter().map(|t| t.track_name.as_str()).collect();
    let missing = ds.tracks().iter().filter(|t| t.streams.is_none()).count();

    println!("Dataset Statistics");
    println!("==================");
    println!("Tracks:             {}", ds.len());
    println!("Distinct artists:   {}", artists.len());
    println!("Distinct titles:    {}", names.len());
    println!("Total streams:      {}", ds.total_streams());
    println!("Missing streams:    {}", missing);
}

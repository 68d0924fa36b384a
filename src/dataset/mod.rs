pub mod artists;
pub mod models;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use self::models::{RawRecord, Track};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid stream count {value:?} on line {line}")]
    InvalidStreams { line: u64, value: String },
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Columns every input file must carry. `artists` may also appear under the
/// un-cleaned export's header, see [`ARTISTS_ALIASES`].
pub const REQUIRED_COLUMNS: &[&str] = &[
    "track_name",
    "artists",
    "streams",
    "key",
    "mode",
    "bpm",
    "danceability_%",
    "valence_%",
    "energy_%",
    "acousticness_%",
    "instrumentalness_%",
    "liveness_%",
    "speechiness_%",
];

/// Accepted headers for the artist credit column.
pub const ARTISTS_ALIASES: &[&str] = &["artists", "artist(s)_name"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Treat unparseable stream counts as missing instead of failing the load.
    pub lenient_streams: bool,
}

/// The loaded table plus its normalized artist column.
///
/// Immutable once built: the artist split happens exactly once, in
/// [`Dataset::from_tracks`], and `credits()[i]` always belongs to `tracks()[i]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    tracks: Vec<Track>,
    credits: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let credits = tracks
            .iter()
            .map(|t| artists::split_artists(&t.artists))
            .collect();
        Self { tracks, credits }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Normalized artist names per row.
    pub fn credits(&self) -> &[Vec<String>] {
        &self.credits
    }

    /// Each track paired with its normalized artist names.
    pub fn rows(&self) -> impl Iterator<Item = (&Track, &[String])> {
        self.tracks
            .iter()
            .zip(self.credits.iter().map(Vec::as_slice))
    }

    /// Sum of all known stream counts, saturating at `u64::MAX`.
    pub fn total_streams(&self) -> u64 {
        self.tracks
            .iter()
            .filter_map(|t| t.streams)
            .fold(0u64, u64::saturating_add)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Load the dataset from a CSV file on disk.
pub fn load(path: &Path, options: LoadOptions) -> Result<Dataset> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let dataset = load_from_reader(file, options)?;
    log::info!("Loaded {} tracks from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Load the dataset from any CSV source (header row required).
pub fn load_from_reader<R: Read>(reader: R, options: LoadOptions) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    check_columns(&headers)?;

    let mut tracks = Vec::new();
    let mut skipped_streams = 0usize;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = record.deserialize(Some(&headers))?;

        let streams = if raw.streams.is_empty() {
            None
        } else {
            match parse_stream_count(&raw.streams) {
                Some(count) => Some(count),
                None if options.lenient_streams => {
                    log::warn!(
                        "Line {}: unparseable stream count {:?}, treating as missing",
                        line,
                        raw.streams
                    );
                    skipped_streams += 1;
                    None
                }
                None => {
                    return Err(DatasetError::InvalidStreams {
                        line,
                        value: raw.streams,
                    });
                }
            }
        };

        tracks.push(raw.into_track(streams));
    }

    if skipped_streams > 0 {
        log::warn!("{} rows had unparseable stream counts", skipped_streams);
    }
    log::debug!("Parsed {} rows", tracks.len());

    Ok(Dataset::from_tracks(tracks))
}

/// Verify the header row carries every required column.
fn check_columns(headers: &csv::StringRecord) -> Result<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    for &column in REQUIRED_COLUMNS {
        let present = if column == "artists" {
            ARTISTS_ALIASES.iter().any(|alias| has(alias))
        } else {
            has(column)
        };
        if !present {
            return Err(DatasetError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Coerce a stream-count cell to an integer.
///
/// Accepts plain integers, integers with `,` or `_` digit grouping, and finite
/// non-negative decimals (rounded). Returns `None` for anything else.
pub fn parse_stream_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v <= u64::MAX as f64 => Some(v.round() as u64),
        _ => None,
    }
}

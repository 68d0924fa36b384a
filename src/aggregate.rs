//! Ranked summary tables over the track table.
//!
//! Stream attribution gives every credited artist the full stream count of a
//! track (no splitting between co-artists), so the per-artist totals of one
//! track add up to `streams × credited artists`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::dataset::Dataset;

/// Default number of rows kept in every summary table.
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub key: String,
    pub value: u64,
}

/// A summary table sorted descending by `value`, unique by `key`.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTable {
    pub key_column: &'static str,
    pub metric_column: &'static str,
    pub rows: Vec<RankedRow>,
}

impl RankedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The selectable summary views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryView {
    ArtistsByStreams,
    ArtistsBySongCount,
    TracksByStreams,
}

impl SummaryView {
    pub const ALL: [SummaryView; 3] = [
        SummaryView::ArtistsByStreams,
        SummaryView::ArtistsBySongCount,
        SummaryView::TracksByStreams,
    ];

    pub fn title(&self, limit: usize) -> String {
        match self {
            Self::ArtistsByStreams => format!("Top {} Artists Based on Streams", limit),
            Self::ArtistsBySongCount => format!("Top {} Artists with Most Songs", limit),
            Self::TracksByStreams => format!("Top {} Tracks Based on Streams", limit),
        }
    }

    /// Label for the ranked metric axis.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::ArtistsByStreams | Self::TracksByStreams => "Streams",
            Self::ArtistsBySongCount => "Count",
        }
    }

    /// Label for the category axis.
    pub fn key_label(&self) -> &'static str {
        match self {
            Self::ArtistsByStreams | Self::ArtistsBySongCount => "Artists",
            Self::TracksByStreams => "Track Name",
        }
    }

    /// Whether the metric is a stream count (drives axis formatting).
    pub fn is_streams(&self) -> bool {
        !matches!(self, Self::ArtistsBySongCount)
    }

    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::ArtistsByStreams => "artists_by_streams",
            Self::ArtistsBySongCount => "artists_by_song_count",
            Self::TracksByStreams => "tracks_by_streams",
        }
    }
}

/// Everything needed to draw one summary view.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    pub view: SummaryView,
    pub table: &'a RankedTable,
    pub title: String,
    pub metric_label: &'static str,
    pub key_label: &'static str,
}

/// All three summary tables, computed together.
#[derive(Debug, Clone, Serialize)]
pub struct Summaries {
    pub limit: usize,
    pub artists_by_streams: RankedTable,
    pub artists_by_song_count: RankedTable,
    pub tracks_by_streams: RankedTable,
}

impl Summaries {
    pub fn compute(dataset: &Dataset, limit: usize) -> Self {
        Self {
            limit,
            artists_by_streams: top_artists_by_streams(dataset, limit),
            artists_by_song_count: top_artists_by_song_count(dataset, limit),
            tracks_by_streams: top_tracks_by_streams(dataset, limit),
        }
    }

    pub fn table(&self, view: SummaryView) -> &RankedTable {
        match view {
            SummaryView::ArtistsByStreams => &self.artists_by_streams,
            SummaryView::ArtistsBySongCount => &self.artists_by_song_count,
            SummaryView::TracksByStreams => &self.tracks_by_streams,
        }
    }

    pub fn panel(&self, view: SummaryView) -> Panel<'_> {
        Panel {
            view,
            table: self.table(view),
            title: view.title(self.limit),
            metric_label: view.metric_label(),
            key_label: view.key_label(),
        }
    }
}

/// Top artists by number of credited tracks.
///
/// Ties keep the order in which artists were first encountered.
pub fn top_artists_by_song_count(dataset: &Dataset, limit: usize) -> RankedTable {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<RankedRow> = Vec::new();

    for artist in dataset.credits().iter().flatten() {
        match index.get(artist.as_str()) {
            Some(&i) => counts[i].value += 1,
            None => {
                index.insert(artist.as_str(), counts.len());
                counts.push(RankedRow {
                    key: artist.clone(),
                    value: 1,
                });
            }
        }
    }
    log::debug!("{} distinct artists by song count", counts.len());

    RankedTable {
        key_column: "artists",
        metric_column: "Count",
        rows: rank(counts, limit),
    }
}

/// One `(artist, streams)` pair per credited artist per track.
pub fn explode_artist_streams(dataset: &Dataset) -> Vec<(&str, Option<u64>)> {
    dataset
        .rows()
        .flat_map(|(track, artists)| artists.iter().map(move |a| (a.as_str(), track.streams)))
        .collect()
}

/// Top artists by total streams, each credited artist receiving the full count.
pub fn top_artists_by_streams(dataset: &Dataset, limit: usize) -> RankedTable {
    let totals = sum_by_key(explode_artist_streams(dataset));
    log::debug!("{} distinct artists by streams", totals.len());

    RankedTable {
        key_column: "artists",
        metric_column: "streams",
        rows: rank(totals, limit),
    }
}

/// Top track names by total streams; duplicate names across releases collapse.
pub fn top_tracks_by_streams(dataset: &Dataset, limit: usize) -> RankedTable {
    let totals = sum_by_key(
        dataset
            .tracks()
            .iter()
            .map(|t| (t.track_name.as_str(), t.streams)),
    );
    log::debug!("{} distinct track names", totals.len());

    RankedTable {
        key_column: "track_name",
        metric_column: "streams",
        rows: rank(totals, limit),
    }
}

/// Group by key and sum, skipping missing values. Totals saturate at
/// `u64::MAX`. Output is in ascending key order, which becomes the tie order
/// after ranking.
fn sum_by_key<'a, I>(pairs: I) -> Vec<RankedRow>
where
    I: IntoIterator<Item = (&'a str, Option<u64>)>,
{
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for (key, streams) in pairs {
        let total = groups.entry(key).or_insert(0);
        *total = total.saturating_add(streams.unwrap_or(0));
    }
    groups
        .into_iter()
        .map(|(key, value)| RankedRow {
            key: key.to_string(),
            value,
        })
        .collect()
}

/// Stable sort descending by value, then truncate.
fn rank(mut rows: Vec<RankedRow>, limit: usize) -> Vec<RankedRow> {
    rows.sort_by(|a, b| b.value.cmp(&a.value));
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{csv_with, load_str};

    fn two_row_example() -> Dataset {
        load_str(&csv_with(&[
            r#"Track A,"X, Y",100,120,C#,Major,80,60,70,10,0,12,5"#,
            "Track B,X,50,95,D,Minor,50,40,30,20,1,8,4",
        ]))
    }

    fn pairs(table: &RankedTable) -> Vec<(&str, u64)> {
        table.rows.iter().map(|r| (r.key.as_str(), r.value)).collect()
    }

    fn assert_ranked(table: &RankedTable, limit: usize) {
        assert!(table.len() <= limit);
        for w in table.rows.windows(2) {
            assert!(w[0].value >= w[1].value, "not sorted: {:?}", table.rows);
        }
        let mut keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), table.len(), "duplicate keys: {:?}", table.rows);
    }

    /// 30 tracks, 12 artists, some co-credits and repeated track names.
    fn large_dataset() -> Dataset {
        let mut lines = Vec::new();
        for i in 0..30u64 {
            let lead = format!("Artist {}", i % 12);
            let artists = if i % 4 == 0 {
                format!("\"{}, Artist {}\"", lead, (i + 5) % 12)
            } else {
                lead
            };
            let name = format!("Song {}", i % 17);
            let streams = if i == 7 { String::new() } else { (i * 1_000_003 % 97_000).to_string() };
            lines.push(format!("{name},{artists},{streams},120,A,Major,50,50,50,50,0,10,5"));
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        load_str(&csv_with(&refs))
    }

    #[test]
    fn test_two_row_example_by_streams() {
        let ds = two_row_example();
        let table = top_artists_by_streams(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("X", 150), ("Y", 100)]);
    }

    #[test]
    fn test_two_row_example_by_song_count() {
        let ds = two_row_example();
        let table = top_artists_by_song_count(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("X", 2), ("Y", 1)]);
    }

    #[test]
    fn test_top_tracks_collapses_duplicate_names() {
        let ds = load_str(&csv_with(&[
            "Flowers,Miley Cyrus,300,118,,Major,70,65,68,6,0,3,7",
            "Flowers,Someone Else,50,118,,Major,70,65,68,6,0,3,7",
            "Kill Bill,SZA,200,89,G#,Major,64,43,73,5,17,16,4",
        ]));
        let table = top_tracks_by_streams(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("Flowers", 350), ("Kill Bill", 200)]);
        assert_eq!(table.key_column, "track_name");
    }

    #[test]
    fn test_short_tables_are_not_padded() {
        let ds = two_row_example();
        let summaries = Summaries::compute(&ds, DEFAULT_LIMIT);
        assert_eq!(summaries.artists_by_streams.len(), 2);
        assert_eq!(summaries.artists_by_song_count.len(), 2);
        assert_eq!(summaries.tracks_by_streams.len(), 2);
    }

    #[test]
    fn test_tables_bounded_and_sorted() {
        let ds = large_dataset();
        let summaries = Summaries::compute(&ds, DEFAULT_LIMIT);
        for view in SummaryView::ALL {
            let table = summaries.table(view);
            assert_eq!(table.len(), DEFAULT_LIMIT, "{:?}", view);
            assert_ranked(table, DEFAULT_LIMIT);
        }

        let small = Summaries::compute(&ds, 3);
        for view in SummaryView::ALL {
            assert_ranked(small.table(view), 3);
            assert_eq!(small.table(view).len(), 3);
        }
    }

    #[test]
    fn test_stream_mass_round_trip() {
        let ds = large_dataset();
        let exploded_total: u64 = sum_by_key(explode_artist_streams(&ds))
            .iter()
            .map(|r| r.value)
            .sum();
        let expected: u64 = ds
            .rows()
            .map(|(t, artists)| t.streams.unwrap_or(0) * artists.len() as u64)
            .sum();
        assert_eq!(exploded_total, expected);
    }

    #[test]
    fn test_full_credit_per_co_artist() {
        let ds = load_str(&csv_with(&["Duet,\"A, B, C\",90,100,A,Major,1,1,1,1,1,1,1"]));
        let table = top_artists_by_streams(&ds, DEFAULT_LIMIT);
        assert!(table.rows.iter().all(|r| r.value == 90));
        assert_eq!(table.rows.iter().map(|r| r.value).sum::<u64>(), 270);
    }

    #[test]
    fn test_song_count_ties_keep_first_encountered_order() {
        let ds = load_str(&csv_with(&[
            "S1,Zed,1,100,A,Major,1,1,1,1,1,1,1",
            "S2,Amy,1,100,A,Major,1,1,1,1,1,1,1",
            "S3,Moe,1,100,A,Major,1,1,1,1,1,1,1",
            "S4,Moe,1,100,A,Major,1,1,1,1,1,1,1",
        ]));
        let table = top_artists_by_song_count(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("Moe", 2), ("Zed", 1), ("Amy", 1)]);
    }

    #[test]
    fn test_stream_ties_break_by_key() {
        let ds = load_str(&csv_with(&[
            "Zulu,B,10,100,A,Major,1,1,1,1,1,1,1",
            "Alpha,A,10,100,A,Major,1,1,1,1,1,1,1",
        ]));
        let table = top_tracks_by_streams(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("Alpha", 10), ("Zulu", 10)]);
    }

    #[test]
    fn test_missing_streams_are_skipped_in_sums() {
        let ds = load_str(&csv_with(&[
            "T1,A,,100,A,Major,1,1,1,1,1,1,1",
            "T2,A,5,100,A,Major,1,1,1,1,1,1,1",
            "T3,B,,100,A,Major,1,1,1,1,1,1,1",
        ]));
        let table = top_artists_by_streams(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("A", 5), ("B", 0)]);
    }

    #[test]
    fn test_huge_stream_totals_saturate() {
        let ds = load_str(&csv_with(&[
            "Big A,X,1e19,100,A,Major,1,1,1,1,1,1,1",
            "Big B,X,1e19,100,A,Major,1,1,1,1,1,1,1",
            "Small,Y,5,100,A,Major,1,1,1,1,1,1,1",
        ]));
        assert_eq!(ds.tracks()[0].streams, Some(10_000_000_000_000_000_000));

        let table = top_artists_by_streams(&ds, DEFAULT_LIMIT);
        assert_eq!(pairs(&table), vec![("X", u64::MAX), ("Y", 5)]);

        let dup = load_str(&csv_with(&[
            "Same,X,1e19,100,A,Major,1,1,1,1,1,1,1",
            "Same,Y,1e19,100,A,Major,1,1,1,1,1,1,1",
        ]));
        let tracks = top_tracks_by_streams(&dup, DEFAULT_LIMIT);
        assert_eq!(pairs(&tracks), vec![("Same", u64::MAX)]);
    }

    #[test]
    fn test_empty_dataset_gives_empty_tables() {
        let ds = load_str(&csv_with(&[]));
        let summaries = Summaries::compute(&ds, DEFAULT_LIMIT);
        for view in SummaryView::ALL {
            assert!(summaries.table(view).is_empty());
        }
    }

    #[test]
    fn test_panel_selection() {
        let ds = two_row_example();
        let summaries = Summaries::compute(&ds, DEFAULT_LIMIT);

        let panel = summaries.panel(SummaryView::ArtistsBySongCount);
        assert_eq!(panel.title, "Top 10 Artists with Most Songs");
        assert_eq!(panel.metric_label, "Count");
        assert_eq!(panel.key_label, "Artists");
        assert_eq!(panel.table.rows[0].key, "X");

        let panel = summaries.panel(SummaryView::TracksByStreams);
        assert_eq!(panel.title, "Top 10 Tracks Based on Streams");
        assert_eq!(panel.key_label, "Track Name");
        assert_eq!(panel.table.rows[0].key, "Track A");
    }
}

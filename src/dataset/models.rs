use serde::Deserialize;

/// One row of the cleaned streaming dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_name: String,
    /// Raw comma-separated artist credit, as found in the file.
    pub artists: String,
    /// `None` when the cell was empty (or unparseable in lenient mode).
    pub streams: Option<u64>,
    pub key: Option<String>,
    pub mode: String,
    pub bpm: Option<f64>,

    // Audio features, all percentages 0-100
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub energy: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
}

/// A CSV row as deserialized, before stream counts are coerced.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    pub track_name: String,
    #[serde(alias = "artist(s)_name")]
    pub artists: String,
    pub streams: String,
    pub key: Option<String>,
    pub mode: Option<String>,
    pub bpm: Option<f64>,
    #[serde(rename = "danceability_%")]
    pub danceability: Option<f64>,
    #[serde(rename = "valence_%")]
    pub valence: Option<f64>,
    #[serde(rename = "energy_%")]
    pub energy: Option<f64>,
    #[serde(rename = "acousticness_%")]
    pub acousticness: Option<f64>,
    #[serde(rename = "instrumentalness_%")]
    pub instrumentalness: Option<f64>,
    #[serde(rename = "liveness_%")]
    pub liveness: Option<f64>,
    #[serde(rename = "speechiness_%")]
    pub speechiness: Option<f64>,
}

impl RawRecord {
    pub(crate) fn into_track(self, streams: Option<u64>) -> Track {
        Track {
            track_name: self.track_name,
            artists: self.artists,
            streams,
            key: self.key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            mode: self.mode.map(|m| m.trim().to_string()).unwrap_or_default(),
            bpm: self.bpm,
            danceability: self.danceability,
            valence: self.valence,
            energy: self.energy,
            acousticness: self.acousticness,
            instrumentalness: self.instrumentalness,
            liveness: self.liveness,
            speechiness: self.speechiness,
        }
    }
}

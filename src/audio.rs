//! Audio-feature panels: feature-vs-streams scatter, streams by key and mode,
//! and the feature correlation matrix.

use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::dataset::models::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AudioFeature {
    Danceability,
    Valence,
    Energy,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    Bpm,
}

impl AudioFeature {
    /// Every selectable feature, in display order.
    pub const ALL: [AudioFeature; 8] = [
        Self::Danceability,
        Self::Valence,
        Self::Energy,
        Self::Acousticness,
        Self::Instrumentalness,
        Self::Liveness,
        Self::Speechiness,
        Self::Bpm,
    ];

    /// The seven percentage features (everything except tempo).
    pub const PERCENTAGES: [AudioFeature; 7] = [
        Self::Danceability,
        Self::Valence,
        Self::Energy,
        Self::Acousticness,
        Self::Instrumentalness,
        Self::Liveness,
        Self::Speechiness,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Danceability => "danceability_%",
            Self::Valence => "valence_%",
            Self::Energy => "energy_%",
            Self::Acousticness => "acousticness_%",
            Self::Instrumentalness => "instrumentalness_%",
            Self::Liveness => "liveness_%",
            Self::Speechiness => "speechiness_%",
            Self::Bpm => "bpm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Danceability => "Danceability",
            Self::Valence => "Valence",
            Self::Energy => "Energy",
            Self::Acousticness => "Acousticness",
            Self::Instrumentalness => "Instrumentalness",
            Self::Liveness => "Liveness",
            Self::Speechiness => "Speechiness",
            Self::Bpm => "Bpm",
        }
    }

    pub fn value(&self, track: &Track) -> Option<f64> {
        match self {
            Self::Danceability => track.danceability,
            Self::Valence => track.valence,
            Self::Energy => track.energy,
            Self::Acousticness => track.acousticness,
            Self::Instrumentalness => track.instrumentalness,
            Self::Liveness => track.liveness,
            Self::Speechiness => track.speechiness,
            Self::Bpm => track.bpm,
        }
    }
}

/// `(feature value, streams)` for every row that has both.
pub fn scatter_points(dataset: &Dataset, feature: AudioFeature) -> Vec<(f64, f64)> {
    dataset
        .tracks()
        .iter()
        .filter_map(|t| match (feature.value(t), t.streams) {
            (Some(x), Some(s)) if x.is_finite() => Some((x, s as f64)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyModeBar {
    pub key: String,
    pub mode: String,
    pub mean_streams: f64,
    pub tracks: usize,
}

/// Mean streams per (key, mode) group.
#[derive(Debug, Clone, Serialize)]
pub struct KeyModeChart {
    /// Keys in first-appearance order.
    pub keys: Vec<String>,
    /// Modes in first-appearance order.
    pub modes: Vec<String>,
    /// Only groups with at least one track, ordered by key then mode.
    pub bars: Vec<KeyModeBar>,
}

impl KeyModeChart {
    pub fn bar(&self, key: &str, mode: &str) -> Option<&KeyModeBar> {
        self.bars.iter().find(|b| b.key == key && b.mode == mode)
    }

    pub fn max_mean(&self) -> f64 {
        self.bars.iter().map(|b| b.mean_streams).fold(0.0, f64::max)
    }
}

/// Group rows by key and mode and average their streams. Rows missing a key
/// or a stream count are left out.
pub fn key_mode_bars(dataset: &Dataset) -> KeyModeChart {
    let mut keys: Vec<String> = Vec::new();
    let mut modes: Vec<String> = Vec::new();
    let mut sums: HashMap<(String, String), (f64, usize)> = HashMap::new();

    for track in dataset.tracks() {
        let (Some(key), Some(streams)) = (&track.key, track.streams) else {
            continue;
        };
        if !keys.contains(key) {
            keys.push(key.clone());
        }
        if !modes.contains(&track.mode) {
            modes.push(track.mode.clone());
        }
        let entry = sums
            .entry((key.clone(), track.mode.clone()))
            .or_insert((0.0, 0));
        entry.0 += streams as f64;
        entry.1 += 1;
    }

    let mut bars = Vec::with_capacity(sums.len());
    for key in &keys {
        for mode in &modes {
            if let Some(&(sum, n)) = sums.get(&(key.clone(), mode.clone())) {
                bars.push(KeyModeBar {
                    key: key.clone(),
                    mode: mode.clone(),
                    mean_streams: sum / n as f64,
                    tracks: n,
                });
            }
        }
    }

    KeyModeChart { keys, modes, bars }
}

/// Symmetric Pearson correlation matrix over a set of features.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub features: Vec<AudioFeature>,
    /// Row-major, `values[i][j]` = corr(features[i], features[j]); NaN when undefined.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: AudioFeature, b: AudioFeature) -> Option<f64> {
        let i = self.features.iter().position(|f| *f == a)?;
        let j = self.features.iter().position(|f| *f == b)?;
        Some(self.values[i][j])
    }

    /// Smallest and largest defined coefficient.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Pearson correlation per feature pair, using only rows where both values
/// are present.
pub fn correlation_matrix(dataset: &Dataset, features: &[AudioFeature]) -> CorrelationMatrix {
    let columns: Vec<Vec<Option<f64>>> = features
        .iter()
        .map(|f| dataset.tracks().iter().map(|t| f.value(t)).collect())
        .collect();

    let n = features.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = columns[i]
                .iter()
                .zip(&columns[j])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip();
            let r = pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        features: features.to_vec(),
        values,
    }
}

/// Pearson's r, or NaN with fewer than two observations or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let x_mean = x[..n].iter().sum::<f64>() / nf;
    let y_mean = y[..n].iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for i in 0..n {
        let dx = x[i] - x_mean;
        let dy = y[i] - y_mean;
        cov += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    if x_var < 1e-12 || y_var < 1e-12 {
        return f64::NAN;
    }
    (cov / (x_var.sqrt() * y_var.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{csv_with, load_str};

    fn sample() -> Dataset {
        // track_name,artists,streams,bpm,key,mode,dance,valence,energy,acoustic,instr,live,speech
        load_str(&csv_with(&[
            "A,X,100,120,C#,Major,80,60,70,10,0,12,5",
            "B,Y,300,95,C#,Major,50,40,30,20,0,8,4",
            "C,Z,200,100,C#,Minor,20,10,40,90,0,30,3",
            "D,X,50,140,,Major,60,70,90,5,0,20,6",
            "E,Y,,130,D,Minor,90,80,60,15,0,11,7",
            "F,Z,400,110,D,Minor,,50,50,50,0,9,8",
        ]))
    }

    #[test]
    fn test_feature_columns_and_labels() {
        assert_eq!(AudioFeature::Danceability.column(), "danceability_%");
        assert_eq!(AudioFeature::Danceability.label(), "Danceability");
        assert_eq!(AudioFeature::Bpm.column(), "bpm");
        assert_eq!(AudioFeature::Bpm.label(), "Bpm");
        assert!(!AudioFeature::PERCENTAGES.contains(&AudioFeature::Bpm));
        assert_eq!(AudioFeature::ALL.len(), AudioFeature::PERCENTAGES.len() + 1);
    }

    #[test]
    fn test_scatter_skips_missing() {
        let ds = sample();
        let points = scatter_points(&ds, AudioFeature::Danceability);
        // E has no streams, F has no danceability
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], (80.0, 100.0));

        let bpm = scatter_points(&ds, AudioFeature::Bpm);
        assert_eq!(bpm.len(), 5);
    }

    #[test]
    fn test_key_mode_means() {
        let ds = sample();
        let chart = key_mode_bars(&ds);

        assert_eq!(chart.keys, vec!["C#", "D"]);
        assert_eq!(chart.modes, vec!["Major", "Minor"]);

        let cs_major = chart.bar("C#", "Major").unwrap();
        assert!((cs_major.mean_streams - 200.0).abs() < 1e-9);
        assert_eq!(cs_major.tracks, 2);

        let cs_minor = chart.bar("C#", "Minor").unwrap();
        assert!((cs_minor.mean_streams - 200.0).abs() < 1e-9);

        // E lacks streams, so D/Minor is F alone; D has no Major rows
        let d_minor = chart.bar("D", "Minor").unwrap();
        assert!((d_minor.mean_streams - 400.0).abs() < 1e-9);
        assert!(chart.bar("D", "Major").is_none());

        assert_eq!(chart.bars.len(), 3);
        assert!((chart.max_mean() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        let neg = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined() {
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn test_correlation_matrix_shape_and_symmetry() {
        let ds = sample();
        let m = correlation_matrix(&ds, &AudioFeature::PERCENTAGES);

        assert_eq!(m.values.len(), 7);
        for i in 0..7 {
            assert_eq!(m.values[i].len(), 7);
            for j in 0..7 {
                let (a, b) = (m.values[i][j], m.values[j][i]);
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }

        let d = m.get(AudioFeature::Danceability, AudioFeature::Danceability).unwrap();
        assert!((d - 1.0).abs() < 1e-9);

        // Instrumentalness is constant 0 in the sample
        let inst = m.get(AudioFeature::Instrumentalness, AudioFeature::Energy).unwrap();
        assert!(inst.is_nan());

        let (lo, hi) = m.range().unwrap();
        assert!(lo >= -1.0 && hi <= 1.0);
    }

    #[test]
    fn test_correlation_uses_pairwise_complete_rows() {
        let ds = sample();
        let m = correlation_matrix(&ds, &[AudioFeature::Danceability, AudioFeature::Valence]);

        // F lacks danceability; correlate over A..E only
        let dance = [80.0, 50.0, 20.0, 60.0, 90.0];
        let valence = [60.0, 40.0, 10.0, 70.0, 80.0];
        let expected = pearson(&dance, &valence);
        let got = m.get(AudioFeature::Danceability, AudioFeature::Valence).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_with_bpm() {
        let ds = sample();
        let m = correlation_matrix(&ds, &AudioFeature::ALL);
        assert_eq!(m.features.len(), 8);
        assert!(m.get(AudioFeature::Bpm, AudioFeature::Energy).unwrap().is_finite());
    }
}

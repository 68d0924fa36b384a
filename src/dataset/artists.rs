//! Artist credit normalization.
//!
//! The raw `artists` column holds every credited artist in one comma-separated
//! string ("Bad Bunny, Chencho Corleone"). Everything downstream works on the
//! split, trimmed sequence.

/// Separator between co-credited artists in the raw column.
pub const ARTIST_SEPARATOR: char = ',';

/// Split a raw artist credit into trimmed artist names, keeping credit order.
///
/// Never fails: a string without a separator (including the empty string)
/// becomes a single-element sequence holding the trimmed original.
pub fn split_artists(raw: &str) -> Vec<String> {
    raw.split(ARTIST_SEPARATOR)
        .map(|name| name.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_artists(artists: &[String]) -> String {
        artists.join(", ")
    }

    #[test]
    fn test_split_two_artists() {
        assert_eq!(split_artists("X, Y"), vec!["X", "Y"]);
    }

    #[test]
    fn test_split_trims_extraneous_whitespace() {
        assert_eq!(split_artists("  X ,Y"), vec!["X", "Y"]);
        assert_eq!(split_artists("\tLatto,  Jung Kook  "), vec!["Latto", "Jung Kook"]);
    }

    #[test]
    fn test_split_without_separator() {
        assert_eq!(split_artists("  Taylor Swift "), vec!["Taylor Swift"]);
    }

    #[test]
    fn test_split_empty_string() {
        assert_eq!(split_artists(""), vec![""]);
        assert_eq!(split_artists("   "), vec![""]);
    }

    #[test]
    fn test_split_keeps_empty_middle_credit() {
        assert_eq!(split_artists("X,,Y"), vec!["X", "", "Y"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["  X ,Y", "Bad Bunny, Chencho Corleone", "Solo", "", "A,B , C"] {
            let once = split_artists(raw);
            let twice = split_artists(&join_artists(&once));
            assert_eq!(once, twice, "re-normalizing {:?} changed it", raw);
        }
    }
}

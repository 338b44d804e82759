use std::collections::HashSet;

use crate::models::Show;

/// Drop shows whose `url` was already seen, keeping the first occurrence
pub fn dedupe(shows: Vec<Show>) -> Vec<Show> {
    let mut seen = HashSet::with_capacity(shows.len());

    shows
        .into_iter()
        .filter(|show| seen.insert(show.url.clone()))
        .collect()
}

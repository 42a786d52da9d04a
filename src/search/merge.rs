//! Candidate set merger

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use serde::Serialize;

/// A profile selected for scoring, with its embedding distance to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub profile_id: i64,
    pub distance: f32,
}

/// Union keyword and similarity hits keyed by profile id.
///
/// Keyword hits come first in their own order, then similarity-only hits in
/// distance order. A keyword-only hit gets `default_distance`; a profile found
/// by both keeps its measured distance.
pub fn merge_candidates(
    keyword_hits: &[i64],
    similar: &[(i64, f32)],
    default_distance: f32,
) -> Vec<Candidate> {
    let mut measured: HashMap<i64, f32> = HashMap::with_capacity(similar.len());
    for (id, distance) in similar {
        measured.entry(*id).or_insert(*distance);
    }

    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(keyword_hits.len() + similar.len());

    for id in keyword_hits {
        if seen.insert(*id) {
            merged.push(Candidate {
                profile_id: *id,
                distance: measured.get(id).copied().unwrap_or(default_distance),
            });
        }
    }
    for (id, distance) in similar {
        if seen.insert(*id) {
            merged.push(Candidate {
                profile_id: *id,
                distance: *distance,
            });
        }
    }

    merged
}

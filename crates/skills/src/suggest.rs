//! Near-match suggestion ranking for unknown skill names.

/// Maximum number of suggestions returned for an unknown skill name.
pub const MAX_SUGGESTIONS: usize = 3;

/// Rank installed skill names by closeness to a requested name.
///
/// A candidate whose normalized form (lowercased, separators stripped)
/// equals the normalized query ranks first; then substring matches; then
/// candidates within a small edit distance. At most [`MAX_SUGGESTIONS`]
/// are returned.
pub fn suggest<'a>(query: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let normalized_query = normalize(query);

    let mut scored: Vec<(u32, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let normalized = normalize(candidate);
            if normalized == normalized_query {
                Some((0, candidate))
            } else if normalized.contains(&normalized_query)
                || normalized_query.contains(&normalized)
            {
                Some((1, candidate))
            } else {
                let distance = edit_distance(&normalized, &normalized_query);
                (distance <= 3).then_some((2 + distance, candidate))
            }
        })
        .collect();

    scored.sort_by_key(|(score, name)| (*score, name.to_string()));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Lowercase and strip `-`/`_` so that "imagetopdf" matches "image_to_pdf".
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Classic Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution_cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j] + substitution_cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

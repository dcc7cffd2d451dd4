/// Fixed number of results returned per request
pub const TOP_K: usize = 15;

/// Sort descending by score and keep the first `TOP_K`
///
/// The sort is stable, so equal scores keep their input (retrieval) order.
/// A NaN score ranks below every real score.
pub fn rank<T>(mut scored: Vec<(T, f64)>) -> Vec<(T, f64)> {
    scored.sort_by(|a, b| sort_key(b.1).total_cmp(&sort_key(a.1)));
    scored.truncate(TOP_K);
    scored
}

#[inline]
fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

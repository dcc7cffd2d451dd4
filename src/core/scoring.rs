use std::collections::BTreeSet;

use crate::core::criteria::{join_labels, normalize_city, parse_labels, CapacitySpec, Criteria};
use crate::core::similarity::{SemanticSimilarity, SimilarityError};
use crate::models::{
    CityMatch, KeywordBlend, LabelMatch, MatchPolicy, ScoreBreakdown, ScoringWeights, Venue,
};

/// Boost applied to the normalized score before capping at 1.0
pub const PRESENTATION_BOOST: f64 = 1.5;

const KEYWORD_EXACT_WEIGHT: f64 = 0.7;
const KEYWORD_SEMANTIC_WEIGHT: f64 = 0.3;

/// Whether scorers may call the similarity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticMode {
    Enabled,
    /// Exact-match scoring only; used after a provider failure
    Disabled,
}

/// Score one venue against the criteria
///
/// Returns the per-attribute breakdown and the presentation score (0-100).
///
/// Scoring formula:
/// normalized = (
///     capacity_score * 0.3 +
///     city_score     * 0.2 +
///     style_score    * 0.3 +
///     keyword_score  * 0.2
/// ) / total_weight
/// presentation = min(normalized * 1.5, 1.0) * 100
pub async fn score_venue(
    criteria: &Criteria,
    venue: &Venue,
    policy: &MatchPolicy,
    weights: &ScoringWeights,
    provider: &dyn SemanticSimilarity,
    mode: SemanticMode,
) -> Result<(ScoreBreakdown, f64), SimilarityError> {
    let venue_city = venue.city.as_deref().and_then(normalize_city);
    let venue_styles = venue.style.as_deref().map(parse_labels).unwrap_or_default();
    let venue_keywords = venue.keywords.as_deref().map(parse_labels).unwrap_or_default();

    let breakdown = ScoreBreakdown {
        city: score_city(
            criteria.city.as_deref(),
            venue_city.as_deref(),
            policy.city,
            provider,
            mode,
        )
        .await?,
        capacity: capacity_score(criteria.capacity, venue.capacity),
        style: label_score(&criteria.styles, &venue_styles, policy.style),
        keywords: score_keywords(
            &criteria.keywords,
            &venue_keywords,
            policy.keywords,
            policy.keyword_blend,
            provider,
            mode,
        )
        .await?,
    };

    let score = presentation_score(normalized_score(&breakdown, weights));

    Ok((breakdown, score))
}

/// City sub-score (0-1)
///
/// Both values must already be normalized. Semantic mode falls back to exact
/// comparison when the provider is disabled.
pub async fn score_city(
    criteria_city: Option<&str>,
    venue_city: Option<&str>,
    policy: CityMatch,
    provider: &dyn SemanticSimilarity,
    mode: SemanticMode,
) -> Result<f64, SimilarityError> {
    let (Some(wanted), Some(actual)) = (criteria_city, venue_city) else {
        return Ok(0.0);
    };

    match (policy, mode) {
        (CityMatch::Semantic, SemanticMode::Enabled) => {
            let similarity = provider.similarity(wanted, actual).await?;
            Ok(clamp_similarity(similarity))
        }
        _ => Ok(if wanted == actual { 1.0 } else { 0.0 }),
    }
}

/// Capacity sub-score (0-1)
///
/// 1.0 inside the band, linear falloff outside: below the minimum relative to
/// the minimum, above a closed maximum relative to the venue's own size.
#[inline]
pub fn capacity_score(spec: Option<CapacitySpec>, capacity: Option<u32>) -> f64 {
    let (Some(spec), Some(capacity)) = (spec, capacity) else {
        return 0.0;
    };

    let c = capacity as f64;
    let min = spec.min as f64;

    if c < min {
        return (1.0 - (min - c) / min).max(0.0);
    }

    match spec.max {
        Some(max) if c > max as f64 => (1.0 - (c - max as f64) / c).max(0.0),
        _ => 1.0,
    }
}

/// Label-set sub-score (0-1) used for style and for the exact keyword signal
#[inline]
pub fn label_score(criteria: &BTreeSet<String>, venue: &BTreeSet<String>, policy: LabelMatch) -> f64 {
    if criteria.is_empty() || venue.is_empty() {
        return 0.0;
    }

    match policy {
        LabelMatch::Overlap => {
            let shared = criteria.intersection(venue).count() as f64;
            shared / criteria.len().max(venue.len()) as f64
        }
        LabelMatch::Partial => {
            let matched = criteria
                .iter()
                .filter(|wanted| venue.iter().any(|label| label.contains(wanted.as_str())))
                .count() as f64;
            matched / criteria.len() as f64
        }
    }
}

/// Keyword sub-score (0-1) blending exact overlap with semantic similarity
///
/// The provider is never called when either set is empty.
pub async fn score_keywords(
    criteria: &BTreeSet<String>,
    venue: &BTreeSet<String>,
    policy: LabelMatch,
    blend: KeywordBlend,
    provider: &dyn SemanticSimilarity,
    mode: SemanticMode,
) -> Result<f64, SimilarityError> {
    if criteria.is_empty() || venue.is_empty() {
        return Ok(0.0);
    }

    let exact = label_score(criteria, venue, policy);

    if mode == SemanticMode::Disabled {
        return Ok(exact);
    }

    let similarity = provider
        .similarity(&join_labels(criteria), &join_labels(venue))
        .await?;
    let semantic = clamp_similarity(similarity);

    Ok(match blend {
        KeywordBlend::Weighted => KEYWORD_EXACT_WEIGHT * exact + KEYWORD_SEMANTIC_WEIGHT * semantic,
        KeywordBlend::Average => (exact + semantic) / 2.0,
    })
}

/// Weighted sum over all four attributes divided by the total weight
///
/// Absent criteria contribute 0 but still count in the denominator.
#[inline]
pub fn normalized_score(breakdown: &ScoreBreakdown, weights: &ScoringWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }

    let raw = breakdown.capacity * weights.capacity
        + breakdown.city * weights.city
        + breakdown.style * weights.style
        + breakdown.keywords * weights.keywords;

    raw / total
}

/// Boost, cap and scale to 0-100 with two decimals
#[inline]
pub fn presentation_score(normalized: f64) -> f64 {
    if !normalized.is_finite() {
        return 0.0;
    }
    let boosted = (normalized * PRESENTATION_BOOST).clamp(0.0, 1.0);
    (boosted * 100.0 * 100.0).round() / 100.0
}

/// Map a provider similarity into [0, 1]; a non-finite value scores 0
#[inline]
fn clamp_similarity(similarity: f32) -> f64 {
    if !similarity.is_finite() {
        tracing::warn!("Similarity provider returned non-finite value {}", similarity);
        return 0.0;
    }
    f64::from(similarity).clamp(0.0, 1.0)
}

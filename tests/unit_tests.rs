// Unit tests for Venue Match

use venue_match::core::{
    criteria::{normalize_city, parse_labels, CapacitySpec, Criteria, CriteriaWarning},
    ranking::{rank, TOP_K},
    scoring::{capacity_score, label_score, normalized_score, presentation_score},
};
use venue_match::models::{LabelMatch, ScoreBreakdown, ScoringWeights};

#[test]
fn test_city_normalization() {
    assert_eq!(normalize_city("  Brooklyn\t"), Some("brooklyn".to_string()));
    assert_eq!(normalize_city("BROOKLYN"), normalize_city("brooklyn "));
    assert_eq!(normalize_city("   "), None);
}

#[test]
fn test_capacity_spec_forms() {
    let (criteria, _) = Criteria::parse(None, Some("200"), None, None);
    assert_eq!(criteria.capacity, Some(CapacitySpec { min: 200, max: Some(200) }));

    let (criteria, _) = Criteria::parse(None, Some("150-300"), None, None);
    assert_eq!(criteria.capacity, Some(CapacitySpec { min: 150, max: Some(300) }));

    let (criteria, _) = Criteria::parse(None, Some("200+"), None, None);
    assert_eq!(criteria.capacity, Some(CapacitySpec { min: 200, max: None }));
}

#[test]
fn test_malformed_capacity_warns() {
    let (criteria, warnings) = Criteria::parse(None, Some("150-abc"), Some("rock"), None);

    assert!(criteria.capacity.is_none());
    assert_eq!(criteria.styles.len(), 1);
    assert!(matches!(warnings.as_slice(), [CriteriaWarning::MalformedCapacity(raw)] if raw == "150-abc"));
    assert!(warnings[0].to_string().contains("150-abc"));
}

#[test]
fn test_capacity_falloff_decreases_with_gap() {
    let spec = Some(CapacitySpec::exact(200));

    assert_eq!(capacity_score(spec, Some(200)), 1.0);

    let mut previous = 1.0;
    for capacity in [180, 150, 100, 50, 10] {
        let score = capacity_score(spec, Some(capacity));
        assert!(score > 0.0 && score < 1.0);
        assert!(score < previous, "{} should score below {}", capacity, previous);
        previous = score;
    }
}

#[test]
fn test_capacity_open_matches_closed_below_min() {
    for capacity in [0, 50, 100, 199] {
        assert_eq!(
            capacity_score(Some(CapacitySpec::at_least(200)), Some(capacity)),
            capacity_score(Some(CapacitySpec::range(200, 400)), Some(capacity)),
        );
    }
    assert_eq!(capacity_score(Some(CapacitySpec::at_least(200)), Some(500)), 1.0);
}

#[test]
fn test_capacity_above_max_is_gentler() {
    let spec = Some(CapacitySpec::range(100, 100));

    // 50 below the band: 1 - 50/100; 50 above: 1 - 50/150
    let below = capacity_score(spec, Some(50));
    let above = capacity_score(spec, Some(150));

    assert_eq!(below, 0.5);
    assert!(above > below);
}

#[test]
fn test_sub_scores_bounded() {
    let specs = [
        CapacitySpec::exact(1),
        CapacitySpec::exact(500),
        CapacitySpec::range(10, 20),
        CapacitySpec::at_least(1000),
    ];
    for spec in specs {
        for capacity in [0, 1, 15, 999, 100_000, u32::MAX] {
            let score = capacity_score(Some(spec), Some(capacity));
            assert!((0.0..=1.0).contains(&score), "{:?} vs {} -> {}", spec, capacity, score);
        }
    }

    let sets = ["", "rock", "rock,pop", "jazz,rock,pop,folk", "classic rock"];
    for a in sets {
        for b in sets {
            for policy in [LabelMatch::Overlap, LabelMatch::Partial] {
                let score = label_score(&parse_labels(a), &parse_labels(b), policy);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}

#[test]
fn test_style_overlap_example() {
    let score = label_score(&parse_labels("jazz, rock"), &parse_labels("ROCK,pop"), LabelMatch::Overlap);
    assert_eq!(score, 0.5);
}

#[test]
fn test_presentation_score_range() {
    for step in 0..=20 {
        let normalized = step as f64 / 20.0;
        let score = presentation_score(normalized);
        assert!((0.0..=100.0).contains(&score));
    }
    assert_eq!(presentation_score(2.0), 100.0);
}

#[test]
fn test_partial_criteria_penalized_by_fixed_denominator() {
    let weights = ScoringWeights::default();
    let city_only = ScoreBreakdown { city: 1.0, ..Default::default() };
    let everything = ScoreBreakdown { city: 1.0, capacity: 1.0, style: 1.0, keywords: 1.0 };

    assert_eq!(presentation_score(normalized_score(&city_only, &weights)), 30.0);
    assert_eq!(presentation_score(normalized_score(&everything, &weights)), 100.0);
}

#[test]
fn test_rank_never_exceeds_top_k() {
    let scored: Vec<(u32, f64)> = (0..100).map(|i| (i, 50.0)).collect();
    let ranked = rank(scored);

    assert_eq!(ranked.len(), TOP_K);
    let ids: Vec<u32> = ranked.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, (0..15).collect::<Vec<_>>());
}

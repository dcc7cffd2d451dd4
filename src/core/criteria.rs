use std::collections::BTreeSet;
use std::fmt;

/// Parsed capacity criterion, inclusive on both ends
///
/// `max == None` means open-ended (`"200+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySpec {
    pub min: u32,
    pub max: Option<u32>,
}

impl CapacitySpec {
    pub fn exact(value: u32) -> Self {
        Self { min: value, max: Some(value) }
    }

    pub fn range(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Parse `"200"`, `"150-300"` or `"200+"`
    pub fn parse(raw: &str) -> Result<Self, CriteriaWarning> {
        let raw = raw.trim();
        let malformed = || CriteriaWarning::MalformedCapacity(raw.to_string());

        if let Some(min) = raw.strip_suffix('+') {
            return parse_bound(min).map(Self::at_least).ok_or_else(malformed);
        }

        if let Some((min, max)) = raw.split_once('-') {
            let min = parse_bound(min).ok_or_else(malformed)?;
            let max = parse_bound(max).ok_or_else(malformed)?;
            if min > max {
                return Err(malformed());
            }
            return Ok(Self::range(min, max));
        }

        parse_bound(raw).map(Self::exact).ok_or_else(malformed)
    }
}

#[inline]
fn parse_bound(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Non-fatal problem found while normalizing criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaWarning {
    MalformedCapacity(String),
}

impl fmt::Display for CriteriaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaWarning::MalformedCapacity(raw) => write!(
                f,
                "capacity '{}' is not a number, range (min-max) or open bound (N+); ignored",
                raw
            ),
        }
    }
}

/// Normalized query criteria; every field independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub city: Option<String>,
    pub capacity: Option<CapacitySpec>,
    pub styles: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
}

impl Criteria {
    /// Normalize raw request fields
    ///
    /// A malformed capacity drops the capacity criterion and is reported in the
    /// returned warnings; everything else is infallible.
    pub fn parse(
        city: Option<&str>,
        capacity: Option<&str>,
        style: Option<&str>,
        keywords: Option<&str>,
    ) -> (Self, Vec<CriteriaWarning>) {
        let mut warnings = Vec::new();

        let capacity = capacity
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| match CapacitySpec::parse(raw) {
                Ok(spec) => Some(spec),
                Err(warning) => {
                    warnings.push(warning);
                    None
                }
            });

        let criteria = Self {
            city: city.and_then(normalize_city),
            capacity,
            styles: style.map(parse_labels).unwrap_or_default(),
            keywords: keywords.map(parse_labels).unwrap_or_default(),
        };

        (criteria, warnings)
    }

    /// True when no attribute would be scored
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.capacity.is_none()
            && self.styles.is_empty()
            && self.keywords.is_empty()
    }
}

/// Trim and lower-case a city; blank means absent
pub fn normalize_city(raw: &str) -> Option<String> {
    let city = raw.trim().to_lowercase();
    if city.is_empty() {
        None
    } else {
        Some(city)
    }
}

/// Split a comma-delimited label list into a normalized set
pub fn parse_labels(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|label| label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Comma-join a label set for the semantic provider
pub fn join_labels(labels: &BTreeSet<String>) -> String {
    labels.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_shapes() {
        assert_eq!(CapacitySpec::parse("200"), Ok(CapacitySpec::exact(200)));
        assert_eq!(CapacitySpec::parse("150-300"), Ok(CapacitySpec::range(150, 300)));
        assert_eq!(CapacitySpec::parse(" 150 - 300 "), Ok(CapacitySpec::range(150, 300)));
        assert_eq!(CapacitySpec::parse("200+"), Ok(CapacitySpec::at_least(200)));
    }

    #[test]
    fn test_capacity_malformed() {
        for raw in ["abc", "300-150", "-5", "10-", "+", "1.5", "1-2-3", "++5"] {
            assert!(CapacitySpec::parse(raw).is_err(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_malformed_capacity_is_not_fatal() {
        let (criteria, warnings) = Criteria::parse(Some("Brooklyn"), Some("lots"), None, None);

        assert!(criteria.capacity.is_none());
        assert_eq!(criteria.city.as_deref(), Some("brooklyn"));
        assert_eq!(warnings, vec![CriteriaWarning::MalformedCapacity("lots".to_string())]);
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let (criteria, warnings) = Criteria::parse(Some("   "), Some(" "), Some(" , ,"), Some(""));

        assert!(criteria.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_labels_collapse_duplicates() {
        let labels = parse_labels(" Rock, pop ,ROCK,, jazz ");
        let expected: Vec<&str> = vec!["jazz", "pop", "rock"];
        assert_eq!(labels.iter().map(String::as_str).collect::<Vec<_>>(), expected);
        assert_eq!(join_labels(&labels), "jazz,pop,rock");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = Criteria::parse(Some(" NYC "), Some("100+"), Some("b,a"), Some("y,x"));
        let b = Criteria::parse(Some(" NYC "), Some("100+"), Some("b,a"), Some("y,x"));
        assert_eq!(a, b);
    }
}

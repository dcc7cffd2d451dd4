use base64::Engine as _;
use serde::{Deserialize, Serialize, Serializer};

/// Length of a venue identifier (CHAR(12) in storage)
pub const VENUE_ID_LEN: usize = 12;

/// Venue record as held by the repository
///
/// The engine only ever reads these. `photo` is left empty by bulk reads and is
/// populated on single-venue lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zipcode: Option<i32>,
    #[serde(default)]
    pub phone: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(rename = "inquiryUrl", default)]
    pub inquiry_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoPayload>,
}

impl Venue {
    /// Summary view without the photo payload
    pub fn summary(&self) -> VenueSummary {
        VenueSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            city: self.city.clone(),
            zipcode: self.zipcode,
            phone: self.phone,
            email: self.email.clone(),
            capacity: self.capacity,
            style: self.style.clone(),
            keywords: self.keywords.clone(),
            inquiry_url: self.inquiry_url.clone(),
        }
    }
}

/// Venue fields returned in listings and match results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueSummary {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub zipcode: Option<i32>,
    pub phone: Option<i64>,
    pub email: Option<String>,
    pub capacity: Option<u32>,
    pub style: Option<String>,
    pub keywords: Option<String>,
    #[serde(rename = "inquiryUrl")]
    pub inquiry_url: Option<String>,
}

/// Venue photo, either stored inline or referenced by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PhotoPayload {
    Url {
        url: String,
    },
    Inline {
        #[serde(rename = "contentType")]
        content_type: String,
        #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
        data: Vec<u8>,
    },
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// Per-attribute sub-scores, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub city: f64,
    pub capacity: f64,
    pub style: f64,
    pub keywords: f64,
}

/// A ranked venue with its presentation score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub venue: VenueSummary,
    /// Presentation score in [0, 100], two decimals
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoPayload>,
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub capacity: f64,
    pub city: f64,
    pub style: f64,
    pub keywords: f64,
}

impl ScoringWeights {
    /// Denominator used to normalize the weighted sum
    pub fn total(&self) -> f64 {
        self.capacity + self.city + self.style + self.keywords
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            capacity: 0.3,
            city: 0.2,
            style: 0.3,
            keywords: 0.2,
        }
    }
}

/// How the city attribute is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityMatch {
    #[default]
    Exact,
    Semantic,
}

/// How two label sets are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// |A ∩ B| / max(|A|, |B|)
    #[default]
    Overlap,
    /// Criteria label matched when it is a substring of any venue label, over |A|
    Partial,
}

/// How exact and semantic keyword signals are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordBlend {
    /// 0.7 × exact + 0.3 × semantic
    #[default]
    Weighted,
    /// (exact + semantic) / 2
    Average,
}

/// What to do when the similarity provider fails mid-request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFallback {
    #[default]
    Fail,
    ExactOnly,
}

/// Scoring policy switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    pub city: CityMatch,
    pub style: LabelMatch,
    pub keywords: LabelMatch,
    pub keyword_blend: KeywordBlend,
    pub on_similarity_error: SimilarityFallback,
}

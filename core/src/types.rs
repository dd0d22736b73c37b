//! Domain DTOs for the Near Earth Object web service (NeoWs).
//!
//! # Design
//! These types mirror the NeoWs JSON schema but are defined independently of
//! the mock-server crate; integration tests catch schema drift between the two.
//! NeoWs encodes most measurements as JSON strings, so numeric fields go
//! through `Numeric`, which accepts either form and leaves interpretation to
//! the caller. `ItemDetail` keeps every field it does not model in `extra` so
//! renderers can reach data this crate does not know about.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public demonstration credential accepted by api.nasa.gov (heavily rate limited).
pub const DEMO_KEY: &str = "DEMO_KEY";

/// Opaque API credential sent with every outbound request.
///
/// `Display` and `Debug` only show the first four characters so the key can
/// be passed to log macros without leaking it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn demo() -> Self {
        Self::new(DEMO_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "{visible}***")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&format_args!("{self}")).finish()
    }
}

/// 1-based index of a listing page. `PageIndex::NONE` means no page has been
/// requested yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIndex(u32);

impl PageIndex {
    pub const NONE: PageIndex = PageIndex(0);
    pub const FIRST: PageIndex = PageIndex(1);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The index actually sent on the wire: `NONE` is promoted to `FIRST`.
    #[must_use]
    pub const fn or_first(self) -> Self {
        if self.is_none() {
            Self::FIRST
        } else {
            self
        }
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A measurement that NeoWs may send either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Returns the finite value, or `None` if the text does not parse.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

/// One entry of a page listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ItemLinks>,
}

impl ItemSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            links: None,
        }
    }

    /// Self-referencing detail URL, when the listing carries one.
    pub fn detail_url(&self) -> Option<&str> {
        self.links.as_ref()?.self_url.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}

/// Pagination metadata. `number` is 0-based, as NeoWs reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}

/// Body of the `browse` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageListing {
    pub near_earth_objects: Vec<ItemSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl PageListing {
    pub fn new(items: Vec<ItemSummary>) -> Self {
        Self {
            near_earth_objects: items,
            page: None,
            links: None,
        }
    }

    pub fn len(&self) -> usize {
        self.near_earth_objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.near_earth_objects.is_empty()
    }

    /// Whether the server indicated there is nothing after this page.
    ///
    /// A `next` link wins over metadata; with neither, an empty page is
    /// taken as the end.
    pub fn is_last_page(&self) -> bool {
        if let Some(links) = &self.links {
            return links.next.is_none();
        }
        if let Some(meta) = &self.page {
            return meta.number.saturating_add(1) >= meta.total_pages;
        }
        self.is_empty()
    }
}

/// Full record for one object, as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_approach_data: Option<Vec<CloseApproach>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter: Option<EstimatedDiameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbital_data: Option<OrbitalData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_approach_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_velocity: Option<RelativeVelocity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbiting_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeVelocity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kilometers_per_second: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meters: Option<DiameterRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiameterRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_min: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_max: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eccentricity: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_major_axis: Option<Numeric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

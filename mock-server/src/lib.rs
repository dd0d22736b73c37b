use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_diameter: Option<EstimatedDiameter>,
    pub close_approach_data: Vec<CloseApproach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbital_data: Option<OrbitalData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    pub meters: DiameterRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiameterRange {
    pub estimated_diameter_min: f64,
    pub estimated_diameter_max: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloseApproach {
    pub close_approach_date: String,
    pub relative_velocity: RelativeVelocity,
    pub orbiting_body: String,
}

/// NeoWs sends measurements as strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelativeVelocity {
    pub kilometers_per_second: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrbitalData {
    pub eccentricity: String,
    pub semi_major_axis: String,
}

impl Neo {
    /// A record with no approaches, no diameter and a circular 1 AU orbit.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            estimated_diameter: None,
            close_approach_data: Vec::new(),
            orbital_data: Some(OrbitalData {
                eccentricity: "0".to_string(),
                semi_major_axis: "1".to_string(),
            }),
        }
    }

    pub fn with_approach(mut self, date: &str, kilometers_per_second: &str) -> Self {
        self.close_approach_data.push(CloseApproach {
            close_approach_date: date.to_string(),
            relative_velocity: RelativeVelocity {
                kilometers_per_second: kilometers_per_second.to_string(),
            },
            orbiting_body: "Earth".to_string(),
        });
        self
    }

    pub fn with_diameter(mut self, min_meters: f64, max_meters: f64) -> Self {
        self.estimated_diameter = Some(EstimatedDiameter {
            meters: DiameterRange {
                estimated_diameter_min: min_meters,
                estimated_diameter_max: max_meters,
            },
        });
        self
    }

    pub fn with_orbit(mut self, eccentricity: &str, semi_major_axis: &str) -> Self {
        self.orbital_data = Some(OrbitalData {
            eccentricity: eccentricity.to_string(),
            semi_major_axis: semi_major_axis.to_string(),
        });
        self
    }

    pub fn without_orbit(mut self) -> Self {
        self.orbital_data = None;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub name: String,
    pub links: SelfLink,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub self_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageMeta {
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub number: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(rename = "self")]
    pub self_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowsePage {
    pub links: PageLinks,
    pub page: PageMeta,
    pub near_earth_objects: Vec<Summary>,
}

/// Read-only set of objects served by the mock, split into fixed-size pages.
#[derive(Clone, Debug)]
pub struct Catalog {
    neos: Vec<Neo>,
    page_size: usize,
}

impl Catalog {
    pub fn new(page_size: usize) -> Self {
        Self {
            neos: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn with(mut self, neo: Neo) -> Self {
        self.neos.push(neo);
        self
    }

    /// Three well-known asteroids on a single page.
    pub fn sample() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
            .with(
                Neo::new("2000433", "433 Eros (A898 PA)")
                    .with_diameter(22006.0, 49208.0)
                    .with_approach("1900-12-27", "5.5786")
                    .with_orbit("0.2229", "1.458"),
            )
            .with(
                Neo::new("2000719", "719 Albert (A911 TB)")
                    .with_diameter(2025.0, 4529.0)
                    .with_approach("1909-04-04", "3.2")
                    .with_orbit("0.5469", "2.638"),
            )
            .with(
                Neo::new("2000887", "887 Alinda (A918 AA)")
                    .with_diameter(4189.0, 9367.0)
                    .with_approach("1910-01-24", "10.48")
                    .with_orbit("0.5703", "2.477"),
            )
    }

    pub fn len(&self) -> usize {
        self.neos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neos.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        self.neos.len().div_ceil(self.page_size)
    }

    /// Objects on 1-based `page`; empty past the end.
    pub fn page(&self, page: usize) -> &[Neo] {
        let start = page.saturating_sub(1).saturating_mul(self.page_size);
        if start >= self.neos.len() {
            return &[];
        }
        let end = (start + self.page_size).min(self.neos.len());
        &self.neos[start..end]
    }

    pub fn find(&self, id: &str) -> Option<&Neo> {
        self.neos.iter().find(|neo| neo.id == id)
    }
}

pub type Db = Arc<Catalog>;

pub fn app() -> Router {
    app_with(Catalog::sample())
}

pub fn app_with(catalog: Catalog) -> Router {
    let db: Db = Arc::new(catalog);
    Router::new()
        .route("/browse", get(browse))
        .route("/{id}", get(get_neo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, catalog: Catalog) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(catalog)).await
}

#[derive(Deserialize)]
pub struct BrowseQuery {
    pub api_key: Option<String>,
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct KeyQuery {
    pub api_key: Option<String>,
}

fn require_key(api_key: Option<&str>) -> Result<&str, (StatusCode, String)> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err((StatusCode::FORBIDDEN, "API_KEY_MISSING".to_string())),
    }
}

async fn browse(
    State(db): State<Db>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowsePage>, (StatusCode, String)> {
    let key = require_key(query.api_key.as_deref())?;
    let page = match query.page.as_deref() {
        None => 1,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid page: {raw}")))?
            .max(1),
    };
    debug!(page, "browse");

    let total_pages = db.total_pages();
    let link = |p: usize| format!("/browse?page={p}&api_key={key}");
    let near_earth_objects = db
        .page(page)
        .iter()
        .map(|neo| Summary {
            id: neo.id.clone(),
            name: neo.name.clone(),
            links: SelfLink {
                self_url: format!("/{}?api_key={key}", neo.id),
            },
        })
        .collect();

    Ok(Json(BrowsePage {
        links: PageLinks {
            next: (page < total_pages).then(|| link(page + 1)),
            prev: (page > 1).then(|| link(page - 1)),
            self_url: link(page),
        },
        page: PageMeta {
            size: db.page_size,
            total_elements: db.len(),
            total_pages,
            number: page - 1,
        },
        near_earth_objects,
    }))
}

async fn get_neo(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Neo>, (StatusCode, String)> {
    require_key(query.api_key.as_deref())?;
    debug!(id = %id, "detail");
    db.find(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(count: usize, page_size: usize) -> Catalog {
        (0..count).fold(Catalog::new(page_size), |c, i| {
            c.with(Neo::new(&i.to_string(), &format!("rock {i}")))
        })
    }

    #[test]
    fn neo_serializes_measurements_as_strings() {
        let neo = Neo::new("1", "One").with_approach("2020-01-01", "12.5");
        let json = serde_json::to_value(&neo).unwrap();
        assert_eq!(json["close_approach_data"][0]["relative_velocity"]["kilometers_per_second"], "12.5");
        assert_eq!(json["orbital_data"]["eccentricity"], "0");
        assert!(json.get("estimated_diameter").is_none());
    }

    #[test]
    fn without_orbit_drops_the_field() {
        let json = serde_json::to_value(Neo::new("1", "One").without_orbit()).unwrap();
        assert!(json.get("orbital_data").is_none());
    }

    #[test]
    fn pages_are_one_based_and_bounded() {
        let c = catalog(5, 2);
        assert_eq!(c.total_pages(), 3);
        assert_eq!(c.page(1).len(), 2);
        assert_eq!(c.page(1)[0].id, "0");
        assert_eq!(c.page(3).len(), 1);
        assert_eq!(c.page(3)[0].id, "4");
        assert!(c.page(4).is_empty());
        assert_eq!(c.page(0)[0].id, "0");
    }

    #[test]
    fn empty_catalog_has_no_pages() {
        let c = Catalog::new(10);
        assert_eq!(c.total_pages(), 0);
        assert!(c.page(1).is_empty());
    }

    #[test]
    fn find_by_id() {
        let c = Catalog::sample();
        assert_eq!(c.find("2000719").map(|n| n.name.as_str()), Some("719 Albert (A911 TB)"));
        assert!(c.find("nope").is_none());
    }
}

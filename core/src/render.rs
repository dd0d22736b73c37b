//! Visual mapping of a detail record and the `Renderer` capability.
//!
//! # Design
//! `RenderParams::from_detail` is the pure part: it turns an `ItemDetail` into
//! the four numbers an orbit animation needs and reports `MalformedData` when
//! a required field is missing. `Renderer` is the side-effecting boundary the
//! pipeline drives. `SceneRenderer` is the concrete renderer: it emits the
//! nested `space` / `gravity` / `satellite` HTML fragment for each item and
//! keeps the fragments in memory for the host to mount.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ApiError;
use crate::types::{ItemDetail, Numeric};

/// Speed used when an object has no recorded close approach.
pub const DEFAULT_SPEED: f64 = 100.0;
/// Size used when an object has no diameter estimate.
pub const DEFAULT_SIZE: f64 = 1.0;
const METERS_PER_PIXEL: f64 = 50.0;
const PIXELS_PER_AU: f64 = 100.0;
const ECCENTRICITY_BUCKETS: f64 = 10.0;

/// Display parameters derived from one detail record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Relative velocity at first close approach, km/s.
    pub speed: f64,
    /// Maximum estimated diameter in pixels.
    pub size: f64,
    /// Orbit eccentricity scaled to 0..=9.
    pub eccentricity_index: u8,
    /// Semi-major axis in pixels.
    pub max_distance: f64,
}

impl RenderParams {
    pub fn from_detail(detail: &ItemDetail) -> Result<Self, ApiError> {
        let approaches = detail
            .close_approach_data
            .as_ref()
            .ok_or_else(|| malformed(detail, "close_approach_data is missing"))?;
        let speed = match approaches.first() {
            None => DEFAULT_SPEED,
            Some(approach) => approach
                .relative_velocity
                .as_ref()
                .and_then(|v| v.kilometers_per_second.as_ref())
                .and_then(Numeric::as_f64)
                .ok_or_else(|| malformed(detail, "relative_velocity.kilometers_per_second is not a number"))?,
        };

        let size = match &detail.estimated_diameter {
            None => DEFAULT_SIZE,
            Some(diameter) => {
                diameter
                    .meters
                    .as_ref()
                    .and_then(|m| m.estimated_diameter_max.as_ref())
                    .and_then(Numeric::as_f64)
                    .ok_or_else(|| malformed(detail, "estimated_diameter.meters.estimated_diameter_max is not a number"))?
                    / METERS_PER_PIXEL
            }
        };

        let orbit = detail
            .orbital_data
            .as_ref()
            .ok_or_else(|| malformed(detail, "orbital_data is missing"))?;
        let eccentricity = orbit
            .eccentricity
            .as_ref()
            .and_then(Numeric::as_f64)
            .ok_or_else(|| malformed(detail, "orbital_data.eccentricity is not a number"))?;
        let semi_major_axis = orbit
            .semi_major_axis
            .as_ref()
            .and_then(Numeric::as_f64)
            .ok_or_else(|| malformed(detail, "orbital_data.semi_major_axis is not a number"))?;

        Ok(Self {
            speed,
            size,
            eccentricity_index: eccentricity_bucket(eccentricity),
            max_distance: semi_major_axis * PIXELS_PER_AU,
        })
    }
}

/// Scale an eccentricity into one of ten animation buckets.
///
/// Hyperbolic orbits (e >= 1) land in the last bucket.
pub fn eccentricity_bucket(eccentricity: f64) -> u8 {
    (eccentricity * ECCENTRICITY_BUCKETS)
        .floor()
        .clamp(0.0, ECCENTRICITY_BUCKETS - 1.0) as u8
}

fn malformed(detail: &ItemDetail, what: &str) -> ApiError {
    ApiError::MalformedData(format!("{}: {what}", detail.id))
}

/// Produces the visual side effect for one detail record.
///
/// Implementations may suspend before finishing; the pipeline awaits each
/// call exactly once.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, detail: &ItemDetail) -> Result<(), ApiError>;
}

#[async_trait]
impl<R: Renderer + ?Sized> Renderer for Arc<R> {
    async fn render(&self, detail: &ItemDetail) -> Result<(), ApiError> {
        (**self).render(detail).await
    }
}

/// Renders each object as an orbiting satellite in an HTML scene.
#[derive(Debug)]
pub struct SceneRenderer {
    rng: Mutex<StdRng>,
    fragments: Mutex<Vec<String>>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic renderer: equal seeds give equal markup.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            fragments: Mutex::new(Vec::new()),
        }
    }

    /// Fragments rendered so far, in completion order.
    pub fn fragments(&self) -> Vec<String> {
        self.fragments.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.fragments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.lock().is_empty()
    }

    /// Remove and return everything rendered so far.
    pub fn take_fragments(&self) -> Vec<String> {
        std::mem::take(&mut *self.fragments.lock())
    }

    fn markup(&self, params: &RenderParams) -> String {
        let (rotation, shade) = {
            let mut rng = self.rng.lock();
            (rng.gen_range(15.0..25.0), rng.gen_range(6u8..16))
        };
        let colour = format!("{shade:x}").repeat(3);
        let RenderParams {
            speed,
            size,
            eccentricity_index,
            max_distance,
        } = *params;
        format!(
            concat!(
                r#"<div class="space" style="animation: rotate {rotation:.2}s infinite linear;">"#,
                r#"<div class="gravity" style="animation: oscillate-{bucket} {half_speed}s infinite ease-in-out alternate;">"#,
                r#"<div class="satellite" style="background: #{colour}; animation: orbit {speed}s infinite linear; "#,
                r#"width: {size}px; height: {size}px; margin-left: -{distance}px; transform-origin: {distance}px center;">"#,
                "</div></div></div>"
            ),
            rotation = rotation,
            bucket = eccentricity_index,
            half_speed = speed / 2.0,
            colour = colour,
            speed = speed,
            size = size,
            distance = max_distance,
        )
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Renderer for SceneRenderer {
    async fn render(&self, detail: &ItemDetail) -> Result<(), ApiError> {
        let params = RenderParams::from_detail(detail)?;
        let fragment = self.markup(&params);
        // Mount on the next scheduler tick, after sibling work had a chance to run.
        tokio::task::yield_now().await;
        self.fragments.lock().push(fragment);
        Ok(())
    }
}

//! Coordinate convention at the presentation boundary.
//!
//! Everything inside the engine is expressed in the domain convention:
//! right-handed, **Z up**, X right, Y front. Y-up renderers see positions
//! through the fixed relabeling
//!
//! ```text
//! render = M · domain = (x, z, -y)        M = [[1,0,0],[0,0,1],[0,-1,0]]
//! domain = M⁻¹ · render = (x, -z', y')    M⁻¹ = Mᵀ
//! ```
//!
//! Render-space values are wrapped in [`RenderPosition`], so converting twice
//! does not type-check.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Up axis used by the consumer of positions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    /// Y-up renderers (three.js, most game engines).
    #[default]
    Y,
    /// Same convention as the domain; conversion is the identity.
    Z,
}

/// A position expressed in the renderer's convention.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderPosition(pub DVec3);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoordinateConvention {
    pub up: UpAxis,
}

impl CoordinateConvention {
    pub fn new(up: UpAxis) -> Self {
        CoordinateConvention { up }
    }

    /// Domain → render transform.
    pub fn matrix(&self) -> DMat3 {
        match self.up {
            // Columns are the images of the domain basis vectors.
            UpAxis::Y => DMat3::from_cols(
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 0.0, -1.0),
                DVec3::new(0.0, 1.0, 0.0),
            ),
            UpAxis::Z => DMat3::IDENTITY,
        }
    }

    /// Render → domain transform.
    pub fn inverse_matrix(&self) -> DMat3 {
        self.matrix().transpose()
    }

    /// Sign flips and swaps only, so the round trip is exact.
    pub fn to_render(&self, p: DVec3) -> RenderPosition {
        match self.up {
            UpAxis::Y => RenderPosition(DVec3::new(p.x, p.z, -p.y)),
            UpAxis::Z => RenderPosition(p),
        }
    }

    pub fn from_render(&self, r: RenderPosition) -> DVec3 {
        let p = r.0;
        match self.up {
            UpAxis::Y => DVec3::new(p.x, -p.z, p.y),
            UpAxis::Z => p,
        }
    }
}

/// Azimuth/elevation/distance, angles in degrees.
///
/// Azimuth 0 faces front (+Y) and grows toward the right (+X); elevation is
/// positive above the horizontal plane.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aed {
    pub azimuth: f64,
    pub elevation: f64,
    pub distance: f64,
}

pub fn from_aed(azimuth_deg: f64, elevation_deg: f64, distance: f64) -> DVec3 {
    let az = azimuth_deg.to_radians();
    let el = elevation_deg.to_radians();
    DVec3::new(
        distance * el.cos() * az.sin(),
        distance * el.cos() * az.cos(),
        distance * el.sin(),
    )
}

/// `None` at the origin, where both angles are undefined.
pub fn to_aed(p: DVec3) -> Option<Aed> {
    let distance = p.length();
    if distance < f64::EPSILON {
        return None;
    }
    Some(Aed {
        azimuth: p.x.atan2(p.y).to_degrees(),
        elevation: (p.z / distance).clamp(-1.0, 1.0).asin().to_degrees(),
        distance,
    })
}

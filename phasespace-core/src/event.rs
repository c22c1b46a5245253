//! Decoded event tuples and the observables read from them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One particle crossing the scoring plane, in analysis units.
///
/// Field order matches the flattened event-list column order:
/// `(weight, energy, x, y, z_last, u, v, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// Statistical weight, always non-negative.
    pub weight: f32,
    /// Kinetic energy in MeV.
    pub energy: f32,
    /// X position in cm.
    pub x: f32,
    /// Y position in cm.
    pub y: f32,
    /// Last interaction depth in cm (zero when the file does not store it).
    pub z_last: f32,
    /// Direction cosine along X.
    pub u: f32,
    /// Direction cosine along Y.
    pub v: f32,
    /// Direction cosine along the transport axis.
    pub w: f32,
}

impl Event {
    /// Returns the event as an array in column order.
    #[must_use]
    pub fn to_array(&self) -> [f32; 8] {
        [
            self.weight,
            self.energy,
            self.x,
            self.y,
            self.z_last,
            self.u,
            self.v,
            self.w,
        ]
    }
}

/// An event field that can be histogrammed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Observable {
    /// Kinetic energy (MeV).
    #[default]
    Energy,
    /// X position (cm).
    X,
    /// Y position (cm).
    Y,
    /// Last interaction depth (cm).
    ZLast,
    /// Direction cosine U.
    U,
    /// Direction cosine V.
    V,
    /// Direction cosine W.
    W,
    /// Statistical weight.
    Weight,
}

impl Observable {
    /// Extracts this observable from an event.
    #[inline]
    #[must_use]
    pub fn value(self, event: &Event) -> f64 {
        let v = match self {
            Observable::Energy => event.energy,
            Observable::X => event.x,
            Observable::Y => event.y,
            Observable::ZLast => event.z_last,
            Observable::U => event.u,
            Observable::V => event.v,
            Observable::W => event.w,
            Observable::Weight => event.weight,
        };
        f64::from(v)
    }

    /// Axis label used when reporting.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Observable::Energy => "Energy (MeV)",
            Observable::X => "X (cm)",
            Observable::Y => "Y (cm)",
            Observable::ZLast => "Z last (cm)",
            Observable::U => "U",
            Observable::V => "V",
            Observable::W => "W",
            Observable::Weight => "Weight",
        }
    }
}

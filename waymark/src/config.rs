//! Configuration of a [`MarkerManager`](crate::MarkerManager).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of a [`MarkerManager`](crate::MarkerManager).
///
/// With the `serde` feature enabled the configuration can be deserialized, and missing fields take their default
/// values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManagerConfig {
    /// Zoom level the manager builds meshes for until the first [`advance_zoom`](crate::MarkerManager::advance_zoom).
    pub initial_zoom: i32,
    /// Minimum extent (in projected meters) of a marker local frame. Points and zero-area geometries get this
    /// extent, so that normalization never divides by zero.
    pub min_extent: f64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 0,
            min_extent: 1.0,
        }
    }
}

impl ManagerConfig {
    /// Sets the initial zoom level.
    pub fn with_initial_zoom(mut self, zoom: i32) -> Self {
        self.initial_zoom = zoom;
        self
    }

    /// Sets the minimum local frame extent. Non-positive or non-finite values are ignored.
    pub fn with_min_extent(mut self, min_extent: f64) -> Self {
        if min_extent.is_finite() && min_extent > 0.0 {
            self.min_extent = min_extent;
        } else {
            log::warn!("Ignoring invalid minimum marker extent {min_extent}");
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_min_extent_is_ignored() {
        let config = ManagerConfig::default().with_min_extent(0.0);
        assert_eq!(config.min_extent, 1.0);
        let config = config.with_min_extent(f64::NAN).with_min_extent(0.5);
        assert_eq!(config.min_extent, 0.5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_defaults() {
        let config: ManagerConfig = serde_json::from_str(r#"{"initial_zoom": 12}"#).unwrap();
        assert_eq!(config.initial_zoom, 12);
        assert_eq!(config.min_extent, 1.0);
    }
}

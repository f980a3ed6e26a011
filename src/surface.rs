// The map surface the live map draws onto, plus the in-memory scene surface
// the server and tests render into.

use serde::Serialize;
use std::collections::HashMap;

use crate::layers::VectorLayer;
use crate::projection::ProjectedPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(pub u32);

/// A point marker in map units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub id: String,
    pub geometry: ProjectedPoint,
}

/// The feature set backing one layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSource {
    features: Vec<Feature>,
}

impl FeatureSource {
    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn add_features<I>(&mut self, features: I)
    where
        I: IntoIterator<Item = Feature>,
    {
        self.features.extend(features);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Capability the live map drives. Implementations may assume `add_layer` is
/// never called for an attached layer and `remove_layer` never for a detached
/// one; [`crate::layers::LayerManager`] tracks membership.
pub trait MapSurface: Send + 'static {
    fn add_layer(&mut self, layer: &VectorLayer);
    fn remove_layer(&mut self, id: LayerId);
    /// Called after an attached layer's features were replaced.
    fn source_changed(&mut self, layer: &VectorLayer);
    fn view(&self) -> MapView;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: ProjectedPoint,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: ProjectedPoint {
                x: -7910361.335273651,
                y: 5215196.272155075,
            },
            zoom: 15.0,
            min_zoom: 10.0,
            max_zoom: 40.0,
        }
    }
}

/// Records what a real surface would be asked to do.
#[derive(Debug, Default)]
pub struct SceneSurface {
    view: MapView,
    attached: Vec<LayerId>,
    add_calls: usize,
    remove_calls: usize,
    redraws: HashMap<LayerId, usize>,
}

impl SceneSurface {
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    /// Attached layers in attach order.
    pub fn attached(&self) -> &[LayerId] {
        &self.attached
    }

    pub fn is_attached(&self, id: LayerId) -> bool {
        self.attached.contains(&id)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls
    }

    pub fn redraws(&self, id: LayerId) -> usize {
        self.redraws.get(&id).copied().unwrap_or(0)
    }
}

impl MapSurface for SceneSurface {
    fn add_layer(&mut self, layer: &VectorLayer) {
        self.add_calls += 1;
        if !self.attached.contains(&layer.id()) {
            self.attached.push(layer.id());
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.remove_calls += 1;
        self.attached.retain(|attached| *attached != id);
    }

    fn source_changed(&mut self, layer: &VectorLayer) {
        *self.redraws.entry(layer.id()).or_insert(0) += 1;
    }

    fn view(&self) -> MapView {
        self.view
    }
}

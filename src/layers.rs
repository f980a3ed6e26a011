// Layer registry: one stop layer and one vehicle layer per transit category,
// created once and only ever attached to or detached from the surface.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Located, Stop, TransitMode, VehiclePosition};
use crate::projection::project;
use crate::surface::{Feature, FeatureSource, LayerId, MapSurface};

// ============================================================================
// Categories & Styles
// ============================================================================

/// Light rail and heavy rail share the subway pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerCategory {
    Subway,
    CommuterRail,
    Bus,
}

impl LayerCategory {
    pub const ALL: [LayerCategory; 3] = [
        LayerCategory::Subway,
        LayerCategory::CommuterRail,
        LayerCategory::Bus,
    ];

    fn styles(self) -> (LayerStyle, LayerStyle) {
        match self {
            LayerCategory::Subway => (
                LayerStyle::icon("/subwayStops.png", 0.09),
                LayerStyle::icon("/subway.png", 0.015).bottom_anchored(),
            ),
            LayerCategory::CommuterRail => (
                LayerStyle::icon("/trainFacility.png", 0.02),
                LayerStyle::icon("/train.png", 0.025).bottom_anchored(),
            ),
            LayerCategory::Bus => (
                LayerStyle::icon("/busStop.png", 0.02),
                LayerStyle::icon("/bus.png", 0.12).bottom_anchored(),
            ),
        }
    }
}

impl TransitMode {
    pub fn category(self) -> LayerCategory {
        match self {
            TransitMode::LightRail | TransitMode::HeavyRail => LayerCategory::Subway,
            TransitMode::CommuterRail => LayerCategory::CommuterRail,
            TransitMode::Bus => LayerCategory::Bus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Stops,
    Vehicles,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub icon: &'static str,
    pub scale: f64,
    pub anchor: [f64; 2],
}

impl LayerStyle {
    fn icon(icon: &'static str, scale: f64) -> Self {
        Self {
            icon,
            scale,
            anchor: [0.5, 0.5],
        }
    }

    fn bottom_anchored(mut self) -> Self {
        self.anchor = [0.5, 1.0];
        self
    }
}

// ============================================================================
// Layers
// ============================================================================

#[derive(Debug)]
pub struct VectorLayer {
    id: LayerId,
    category: LayerCategory,
    kind: LayerKind,
    style: LayerStyle,
    source: FeatureSource,
    attached: bool,
}

impl VectorLayer {
    fn new(id: LayerId, category: LayerCategory, kind: LayerKind, style: LayerStyle) -> Self {
        Self {
            id,
            category,
            kind,
            style,
            source: FeatureSource::default(),
            attached: false,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn category(&self) -> LayerCategory {
        self.category
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    pub fn source(&self) -> &FeatureSource {
        &self.source
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    fn attach<S: MapSurface>(&mut self, surface: &mut S) {
        if !self.attached {
            surface.add_layer(self);
            self.attached = true;
        }
    }

    fn detach<S: MapSurface>(&mut self, surface: &mut S) {
        if self.attached {
            surface.remove_layer(self.id);
            self.attached = false;
        }
    }

    fn replace<'a, T, I, S>(&mut self, entities: I, surface: &mut S)
    where
        T: Located + 'a,
        I: IntoIterator<Item = &'a T>,
        S: MapSurface,
    {
        self.source.clear();
        self.source.add_features(entities.into_iter().map(|entity| Feature {
            id: entity.id().to_string(),
            geometry: project(entity.location()),
        }));
        if self.attached {
            surface.source_changed(self);
        }
    }

    fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        if self.source.is_empty() {
            return;
        }
        self.source.clear();
        if self.attached {
            surface.source_changed(self);
        }
    }

    fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            id: self.id,
            category: self.category,
            kind: self.kind,
            attached: self.attached,
            style: self.style.clone(),
            features: self.source.features().to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct LayerPair {
    pub stops: VectorLayer,
    pub vehicles: VectorLayer,
}

impl LayerPair {
    fn layers_mut(&mut self) -> [&mut VectorLayer; 2] {
        [&mut self.stops, &mut self.vehicles]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSnapshot {
    pub id: LayerId,
    pub category: LayerCategory,
    pub kind: LayerKind,
    pub attached: bool,
    pub style: LayerStyle,
    pub features: Vec<Feature>,
}

// ============================================================================
// Layer Manager
// ============================================================================

pub struct LayerManager<S> {
    surface: S,
    pairs: BTreeMap<LayerCategory, LayerPair>,
}

impl<S: MapSurface> LayerManager<S> {
    pub fn new(surface: S) -> Self {
        let mut next_id = 0;
        let mut layer = |category, kind, style| {
            next_id += 1;
            VectorLayer::new(LayerId(next_id), category, kind, style)
        };

        let pairs = LayerCategory::ALL
            .into_iter()
            .map(|category| {
                let (stop_style, vehicle_style) = category.styles();
                let pair = LayerPair {
                    stops: layer(category, LayerKind::Stops, stop_style),
                    vehicles: layer(category, LayerKind::Vehicles, vehicle_style),
                };
                (category, pair)
            })
            .collect();

        Self { surface, pairs }
    }

    /// Detaches every pair, then attaches the pair for `mode` if one is given.
    pub fn show_only(&mut self, mode: Option<TransitMode>) {
        let keep = mode.map(TransitMode::category);

        for (category, pair) in self.pairs.iter_mut() {
            if Some(*category) != keep {
                for layer in pair.layers_mut() {
                    layer.detach(&mut self.surface);
                }
            }
        }

        if let Some(pair) = keep.and_then(|category| self.pairs.get_mut(&category)) {
            for layer in pair.layers_mut() {
                layer.attach(&mut self.surface);
            }
        }
    }

    pub fn detach_all(&mut self) {
        self.show_only(None);
    }

    /// Empties both sources of the pair `mode` draws into.
    pub fn clear(&mut self, mode: TransitMode) {
        if let Some(pair) = self.pairs.get_mut(&mode.category()) {
            for layer in pair.layers_mut() {
                layer.clear(&mut self.surface);
            }
        }
    }

    pub fn replace_stops(&mut self, mode: TransitMode, stops: &[Stop]) {
        if let Some(pair) = self.pairs.get_mut(&mode.category()) {
            pair.stops.replace(stops, &mut self.surface);
        }
    }

    pub fn replace_vehicles(&mut self, mode: TransitMode, vehicles: &[VehiclePosition]) {
        if let Some(pair) = self.pairs.get_mut(&mode.category()) {
            pair.vehicles.replace(vehicles, &mut self.surface);
        }
    }

    pub fn pair(&self, mode: TransitMode) -> &LayerPair {
        &self.pairs[&mode.category()]
    }

    /// The category whose pair is currently on the surface, if any.
    pub fn visible_category(&self) -> Option<LayerCategory> {
        self.pairs
            .iter()
            .find(|(_, pair)| pair.stops.attached || pair.vehicles.attached)
            .map(|(category, _)| *category)
    }

    pub fn snapshot(&self) -> Vec<LayerSnapshot> {
        self.pairs
            .values()
            .flat_map(|pair| [pair.stops.snapshot(), pair.vehicles.snapshot()])
            .collect()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use crate::surface::SceneSurface;

    fn stop(id: &str, longitude: f64, latitude: f64) -> Stop {
        Stop {
            id: id.to_string(),
            location: GeoPoint::new(longitude, latitude),
        }
    }

    #[test]
    fn show_only_is_exclusive_and_idempotent() {
        let mut layers = LayerManager::new(SceneSurface::default());

        layers.show_only(Some(TransitMode::Bus));
        assert_eq!(layers.visible_category(), Some(LayerCategory::Bus));
        assert_eq!(layers.surface().attached().len(), 2);

        layers.show_only(Some(TransitMode::CommuterRail));
        let bus = layers.pair(TransitMode::Bus);
        let rail = layers.pair(TransitMode::CommuterRail);
        assert!(!bus.stops.is_attached() && !bus.vehicles.is_attached());
        assert!(rail.stops.is_attached() && rail.vehicles.is_attached());
        assert!(!layers.surface().is_attached(bus.stops.id()));

        let adds = layers.surface().add_calls();
        let removes = layers.surface().remove_calls();
        layers.show_only(Some(TransitMode::CommuterRail));
        assert_eq!(layers.surface().add_calls(), adds);
        assert_eq!(layers.surface().remove_calls(), removes);
        assert_eq!(layers.surface().attached().len(), 2);
    }

    #[test]
    fn rail_modes_share_the_subway_pair() {
        let mut layers = LayerManager::new(SceneSurface::default());
        layers.show_only(Some(TransitMode::LightRail));
        let adds = layers.surface().add_calls();

        layers.show_only(Some(TransitMode::HeavyRail));
        assert_eq!(layers.visible_category(), Some(LayerCategory::Subway));
        assert_eq!(layers.surface().add_calls(), adds);
    }

    #[test]
    fn detach_all_with_nothing_attached_is_a_no_op() {
        let mut layers = LayerManager::new(SceneSurface::default());
        layers.detach_all();
        assert_eq!(layers.surface().remove_calls(), 0);
        assert_eq!(layers.visible_category(), None);
    }

    #[test]
    fn replace_keeps_state_while_hidden() {
        let mut layers = LayerManager::new(SceneSurface::default());
        layers.replace_stops(
            TransitMode::Bus,
            &[stop("1", -71.06, 42.36), stop("2", -71.05, 42.35)],
        );

        let bus = layers.pair(TransitMode::Bus);
        assert_eq!(bus.stops.source().len(), 2);
        assert_eq!(layers.surface().redraws(bus.stops.id()), 0);

        layers.show_only(Some(TransitMode::Bus));
        layers.replace_stops(TransitMode::Bus, &[]);
        let bus = layers.pair(TransitMode::Bus);
        assert!(bus.stops.source().is_empty());
        assert_eq!(layers.surface().redraws(bus.stops.id()), 1);
    }

    #[test]
    fn clear_empties_only_the_mode_pair() {
        let mut layers = LayerManager::new(SceneSurface::default());
        layers.replace_stops(TransitMode::Bus, &[stop("1", -71.06, 42.36)]);
        layers.replace_stops(TransitMode::LightRail, &[stop("place-lech", -71.07, 42.37)]);
        layers.replace_vehicles(
            TransitMode::LightRail,
            &[VehiclePosition {
                id: "G-10001".to_string(),
                location: GeoPoint::new(-71.08, 42.35),
            }],
        );
        layers.show_only(Some(TransitMode::HeavyRail));

        layers.clear(TransitMode::HeavyRail);
        let subway = layers.pair(TransitMode::HeavyRail);
        assert!(subway.stops.source().is_empty());
        assert!(subway.vehicles.source().is_empty());
        assert!(subway.stops.is_attached());
        assert_eq!(layers.surface().redraws(subway.stops.id()), 1);
        assert_eq!(layers.surface().redraws(subway.vehicles.id()), 1);
        assert_eq!(layers.pair(TransitMode::Bus).stops.source().len(), 1);

        // Already empty: nothing to redraw.
        layers.clear(TransitMode::LightRail);
        let subway = layers.pair(TransitMode::LightRail);
        assert_eq!(layers.surface().redraws(subway.stops.id()), 1);
    }

    #[test]
    fn features_are_projected() {
        let mut layers = LayerManager::new(SceneSurface::default());
        layers.replace_vehicles(
            TransitMode::HeavyRail,
            &[VehiclePosition {
                id: "R-1".to_string(),
                location: GeoPoint::new(0.0, 0.0),
            }],
        );
        let feature = &layers.pair(TransitMode::HeavyRail).vehicles.source().features()[0];
        assert_eq!(feature.id, "R-1");
        assert!(feature.geometry.x.abs() < 1e-9);
    }

    #[test]
    fn six_layers_with_distinct_ids() {
        let layers = LayerManager::new(SceneSurface::default());
        let snapshot = layers.snapshot();
        assert_eq!(snapshot.len(), 6);
        let mut ids: Vec<_> = snapshot.iter().map(|l| l.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(snapshot.iter().all(|l| !l.attached));
    }
}

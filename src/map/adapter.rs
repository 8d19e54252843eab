use crate::error::SurfaceError;
use crate::geo::Point;
use crate::map::cluster::{count_icon, ClusterIconFactory, ClusterOptions};
use crate::map::heat::HeatOptions;
use crate::map::surface::{HeatPoint, LayerId, MarkerIcon, Popup, RenderSurface};
use crate::map::tiles::BaseLayerType;
use crate::radar::{RadarMarker, RegionSet};

/// Layers currently attached by the adapter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerSet {
    pub tile: Option<LayerId>,
    pub heat: Option<LayerId>,
    pub cluster: Option<LayerId>,
    pub user: Option<LayerId>,
}

/// Turns filtered radar markers into tile, heat and cluster layers on a surface.
///
/// Every rebuild starts by detaching what the previous one attached, so the
/// surface never holds more than one layer of each kind from this adapter.
pub struct PresentationAdapter {
    heat: HeatOptions,
    cluster: ClusterOptions,
    icon: ClusterIconFactory,
    current: LayerSet,
}

impl PresentationAdapter {
    pub fn new(heat: HeatOptions, cluster: ClusterOptions) -> Self {
        Self {
            heat,
            cluster,
            icon: count_icon,
            current: LayerSet::default(),
        }
    }

    pub fn current(&self) -> LayerSet {
        self.current
    }

    /// Replace the tile, heat and cluster layers with ones built from `markers`.
    /// On failure nothing from this attempt stays on the surface.
    pub fn rebuild<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        markers: &[RadarMarker],
        base: BaseLayerType,
        regions: &RegionSet,
    ) -> Result<(), SurfaceError> {
        self.clear_data_layers(surface);

        if !surface.is_ready() {
            log::warn!("map surface not ready, skipping layer build");
            return Err(SurfaceError::NotReady);
        }

        let mut created = Vec::new();
        match self.build(surface, markers, base, regions, &mut created) {
            Ok((tile, heat, cluster)) => {
                self.current.tile = Some(tile);
                self.current.heat = Some(heat);
                self.current.cluster = Some(cluster);
                log::debug!("built map layers for {} markers", markers.len());
                Ok(())
            }
            Err(e) => {
                for id in created {
                    surface.detach(id);
                }
                log::error!("map layer build failed: {e}");
                Err(e)
            }
        }
    }

    fn build<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        markers: &[RadarMarker],
        base: BaseLayerType,
        regions: &RegionSet,
        created: &mut Vec<LayerId>,
    ) -> Result<(LayerId, LayerId, LayerId), SurfaceError> {
        let tile = surface.create_tile_layer(base)?;
        created.push(tile);

        let points = markers
            .iter()
            .map(|m| HeatPoint {
                position: m.point(),
                weight: 1.0,
            })
            .collect();
        let heat = surface.create_heat_layer(points, &self.heat)?;
        created.push(heat);

        let group = surface.create_cluster_group(&self.cluster, self.icon)?;
        created.push(group);

        for marker in markers {
            let id = surface.create_marker(marker.point(), MarkerIcon::Radar)?;
            created.push(id);
            surface.bind_popup(id, popup_for(marker, regions.classify(marker.point())))?;
            surface.add_to_cluster(group, id)?;
        }

        surface.attach(tile)?;
        surface.attach(heat)?;
        surface.attach(group)?;
        Ok((tile, heat, group))
    }

    /// Swap only the tile layer, leaving heat and clusters in place
    pub fn replace_base_layer<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        base: BaseLayerType,
    ) -> Result<(), SurfaceError> {
        surface.remove_layers_of_kind(crate::map::LayerKind::Tile);
        self.current.tile = None;

        let tile = surface.create_tile_layer(base)?;
        if let Err(e) = surface.attach(tile) {
            surface.detach(tile);
            return Err(e);
        }
        self.current.tile = Some(tile);
        log::info!("base layer switched to {base}");
        Ok(())
    }

    /// Put the user-location marker at `position`, replacing any previous one
    pub fn show_user_location<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        position: Point,
    ) -> Result<(), SurfaceError> {
        if let Some(old) = self.current.user.take() {
            surface.detach(old);
        }

        let id = surface.create_marker(position, MarkerIcon::UserLocation)?;
        let attached = surface
            .bind_popup(id, Popup::titled("Your location"))
            .and_then(|()| surface.attach(id));
        if let Err(e) = attached {
            surface.detach(id);
            return Err(e);
        }
        self.current.user = Some(id);
        Ok(())
    }

    /// Remove the user-location marker, if one is shown
    pub fn hide_user_location<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(id) = self.current.user.take() {
            surface.detach(id);
        }
    }

    /// Move the view; layers are left alone
    pub fn set_view<S: RenderSurface + ?Sized>(&self, surface: &mut S, center: Point, zoom: u8) {
        surface.set_view(center, zoom);
    }

    /// Detach everything this adapter attached
    pub fn clear<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.clear_data_layers(surface);
        self.hide_user_location(surface);
    }

    fn clear_data_layers<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        for id in [
            self.current.tile.take(),
            self.current.heat.take(),
            self.current.cluster.take(),
        ]
        .into_iter()
        .flatten()
        {
            surface.detach(id);
        }
    }
}

/// Detail panel shown for a radar marker
pub fn popup_for(marker: &RadarMarker, region: &str) -> Popup {
    Popup::titled("Traffic radar")
        .row("Location", marker.name.as_str())
        .row("City", region)
        .row("Source", marker.source.label())
        .row("Coordinates", format!("{:.6}, {:.6}", marker.lat, marker.lng))
        .link(format!(
            "https://www.google.com/maps?q={},{}",
            marker.lat, marker.lng
        ))
}

use crate::error::SurfaceError;
use crate::geo::Point;
use crate::map::cluster::{ClusterIconFactory, ClusterOptions};
use crate::map::heat::HeatOptions;
use crate::map::tiles::BaseLayerType;

/// Handle to a layer owned by a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Layer category, used for enumeration and removal-by-type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Tile,
    Heat,
    Cluster,
    Marker,
}

/// Glyph used for a point marker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerIcon {
    Radar,
    UserLocation,
}

/// Detail panel attached to a marker
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub title: String,
    /// (label, value) rows
    pub rows: Vec<(String, String)>,
    pub link: Option<String>,
}

impl Popup {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
            link: None,
        }
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }

    pub fn link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    /// Value of the first row with `label`
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// A weighted heat sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatPoint {
    pub position: Point,
    pub weight: f64,
}

/// Capabilities the presentation adapter needs from a map renderer.
///
/// Created layers belong to the surface but are not drawn until attached.
/// `detach` releases a layer whether or not it was attached, so a caller
/// can discard everything it created during a failed build.
pub trait RenderSurface {
    /// The surface can accept layers
    fn is_ready(&self) -> bool;

    fn create_tile_layer(&mut self, base: BaseLayerType) -> Result<LayerId, SurfaceError>;

    fn create_marker(&mut self, position: Point, icon: MarkerIcon) -> Result<LayerId, SurfaceError>;

    fn create_heat_layer(
        &mut self,
        points: Vec<HeatPoint>,
        options: &HeatOptions,
    ) -> Result<LayerId, SurfaceError>;

    fn create_cluster_group(
        &mut self,
        options: &ClusterOptions,
        icon: ClusterIconFactory,
    ) -> Result<LayerId, SurfaceError>;

    /// Move a created marker into a cluster group
    fn add_to_cluster(&mut self, group: LayerId, marker: LayerId) -> Result<(), SurfaceError>;

    fn bind_popup(&mut self, layer: LayerId, popup: Popup) -> Result<(), SurfaceError>;

    /// View transform only; layers are untouched
    fn set_view(&mut self, center: Point, zoom: u8);

    fn attach(&mut self, layer: LayerId) -> Result<(), SurfaceError>;

    /// Release a layer. Unknown ids are ignored.
    fn detach(&mut self, layer: LayerId);

    /// Attached layers in draw order
    fn layers(&self) -> Vec<(LayerId, LayerKind)>;

    /// Detach every attached layer of `kind`, returning how many were removed
    fn remove_layers_of_kind(&mut self, kind: LayerKind) -> usize {
        let doomed: Vec<LayerId> = self
            .layers()
            .into_iter()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.detach(*id);
        }
        doomed.len()
    }
}

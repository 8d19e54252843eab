mod adapter;
mod basemap;
mod cluster;
mod geometry;
mod heat;
mod projection;
mod spatial;
mod surface;
mod terminal;
mod tiles;

pub use adapter::{popup_for, LayerSet, PresentationAdapter};
pub use basemap::{BaseMap, LineString, Lod};
pub use cluster::{cluster_points, count_icon, ClusterIcon, ClusterIconFactory, ClusterOptions, ClusterSize, ScreenCluster};
pub use heat::{HeatGrid, HeatOptions};
pub use projection::Viewport;
pub use surface::{HeatPoint, LayerId, LayerKind, MarkerIcon, Popup, RenderSurface};
pub use terminal::{Glyph, Hit, SurfaceFrame, TerminalSurface};
pub use tiles::{BaseLayerType, TileProvider};

use std::collections::HashMap;

use glam::DVec2;

use crate::braille::BrailleCanvas;
use crate::error::SurfaceError;
use crate::geo::Point;
use crate::map::basemap::BaseMap;
use crate::map::cluster::{cluster_points, ClusterIconFactory, ClusterOptions, ClusterSize, ScreenCluster};
use crate::map::geometry::{draw_disc, draw_ring};
use crate::map::heat::{HeatGrid, HeatOptions};
use crate::map::projection::Viewport;
use crate::map::surface::{HeatPoint, LayerId, LayerKind, MarkerIcon, Popup, RenderSurface};
use crate::map::tiles::BaseLayerType;

/// Option values are in screen pixels; one Braille dot stands in for this many
const SCREEN_PX_PER_DOT: f64 = 4.0;

/// Smallest map area (in characters) worth drawing into
const MIN_COLS: usize = 10;
const MIN_ROWS: usize = 4;

/// Click tolerance around a single marker, in dots
const HIT_RADIUS: f64 = 3.0;

struct ClusterMember {
    position: Point,
    popup: Option<Popup>,
}

enum Layer {
    Tile(BaseLayerType),
    Marker {
        position: Point,
        icon: MarkerIcon,
        popup: Option<Popup>,
    },
    Heat {
        points: Vec<HeatPoint>,
        options: HeatOptions,
    },
    Cluster {
        options: ClusterOptions,
        icon: ClusterIconFactory,
        members: Vec<ClusterMember>,
    },
}

impl Layer {
    fn kind(&self) -> LayerKind {
        match self {
            Layer::Tile(_) => LayerKind::Tile,
            Layer::Marker { .. } => LayerKind::Marker,
            Layer::Heat { .. } => LayerKind::Heat,
            Layer::Cluster { .. } => LayerKind::Cluster,
        }
    }
}

/// Text drawn over the map at a character cell
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: [u8; 3],
}

/// Everything needed to paint one frame of the map, back to front
pub struct SurfaceFrame {
    pub base: Option<BaseLayerType>,
    pub outlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// (col, row, rgb) background cells
    pub heat: Vec<(u16, u16, [u8; 3])>,
    /// Individual radar markers
    pub markers: BrailleCanvas,
    /// Cluster outlines, one canvas per size class
    pub rings: Vec<(ClusterSize, BrailleCanvas)>,
    pub user: BrailleCanvas,
    pub glyphs: Vec<Glyph>,
}

/// What sits under a clicked position
#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
    Marker(Popup),
    Cluster { center: Point, count: usize },
}

/// Braille-canvas implementation of [`RenderSurface`]
pub struct TerminalSurface {
    viewport: Viewport,
    base_map: BaseMap,
    cols: usize,
    rows: usize,
    layers: HashMap<LayerId, Layer>,
    attached: Vec<LayerId>,
    next_id: u64,
}

impl TerminalSurface {
    /// Not ready until [`resize`](Self::resize) gives it a usable area
    pub fn new(base_map: BaseMap, center: Point, zoom: u8) -> Self {
        Self {
            viewport: Viewport::centered(center, zoom, 0, 0),
            base_map,
            cols: 0,
            rows: 0,
            layers: HashMap::new(),
            attached: Vec::new(),
            next_id: 1,
        }
    }

    /// Set the map area in terminal characters
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.viewport.resize(cols * 2, rows * 4);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Direct view manipulation (pan and zoom gestures)
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Layers held by the surface, attached or not
    pub fn stored_layers(&self) -> usize {
        self.layers.len()
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(id, layer);
        id
    }

    fn ensure_ready(&self) -> Result<(), SurfaceError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(SurfaceError::NotReady)
        }
    }

    fn attached_layers(&self) -> impl Iterator<Item = &Layer> {
        self.attached.iter().filter_map(|id| self.layers.get(id))
    }

    /// Members of a cluster group grouped in current screen space
    fn screen_clusters(&self, members: &[ClusterMember], options: &ClusterOptions) -> (Vec<DVec2>, Vec<ScreenCluster>) {
        let points: Vec<DVec2> = members
            .iter()
            .map(|m| {
                let (x, y) = self.viewport.project_f64(m.position.lng, m.position.lat);
                DVec2::new(x, y)
            })
            .collect();
        let clusters = cluster_points(&points, options.max_cluster_radius / SCREEN_PX_PER_DOT);
        (points, clusters)
    }

    /// Paint all attached layers
    pub fn render(&self) -> SurfaceFrame {
        let (cols, rows) = (self.cols, self.rows);
        let mut frame = SurfaceFrame {
            base: None,
            outlines: BrailleCanvas::new(cols, rows),
            borders: BrailleCanvas::new(cols, rows),
            heat: Vec::new(),
            markers: BrailleCanvas::new(cols, rows),
            rings: [ClusterSize::Small, ClusterSize::Medium, ClusterSize::Large]
                .into_iter()
                .map(|size| (size, BrailleCanvas::new(cols, rows)))
                .collect(),
            user: BrailleCanvas::new(cols, rows),
            glyphs: Vec::new(),
        };

        for layer in self.attached_layers() {
            match layer {
                Layer::Tile(base) => {
                    if frame.base.is_none() {
                        self.base_map
                            .draw(&mut frame.outlines, &mut frame.borders, &self.viewport);
                    }
                    frame.base = Some(*base);
                }
                Layer::Heat { points, options } => {
                    let scale = options.zoom_scale(self.viewport.level());
                    let mut grid = HeatGrid::new(cols, rows);
                    let projected = points.iter().map(|p| {
                        let (x, y) = self.viewport.project_f64(p.position.lng, p.position.lat);
                        (x, y, p.weight * scale)
                    });
                    grid.rebuild(projected, (options.radius + options.blur) / SCREEN_PX_PER_DOT);
                    frame
                        .heat
                        .extend(grid.iter_cells().map(|(c, r, v)| (c, r, options.shade(v))));
                }
                Layer::Cluster {
                    options,
                    icon,
                    members,
                } => {
                    let (points, clusters) = self.screen_clusters(members, options);
                    for cluster in clusters {
                        let (x, y) = (cluster.center.x as i32, cluster.center.y as i32);
                        if !self.viewport.is_visible(x, y) {
                            continue;
                        }
                        if let [only] = cluster.members.as_slice() {
                            let p = points[*only];
                            draw_disc(&mut frame.markers, p.x as i32, p.y as i32, 1);
                            continue;
                        }

                        let glyph = icon(cluster.members.len());
                        let ring_radius = (glyph.size.diameter() as f64 / SCREEN_PX_PER_DOT / 2.0) as i32;
                        if let Some((_, canvas)) = frame.rings.iter_mut().find(|(s, _)| *s == glyph.size) {
                            draw_ring(canvas, x, y, ring_radius);
                        }
                        if x >= 0 && y >= 0 {
                            let half = (glyph.label.chars().count() / 2) as i32;
                            frame.glyphs.push(Glyph {
                                col: ((x / 2) - half).max(0) as u16,
                                row: (y / 4) as u16,
                                text: glyph.label,
                                color: glyph.size.color(),
                            });
                        }
                    }
                }
                Layer::Marker { position, icon, .. } => {
                    let (x, y) = self.viewport.project(position.lng, position.lat);
                    match icon {
                        MarkerIcon::Radar => draw_disc(&mut frame.markers, x, y, 1),
                        MarkerIcon::UserLocation => draw_disc(&mut frame.user, x, y, 2),
                    }
                }
            }
        }

        frame
    }

    /// Find the marker or cluster under a dot position
    pub fn hit_test(&self, px: i32, py: i32) -> Option<Hit> {
        let click = DVec2::new(px as f64, py as f64);
        let mut best: Option<(f64, Hit)> = None;
        let mut consider = |dist: f64, hit: Hit| {
            if best.as_ref().map_or(true, |(d, _)| dist < *d) {
                best = Some((dist, hit));
            }
        };

        for layer in self.attached_layers() {
            match layer {
                Layer::Marker {
                    position,
                    popup: Some(popup),
                    ..
                } => {
                    let (x, y) = self.viewport.project_f64(position.lng, position.lat);
                    let dist = DVec2::new(x, y).distance(click);
                    if dist <= HIT_RADIUS {
                        consider(dist, Hit::Marker(popup.clone()));
                    }
                }
                Layer::Cluster {
                    options,
                    icon,
                    members,
                } => {
                    let (points, clusters) = self.screen_clusters(members, options);
                    for cluster in clusters {
                        if let [only] = cluster.members.as_slice() {
                            let dist = points[*only].distance(click);
                            if let (true, Some(popup)) = (dist <= HIT_RADIUS, &members[*only].popup) {
                                consider(dist, Hit::Marker(popup.clone()));
                            }
                            continue;
                        }
                        let reach = icon(cluster.members.len()).size.diameter() as f64
                            / SCREEN_PX_PER_DOT
                            / 2.0;
                        let dist = cluster.center.distance(click);
                        if dist <= reach {
                            let (lon, lat) = self
                                .viewport
                                .unproject(cluster.center.x as i32, cluster.center.y as i32);
                            consider(
                                dist,
                                Hit::Cluster {
                                    center: Point::new(lat, lon),
                                    count: cluster.members.len(),
                                },
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        best.map(|(_, hit)| hit)
    }
}

fn check_point(position: Point) -> Result<(), SurfaceError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(SurfaceError::InvalidInput(format!(
            "non-finite coordinate {}, {}",
            position.lat, position.lng
        )))
    }
}

impl RenderSurface for TerminalSurface {
    fn is_ready(&self) -> bool {
        self.cols >= MIN_COLS && self.rows >= MIN_ROWS
    }

    fn create_tile_layer(&mut self, base: BaseLayerType) -> Result<LayerId, SurfaceError> {
        self.ensure_ready()?;
        Ok(self.insert(Layer::Tile(base)))
    }

    fn create_marker(&mut self, position: Point, icon: MarkerIcon) -> Result<LayerId, SurfaceError> {
        self.ensure_ready()?;
        check_point(position)?;
        Ok(self.insert(Layer::Marker {
            position,
            icon,
            popup: None,
        }))
    }

    fn create_heat_layer(
        &mut self,
        points: Vec<HeatPoint>,
        options: &HeatOptions,
    ) -> Result<LayerId, SurfaceError> {
        self.ensure_ready()?;
        for p in &points {
            check_point(p.position)?;
        }
        Ok(self.insert(Layer::Heat {
            points,
            options: options.clone(),
        }))
    }

    fn create_cluster_group(
        &mut self,
        options: &ClusterOptions,
        icon: ClusterIconFactory,
    ) -> Result<LayerId, SurfaceError> {
        self.ensure_ready()?;
        Ok(self.insert(Layer::Cluster {
            options: options.clone(),
            icon,
            members: Vec::new(),
        }))
    }

    fn add_to_cluster(&mut self, group: LayerId, marker: LayerId) -> Result<(), SurfaceError> {
        match self.layers.get(&group) {
            Some(Layer::Cluster { .. }) => {}
            Some(_) => return Err(SurfaceError::NotACluster(group)),
            None => return Err(SurfaceError::UnknownLayer(group)),
        }
        let (position, popup) = match self.layers.remove(&marker) {
            Some(Layer::Marker { position, popup, .. }) => (position, popup),
            Some(other) => {
                self.layers.insert(marker, other);
                return Err(SurfaceError::InvalidInput(format!(
                    "layer {marker:?} is not a marker"
                )));
            }
            None => return Err(SurfaceError::UnknownLayer(marker)),
        };
        self.attached.retain(|id| *id != marker);

        if let Some(Layer::Cluster { members, .. }) = self.layers.get_mut(&group) {
            members.push(ClusterMember { position, popup });
        }
        Ok(())
    }

    fn bind_popup(&mut self, layer: LayerId, popup: Popup) -> Result<(), SurfaceError> {
        match self.layers.get_mut(&layer) {
            Some(Layer::Marker { popup: slot, .. }) => {
                *slot = Some(popup);
                Ok(())
            }
            Some(_) => Err(SurfaceError::InvalidInput(format!(
                "popups bind to markers only, not {layer:?}"
            ))),
            None => Err(SurfaceError::UnknownLayer(layer)),
        }
    }

    fn set_view(&mut self, center: Point, zoom: u8) {
        self.viewport.set_view(center, zoom);
    }

    fn attach(&mut self, layer: LayerId) -> Result<(), SurfaceError> {
        if !self.layers.contains_key(&layer) {
            return Err(SurfaceError::UnknownLayer(layer));
        }
        if !self.attached.contains(&layer) {
            self.attached.push(layer);
        }
        Ok(())
    }

    fn detach(&mut self, layer: LayerId) {
        self.layers.remove(&layer);
        self.attached.retain(|id| *id != layer);
    }

    fn layers(&self) -> Vec<(LayerId, LayerKind)> {
        self.attached
            .iter()
            .filter_map(|id| self.layers.get(id).map(|layer| (*id, layer.kind())))
            .collect()
    }
}

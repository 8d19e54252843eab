use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::api::{spawn_fetch, RadarClient};
use crate::config::ViewConfig;
use crate::error::{FetchError, GeolocationError};
use crate::geo::Point;
use crate::geolocation::{spawn_request, Geolocator};
use crate::map::{
    BaseLayerType, Hit, Popup, PresentationAdapter, RenderSurface, TerminalSurface,
};
use crate::radar::{
    filter, format_age, group, ClassifiedGroup, RadarData, RadarMarker, RegionSet, Selection, UNKNOWN,
};

/// Where the radar data is in its lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Loading,
    Failed(String),
    Ready,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LocationStatus {
    /// Never asked
    Unknown,
    Requesting,
    Known(Point),
    Unavailable(String),
}

/// Everything the screen shows, owned by the UI loop
#[derive(Clone, Debug)]
pub struct AppState {
    pub load: LoadState,
    pub data: Option<RadarData>,
    pub groups: ClassifiedGroup,
    /// Markers passing the current selection, input order
    pub filtered: Vec<RadarMarker>,
    pub selection: Selection,
    pub base_layer: BaseLayerType,
    pub location: LocationStatus,
    /// "time since cache" text, refreshed by the ticker
    pub cache_age: Option<String>,
    pub fresh: bool,
    pub popup: Option<Popup>,
    /// The surface currently holds layers for `filtered`
    pub layers_built: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(base_layer: BaseLayerType) -> Self {
        Self {
            load: LoadState::Loading,
            data: None,
            groups: ClassifiedGroup::default(),
            filtered: Vec::new(),
            selection: Selection::All,
            base_layer,
            location: LocationStatus::Unknown,
            cache_age: None,
            fresh: false,
            popup: None,
            layers_built: false,
            should_quit: false,
        }
    }

    /// "all", then "unknown", then every city that has radars
    pub fn region_choices(&self) -> Vec<Selection> {
        [Selection::All, Selection::Region(UNKNOWN.to_string())]
            .into_iter()
            .chain(
                self.groups
                    .city_options()
                    .into_iter()
                    .map(|(name, _)| Selection::Region(name)),
            )
            .collect()
    }

    fn step_region(&self, forward: bool) -> Selection {
        let choices = self.region_choices();
        let len = choices.len();
        let idx = choices
            .iter()
            .position(|s| *s == self.selection)
            .unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        choices[next].clone()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// First frame: fetch data and ask for the user's position
    Start,
    /// Manual re-fetch after a failure
    Retry,
    MarkersChanged(RadarData),
    FetchFailed(String),
    RegionChanged(Selection),
    NextRegion,
    PrevRegion,
    BaseLayerChanged(BaseLayerType),
    CycleBaseLayer,
    RequestLocation,
    LocationResolved(Point),
    LocationFailed(GeolocationError),
    CenterOnUser,
    /// The surface became able to take layers
    SurfaceReady,
    LayersBuilt(bool),
    /// Unix seconds
    Tick(i64),
    ShowPopup(Popup),
    ClosePopup,
    Quit,
}

/// Side effects requested by [`update`], executed by [`App`]
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Fetch,
    RequestLocation,
    RebuildLayers,
    ReplaceBaseLayer,
    ShowUserLocation(Point),
    HideUserLocation,
    SetView(Point, u8),
    ClearLayers,
}

/// Read-only context the reducer needs
pub struct Env<'a> {
    pub regions: &'a RegionSet,
    pub view: &'a ViewConfig,
}

impl Env<'_> {
    fn view_for(&self, selection: &Selection) -> (Point, u8) {
        let region = match selection {
            Selection::Region(name) if !selection.is_country_wide() => self.regions.find(name),
            _ => None,
        };
        match region {
            Some(region) => (region.center, self.view.region_zoom),
            None => (self.view.country_center, self.view.country_zoom),
        }
    }
}

/// Apply an action to the state, returning the effects it calls for
pub fn update(state: &mut AppState, action: Action, env: &Env) -> Vec<Effect> {
    match action {
        Action::Start => {
            state.location = LocationStatus::Requesting;
            vec![
                Effect::SetView(env.view.initial_center, env.view.initial_zoom),
                Effect::Fetch,
                Effect::RequestLocation,
            ]
        }
        Action::Retry => {
            state.load = LoadState::Loading;
            state.popup = None;
            vec![Effect::Fetch]
        }
        Action::MarkersChanged(data) => {
            state.groups = group(&data.markers, env.regions);
            state.filtered = filter(&data.markers, &state.selection, env.regions);
            state.data = Some(data);
            state.load = LoadState::Ready;

            let mut effects = vec![Effect::RebuildLayers];
            if let LocationStatus::Known(p) = state.location {
                effects.push(Effect::ShowUserLocation(p));
            }
            effects
        }
        Action::FetchFailed(message) => {
            state.load = LoadState::Failed(message);
            state.data = None;
            state.groups = ClassifiedGroup::default();
            state.filtered.clear();
            state.cache_age = None;
            state.layers_built = false;
            vec![Effect::ClearLayers]
        }
        Action::RegionChanged(selection) => {
            state.filtered = state
                .data
                .as_ref()
                .map(|d| filter(&d.markers, &selection, env.regions))
                .unwrap_or_default();
            let (center, zoom) = env.view_for(&selection);
            state.selection = selection;
            state.popup = None;

            let mut effects = Vec::new();
            if state.load == LoadState::Ready {
                effects.push(Effect::RebuildLayers);
            }
            effects.push(Effect::SetView(center, zoom));
            effects
        }
        Action::NextRegion => {
            let next = state.step_region(true);
            update(state, Action::RegionChanged(next), env)
        }
        Action::PrevRegion => {
            let prev = state.step_region(false);
            update(state, Action::RegionChanged(prev), env)
        }
        Action::BaseLayerChanged(base) => {
            state.base_layer = base;
            if state.layers_built {
                vec![Effect::ReplaceBaseLayer]
            } else {
                Vec::new()
            }
        }
        Action::CycleBaseLayer => {
            let next = state.base_layer.next();
            update(state, Action::BaseLayerChanged(next), env)
        }
        Action::RequestLocation => {
            state.location = LocationStatus::Requesting;
            vec![Effect::RequestLocation]
        }
        Action::LocationResolved(p) => {
            state.location = LocationStatus::Known(p);
            vec![
                Effect::ShowUserLocation(p),
                Effect::SetView(p, env.view.location_zoom),
            ]
        }
        Action::LocationFailed(e) => {
            state.location = LocationStatus::Unavailable(e.to_string());
            vec![Effect::HideUserLocation]
        }
        Action::CenterOnUser => match state.location {
            LocationStatus::Known(p) => vec![Effect::SetView(p, env.view.location_zoom)],
            LocationStatus::Requesting => Vec::new(),
            _ => update(state, Action::RequestLocation, env),
        },
        Action::SurfaceReady => {
            if state.load != LoadState::Ready || state.layers_built {
                return Vec::new();
            }
            let mut effects = vec![Effect::RebuildLayers];
            if let LocationStatus::Known(p) = state.location {
                effects.push(Effect::ShowUserLocation(p));
            }
            effects
        }
        Action::LayersBuilt(ok) => {
            state.layers_built = ok;
            Vec::new()
        }
        Action::Tick(now) => {
            if let Some(data) = &state.data {
                state.cache_age = Some(format_age(data.meta.age_secs(now)));
                state.fresh = data.meta.is_fresh(now);
            }
            Vec::new()
        }
        Action::ShowPopup(popup) => {
            state.popup = Some(popup);
            Vec::new()
        }
        Action::ClosePopup => {
            state.popup = None;
            Vec::new()
        }
        Action::Quit => {
            state.should_quit = true;
            Vec::new()
        }
    }
}

/// Fixed-period timer driven by the UI loop
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// First tick fires immediately
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, next: now }
    }

    /// True once per elapsed period
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }
}

/// Owns the state, the map surface and the background requests
pub struct App {
    pub state: AppState,
    pub surface: TerminalSurface,
    adapter: PresentationAdapter,
    regions: RegionSet,
    view: ViewConfig,
    client: RadarClient,
    locator: Arc<dyn Geolocator>,
    /// Outstanding fetches; a superseded one is still applied when it lands
    fetches: Vec<Receiver<Result<RadarData, FetchError>>>,
    locations: Vec<Receiver<Result<Point, GeolocationError>>>,
    ticker: Ticker,
    /// Screen area of the map, inside its border
    pub map_area: Rect,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
    dragged: bool,
}

impl App {
    pub fn new(
        state: AppState,
        surface: TerminalSurface,
        adapter: PresentationAdapter,
        regions: RegionSet,
        view: ViewConfig,
        client: RadarClient,
        locator: Arc<dyn Geolocator>,
    ) -> Self {
        Self {
            state,
            surface,
            adapter,
            regions,
            view,
            client,
            locator,
            fetches: Vec::new(),
            locations: Vec::new(),
            ticker: Ticker::new(Duration::from_secs(1), Instant::now()),
            map_area: Rect::default(),
            last_mouse: None,
            dragged: false,
        }
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn dispatch(&mut self, action: Action) {
        let env = Env {
            regions: &self.regions,
            view: &self.view,
        };
        let effects = update(&mut self.state, action, &env);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Fetch => self.fetches.push(spawn_fetch(self.client.clone())),
            Effect::RequestLocation => self.locations.push(spawn_request(Arc::clone(&self.locator))),
            Effect::RebuildLayers => {
                let built = self
                    .adapter
                    .rebuild(
                        &mut self.surface,
                        &self.state.filtered,
                        self.state.base_layer,
                        &self.regions,
                    )
                    .is_ok();
                self.dispatch(Action::LayersBuilt(built));
            }
            Effect::ReplaceBaseLayer => {
                if let Err(e) = self
                    .adapter
                    .replace_base_layer(&mut self.surface, self.state.base_layer)
                {
                    log::error!("base layer change failed: {e}");
                }
            }
            Effect::ShowUserLocation(p) => {
                if let Err(e) = self.adapter.show_user_location(&mut self.surface, p) {
                    log::warn!("user location marker not shown: {e}");
                }
            }
            Effect::HideUserLocation => self.adapter.hide_user_location(&mut self.surface),
            Effect::SetView(center, zoom) => self.adapter.set_view(&mut self.surface, center, zoom),
            Effect::ClearLayers => self.adapter.clear(&mut self.surface),
        }
    }

    /// Apply finished background work and fire the ticker
    pub fn pump(&mut self, now: Instant) {
        for result in drain(&mut self.fetches, || Err(FetchError::Disconnected)) {
            match result {
                Ok(data) => self.dispatch(Action::MarkersChanged(data)),
                Err(e) => self.dispatch(Action::FetchFailed(e.to_string())),
            }
        }
        for result in drain(&mut self.locations, || Err(GeolocationError::Unavailable)) {
            match result {
                Ok(p) => self.dispatch(Action::LocationResolved(p)),
                Err(e) => self.dispatch(Action::LocationFailed(e)),
            }
        }
        if self.ticker.poll(now) {
            self.dispatch(Action::Tick(chrono::Utc::now().timestamp()));
        }
    }

    /// Requests still in flight
    pub fn pending(&self) -> usize {
        self.fetches.len() + self.locations.len()
    }

    /// New map area (inside the border), in terminal cells
    pub fn resize(&mut self, map_area: Rect) {
        self.map_area = map_area;
        self.surface
            .resize(map_area.width as usize, map_area.height as usize);
        if self.surface.is_ready() {
            self.dispatch(Action::SurfaceReady);
        }
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.surface.viewport_mut().pan(dx, dy);
    }

    /// Deepest level the current base layer serves
    fn max_level(&self) -> u8 {
        self.state.base_layer.provider().max_zoom
    }

    fn can_zoom_in(&self) -> bool {
        self.surface.viewport().level() + 1.0 <= self.max_level() as f64 + 1e-9
    }

    pub fn zoom_in(&mut self) {
        if self.can_zoom_in() {
            self.surface.viewport_mut().zoom_in();
        }
    }

    pub fn zoom_out(&mut self) {
        self.surface.viewport_mut().zoom_out();
    }

    /// Terminal cell to Braille dot inside the map, if it is on the map
    fn to_dots(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        let inside = col >= area.x
            && row >= area.y
            && col < area.x + area.width
            && row < area.y + area.height;
        inside.then(|| {
            (
                (col - area.x) as i32 * 2 + 1,
                (row - area.y) as i32 * 4 + 2,
            )
        })
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if !self.can_zoom_in() {
            return;
        }
        if let Some((px, py)) = self.to_dots(col, row) {
            self.surface.viewport_mut().zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.to_dots(col, row) {
            self.surface.viewport_mut().zoom_out_at(px, py);
        }
    }

    pub fn start_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.pan(dx, dy);
                self.dragged = true;
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse released; a release without movement counts as a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if clicked {
            self.click(col, row);
        }
    }

    /// Open a marker popup or zoom into a cluster
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.to_dots(col, row) else {
            return;
        };
        match self.surface.hit_test(px, py) {
            Some(Hit::Marker(popup)) => self.dispatch(Action::ShowPopup(popup)),
            Some(Hit::Cluster { center, .. }) => {
                let level = (self.surface.viewport().level().round() as u8).saturating_add(2);
                let level = level.min(self.max_level());
                self.adapter.set_view(&mut self.surface, center, level);
            }
            None => {
                if self.state.popup.is_some() {
                    self.dispatch(Action::ClosePopup);
                }
            }
        }
    }
}

/// Take every finished result out of a set of one-shot receivers
fn drain<T>(receivers: &mut Vec<Receiver<T>>, lost: impl Fn() -> T) -> Vec<T> {
    let mut results = Vec::new();
    receivers.retain(|rx| match rx.try_recv() {
        Ok(result) => {
            results.push(result);
            false
        }
        Err(TryRecvError::Empty) => true,
        Err(TryRecvError::Disconnected) => {
            results.push(lost());
            false
        }
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::ConfiguredLocation;
    use crate::map::{BaseMap, ClusterOptions, HeatOptions};
    use crate::radar::{Meta, Source};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn marker(name: &str, lat: f64, lng: f64) -> RadarMarker {
        RadarMarker {
            name: name.to_string(),
            lat,
            lng,
            source: Source::User,
        }
    }

    fn data() -> RadarData {
        RadarData {
            markers: vec![
                marker("Kızılay", 39.92, 32.85),
                marker("Taksim", 41.03, 28.98),
                marker("Ulus", 39.94, 32.85),
            ],
            meta: Meta {
                count: 3,
                cache_at: 1_700_000_000,
            },
            center: Point::new(39.0, 35.0),
            zoom: 6,
        }
    }

    fn run(state: &mut AppState, action: Action) -> Vec<Effect> {
        let regions = RegionSet::builtin().unwrap();
        let view = ViewConfig::default();
        update(
            state,
            action,
            &Env {
                regions: &regions,
                view: &view,
            },
        )
    }

    #[test]
    fn test_start_fetches_and_requests_location() {
        let mut state = AppState::new(BaseLayerType::Osm);
        let effects = run(&mut state, Action::Start);
        assert_eq!(
            effects,
            vec![
                Effect::SetView(Point::new(39.9334, 32.8597), 7),
                Effect::Fetch,
                Effect::RequestLocation
            ]
        );
        assert_eq!(state.location, LocationStatus::Requesting);
    }

    #[test]
    fn test_markers_changed_groups_and_rebuilds() {
        let mut state = AppState::new(BaseLayerType::Osm);
        let effects = run(&mut state, Action::MarkersChanged(data()));

        assert_eq!(effects, vec![Effect::RebuildLayers]);
        assert_eq!(state.load, LoadState::Ready);
        assert_eq!(state.groups.count("Ankara"), 2);
        assert_eq!(state.groups.count("İstanbul"), 1);
        assert_eq!(state.filtered.len(), 3);
    }

    #[test]
    fn test_region_change_recentres() {
        let mut state = AppState::new(BaseLayerType::Osm);
        run(&mut state, Action::MarkersChanged(data()));

        let effects = run(&mut state, Action::RegionChanged(Selection::parse("Ankara")));
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(effects[0], Effect::RebuildLayers);
        match effects[1] {
            Effect::SetView(center, zoom) => {
                assert_eq!(zoom, 9);
                assert!((center.lat - 39.93).abs() < 0.5);
            }
            ref other => panic!("unexpected effect {other:?}"),
        }

        let effects = run(&mut state, Action::RegionChanged(Selection::All));
        assert_eq!(state.filtered.len(), 3);
        assert_eq!(effects[1], Effect::SetView(Point::new(39.0, 35.0), 6));

        let effects = run(&mut state, Action::RegionChanged(Selection::parse("unknown")));
        assert!(state.filtered.is_empty());
        assert_eq!(effects[1], Effect::SetView(Point::new(39.0, 35.0), 6));
    }

    #[test]
    fn test_region_cycle_wraps() {
        let mut state = AppState::new(BaseLayerType::Osm);
        run(&mut state, Action::MarkersChanged(data()));

        run(&mut state, Action::NextRegion);
        assert_eq!(state.selection, Selection::parse("unknown"));
        assert!(state.filtered.is_empty());
        run(&mut state, Action::NextRegion);
        assert_eq!(state.selection, Selection::parse("Ankara"));
        run(&mut state, Action::NextRegion);
        assert_eq!(state.selection, Selection::parse("İstanbul"));
        run(&mut state, Action::NextRegion);
        assert_eq!(state.selection, Selection::All);
        run(&mut state, Action::PrevRegion);
        assert_eq!(state.selection, Selection::parse("İstanbul"));
    }

    #[test]
    fn test_unknown_bucket_is_selectable() {
        let mut state = AppState::new(BaseLayerType::Osm);
        let mut with_sea = data();
        with_sea.markers.push(marker("Open sea", 34.0, 20.0));
        run(&mut state, Action::MarkersChanged(with_sea));

        let mut seen = Vec::new();
        for _ in 0..5 {
            run(&mut state, Action::NextRegion);
            seen.push(state.selection.to_string());
        }
        assert!(seen.contains(&"unknown".to_string()));

        run(&mut state, Action::RegionChanged(Selection::parse("unknown")));
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.filtered[0].name, "Open sea");
    }

    #[test]
    fn test_location_arrival_zooms_in() {
        let mut state = AppState::new(BaseLayerType::Osm);
        let p = Point::new(41.0, 29.0);
        let effects = run(&mut state, Action::LocationResolved(p));
        assert_eq!(
            effects,
            vec![Effect::ShowUserLocation(p), Effect::SetView(p, 12)]
        );

        // Known location is re-shown after new data arrives
        let effects = run(&mut state, Action::MarkersChanged(data()));
        assert_eq!(effects, vec![Effect::RebuildLayers, Effect::ShowUserLocation(p)]);
    }

    #[test]
    fn test_location_denied_keeps_view() {
        let mut state = AppState::new(BaseLayerType::Osm);
        let effects = run(&mut state, Action::LocationFailed(GeolocationError::Denied));
        assert_eq!(effects, vec![Effect::HideUserLocation]);
        assert!(matches!(state.location, LocationStatus::Unavailable(_)));

        let effects = run(&mut state, Action::CenterOnUser);
        assert_eq!(effects, vec![Effect::RequestLocation]);
    }

    #[test]
    fn test_base_layer_change_only_when_built() {
        let mut state = AppState::new(BaseLayerType::Osm);
        assert!(run(&mut state, Action::CycleBaseLayer).is_empty());
        assert_eq!(state.base_layer, BaseLayerType::ArcGis);

        run(&mut state, Action::LayersBuilt(true));
        let effects = run(&mut state, Action::BaseLayerChanged(BaseLayerType::Google));
        assert_eq!(effects, vec![Effect::ReplaceBaseLayer]);
    }

    #[test]
    fn test_fetch_failure_clears_everything() {
        let mut state = AppState::new(BaseLayerType::Osm);
        run(&mut state, Action::MarkersChanged(data()));
        run(&mut state, Action::LayersBuilt(true));

        let effects = run(&mut state, Action::FetchFailed("HTTP 500".into()));
        assert_eq!(effects, vec![Effect::ClearLayers]);
        assert_eq!(state.load, LoadState::Failed("HTTP 500".into()));
        assert!(state.filtered.is_empty());
        assert!(!state.layers_built);

        assert_eq!(run(&mut state, Action::Retry), vec![Effect::Fetch]);
        assert_eq!(state.load, LoadState::Loading);
    }

    #[test]
    fn test_tick_updates_age() {
        let mut state = AppState::new(BaseLayerType::Osm);
        run(&mut state, Action::Tick(1_700_000_000));
        assert_eq!(state.cache_age, None);

        run(&mut state, Action::MarkersChanged(data()));
        run(&mut state, Action::Tick(1_700_000_000 + 300));
        assert_eq!(state.cache_age.as_deref(), Some("5m 0s ago"));
        assert!(state.fresh);

        run(&mut state, Action::Tick(1_700_000_000 + 15 * 60));
        assert!(!state.fresh);
    }

    #[test]
    fn test_surface_ready_builds_pending_layers() {
        let mut state = AppState::new(BaseLayerType::Osm);
        assert!(run(&mut state, Action::SurfaceReady).is_empty());

        run(&mut state, Action::MarkersChanged(data()));
        run(&mut state, Action::LayersBuilt(false));
        assert_eq!(run(&mut state, Action::SurfaceReady), vec![Effect::RebuildLayers]);
    }

    #[test]
    fn test_ticker_fires_once_per_period() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(1), start);
        assert!(ticker.poll(start));
        assert!(!ticker.poll(start + Duration::from_millis(500)));
        assert!(ticker.poll(start + Duration::from_millis(1000)));
    }

    fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response =
                    format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/radar/api")
    }

    fn offline_app() -> App {
        let view = ViewConfig::default();
        let surface = TerminalSurface::new(BaseMap::new(), view.initial_center, view.initial_zoom);
        App::new(
            AppState::new(BaseLayerType::Osm),
            surface,
            PresentationAdapter::new(HeatOptions::default(), ClusterOptions::default()),
            RegionSet::builtin().unwrap(),
            view,
            RadarClient::new("http://127.0.0.1:9/radar/api", Duration::from_secs(1)).unwrap(),
            Arc::new(ConfiguredLocation::new(None)),
        )
    }

    #[test]
    fn test_zoom_stops_at_provider_max() {
        let mut app = offline_app();
        app.resize(Rect::new(1, 3, 80, 30));
        let max = BaseLayerType::Osm.provider().max_zoom;
        app.surface.set_view(Point::new(39.0, 35.0), max - 1);

        app.zoom_in();
        app.zoom_in();
        app.zoom_in_at(40, 18);
        assert!((app.surface.viewport().level() - max as f64).abs() < 1e-9);
    }

    #[test]
    fn test_failed_location_removes_marker() {
        let mut app = offline_app();
        app.resize(Rect::new(1, 3, 80, 30));
        app.dispatch(Action::LocationResolved(Point::new(39.93, 32.86)));
        assert_eq!(app.surface.layers().len(), 1);

        app.dispatch(Action::RequestLocation);
        app.dispatch(Action::LocationFailed(GeolocationError::Unavailable));
        assert!(app.surface.layers().is_empty());
    }

    #[test]
    fn test_server_error_ends_in_failed_state_without_layers() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error");
        let client = RadarClient::new(url, Duration::from_secs(5)).unwrap();
        let view = ViewConfig::default();
        let surface = TerminalSurface::new(BaseMap::new(), view.initial_center, view.initial_zoom);
        let mut app = App::new(
            AppState::new(BaseLayerType::Osm),
            surface,
            PresentationAdapter::new(HeatOptions::default(), ClusterOptions::default()),
            RegionSet::builtin().unwrap(),
            view,
            client,
            Arc::new(ConfiguredLocation::new(None)),
        );
        app.resize(Rect::new(1, 3, 80, 30));
        app.dispatch(Action::Start);

        let deadline = Instant::now() + Duration::from_secs(10);
        while app.pending() > 0 && Instant::now() < deadline {
            app.pump(Instant::now());
            thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(app.state.load, LoadState::Failed(_)));
        assert!(matches!(app.state.location, LocationStatus::Unavailable(_)));
        assert!(app.surface.layers().is_empty());
    }
}

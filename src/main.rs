use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use radar_map::api::RadarClient;
use radar_map::app::{Action, App, AppState, LoadState};
use radar_map::config::Config;
use radar_map::geolocation::{parse_location, ConfiguredLocation};
use radar_map::map::{BaseLayerType, BaseMap, PresentationAdapter, TerminalSurface};
use radar_map::radar::RegionSet;
use radar_map::{data, ui};
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about = "Traffic radar map of Türkiye in the terminal")]
struct Args {
    /// Load settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Radar API endpoint
    #[arg(long)]
    api_url: Option<String>,
    /// Region table replacing the built-in province list
    #[arg(long)]
    regions: Option<PathBuf>,
    /// Directory with Natural Earth GeoJSON files
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// osm, arcgis or google; anything else means osm
    #[arg(long)]
    base_layer: Option<String>,
    /// Report this position as the user's location, as LAT,LNG
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        if let Some(path) = self.regions {
            config.regions_path = Some(path);
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(name) = self.base_layer {
            config.base_layer = BaseLayerType::from_name(&name);
        }
        if let Some(location) = self.location {
            config.location = Some(parse_location(&location).context("parsing --location")?);
        }
        if let Some(path) = self.log_file {
            config.log_file = path;
        }
        Ok(config)
    }
}

/// Log to a file; stderr belongs to the terminal UI
fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    init_logging(&config)?;

    let regions = match &config.regions_path {
        Some(path) => RegionSet::load(path)?,
        None => RegionSet::builtin()?,
    };
    log::info!("{} regions loaded", regions.len());

    // Load all available GeoJSON data at different resolutions
    let mut base_map = BaseMap::new();
    data::load_base_map(&mut base_map, &config.data_dir);
    // Fall back to a simple outline if no data loaded
    if !base_map.has_data() {
        data::generate_fallback_outline(&mut base_map);
    }

    let client = RadarClient::new(
        config.api_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let surface = TerminalSurface::new(base_map, config.view.initial_center, config.view.initial_zoom);
    let mut app = App::new(
        AppState::new(config.base_layer),
        surface,
        PresentationAdapter::new(config.heat.clone(), config.cluster.clone()),
        regions,
        config.view.clone(),
        client,
        Arc::new(ConfiguredLocation::new(config.location)),
    );

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and picking
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.start_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc if app.state.popup.is_some() => app.dispatch(Action::ClosePopup),
        KeyCode::Char('q') | KeyCode::Esc => app.dispatch(Action::Quit),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('m') | KeyCode::Char('M') => app.dispatch(Action::CycleBaseLayer),
        KeyCode::Char(']') | KeyCode::Tab => app.dispatch(Action::NextRegion),
        KeyCode::Char('[') | KeyCode::BackTab => app.dispatch(Action::PrevRegion),
        KeyCode::Char('u') | KeyCode::Char('U') => app.dispatch(Action::CenterOnUser),
        KeyCode::Char('g') | KeyCode::Char('G') => app.dispatch(Action::RequestLocation),
        KeyCode::Char('r') | KeyCode::Char('R') if matches!(app.state.load, LoadState::Failed(_)) => {
            app.dispatch(Action::Retry)
        }
        _ => {}
    }
}

fn map_area(terminal: &DefaultTerminal) -> Result<Rect> {
    let size = terminal.size()?;
    Ok(ui::map_inner(Rect::new(0, 0, size.width, size.height)))
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    app.resize(map_area(terminal)?);
    app.dispatch(Action::Start);

    // Main loop
    loop {
        app.pump(Instant::now());

        // Draw
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key.code),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => {
                    app.resize(ui::map_inner(Rect::new(0, 0, width, height)));
                }
                _ => {}
            }
        }

        if app.state.should_quit {
            break;
        }
    }

    Ok(())
}

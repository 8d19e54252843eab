use crate::app::{App, AppState, LoadState, LocationStatus};
use crate::braille::{BrailleCanvas, BRAILLE_BLANK};
use crate::map::{ClusterSize, Lod, Popup, SurfaceFrame};
use crate::radar::{format_count, Selection, UNKNOWN};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Header, controls, map and status bar rows
fn split(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Stats
            Constraint::Length(1), // Controls
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Traffic Radars ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
}

/// Map drawing area inside its border for a full-screen `area`
pub fn map_inner(area: Rect) -> Rect {
    map_block().inner(split(area)[2])
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let [stats, controls, map, status] = split(frame.area());

    render_stats(frame, app, stats);
    render_controls(frame, app, controls);
    render_map(frame, app, map);
    render_status_bar(frame, app, status);

    if let Some(popup) = &app.state.popup {
        render_popup(frame, popup, map);
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(
        " Traffic radars ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    if let Some(data) = &state.data {
        spans.push(Span::styled("| Total: ", dim));
        spans.push(Span::styled(
            format_count(data.meta.count),
            Style::default().fg(Color::White),
        ));
        spans.push(Span::styled(" | Displayed: ", dim));
        spans.push(Span::styled(
            format_count(state.filtered.len()),
            Style::default().fg(Color::White),
        ));

        let age_color = if state.fresh { Color::Green } else { Color::Yellow };
        spans.push(Span::styled(" | Updated: ", dim));
        spans.push(Span::styled(
            state.cache_age.clone().unwrap_or_default(),
            Style::default().fg(age_color),
        ));
        if let Some(local) = data.meta.cached_at_local() {
            spans.push(Span::styled(format!(" ({local})"), dim));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn location_text(status: &LocationStatus) -> (String, Color) {
    match status {
        LocationStatus::Unknown => ("not requested - g: request location".to_string(), Color::DarkGray),
        LocationStatus::Requesting => ("locating...".to_string(), Color::DarkGray),
        LocationStatus::Known(p) => (format!("{:.4}, {:.4}", p.lat, p.lng), Color::Green),
        LocationStatus::Unavailable(_) => (
            "location permission not granted - g: request location".to_string(),
            Color::Yellow,
        ),
    }
}

/// Selector text with the number of radars behind the selection.
/// "all" shows the server's count.
fn city_label(state: &AppState) -> String {
    match &state.selection {
        Selection::All => {
            let total = state
                .data
                .as_ref()
                .map_or(state.groups.total(), |d| d.meta.count);
            format!("All cities ({})", format_count(total))
        }
        Selection::Region(name) if name == UNKNOWN => {
            format!("Unknown ({})", state.groups.count(UNKNOWN))
        }
        Selection::Region(name) => format!("{name} ({})", state.groups.count(name)),
    }
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let dim = Style::default().fg(Color::DarkGray);

    let city = city_label(state);
    let (location, location_color) = location_text(&state.location);

    let controls = Line::from(vec![
        Span::styled(" Map: ", dim),
        Span::styled(state.base_layer.to_string(), Style::default().fg(Color::Magenta)),
        Span::styled(" [m]", dim),
        Span::styled(" | City: ", dim),
        Span::styled(city, Style::default().fg(Color::Yellow)),
        Span::styled(" [ [ ] ]", dim),
        Span::styled(" | Unknown: ", dim),
        Span::styled(state.groups.count(UNKNOWN).to_string(), Style::default().fg(Color::Gray)),
        Span::styled(" | Location: ", dim),
        Span::styled(location, Style::default().fg(location_color)),
    ]);
    frame.render_widget(Paragraph::new(controls), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let notice = match &app.state.load {
        LoadState::Loading => Some(("Loading radar data...".to_string(), Color::Cyan)),
        LoadState::Failed(message) => Some((
            format!("Radar data could not be loaded: {message}\n\nr: retry"),
            Color::Red,
        )),
        LoadState::Ready if !app.state.layers_built => Some(("Map loading...".to_string(), Color::Cyan)),
        LoadState::Ready => None,
    };

    if let Some((text, color)) = notice {
        let rows = text.lines().count() as u16;
        let top = inner.y + inner.height.saturating_sub(rows) / 2;
        let area = Rect::new(inner.x, top, inner.width, rows.min(inner.height));
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    frame.render_widget(
        MapWidget {
            frame: app.surface.render(),
        },
        inner,
    );
}

/// Braille layers with heat cells underneath and cluster counts on top
struct MapWidget {
    frame: SurfaceFrame,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                if ch == BRAILLE_BLANK {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }

    fn render_legend(area: Rect, buf: &mut Buffer) {
        if area.height < 2 || area.width < 30 {
            return;
        }
        let y = area.y + area.height - 1;
        let mut x = area.x + 1;
        for (size, text) in [
            (ClusterSize::Small, " <20 "),
            (ClusterSize::Medium, " 20-100 "),
            (ClusterSize::Large, " >100 "),
        ] {
            buf[(x, y)].set_char('●').set_fg(rgb(size.color()));
            x += 1;
            for ch in text.chars() {
                buf[(x, y)].set_char(ch).set_fg(Color::Gray);
                x += 1;
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = &self.frame;

        // Heat cells as background colour
        for &(col, row, color) in &frame.heat {
            if col < area.width && row < area.height {
                buf[(area.x + col, area.y + row)].set_bg(rgb(color));
            }
        }

        if frame.base.is_some() {
            Self::render_layer(&frame.outlines, Color::Cyan, area, buf);
            Self::render_layer(&frame.borders, Color::DarkGray, area, buf);
        }
        Self::render_layer(&frame.markers, Color::Red, area, buf);
        for (size, canvas) in &frame.rings {
            Self::render_layer(canvas, rgb(size.color()), area, buf);
        }
        Self::render_layer(&frame.user, Color::Blue, area, buf);

        for glyph in &frame.glyphs {
            if glyph.row >= area.height {
                continue;
            }
            let y = area.y + glyph.row;
            let style = Style::default()
                .fg(Color::White)
                .bg(rgb(glyph.color))
                .add_modifier(Modifier::BOLD);
            for (i, ch) in glyph.text.chars().enumerate() {
                let col = glyph.col + i as u16;
                if col < area.width {
                    buf[(area.x + col, y)].set_char(ch).set_style(style);
                }
            }
        }

        Self::render_legend(area, buf);
    }
}

fn render_popup(frame: &mut Frame, popup: &Popup, map: Rect) {
    let mut lines: Vec<Line> = popup
        .rows
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
                Span::styled(value.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect();
    if let Some(link) = &popup.link {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            link.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }

    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .max(popup.title.chars().count() as u16 + 4)
        + 4;
    let height = lines.len() as u16 + 2;
    let area = Rect::new(
        map.x + map.width.saturating_sub(width) / 2,
        map.y + map.height.saturating_sub(height) / 2,
        width.min(map.width),
        height.min(map.height),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            format!(" {} ", popup.title),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(" Esc: close ").alignment(Alignment::Right));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let viewport = app.surface.viewport();
    let provider = app.state.base_layer.provider();
    let center = viewport.center();

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.1}/{}", viewport.level(), provider.max_zoom),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(Lod::from_level(viewport.level()).label(), Style::default().fg(Color::Magenta)),
        Span::styled(") | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(
                "{:.2}°{}, {:.2}°{}",
                center.lat.abs(),
                if center.lat >= 0.0 { "N" } else { "S" },
                center.lng.abs(),
                if center.lng >= 0.0 { "E" } else { "W" }
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(provider.attribution, Style::default().fg(Color::Gray)),
        Span::styled(
            " | hjkl:pan +/-:zoom m:map [/]:city u:me g:locate r:retry q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_inner_sits_inside_border() {
        let inner = map_inner(Rect::new(0, 0, 100, 40));
        // Two header rows plus the border
        assert_eq!(inner, Rect::new(1, 3, 98, 35));
    }

    #[test]
    fn test_city_label_counts() {
        use crate::geo::Point;
        use crate::map::BaseLayerType;
        use crate::radar::{group, Meta, RadarData, RadarMarker, RegionSet, Source};

        let regions = RegionSet::builtin().unwrap();
        let markers = vec![
            RadarMarker { name: "Kızılay".into(), lat: 39.92, lng: 32.85, source: Source::Official },
            RadarMarker { name: "Open sea".into(), lat: 34.0, lng: 20.0, source: Source::User },
        ];
        let mut state = AppState::new(BaseLayerType::Osm);
        state.groups = group(&markers, &regions);
        state.data = Some(RadarData {
            markers,
            meta: Meta { count: 1234, cache_at: 0 },
            center: Point::new(39.0, 35.0),
            zoom: 6,
        });

        assert_eq!(city_label(&state), "All cities (1.234)");
        state.selection = Selection::parse("unknown");
        assert_eq!(city_label(&state), "Unknown (1)");
        state.selection = Selection::parse("Ankara");
        assert_eq!(city_label(&state), "Ankara (1)");
    }

    #[test]
    fn test_location_text_for_denied() {
        let (text, color) = location_text(&LocationStatus::Unavailable("denied".into()));
        assert!(text.contains("permission not granted"));
        assert_eq!(color, Color::Yellow);
    }
}

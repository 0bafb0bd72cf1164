//! UI rendering and layout utilities

use crate::state::AppState;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Create a gradient bar showing an activity level
pub fn create_gradient_bar(width: usize, ratio: f64) -> Line<'static> {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let partial_fill = (ratio * width as f64) - filled as f64;
    let mut spans = Vec::with_capacity(width);

    for i in 0..width {
        let color = if i < width / 3 {
            Color::Green
        } else if i < 2 * width / 3 {
            Color::Yellow
        } else {
            Color::Red
        };

        let ch = if i < filled {
            '█'
        } else if i == filled && partial_fill > 0.0 {
            match (partial_fill * 8.0) as usize {
                0 | 1 => '░',
                2 | 3 => '▒',
                4 | 5 => '▓',
                _ => '█',
            }
        } else {
            '░'
        };
        spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
    }

    Line::from(spans)
}

fn on_off(flag: bool) -> Span<'static> {
    if flag {
        Span::styled("on", Style::default().fg(Color::Green))
    } else {
        Span::styled("off", Style::default().fg(Color::DarkGray))
    }
}

fn render_level(f: &mut Frame, area: Rect, title: &str, level: f32) {
    let bar_width = (area.width as usize).saturating_sub(crate::constants::ui::BAR_BORDER_WIDTH);
    let bar = create_gradient_bar(bar_width, level as f64);
    let gauge = Paragraph::new(bar).block(
        Block::default()
            .title(format!("{}: {:.2}", title, level))
            .borders(Borders::ALL),
    );
    f.render_widget(gauge, area);
}

/// Render the complete UI
pub fn render_ui(f: &mut Frame, state: &AppState) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(size);

    let device_block = Block::default().title("Device").borders(Borders::ALL);
    f.render_widget(
        Paragraph::new(state.device_name.as_str()).block(device_block),
        chunks[0],
    );

    let status_block = Block::default().title("Status").borders(Borders::ALL);
    f.render_widget(
        Paragraph::new(state.status.as_str()).block(status_block),
        chunks[1],
    );

    render_level(f, chunks[2], "Emission", state.levels.emission);
    render_level(f, chunks[3], "Speed", state.levels.speed);
    render_level(f, chunks[4], "Size", state.levels.size);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[5]);

    let p = &state.particle;
    let particle_text = vec![
        Line::from(format!("Emission rate:  {:.2}", p.emission_rate)),
        Line::from(format!("Start speed:    {:.2}", p.start_speed)),
        Line::from(format!("Start size:     {:.2}", p.start_size)),
        Line::from(format!("Noise strength: {:.2}", p.noise_strength)),
    ];
    f.render_widget(
        Paragraph::new(particle_text)
            .block(Block::default().title("Particles").borders(Borders::ALL)),
        columns[0],
    );

    let m = &state.material;
    let preset_text = vec![
        Line::from(vec![
            Span::raw("Preset: "),
            Span::styled(
                state.preset_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" [{}]", state.preset.current_index)),
        ]),
        Line::from(format!(
            "Master {:.2}  Emission {:.2}  Smoothing {:.2}",
            state.preset.master_gain, state.preset.emission_gain, state.preset.smoothing
        )),
        Line::from(vec![
            Span::raw("Safe mode: "),
            on_off(m.safe_mode),
            Span::raw("  Beat pulse: "),
            on_off(m.beat_pulse),
        ]),
        Line::from(format!(
            "_AL_Gain {:.2}  _AL_Smooth {:.2}",
            m.al_gain, m.al_smoothing
        )),
        Line::from(format!(
            "_EmissionGain {:.2}  _AL_Enable {:.0}",
            m.emission_gain, m.al_enable
        )),
    ];
    f.render_widget(
        Paragraph::new(preset_text).block(Block::default().title("Material").borders(Borders::ALL)),
        columns[1],
    );

    let help = Paragraph::new(
        "a audio  n/p preset  1-3 select  s safe  b beat  +/- gain  r reset  Esc quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[6]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_gradient_bar_fill() {
        assert_eq!(text(&create_gradient_bar(4, 0.0)), "░░░░");
        assert_eq!(text(&create_gradient_bar(4, 1.0)), "████");
        assert_eq!(text(&create_gradient_bar(4, 0.5)), "██░░");
    }

    #[test]
    fn test_gradient_bar_clamps_ratio() {
        assert_eq!(text(&create_gradient_bar(3, 4.0)), "███");
        assert_eq!(text(&create_gradient_bar(3, -1.0)), "░░░");
        assert!(create_gradient_bar(0, 0.5).spans.is_empty());
    }

    #[test]
    fn test_gradient_bar_partial_cell() {
        assert_eq!(text(&create_gradient_bar(8, 0.5625)), "████▓░░░");
        assert_eq!(text(&create_gradient_bar(8, 0.53125)), "████▒░░░");
    }
}

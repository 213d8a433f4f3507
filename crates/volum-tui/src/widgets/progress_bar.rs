//! Smooth Unicode bars for playback progress and volume.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::model::DisplayModel;
use crate::theme::{C_PROGRESS, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// `width` cells filled to `ratio` (clamped to 0.0..=1.0), in eighths.
pub fn bar(ratio: f64, width: usize) -> String {
    let eighths = (ratio.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut out = String::with_capacity(width * 3);
    for _ in 0..full_blocks {
        out.push('█');
    }
    if full_blocks < width {
        out.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            out.push(' ');
        }
    }
    out
}

/// Playback gauge: `<label> ████▌     50%`.
pub fn draw_playback_gauge(frame: &mut Frame, area: Rect, model: &DisplayModel) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let left_label = format!("{} ", model.playback_label);
    let right_label = format!(" {}%", model.elapsed_percent);
    let label_w = (left_label.chars().count() + right_label.chars().count()) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let spans = vec![
        Span::styled(left_label, Style::default().fg(C_SECONDARY)),
        Span::styled(bar(model.elapsed_ratio(), bar_w), Style::default().fg(C_PROGRESS)),
        Span::styled(right_label, Style::default().fg(C_SECONDARY)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

//! Footer: network summary on the left, volume bar on the right.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::model::DisplayModel;
use crate::theme::{style_secondary, C_SECONDARY, C_VOLUME};
use crate::widgets::progress_bar::bar;

const VOLUME_WIDTH: u16 = 14;

pub fn draw_footer(frame: &mut Frame, area: Rect, model: &DisplayModel) {
    if area.height == 0 {
        return;
    }
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(VOLUME_WIDTH)]).areas(area);

    frame.render_widget(
        Paragraph::new(Line::styled(model.network.as_str(), style_secondary())),
        left,
    );

    let label = format!(" {}", model.volume_label());
    let bar_w = (right.width as usize).saturating_sub(label.chars().count());
    let line = Line::from(vec![
        Span::styled(bar(model.volume_ratio(), bar_w), Style::default().fg(C_VOLUME)),
        Span::styled(label, Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), right);
}

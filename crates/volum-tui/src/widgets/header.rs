//! Header line: device label on the left, local time on the right.

use ratatui::{layout::Rect, text::Line, widgets::Paragraph, Frame};
use unicode_width::UnicodeWidthStr;

use crate::model::DisplayModel;
use crate::theme::style_header;

pub fn draw_header(frame: &mut Frame, area: Rect, model: &DisplayModel) {
    if area.height == 0 {
        return;
    }
    let text = header_line(&model.label, &model.clock, area.width as usize);
    frame.render_widget(
        Paragraph::new(Line::styled(text, style_header())),
        area,
    );
}

/// `label`, padding, `clock`, filling `width` columns. The clock wins when
/// both don't fit.
fn header_line(label: &str, clock: &str, width: usize) -> String {
    let label_w = label.width();
    let clock_w = clock.width();
    if label_w + clock_w + 1 > width {
        return clock.to_string();
    }
    format!("{}{}{}", label, " ".repeat(width - label_w - clock_w), clock)
}

//! Playback details (title, album, artist) and the bordered track details
//! list (bit depth, sample rate, track type, service).

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use volum_proto::state::PlaybackStatus;

use crate::model::DisplayModel;
use crate::theme::{
    style_border, style_default, style_muted, style_secondary, style_title, C_PAUSED, C_PLAYING,
};

fn status_style(status: PlaybackStatus) -> Style {
    match status {
        PlaybackStatus::Play => Style::default().fg(C_PLAYING),
        PlaybackStatus::Pause => Style::default().fg(C_PAUSED),
        _ => style_secondary(),
    }
}

pub fn draw_playback_details(frame: &mut Frame, area: Rect, model: &DisplayModel) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", model.status.icon()), status_style(model.status)),
            Span::styled(model.title.as_str(), style_title()),
        ]),
        Line::styled(model.album.as_str(), style_default()),
        Line::styled(model.artist.as_str(), style_secondary()),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

pub fn draw_track_details(frame: &mut Frame, area: Rect, model: &DisplayModel) {
    if area.height < 2 || area.width < 2 {
        return;
    }
    let items: Vec<ListItem> = model
        .track_rows()
        .into_iter()
        .map(|row| ListItem::new(Line::styled(row, style_default())))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_border())
        .title(Span::styled("track", style_muted()));
    frame.render_widget(List::new(items).block(block), area);
}

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Shared quit confirmation dialog widget
pub struct QuitConfirmation;

impl QuitConfirmation {
    /// Size of the confirmation dialog (width%, height%)
    const DIALOG_SIZE: (u16, u16) = (40, 20);

    /// Handle key events when quit confirmation is showing.
    /// Returns Some(true) if user confirmed quit, Some(false) if cancelled, None if key not handled.
    pub fn handle_key_event(key: KeyEvent) -> Option<bool> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => Some(true),
            KeyCode::Esc | KeyCode::Char('n') => Some(false),
            _ => None,
        }
    }

    /// Render the dialog, warning that `uploading` transfers will be aborted
    pub fn render(frame: &mut Frame, uploading: usize) {
        let area = Self::centered_rect(Self::DIALOG_SIZE.0, Self::DIALOG_SIZE.1, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(Self::make_dialog(uploading), area);
    }

    fn message(uploading: usize) -> String {
        match uploading {
            0 => "Are you sure you want to quit?".to_string(),
            1 => "1 upload is still in progress and will be aborted. Quit anyway?".to_string(),
            n => format!("{} uploads are still in progress and will be aborted. Quit anyway?", n),
        }
    }

    fn make_dialog(uploading: usize) -> Paragraph<'static> {
        Paragraph::new(Self::message(uploading))
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Confirm Quit ")
                    .title_bottom(
                        Line::from(vec![
                            Span::raw(" Press "),
                            Span::styled("Enter/y", Style::default().fg(Color::Green).bold()),
                            Span::raw(" to quit, "),
                            Span::styled("Esc/n", Style::default().fg(Color::Red).bold()),
                            Span::raw(" to cancel "),
                        ])
                        .alignment(Alignment::Center),
                    ),
            )
            .alignment(Alignment::Center)
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::vertical([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

        Layout::horizontal([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
    }
}

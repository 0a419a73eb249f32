use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::Flex;
use ratatui::{prelude::*, widgets::*};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::components::component::{Component, ComponentRender};
use crate::components::widgets::quit_confirmation::QuitConfirmation;
use crate::model::action::Action;
use crate::model::state::{ActivePage, State};
use crate::model::upload_record::{UploadRecord, UploadStatus};
use crate::services::picker::parse_paths;
use crate::utils::{format_progress_bar, truncate_name};

const NAME_WIDTH: usize = 28;
const PROGRESS_BAR_WIDTH: usize = 12;

#[derive(Clone)]
struct Props {
    records: Vec<UploadRecord>,
    extensions_label: String,
    max_size_mb: u64,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            records: state.tracker.records().to_vec(),
            extensions_label: state.accepted_extensions_label(),
            max_size_mb: state.max_size_mb,
        }
    }
}

/// Drop zone with the upload list underneath
pub struct UploaderPage {
    /// Action sender
    pub action_tx: UnboundedSender<Action>,
    /// State Mapped UploaderPage Props
    props: Props,
    table_state: TableState,
    input: Input,
    input_focused: bool,
    show_quit_confirmation: bool,
    throbber_state: ThrobberState,
}

impl Component for UploaderPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        UploaderPage {
            action_tx: action_tx.clone(),
            // set the props
            props: Props::from(state),
            table_state: TableState::default(),
            input: Input::default(),
            input_focused: false,
            show_quit_confirmation: false,
            throbber_state: ThrobberState::default(),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        let mut page = UploaderPage {
            props: Props::from(state),
            ..self
        };
        page.clamp_selection();
        page
    }

    fn name(&self) -> &str {
        "Uploader Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.show_quit_confirmation {
            match QuitConfirmation::handle_key_event(key) {
                Some(true) => {
                    let _ = self.action_tx.send(Action::Exit);
                }
                Some(false) => self.show_quit_confirmation = false,
                None => {}
            }
            return;
        }

        if self.input_focused {
            match key.code {
                KeyCode::Enter => self.submit_input(),
                KeyCode::Esc => {
                    self.input.reset();
                    self.input_focused = false;
                }
                _ => {
                    self.input.handle_event(&Event::Key(key));
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.navigate(false),
            KeyCode::Char('k') | KeyCode::Up => self.navigate(true),
            KeyCode::Char('i') | KeyCode::Char('/') => self.input_focused = true,
            KeyCode::Char('r') => {
                if let Some(record) = self.selected_record().filter(|r| r.can_retry()) {
                    let _ = self.action_tx.send(Action::Retry {
                        name: record.name().to_string(),
                    });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(record) = self.selected_record() {
                    let _ = self.action_tx.send(Action::Delete {
                        name: record.name().to_string(),
                    });
                }
            }
            KeyCode::Char('?') => {
                let _ = self.action_tx.send(Action::Navigate {
                    page: ActivePage::Help,
                });
            }
            KeyCode::Char('q') => self.show_quit_confirmation = true,
            _ => {}
        }
    }

    fn handle_paste_event(&mut self, text: String) {
        if self.show_quit_confirmation {
            return;
        }
        self.input.reset();
        self.input_focused = false;
        self.send_paths(&text);
    }

    fn on_tick(&mut self) {
        if self.props.records.iter().any(|r| r.status.is_uploading()) {
            self.throbber_state.calc_next();
        }
    }
}

impl UploaderPage {
    fn navigate(&mut self, up: bool) {
        if self.props.records.is_empty() {
            return;
        }
        let last = self.props.records.len() - 1;
        let i = match self.table_state.selected() {
            Some(i) if up => i.saturating_sub(1),
            Some(i) => i.saturating_add(1).min(last),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Keeps the selection on a row that still exists after the list changed
    fn clamp_selection(&mut self) {
        let len = self.props.records.len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn selected_record(&self) -> Option<&UploadRecord> {
        self.table_state
            .selected()
            .and_then(|i| self.props.records.get(i))
    }

    fn uploads_in_flight(&self) -> usize {
        self.props
            .records
            .iter()
            .filter(|r| !r.status.is_finished())
            .count()
    }

    fn submit_input(&mut self) {
        let value = self.input.value().to_string();
        self.input.reset();
        self.input_focused = false;
        self.send_paths(&value);
    }

    fn send_paths(&self, text: &str) {
        let paths = parse_paths(text);
        if !paths.is_empty() {
            let _ = self.action_tx.send(Action::Drop { paths });
        }
    }

    fn status_color(status: UploadStatus) -> Color {
        match status {
            UploadStatus::Uploading => Color::Yellow,
            UploadStatus::Completed => Color::Green,
            UploadStatus::Failed => Color::Red,
        }
    }

    fn status_icon(&self, status: UploadStatus) -> Span<'static> {
        match status {
            UploadStatus::Uploading => Throbber::default()
                .throbber_set(throbber_widgets_tui::BRAILLE_SIX)
                .to_symbol_span(&self.throbber_state)
                .fg(Color::Yellow),
            UploadStatus::Completed => Span::styled("✔", Style::default().fg(Color::Green)),
            UploadStatus::Failed => Span::styled("✖", Style::default().fg(Color::Red)),
        }
    }

    fn get_row(&self, record: &UploadRecord) -> Row {
        // name, size, status, percentage
        let columns = record.to_columns();
        let color = Self::status_color(record.status);
        let badge = Line::from(vec![
            self.status_icon(record.status),
            Span::raw(" "),
            Span::styled(columns[2].clone(), Style::default().fg(color)),
        ]);
        let progress = if record.status.is_uploading() {
            Line::from(vec![
                Span::styled(
                    format_progress_bar(record.progress, PROGRESS_BAR_WIDTH),
                    Style::default().fg(color),
                ),
                Span::raw(format!(" {:>4}", columns[3])),
            ])
        } else {
            Line::default()
        };
        let action = if record.can_retry() {
            Span::styled("↻ retry", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("✕ delete", Style::default().fg(Color::Gray))
        };
        Row::new(vec![
            Cell::from(truncate_name(&columns[0], NAME_WIDTH)),
            Cell::from(columns[1].clone()),
            Cell::from(badge),
            Cell::from(progress),
            Cell::from(action),
        ])
    }

    fn get_table(&self) -> Table {
        let focus_color = Color::Rgb(98, 114, 164);
        let header = Row::new(vec!["Name", "Size", "Status", "Progress", "Action"])
            .fg(focus_color)
            .bold()
            .underlined()
            .height(1)
            .bottom_margin(0);
        let rows = self.props.records.iter().map(|record| self.get_row(record));
        let widths = [
            Constraint::Length(NAME_WIDTH as u16),
            Constraint::Length(8),
            Constraint::Length(13),
            Constraint::Length(PROGRESS_BAR_WIDTH as u16 + 5),
            Constraint::Length(9),
        ];
        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("List")
                    .fg(Color::White),
            )
            .row_highlight_style(
                Style::default()
                    .fg(focus_color)
                    .bg(Color::White)
                    .add_modifier(Modifier::REVERSED),
            )
    }

    fn render_drop_zone(&self, frame: &mut Frame, area: Rect) {
        let border_color = if self.input_focused {
            Color::Yellow
        } else {
            Color::Rgb(98, 114, 164)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title("Upload Your Files");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .flex(Flex::Center)
        .split(inner);

        let hint = Paragraph::new(vec![
            Line::from("⇪ Drag & drop a file here").bold(),
            Line::from(vec![
                Span::raw("or press "),
                Span::styled("i", Style::default().fg(Color::Yellow).bold()),
                Span::raw(" to browse by path"),
            ]),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(hint, chunks[0]);

        let prompt_width = 2;
        let field = Rect {
            x: chunks[1].x + 1,
            width: chunks[1].width.saturating_sub(2),
            ..chunks[1]
        };
        let scroll = self
            .input
            .visual_scroll(field.width.saturating_sub(prompt_width) as usize);
        let input = Paragraph::new(Line::from(vec![
            Span::styled("› ", Style::default().fg(border_color)),
            Span::raw(self.input.value()),
        ]))
        .scroll((0, scroll as u16));
        frame.render_widget(input, field);
        if self.input_focused {
            let cursor = self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((field.x + prompt_width + cursor, field.y));
        }

        let constraints = Paragraph::new(vec![
            Line::from(format!("File must be {}", self.props.extensions_label)),
            Line::from(format!("Max → {}MB", self.props.max_size_mb)),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        frame.render_widget(constraints, chunks[3]);
    }

    fn footer() -> Paragraph<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).bold());
        Paragraph::new(Line::from(vec![
            key("i"),
            Span::raw(" path  "),
            key("r"),
            Span::raw(" retry  "),
            key("d"),
            Span::raw(" delete  "),
            key("?"),
            Span::raw(" help  "),
            key("q"),
            Span::raw(" quit"),
        ]))
    }
}

impl ComponentRender<()> for UploaderPage {
    fn render(&self, frame: &mut Frame, _props: ()) {
        if self.props.records.is_empty() {
            let chunks = Layout::vertical([Constraint::Min(8), Constraint::Length(1)])
                .split(frame.area());
            self.render_drop_zone(frame, chunks[0]);
            frame.render_widget(Self::footer(), chunks[1]);
        } else {
            let chunks = Layout::vertical([
                Constraint::Length(9),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.area());
            self.render_drop_zone(frame, chunks[0]);
            frame.render_stateful_widget(
                self.get_table(),
                chunks[1],
                &mut self.table_state.clone(),
            );
            frame.render_widget(Self::footer(), chunks[2]);
        }

        if self.show_quit_confirmation {
            QuitConfirmation::render(frame, self.uploads_in_flight());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file_handle::FileHandle;
    use crate::settings::upload_config::UploadConfig;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state_with_records() -> State {
        let mut state = State::new(&UploadConfig::default());
        let attempt = state.tracker.begin_upload(FileHandle::new("/tmp/done.png", 10));
        state.tracker.complete("done.png", attempt);
        state.tracker.record_failure(FileHandle::new("/tmp/broken.jpg", 10));
        state.tracker.begin_upload(FileHandle::new("/tmp/busy.png", 10));
        state
    }

    fn page(state: &State) -> (UploaderPage, UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        (UploaderPage::new(state, action_tx), action_rx)
    }

    fn render_to_string(page: &UploaderPage) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| page.render(frame, ())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_paste_sends_drop() {
        let (mut page, mut action_rx) = page(&State::default());

        page.handle_paste_event("/tmp/a.png '/tmp/my file.jpg'".to_string());

        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::Drop {
                paths: vec![PathBuf::from("/tmp/a.png"), PathBuf::from("/tmp/my file.jpg")]
            }
        );
    }

    #[test]
    fn test_typed_path_is_submitted_on_enter() {
        let (mut page, mut action_rx) = page(&State::default());

        page.handle_key_event(press(KeyCode::Char('i')));
        for c in "/tmp/q.png".chars() {
            page.handle_key_event(press(KeyCode::Char(c)));
        }
        assert!(!page.show_quit_confirmation);
        page.handle_key_event(press(KeyCode::Enter));

        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::Drop {
                paths: vec![PathBuf::from("/tmp/q.png")]
            }
        );
        assert!(!page.input_focused);
        assert_eq!(page.input.value(), "");
    }

    #[test]
    fn test_escape_discards_typed_input() {
        let (mut page, mut action_rx) = page(&State::default());

        page.handle_key_event(press(KeyCode::Char('/')));
        page.handle_key_event(press(KeyCode::Char('x')));
        page.handle_key_event(press(KeyCode::Esc));

        assert!(action_rx.try_recv().is_err());
        assert!(!page.input_focused);
        assert_eq!(page.input.value(), "");
    }

    #[test]
    fn test_retry_only_for_failed_record() {
        let (mut page, mut action_rx) = page(&state_with_records());
        assert_eq!(page.table_state.selected(), Some(0));

        // done.png is completed
        page.handle_key_event(press(KeyCode::Char('r')));
        assert!(action_rx.try_recv().is_err());

        page.handle_key_event(press(KeyCode::Char('j')));
        page.handle_key_event(press(KeyCode::Char('r')));
        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::Retry {
                name: "broken.jpg".into()
            }
        );
    }

    #[test]
    fn test_delete_selected_record() {
        let (mut page, mut action_rx) = page(&state_with_records());

        page.handle_key_event(press(KeyCode::Down));
        page.handle_key_event(press(KeyCode::Down));
        page.handle_key_event(press(KeyCode::Down));
        page.handle_key_event(press(KeyCode::Delete));

        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::Delete {
                name: "busy.png".into()
            }
        );
    }

    #[test]
    fn test_selection_follows_shrinking_list() {
        let mut state = state_with_records();
        let (mut page, _action_rx) = page(&state);
        page.handle_key_event(press(KeyCode::Char('j')));
        page.handle_key_event(press(KeyCode::Char('j')));
        assert_eq!(page.table_state.selected(), Some(2));

        state.tracker.remove("busy.png");
        let page = page.move_with_state(&state);
        assert_eq!(page.table_state.selected(), Some(1));

        let page = page.move_with_state(&State::default());
        assert_eq!(page.table_state.selected(), None);
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let (mut page, mut action_rx) = page(&State::default());

        page.handle_key_event(press(KeyCode::Char('q')));
        assert!(action_rx.try_recv().is_err());
        page.handle_key_event(press(KeyCode::Char('n')));
        assert!(!page.show_quit_confirmation);

        page.handle_key_event(press(KeyCode::Char('q')));
        page.handle_key_event(press(KeyCode::Char('y')));
        assert_eq!(action_rx.try_recv().unwrap(), Action::Exit);
    }

    #[test]
    fn test_quit_dialog_counts_unfinished_uploads() {
        let mut state = state_with_records();
        let (page, _action_rx) = page(&state);
        assert_eq!(page.uploads_in_flight(), 1);

        let attempt = state.tracker.get("busy.png").unwrap().attempt;
        state.tracker.fail("busy.png", attempt);
        let page = page.move_with_state(&state);
        assert_eq!(page.uploads_in_flight(), 0);
    }

    #[test]
    fn test_help_key_navigates() {
        let (mut page, mut action_rx) = page(&State::default());
        page.handle_key_event(press(KeyCode::Char('?')));
        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::Navigate {
                page: ActivePage::Help
            }
        );
    }

    #[test]
    fn test_empty_list_is_hidden() {
        let (page, _action_rx) = page(&State::new(&UploadConfig::default()));
        let screen = render_to_string(&page);

        assert!(screen.contains("Drag & drop a file here"));
        assert!(screen.contains("File must be .PNG or .JPG"));
        assert!(screen.contains("Max → 2MB"));
        assert!(!screen.contains("Progress"));
    }

    #[test]
    fn test_rows_show_badges_and_actions() {
        let (page, _action_rx) = page(&state_with_records());
        let screen = render_to_string(&page);

        assert!(screen.contains("Completed"));
        assert!(screen.contains("Failed"));
        assert!(screen.contains("Uploading"));
        assert!(screen.contains("↻ retry"));
        assert!(screen.contains("✕ delete"));
        assert!(screen.contains("0.0MB"));
        // only the uploading row carries a bar
        assert!(screen.contains("░░░░░░░░░░░░   0%"));
        assert!(!screen.contains("100%"));
    }
}

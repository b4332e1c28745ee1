use kbview::i18n::{Translator, keys};
use kbview::view::{ResultCard, ViewStatus};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, InputMode};

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Draw the UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query field
            Constraint::Min(1),    // Results
            Constraint::Length(1), // Key hints
        ])
        .split(f.area());

    render_input(f, app, chunks[0]);
    render_results(f, app, chunks[1]);
    render_hints(f, app, chunks[2]);
    render_toasts(f, app);
}

/// Lines for one result card: title with distance, then the body
fn card_lines(card: &ResultCard, distance_label: &str) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            card.title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}: {}", distance_label, card.distance),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    lines.extend(card.body.lines().map(|l| Line::from(l.to_string())));
    lines
}

/// Render the result cards, or the loading / empty placeholder
fn render_results(f: &mut Frame, app: &mut App, area: Rect) {
    let results_block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!("{} · {}", app.catalog.translate(keys::RESULTS), app.view.kb_id()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));

    let placeholder = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    match app.view.status() {
        ViewStatus::Loading => {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} {}",
                    SPINNER_FRAMES[app.spinner_frame],
                    app.catalog.translate(keys::LOADING)
                ),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            )));
        }
        ViewStatus::Empty => {
            lines.push(Line::from(Span::styled(
                app.catalog.translate(keys::NO_RESULTS),
                placeholder,
            )));
        }
        ViewStatus::Showing(_) => {
            let distance_label = app.catalog.translate(keys::DISTANCE);
            let cards = app.view.cards();
            for (i, card) in cards.iter().enumerate() {
                if i > 0 {
                    lines.push(Line::from(Span::styled(
                        "─".repeat(area.width.saturating_sub(2) as usize),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.extend(card_lines(card, &distance_label));
            }
        }
    }

    // Long bodies wrap, so clamp against rows after wrapping
    let inner_area = results_block.inner(area);
    let results = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total_height = results.line_count(inner_area.width);
    let max_scroll = total_height.saturating_sub(inner_area.height as usize);
    app.scroll_position = app.scroll_position.min(max_scroll);

    let results = results
        .block(results_block)
        .scroll((app.scroll_position as u16, 0));

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));

    let mut scrollbar_state = ScrollbarState::default()
        .content_length(max_scroll)
        .position(app.scroll_position);

    f.render_widget(results, area);
    if max_scroll > 0 {
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// Render the query field
fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let title_style = if app.view.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let (title_key, placeholder_key) = match app.mode {
        InputMode::Query => (keys::QUERY, keys::QUERY_PLACEHOLDER),
        InputMode::KnowledgeBase => (keys::KNOWLEDGE_BASE, keys::KNOWLEDGE_BASE),
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(app.catalog.translate(title_key), title_style));

    let inner_area = input_block.inner(area);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            app.catalog.translate(placeholder_key),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(app.input.as_str())
    };
    let input = input.block(input_block);

    f.render_widget(input, area);

    let before_cursor: String = app.input.chars().take(app.cursor_position).collect();
    let cursor_x = (before_cursor.width() as u16).min(inner_area.width.saturating_sub(1));
    f.set_cursor_position((inner_area.x + cursor_x, inner_area.y));
}

/// Render the key hint line
fn render_hints(f: &mut Frame, app: &App, area: Rect) {
    let hints_key = match app.mode {
        InputMode::Query => keys::KEY_HINTS,
        InputMode::KnowledgeBase => keys::SWITCH_HINTS,
    };
    let hints = Paragraph::new(Span::styled(
        app.catalog.translate(hints_key),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(hints, area);
}

/// Render error toasts stacked in the top-right corner
fn render_toasts(f: &mut Frame, app: &App) {
    let size = f.area();
    let mut y = 1;

    for toast in app.toasts.visible() {
        let width = (toast.message.width() as u16 + 4).min(size.width.saturating_sub(2));
        let height = 3;
        if y + height > size.height {
            break;
        }
        let x = size.width.saturating_sub(width + 1);
        let popup_area = Rect::new(x, y, width, height);

        f.render_widget(Clear, popup_area);
        let popup = Paragraph::new(toast.message.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .style(Style::default().bg(Color::Black)),
            );
        f.render_widget(popup, popup_area);

        y += height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::event::EventHandler;
    use kbview::i18n::Catalog;
    use kbview::knowledge::{ContentItem, KnowledgeBaseFile, ResultMetadata, RetrieveResult};
    use kbview::notify::Notifier;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        App::with_handler("kb-1", Catalog::default(), EventHandler::detached())
    }

    #[test]
    fn test_empty_state_shows_placeholders() {
        let text = screen(&mut app());
        assert!(text.contains("Enter a query"));
        assert!(text.contains("No results"));
    }

    #[test]
    fn test_result_card_is_rendered() {
        let mut app = app();
        let files = app.view.begin_load_files();
        app.view
            .finish_load_files(files.ticket, Ok(vec![KnowledgeBaseFile::new("f1", "policy.pdf")]));
        app.view.set_query("refund policy");
        let request = app.view.begin_retrieve().unwrap();
        let catalog = app.catalog;
        app.view.finish_retrieve(
            request.ticket,
            Ok(vec![RetrieveResult {
                id: "r1".to_string(),
                distance: 0.1234,
                metadata: ResultMetadata {
                    file_id: Some("f1".to_string()),
                    ..ResultMetadata::default()
                },
                content: Some(vec![ContentItem::text("Refunds within 30 days.")]),
            }]),
            &catalog,
            &mut app.toasts,
        );

        let text = screen(&mut app);
        assert!(text.contains("policy.pdf  Distance: 0.1234"));
        assert!(text.contains("Refunds within 30 days."));
        assert!(!text.contains("No results"));
    }

    #[test]
    fn test_loading_hides_placeholder() {
        let mut app = app();
        app.view.set_query("q");
        app.view.begin_retrieve().unwrap();

        let text = screen(&mut app);
        assert!(text.contains("Loading..."));
        assert!(!text.contains("No results"));
    }

    #[test]
    fn test_kb_prompt_replaces_query_field() {
        let mut app = app();
        app.mode = InputMode::KnowledgeBase;
        app.input = "kb-2".to_string();

        let text = screen(&mut app);
        assert!(text.contains("Knowledge base"));
        assert!(text.contains("kb-2"));
        assert!(text.contains("Enter: open  Esc: cancel"));
    }

    #[test]
    fn test_toast_is_rendered() {
        let mut app = app();
        app.toasts.notify_error("Failed to retrieve");
        assert!(screen(&mut app).contains("Failed to retrieve"));
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let mut app = app();
        app.scroll_by(100);
        screen(&mut app);
        assert_eq!(app.scroll_position, 0);
    }

    #[test]
    fn test_scroll_reaches_end_of_wrapped_body() {
        let mut app = app();
        app.view.set_query("q");
        let request = app.view.begin_retrieve().unwrap();
        let catalog = app.catalog;
        app.view.finish_retrieve(
            request.ticket,
            Ok(vec![RetrieveResult {
                id: "r1".to_string(),
                distance: 0.5,
                metadata: ResultMetadata::default(),
                content: Some(vec![ContentItem::text(format!("{}TAILMARKER", "word ".repeat(200)))]),
            }]),
            &catalog,
            &mut app.toasts,
        );

        assert!(!screen(&mut app).contains("TAILMARKER"));

        let mut seen = false;
        for _ in 0..50 {
            app.scroll_by(5);
            if screen(&mut app).contains("TAILMARKER") {
                seen = true;
                break;
            }
        }
        assert!(seen);
        assert!(app.scroll_position > 0);

        // Scrolling past the end stays on the last page
        app.scroll_by(1000);
        assert!(screen(&mut app).contains("TAILMARKER"));
    }
}

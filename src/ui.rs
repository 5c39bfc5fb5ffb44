use chat_assistant::{ChatRole, Severity};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;

const TOAST_WIDTH: u16 = 48;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.toast.is_some() {
        render_toast(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chat Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", app.backend_label), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn role_label(role: ChatRole) -> Span<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You:", Color::Cyan),
        ChatRole::Assistant => ("AI:", Color::Yellow),
        ChatRole::System => ("System:", Color::Magenta),
    };
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// The chat pane's contents, wrapped the way they are drawn. Also used to
/// measure the rendered height when scrolling.
pub fn chat_paragraph(app: &App) -> Paragraph<'static> {
    let pending = app.chat.is_pending();
    let text = if app.chat.messages().is_empty() && !pending {
        Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Welcome to Chat Assistant",
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::from(Span::styled(
                "Type a message below and press Enter",
                Style::default().fg(Color::DarkGray),
            ))
            .centered(),
        ])
    } else {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for msg in app.chat.messages() {
            lines.push(Line::from(role_label(msg.role)));
            // Content is shown verbatim, one Line per source line
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if pending {
            lines.push(Line::from(role_label(ChatRole::Assistant)));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(text).wrap(Wrap { trim: false })
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Conversation ({}) ", app.chat.messages().len()));

    let chat = chat_paragraph(app).block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.chat.is_pending();
    let border_color = if pending { Color::DarkGray } else { Color::Yellow };
    let title = if pending {
        " Waiting for reply... "
    } else {
        " Message "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        visible_input(app.chat.draft(), app.chat.cursor(), inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

/// Slice of the draft that fits in `width` terminal columns with the cursor
/// kept inside, plus the cursor's column within that slice.
fn visible_input(draft: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = draft.chars().collect();
    let cursor = cursor.min(chars.len());
    let char_width = |c: char| c.width().unwrap_or(0);

    // Drop leading chars until the cursor column is inside the box
    let mut start = 0;
    let mut cursor_col: usize = chars[..cursor].iter().copied().map(char_width).sum();
    while width > 0 && cursor_col >= width && start < cursor {
        cursor_col -= char_width(chars[start]);
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .copied()
        .take_while(|&c| {
            used += char_width(c);
            used <= width
        })
        .collect();

    (visible, cursor_col as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.chat.is_pending() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let send_label = if app.chat.can_submit() { " send " } else { " (send) " };
    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(send_label, label_style),
        Span::styled(" Ctrl+L ", key_style),
        Span::styled(" clear chat ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_toast(app: &App, frame: &mut Frame, area: Rect) {
    let Some(toast) = app.toast.as_ref() else {
        return;
    };
    let notification = &toast.notification;

    let width = TOAST_WIDTH.min(area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let text_lines = notification.description.width().div_ceil(inner_width).max(1);
    let height = (text_lines as u16 + 2).min(area.height);

    // Top-right corner, just under the header
    let toast_area = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: height.min(area.height.saturating_sub(1)),
    };

    let color = match notification.severity {
        Severity::Error => Color::Red,
        Severity::Info => Color::Blue,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", notification.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let body = Paragraph::new(notification.description.as_str())
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, toast_area);
    frame.render_widget(body, toast_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Toast;
    use chat_assistant::{ChatMessage, Notification, SimulatedClient};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn draw(app: &mut App) -> String {
        draw_sized(app, 80, 24)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn test_app() -> App {
        App::new(Arc::new(SimulatedClient::new(Duration::ZERO)), "http://localhost:8000")
    }

    #[test]
    fn test_empty_chat_shows_welcome() {
        let mut app = test_app();
        let screen = draw(&mut app);
        assert!(screen.contains("Welcome to Chat Assistant"));
        assert!(screen.contains("http://localhost:8000"));
        assert!(!screen.contains("Thinking"));
    }

    #[test]
    fn test_pending_chat_shows_turns_and_thinking() {
        let mut app = test_app();
        app.chat.set_draft("Hello");
        app.chat.submit();

        let screen = draw(&mut app);
        assert!(screen.contains("You:"));
        assert!(screen.contains("Hello"));
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("WAITING"));
        assert!(!screen.contains("Welcome"));
    }

    #[test]
    fn test_reply_is_rendered_after_question() {
        let mut app = test_app();
        app.chat.set_draft("Hello");
        let request = app.chat.submit().unwrap();
        app.chat.complete(request.ticket, Ok("Hi there".to_string()));
        assert_eq!(app.chat.messages()[1], ChatMessage::assistant("Hi there"));

        let screen = draw(&mut app);
        let question = screen.find("Hello").unwrap();
        let answer = screen.find("Hi there").unwrap();
        assert!(question < answer);
        assert!(screen.contains("AI:"));
    }

    #[test]
    fn test_toast_is_drawn() {
        let mut app = test_app();
        app.toast = Some(Toast {
            notification: Notification::error("Error", "Failed to send message."),
            ticks_left: 4,
        });
        let screen = draw(&mut app);
        assert!(screen.contains("Error"));
        assert!(screen.contains("Failed to send message."));
    }

    #[test]
    fn test_scroll_to_bottom_reaches_end_of_word_wrapped_reply() {
        let mut app = test_app();
        // First frame records the chat pane size
        draw_sized(&mut app, 20, 10);

        app.chat.set_draft("q");
        let request = app.chat.submit().unwrap();
        let reply = "aaaaaaaaaaaa bbbbbbbbbbbb cccccccccccc dddddddddddd eeeeeeeeeeee ENDMARK";
        app.chat.complete(request.ticket, Ok(reply.to_string()));
        app.scroll_chat_to_bottom();

        let screen = draw_sized(&mut app, 20, 10);
        assert!(screen.contains("ENDMARK"));
    }

    #[test]
    fn test_visible_input_fits_plain_text() {
        assert_eq!(visible_input("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(visible_input("abcdefghij", 10, 5), ("ghij".to_string(), 4));
        assert_eq!(visible_input("abcdefghij", 0, 5), ("abcde".to_string(), 0));
    }

    #[test]
    fn test_visible_input_counts_wide_chars_as_two_columns() {
        // Each CJK char takes two columns; only two fit before the cursor
        assert_eq!(visible_input("你好世界", 4, 5), ("世界".to_string(), 4));
        assert_eq!(visible_input("你好世界", 0, 5), ("你好".to_string(), 0));
        assert_eq!(visible_input("a你b", 3, 10), ("a你b".to_string(), 4));
    }
}

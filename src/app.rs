use std::sync::Arc;

use chat_assistant::{
    ChatController, CompletionClient, CompletionError, CompletionOutcome, Notification,
    RequestTicket,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;

use crate::ui;

/// How many ticks a toast stays on screen
pub const TOAST_TICKS: u8 = 16;

/// A notification currently shown in the corner of the screen
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub ticks_left: u8,
}

/// The spawned request and the ticket its result must be filed under
pub struct InFlight {
    pub ticket: RequestTicket,
    pub task: JoinHandle<Result<String, CompletionError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub chat: ChatController,

    // Backend
    pub client: Arc<dyn CompletionClient>,
    pub backend_label: String,
    pub query_task: Option<InFlight>,

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub toast: Option<Toast>,
}

impl App {
    pub fn new(client: Arc<dyn CompletionClient>, backend_label: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            chat: ChatController::new(),

            client,
            backend_label: backend_label.into(),
            query_task: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            animation_frame: 0,

            toast: None,
        }
    }

    /// Send the draft if the controller accepts it
    pub fn submit(&mut self) {
        let Some(request) = self.chat.submit() else {
            return;
        };

        let client = self.client.clone();
        let messages = request.messages;
        self.query_task = Some(InFlight {
            ticket: request.ticket,
            task: tokio::spawn(async move { client.complete(&messages).await }),
        });

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();
    }

    /// Collect the reply once the background request has finished
    pub async fn poll_completion(&mut self) -> Option<CompletionOutcome> {
        if !self.query_task.as_ref()?.task.is_finished() {
            return None;
        }
        let in_flight = self.query_task.take()?;

        let result = match in_flight.task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "request task did not finish cleanly");
                Err(CompletionError::network(format!("request task failed: {e}")))
            }
        };

        let outcome = self.chat.complete(in_flight.ticket, result);
        if outcome == CompletionOutcome::Appended {
            self.scroll_chat_to_bottom();
        }
        self.refresh_toast();
        Some(outcome)
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear_chat();
        self.chat_scroll = 0;
        self.refresh_toast();
    }

    /// Show the newest queued notification
    pub fn refresh_toast(&mut self) {
        if let Some(notification) = self.chat.take_notifications().pop() {
            self.toast = Some(Toast {
                notification,
                ticks_left: TOAST_TICKS,
            });
        }
    }

    /// Advance animations and expire the toast (called by Tick event)
    pub fn tick(&mut self) {
        if self.chat.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some(toast) = self.toast.as_mut() {
            toast.ticks_left = toast.ticks_left.saturating_sub(1);
            if toast.ticks_left == 0 {
                self.toast = None;
            }
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.chat_line_count().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.chat_line_count();
        let visible_height = self.visible_height();

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered line count of the chat pane, measured with the same
    /// wrapping the pane is drawn with
    fn chat_line_count(&self) -> u16 {
        // Default to 50 columns until the first frame has been drawn
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let lines = ui::chat_paragraph(self).line_count(wrap_width);
        u16::try_from(lines).unwrap_or(u16::MAX)
    }
}

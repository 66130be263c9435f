use crate::core::{Action, Digest, ItemId};
use crate::tui::components::{ContentViewer, ItemList};
use crate::tui::events::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// The viewer shows the synthesis.
    Synthesis,
    /// The viewer shows the model's reply to one injected item.
    ItemReply { sequence: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Items,
    Viewer,
}

pub struct App {
    pub state: AppState,
    pub focus: Focus,
    pub should_quit: bool,

    pub topic: String,
    pub recommendation: Option<Action>,
    pub discovered: usize,
    pub skipped: Vec<ItemId>,
    pub failed: Vec<ItemId>,

    synthesis: String,
    replies: Vec<(usize, String)>,

    pub item_list: ItemList,
    pub viewer: ContentViewer,
    pub viewer_height: u16,
}

impl App {
    pub fn new(digest: &Digest) -> Self {
        Self {
            state: AppState::Synthesis,
            focus: Focus::Viewer,
            should_quit: false,

            topic: digest.topic.clone(),
            recommendation: digest.recommendation,
            discovered: digest.discovered.len(),
            skipped: digest.skipped.clone(),
            failed: digest.failed.clone(),

            synthesis: digest.synthesis.clone(),
            replies: digest
                .items
                .iter()
                .map(|item| (item.sequence, item.reply.clone()))
                .collect(),

            item_list: ItemList::new(digest.verdicts.clone()),
            viewer: ContentViewer::new(&digest.synthesis, "Synthesis"),
            viewer_height: 0,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Tick => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Esc => match self.state {
                AppState::ItemReply { .. } => self.show_synthesis(),
                AppState::Synthesis => self.should_quit = true,
            },
            KeyCode::Enter if self.focus == Focus::Items => self.open_selected(),
            _ => {
                let height = self.viewer_height as usize;
                let handled = match self.focus {
                    Focus::Items => self.item_list.handle_key(key),
                    Focus::Viewer => self.viewer.handle_key(key, height),
                };
                if !handled {
                    // PageUp/PageDown always scroll the text
                    self.viewer.handle_key(key, height);
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let height = self.viewer_height as usize;
        match self.focus {
            Focus::Items => {
                self.item_list.handle_mouse(mouse);
            }
            Focus::Viewer => match mouse.kind {
                MouseEventKind::ScrollUp => self.viewer.scroll_up(3),
                MouseEventKind::ScrollDown => self.viewer.scroll_down(3, height),
                _ => {}
            },
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Items => Focus::Viewer,
            Focus::Viewer => Focus::Items,
        };
    }

    fn open_selected(&mut self) {
        let Some(selected) = self.item_list.get_selected() else {
            return;
        };
        let sequence = selected.sequence;
        let title = format!("Video {sequence} ({})", selected.item_id);

        if let Some((_, reply)) = self.replies.iter().find(|(seq, _)| *seq == sequence) {
            self.viewer.set_content(reply, title);
            self.state = AppState::ItemReply { sequence };
            self.focus = Focus::Viewer;
        }
    }

    fn show_synthesis(&mut self) {
        self.viewer.set_content(&self.synthesis, "Synthesis");
        self.state = AppState::Synthesis;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InjectedItem, ItemVerdict};
    use chrono::Utc;

    fn digest() -> Digest {
        let a = ItemId::parse("aaa").expect("id");
        let b = ItemId::parse("bbb").expect("id");
        Digest {
            topic: "xrp".into(),
            generated_at: Utc::now(),
            discovered: vec![a.clone(), b.clone()],
            skipped: Vec::new(),
            failed: Vec::new(),
            items: vec![
                InjectedItem {
                    sequence: 1,
                    item_id: a.clone(),
                    reply: "first reply".into(),
                },
                InjectedItem {
                    sequence: 2,
                    item_id: b.clone(),
                    reply: "second reply".into(),
                },
            ],
            synthesis: "Summary.\n\nVideo 1 - Buy\nVideo 2 - Hold\n\nHold".into(),
            verdicts: vec![
                ItemVerdict {
                    sequence: 1,
                    item_id: a,
                    action: Some(Action::Buy),
                },
                ItemVerdict {
                    sequence: 2,
                    item_id: b,
                    action: Some(Action::Hold),
                },
            ],
            recommendation: Some(Action::Hold),
            conversation: Vec::new(),
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn opens_an_item_reply_and_returns() {
        let mut app = App::new(&digest());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Items);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::ItemReply { sequence: 2 });
        assert_eq!(app.viewer.title, "Video 2 (bbb)");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Synthesis);
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn carries_failed_items_for_the_title() {
        let mut digest = digest();
        digest.failed = vec![ItemId::parse("ccc").expect("id")];
        let app = App::new(&digest);
        assert_eq!(app.failed, digest.failed);
        assert!(app.skipped.is_empty());
    }

    #[test]
    fn q_quits_from_anywhere() {
        let mut app = App::new(&digest());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}

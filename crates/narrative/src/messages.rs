use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub user: Option<String>,
    pub ai: Option<String>,
}

/// Assistant conversation shown beside the map, with a browsing cursor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageLog {
    messages: Vec<Message>,
    cursor: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and moves the cursor to it.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.cursor = self.messages.len() - 1;
    }

    pub fn user(&mut self, text: impl Into<String>) {
        self.push(Message {
            user: Some(text.into()),
            ai: None,
        });
    }

    /// Answers the latest user message, or starts a new entry when it is
    /// already answered.
    pub fn ai(&mut self, text: impl Into<String>) {
        match self.messages.last_mut() {
            Some(last) if last.ai.is_none() => {
                last.ai = Some(text.into());
                self.cursor = self.messages.len() - 1;
            }
            _ => self.push(Message {
                user: None,
                ai: Some(text.into()),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn current(&self) -> Option<&Message> {
        self.messages.get(self.cursor)
    }

    /// 1-based position of the cursor, as shown in the pager.
    pub fn position(&self) -> (usize, usize) {
        if self.messages.is_empty() {
            (0, 0)
        } else {
            (self.cursor + 1, self.messages.len())
        }
    }

    pub fn prev(&mut self) -> Option<&Message> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    pub fn next(&mut self) -> Option<&Message> {
        if self.cursor + 1 < self.messages.len() {
            self.cursor += 1;
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::MessageLog;

    #[test]
    fn cursor_is_clamped() {
        let mut log = MessageLog::new();
        assert!(log.prev().is_none());
        assert_eq!(log.position(), (0, 0));

        log.user("retry analysis for cluster1");
        log.ai("Named 5 clusters.");
        log.user("retry analysis for cluster2");
        assert_eq!(log.len(), 2);
        assert_eq!(log.position(), (2, 2));

        assert!(log.next().unwrap().ai.is_none());
        assert_eq!(log.position(), (2, 2));
        let first = log.prev().unwrap();
        assert_eq!(first.ai.as_deref(), Some("Named 5 clusters."));
        log.prev();
        assert_eq!(log.position(), (1, 2));
    }

    #[test]
    fn ai_without_question_starts_new_entry() {
        let mut log = MessageLog::new();
        log.ai("Welcome.");
        log.ai("Pick your priorities.");
        assert_eq!(log.len(), 2);
        assert_eq!(log.current().unwrap().user, None);
    }
}

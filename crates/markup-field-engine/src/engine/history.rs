use std::collections::VecDeque;

/// Number of undo steps an editing surface keeps.
pub const HISTORY_LIMIT: usize = 50;

/// Native undo of an editing surface, as markup snapshots of its edit root.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<String>,
    redo: Vec<String>,
}

impl History {
    /// Records the content as it was before a change.
    pub fn record(&mut self, before: String) {
        if self.undo.back() == Some(&before) {
            return;
        }
        self.undo.push_back(before);
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Steps back from `current`, returning the content to show.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: String) -> Option<String> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn undo_redo_walk() {
        let mut history = History::default();
        history.record("a".into());
        history.record("ab".into());

        assert_eq!(history.undo("abc".into()).as_deref(), Some("ab"));
        assert_eq!(history.undo("ab".into()).as_deref(), Some("a"));
        assert_eq!(history.undo("a".into()), None);
        assert_eq!(history.redo("a".into()).as_deref(), Some("ab"));
        assert_eq!(history.redo("ab".into()).as_deref(), Some("abc"));
        assert!(!history.can_redo());
    }

    #[test]
    fn recording_clears_redo_and_is_bounded() {
        let mut history = History::default();
        for i in 0..HISTORY_LIMIT + 10 {
            history.record(i.to_string());
        }
        history.undo("now".into());
        assert!(history.can_redo());

        history.record("fresh".into());

        assert!(!history.can_redo());
        let mut steps = 0;
        let mut current = "x".to_string();
        while let Some(prev) = history.undo(current) {
            current = prev;
            steps += 1;
        }
        assert_eq!(steps, HISTORY_LIMIT);
    }
}

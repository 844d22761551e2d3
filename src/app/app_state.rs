use crate::models::Conversation;

/// What the front end last heard from the action service.
#[derive(Debug, Default)]
pub(crate) struct AppState {
    pub conversations: Vec<Conversation>,
    pub current: Option<Conversation>,
    /// Messages of `current` already written out.
    pub printed: usize,
    pub loading: bool,
    pub error: Option<String>,

    pub confirming_clear: bool,
    pub show_next_list: bool,
    pub quitting: bool,
}

impl AppState {
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id())
    }

    /// Resolves a 1-based position in the last listing, an exact id or an
    /// unambiguous id prefix.
    pub fn resolve(&self, target: &str) -> Option<&Conversation> {
        if let Ok(n) = target.parse::<usize>() {
            if let Some(convo) = n.checked_sub(1).and_then(|i| self.conversations.get(i)) {
                return Some(convo);
            }
        }

        if let Some(convo) = self.conversations.iter().find(|c| c.id() == target) {
            return Some(convo);
        }

        let mut matches = self.conversations.iter().filter(|c| c.id().starts_with(target));
        match (matches.next(), matches.next()) {
            (Some(convo), None) => Some(convo),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState {
            conversations: vec![
                Conversation::new().with_id("3f2a-aaaa"),
                Conversation::new().with_id("3f2a-bbbb"),
                Conversation::new().with_id("9c01-cccc"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve() {
        let state = state();
        let id = |target: &str| state.resolve(target).map(|c| c.id().to_string());

        assert_eq!(id("1").as_deref(), Some("3f2a-aaaa"));
        assert_eq!(id("3").as_deref(), Some("9c01-cccc"));
        assert_eq!(id("3f2a-bbbb").as_deref(), Some("3f2a-bbbb"));
        assert_eq!(id("9c").as_deref(), Some("9c01-cccc"));
        assert!(id("3f2a").is_none());
        assert!(id("0").is_none());
        assert!(id("4").is_none());
        assert!(id("zzz").is_none());
    }
}

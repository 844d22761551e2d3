/// Intents accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit(String),
    Retry,
    /// Clear the active conversation. Only sent once the user confirmed.
    Clear,
    NewConversation,
    Select(String),         // Conversation ID
    Rename(String, String), // Conversation ID, Title
    Delete(String),         // Conversation ID
    DismissError,
    List,
}

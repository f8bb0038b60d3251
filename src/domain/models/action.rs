/// Intents forwarded from the UI to the session controller.
pub enum Action {
    DismissFeedback(),
    NewChat(),
    RequestFeedback(),
    ResubmitLastMessage(),
    SendMessage(String),
    SetInput(String),
    Tick(),
    TogglePlayback(),
    ToggleRecording(),
}

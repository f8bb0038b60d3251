#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Transcribing,
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        return *self == RecordingState::Idle;
    }
}

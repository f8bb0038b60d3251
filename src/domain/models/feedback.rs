/// Progress summary returned by the feedback endpoint. A failed request keeps
/// the failure reason as text so it is still shown in the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub failed: bool,
}

impl Feedback {
    pub fn new(text: &str) -> Feedback {
        return Feedback {
            text: text.to_string(),
            failed: false,
        };
    }

    pub fn failure(text: &str) -> Feedback {
        return Feedback {
            text: text.to_string(),
            failed: true,
        };
    }
}

/// One numbered entry of a formatted feedback text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedbackItem {
    pub number: Option<String>,
    pub text: String,
    pub bullets: Vec<String>,
}

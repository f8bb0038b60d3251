mod action;
mod audio;
mod backend;
mod event;
mod feedback;
mod loading;
mod message;
mod recording;
mod role;
mod session;
mod slash_commands;
mod store;
mod textarea;

pub use action::*;
pub use audio::*;
pub use backend::*;
pub use event::*;
pub use feedback::*;
pub use loading::*;
pub use message::*;
pub use recording::*;
pub use role::*;
pub use session::*;
pub use slash_commands::*;
pub use store::*;
pub use textarea::*;

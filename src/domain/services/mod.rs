pub mod actions;
mod app_state;
mod bubble;
mod bubble_list;
pub mod events;
mod feedback;
mod scroll;
mod session_controller;

pub use app_state::*;
pub use bubble::*;
pub use bubble_list::*;
pub use feedback::*;
pub use scroll::*;
pub use session_controller::*;

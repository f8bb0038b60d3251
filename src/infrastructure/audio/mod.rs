pub mod decode;
pub mod device;
pub mod microphone;
pub mod speaker;
pub mod wav;

use crate::domain::models::PlayerBox;
use crate::domain::models::RecorderBox;

pub struct AudioManager {}

impl AudioManager {
    pub fn recorder() -> RecorderBox {
        return Box::<microphone::Microphone>::default();
    }

    pub fn player() -> PlayerBox {
        return Box::<speaker::Speaker>::default();
    }
}

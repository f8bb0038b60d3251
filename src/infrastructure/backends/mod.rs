pub mod lang_api;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> BackendBox {
        return Box::<lang_api::LangApi>::default();
    }
}

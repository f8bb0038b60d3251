use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

impl Role {
    /// Name shown at the top of a chat bubble.
    pub fn display_name(&self) -> String {
        match self {
            Role::User => return Config::get(ConfigKey::Username),
            Role::Assistant => return String::from("Lang"),
            Role::Error => return String::from("Error"),
        }
    }
}

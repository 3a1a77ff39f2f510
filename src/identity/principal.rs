use serde::{Deserialize, Serialize};

/// The identity a verified session belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    #[serde(default)]
    pub email: String,
}

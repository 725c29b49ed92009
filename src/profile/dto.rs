use serde::Deserialize;

use crate::patch::{double_option, trimmed};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
}

impl UpdateProfileRequest {
    /// `None` leaves the name alone; `Some(None)` clears it (`null` or blank).
    pub fn name_change(self) -> Option<Option<String>> {
        self.name.map(trimmed)
    }
}

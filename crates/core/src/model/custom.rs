use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::point::FieldValue;

/// Caller-supplied points that need no dedicated generator.
///
/// `data`/`data_tags` become one custom measurement. `data_map` holds one
/// field map per measurement name; `data_map_tags` attaches tags to the entry
/// with the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomData {
    #[serde(rename = "custom_data")]
    pub data: BTreeMap<String, FieldValue>,
    #[serde(rename = "custom_data_tags")]
    pub data_tags: BTreeMap<String, String>,
    #[serde(rename = "custom_data_map")]
    pub data_map: BTreeMap<String, BTreeMap<String, FieldValue>>,
    #[serde(rename = "custom_data_map_tags")]
    pub data_map_tags: BTreeMap<String, BTreeMap<String, String>>,
}

impl CustomData {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.data_map.is_empty()
    }
}

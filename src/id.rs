use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identifier of a kintone app. The REST API accepts the numeric id either
/// as a JSON number or as a string, so both are kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppId {
    Number(u64),
    Text(CompactString),
}

impl AppId {
    pub fn new(id: u64) -> Self { Self::Number(id) }
}

impl From<u64> for AppId {
    fn from(id: u64) -> Self { Self::Number(id) }
}

impl From<u32> for AppId {
    fn from(id: u32) -> Self { Self::Number(id.into()) }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self { Self::Text(id.into()) }
}

impl From<CompactString> for AppId {
    fn from(id: CompactString) -> Self { Self::Text(id) }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AppId::Number(id) => write!(f, "{id}"),
            AppId::Text(id) => write!(f, "{id}"),
        }
    }
}

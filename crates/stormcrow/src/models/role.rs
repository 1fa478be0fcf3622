use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Who authored a message in the transcript
pub enum Role {
    System,
    User,
    Assistant,
}

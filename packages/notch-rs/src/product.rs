//! Status messages written to `product.json` for the hosting platform.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    pub msg: String,
}

/// Accumulated run status, serialized as `{"brainlife": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub brainlife: Vec<Message>,
}

impl Product {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.push("info", msg);
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.push("success", msg);
    }

    fn push(&mut self, kind: &str, msg: impl Into<String>) {
        self.brainlife.push(Message {
            kind: kind.to_string(),
            msg: msg.into(),
        });
    }

    pub fn has_success(&self) -> bool {
        self.brainlife.iter().any(|m| m.kind == "success")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

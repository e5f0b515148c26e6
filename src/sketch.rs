//! Sketch documents: the raw script text as it is saved and loaded.
//!
//! Storage itself (document ids, remote collections) belongs to the caller.
//! This module only fixes the document shape, `{"code": "..."}`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SketchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed sketch document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A saved sketch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sketch {
    pub code: String,
}

impl Sketch {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn to_json(&self) -> Result<String, SketchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SketchError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SketchError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SketchError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// The script the sketching tool opens with.
pub const STARTER_SCRIPT: &str = "\
grid on
material matcap

reset
lsys FF+FFFFF
translate 10 0 0
lsys FF+FFF+FFFFF
extrude 5
";

pub mod gemini;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::BackendName;
use crate::domain::models::ImageServiceBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName) -> Result<ImageServiceBox> {
        if name == BackendName::Gemini {
            return Ok(Arc::<gemini::Gemini>::default());
        }

        bail!(format!("No backend implemented for {name}"))
    }
}

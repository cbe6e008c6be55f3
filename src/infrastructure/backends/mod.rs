pub mod analyzer;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> BackendBox {
        return Box::<analyzer::Analyzer>::default();
    }
}

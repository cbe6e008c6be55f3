pub mod actions;
mod artifact_viewer;
mod narrative;
mod performance;
mod session;

pub use artifact_viewer::*;
pub use narrative::*;
pub use performance::*;
pub use session::*;

mod action;
mod analysis;
mod backend;
mod event;
mod message;
mod performance;
mod role;
mod slash_commands;

pub use action::*;
pub use analysis::*;
pub use backend::*;
pub use event::*;
pub use message::*;
pub use performance::*;
pub use role::*;
pub use slash_commands::*;

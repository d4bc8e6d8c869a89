// Exported functions
pub use self::general::{action_button, action_command, invalid_state};

// Submodules
mod general;
mod utils;

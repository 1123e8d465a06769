pub mod saver;
pub mod shared;
pub mod state;

pub use saver::Saver;
pub use shared::SharedState;
pub use state::{AppState, Status};

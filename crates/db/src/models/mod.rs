//! Entity models and DTOs.

pub mod daily_game;
pub mod game;
pub mod screenshot;

pub use daily_game::DailyGame;
pub use game::{CreateGame, Franchise, Game};
pub use screenshot::{CreateScreenshot, Screenshot};

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query
//! methods that accept `&PgPool` as the first argument.

pub mod daily_game_repo;
pub mod franchise_repo;
pub mod game_repo;
pub mod screenshot_repo;

pub use daily_game_repo::DailyGameRepo;
pub use franchise_repo::FranchiseRepo;
pub use game_repo::GameRepo;
pub use screenshot_repo::ScreenshotRepo;

pub mod chart;
pub mod file;
pub mod user;

pub use chart::*;
pub use file::*;
pub use user::*;

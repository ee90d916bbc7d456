pub mod config;
pub mod ids;
pub mod member;
pub mod notification;
pub mod project;
pub mod report;
pub mod task;

pub use config::*;
pub use ids::*;
pub use member::*;
pub use notification::*;
pub use project::*;
pub use report::*;
pub use task::*;

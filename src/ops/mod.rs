pub mod calendar;
pub mod notifications;
pub mod reports;
pub mod search;
pub mod stats;

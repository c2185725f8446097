pub mod repository;

pub use repository::{ActivityItem, RepositorySummary};

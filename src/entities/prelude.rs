pub use super::response_cache::Entity as ResponseCache;

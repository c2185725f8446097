pub mod activity;
pub use activity::is_active;

pub mod aggregation;
pub use aggregation::{AggregationPipeline, AggregationReport, FeedQuery};

pub mod cache;
pub use cache::{CacheError, ResponseCache};

pub mod enricher;
pub use enricher::{ActivityEnricher, EnrichedActivity, EnrichmentError};

pub mod issues;
pub use issues::IssueFeedService;

#[cfg(test)]
pub(crate) mod testing;

// Feedback portal core: the store, the dashboard query, and their HTTP surface.
// All persistence goes through store::FeedbackStore; nothing else writes storage.

pub mod handlers;
pub mod query;
pub mod seed;
pub mod stats;
pub mod store;
pub mod validation;

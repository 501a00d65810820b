/// Middleware module
///
/// Custom actix middleware that is not tied to a single route.

mod hits;

pub use hits::FileserverHits;

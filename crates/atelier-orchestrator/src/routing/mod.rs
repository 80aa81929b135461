//! Routing: the decision tree mapping classification and context to an
//! execution path, plus cognitive-offloading detection.

mod offloading;
mod tree;
mod types;

pub use offloading::{detect_cognitive_offloading, OffloadingIndicators};
pub use tree::RoutingTree;
pub use types::{OffloadingType, RouteType, RoutingContext, RoutingDecision};

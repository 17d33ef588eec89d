//! Cross-source discovery: find coverage of a story from outlets whose bias
//! differs from the source article's.
//!
//! - [`resolver`]: which biases to search
//! - [`sampler`]: which outlets of those biases to try
//! - [`probe`]: one paced search per outlet, with result validation
//! - [`collector`]: validated URL → article text
//! - [`coherence`]: keep the articles that agree on the topic
//! - [`pipeline`]: runs the stages in order

pub mod coherence;
pub mod collector;
pub mod pipeline;
pub mod probe;
pub mod resolver;
pub mod sampler;

pub use pipeline::{Collaborators, DiscoveryPipeline, DiscoverySettings};

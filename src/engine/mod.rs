//! Core engine: the query → fetch → extract → reduce valuation run.

pub mod politeness;
pub mod valuator;

pub use politeness::{DelayPolicy, FixedDelay, JitterDelay};
pub use valuator::{summarize, Valuator};

pub mod client;
pub mod messages;

pub use client::{
    sample_or_default, HttpSampleSource, SampleError, SampleSource, StaticSampleSource,
    DEFAULT_SAMPLE_URL,
};
pub use messages::{SampleItem, DEFAULT_PASSAGE};

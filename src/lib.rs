//! jsonpedia - client for the JSONpedia annotation and storage service.
//!
//! Builds annotate, Mongo and Elasticsearch requests through fluent chains
//! and dispatches each one exactly once, reporting through `done`/`fail`
//! callbacks.

pub mod client;
pub mod config;
pub mod error;
pub mod render;

pub use client::{
    Dispatcher, ElasticChain, JsonPedia, MongoChain, Origin, Outcome, OutputFormat, Processor,
    ProcessorChain, RequestDescriptor, RequestParams,
};
pub use config::ClientConfig;
pub use error::{ConfigError, ConfigurationError, JsonPediaError, TransportError};

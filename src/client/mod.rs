//! JSONpedia service client.
//!
//! ```no_run
//! # async fn example() -> Result<(), jsonpedia::JsonPediaError> {
//! use jsonpedia::{JsonPedia, Origin};
//!
//! let jsonpedia = JsonPedia::new(Origin::new("localhost", Some(8080)))?;
//! jsonpedia
//!     .annotate("en:Albert_Einstein")
//!     .extractors()
//!     .linkers()
//!     .json()
//!     .done(|body| println!("{}", body))
//!     .fail(|err| eprintln!("{}", err));
//! # Ok(())
//! # }
//! ```

mod chain;
mod dispatch;
mod params;
mod request;

pub use chain::{ElasticChain, MongoChain, ProcessorChain};
pub use dispatch::{Dispatcher, Outcome};
pub use params::{CallParams, RequestParams};
pub use request::{
    ElasticCall, MapReduceQuery, Mode, MongoCall, Origin, OutputFormat, Processor,
    RequestDescriptor, SelectQuery,
};

use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::{ConfigurationError, JsonPediaError};

/// Entry point for building requests against one service origin.
///
/// Each call to [`annotate`](Self::annotate), [`mongo`](Self::mongo) or
/// [`elastic`](Self::elastic) starts an independent request; only the
/// connection pool is shared between them.
#[derive(Clone)]
pub struct JsonPedia {
    client: Client,
    origin: Origin,
}

impl JsonPedia {
    /// Create a client with the default user agent.
    pub fn new(origin: Origin) -> Result<Self, JsonPediaError> {
        Self::from_config(&ClientConfig {
            host: origin.host,
            port: origin.port,
            ..ClientConfig::default()
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, JsonPediaError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self::with_client(client, config.origin()))
    }

    /// Use an existing HTTP client.
    pub fn with_client(client: Client, origin: Origin) -> Self {
        Self { client, origin }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Start an annotation request for `entity` (e.g. `en:Albert_Einstein`).
    pub fn annotate(&self, entity: impl Into<String>) -> ProcessorChain {
        ProcessorChain::new(self.clone(), entity.into())
    }

    pub fn mongo(&self) -> MongoChain {
        MongoChain::new(self.clone())
    }

    pub fn elastic(&self) -> ElasticChain {
        ElasticChain::new(self.clone())
    }

    /// Build a dispatcher from untyped parameters.
    pub fn request(&self, params: RequestParams) -> Result<Dispatcher, ConfigurationError> {
        Ok(self.dispatcher(params.into_descriptor()?))
    }

    pub fn dispatcher(&self, descriptor: RequestDescriptor) -> Dispatcher {
        Dispatcher::new(self.client.clone(), self.origin.clone(), descriptor)
    }
}

//! Fluent builders for the three request families.
//!
//! Every call consumes the chain and hands back a new one; terminal calls
//! (`json`, `html`, `select`, `mapred`) produce a [`Dispatcher`].

use super::dispatch::Dispatcher;
use super::request::{
    ElasticCall, MapReduceQuery, MongoCall, OutputFormat, Processor, RequestDescriptor,
    SelectQuery,
};
use super::JsonPedia;

/// Annotation request under construction.
#[derive(Clone)]
#[must_use = "a chain does nothing until finished with json() or html()"]
pub struct ProcessorChain {
    session: JsonPedia,
    entity: String,
    processors: Vec<Processor>,
}

impl ProcessorChain {
    pub(crate) fn new(session: JsonPedia, entity: String) -> Self {
        Self {
            session,
            entity,
            processors: Vec::new(),
        }
    }

    /// Append a processor. Duplicates are kept.
    pub fn processor(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn extractors(self) -> Self {
        self.processor(Processor::Extractors)
    }

    pub fn linkers(self) -> Self {
        self.processor(Processor::Linkers)
    }

    pub fn splitters(self) -> Self {
        self.processor(Processor::Splitters)
    }

    pub fn structure(self) -> Self {
        self.processor(Processor::Structure)
    }

    pub fn validate(self) -> Self {
        self.processor(Processor::Validate)
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    pub fn json(self) -> Dispatcher {
        self.format(OutputFormat::Json)
    }

    pub fn html(self) -> Dispatcher {
        self.format(OutputFormat::Html)
    }

    /// Finish with an explicit output format.
    pub fn format(self, format: OutputFormat) -> Dispatcher {
        self.session.dispatcher(RequestDescriptor::Annotate {
            entity: self.entity,
            processors: self.processors,
            format,
        })
    }
}

/// Mongo storage request under construction.
#[derive(Clone)]
#[must_use = "a chain does nothing until finished with select() or mapred()"]
pub struct MongoChain {
    session: JsonPedia,
}

impl MongoChain {
    pub(crate) fn new(session: JsonPedia) -> Self {
        Self { session }
    }

    pub fn select(
        self,
        query: impl Into<String>,
        filter: impl Into<String>,
        limit: u64,
    ) -> Dispatcher {
        self.session
            .dispatcher(RequestDescriptor::Mongo(MongoCall::Select(SelectQuery::new(
                query, filter, limit,
            ))))
    }

    /// Map-reduce over the documents matching `criteria`.
    pub fn mapred(
        self,
        criteria: impl Into<String>,
        map: impl Into<String>,
        reduce: impl Into<String>,
        limit: u64,
    ) -> Dispatcher {
        self.session
            .dispatcher(RequestDescriptor::Mongo(MongoCall::MapReduce(
                MapReduceQuery {
                    criteria: criteria.into(),
                    map: map.into(),
                    reduce: reduce.into(),
                    limit,
                },
            )))
    }
}

/// Elasticsearch storage request under construction.
#[derive(Clone)]
#[must_use = "a chain does nothing until finished with select()"]
pub struct ElasticChain {
    session: JsonPedia,
}

impl ElasticChain {
    pub(crate) fn new(session: JsonPedia) -> Self {
        Self { session }
    }

    pub fn select(
        self,
        query: impl Into<String>,
        filter: impl Into<String>,
        limit: u64,
    ) -> Dispatcher {
        self.session
            .dispatcher(RequestDescriptor::Elastic(ElasticCall::Select(
                SelectQuery::new(query, filter, limit),
            )))
    }
}

//! Request descriptors and URL construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigurationError;

/// Host the service is reached on (the page origin in the browser client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub host: String,
    pub port: Option<u16>,
}

impl Origin {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `http://<host>` with `:<port>` appended only when a port is set.
    pub fn base(&self) -> String {
        match self.port {
            Some(port) => format!("http://{}:{}", self.host, port),
            None => format!("http://{}", self.host),
        }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::new("localhost", None)
    }
}

/// Annotation stage requested through the `procs` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Processor {
    Extractors,
    Linkers,
    Splitters,
    Structure,
    Validate,
}

impl Processor {
    pub const ALL: [Processor; 5] = [
        Processor::Extractors,
        Processor::Linkers,
        Processor::Splitters,
        Processor::Structure,
        Processor::Validate,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Processor::Extractors => "Extractors",
            Processor::Linkers => "Linkers",
            Processor::Splitters => "Splitters",
            Processor::Structure => "Structure",
            Processor::Validate => "Validate",
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Processor {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Processor::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigurationError::UnknownProcessor(s.to_string()))
    }
}

/// Output format of an annotation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(ConfigurationError::UnknownFormat(s.to_string())),
        }
    }
}

/// Request family a builder is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Annotate,
    Mongo,
    Elastic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Annotate => "annotate",
            Mode::Mongo => "mongo",
            Mode::Elastic => "elastic",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annotate" => Ok(Mode::Annotate),
            "mongo" => Ok(Mode::Mongo),
            "elastic" => Ok(Mode::Elastic),
            _ => Err(ConfigurationError::UnknownMode(s.to_string())),
        }
    }
}

/// Arguments of a `select` call, shared by the Mongo and Elastic backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub query: String,
    pub filter: String,
    pub limit: u64,
}

impl SelectQuery {
    pub fn new(query: impl Into<String>, filter: impl Into<String>, limit: u64) -> Self {
        Self {
            query: query.into(),
            filter: filter.into(),
            limit,
        }
    }
}

/// Arguments of a Mongo map-reduce call. `map` and `reduce` are opaque
/// function sources handed to the backend untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapReduceQuery {
    pub criteria: String,
    pub map: String,
    pub reduce: String,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MongoCall {
    Select(SelectQuery),
    MapReduce(MapReduceQuery),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElasticCall {
    Select(SelectQuery),
}

/// Fully assembled request, ready to be resolved against an [`Origin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDescriptor {
    Annotate {
        entity: String,
        processors: Vec<Processor>,
        format: OutputFormat,
    },
    Mongo(MongoCall),
    Elastic(ElasticCall),
}

impl RequestDescriptor {
    pub fn mode(&self) -> Mode {
        match self {
            RequestDescriptor::Annotate { .. } => Mode::Annotate,
            RequestDescriptor::Mongo(_) => Mode::Mongo,
            RequestDescriptor::Elastic(_) => Mode::Elastic,
        }
    }

    /// Resolve the absolute URL of this request.
    pub fn url(&self, origin: &Origin) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&origin.base())?;

        let query = match self {
            RequestDescriptor::Annotate {
                entity,
                processors,
                format,
            } => {
                set_path(
                    &mut url,
                    &["annotate", "resource", format.as_str(), entity.as_str()],
                );
                let procs: Vec<&str> = processors.iter().map(Processor::as_str).collect();
                format!("procs={}", procs.join(","))
            }
            RequestDescriptor::Mongo(MongoCall::Select(select)) => {
                set_path(&mut url, &["storage", "mongo", "select"]);
                select_query(select)
            }
            RequestDescriptor::Mongo(MongoCall::MapReduce(mapred)) => {
                set_path(&mut url, &["storage", "mongo", "mapred"]);
                format!(
                    "criteria={}&map={}&reduce={}&limit={}",
                    urlencoding::encode(&mapred.criteria),
                    urlencoding::encode(&mapred.map),
                    urlencoding::encode(&mapred.reduce),
                    mapred.limit
                )
            }
            RequestDescriptor::Elastic(ElasticCall::Select(select)) => {
                set_path(&mut url, &["storage", "elastic", "select"]);
                select_query(select)
            }
        };

        url.set_query(Some(&query));
        Ok(url)
    }
}

fn select_query(select: &SelectQuery) -> String {
    format!(
        "q={}&filter={}&limit={}",
        urlencoding::encode(&select.query),
        urlencoding::encode(&select.filter),
        select.limit
    )
}

// Each segment is escaped on its own, so an entity id containing '/' stays one segment.
fn set_path(url: &mut Url, segments: &[&str]) {
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
}

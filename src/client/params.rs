//! Untyped request parameters.
//!
//! Requests loaded from files or assembled from command line input arrive as
//! loose name/argument bags. [`RequestParams::into_descriptor`] validates them
//! into a [`RequestDescriptor`] or fails with a [`ConfigurationError`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::request::{
    ElasticCall, MapReduceQuery, Mode, MongoCall, OutputFormat, Processor, RequestDescriptor,
    SelectQuery,
};
use crate::config;
use crate::error::{ConfigError, ConfigurationError};

/// A single recorded call, e.g. `select` with `[query, filter, limit]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub verb: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CallParams {
    pub fn new(verb: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }

    fn expect_args(&self, expected: usize) -> Result<(), ConfigurationError> {
        if self.args.len() != expected {
            return Err(ConfigurationError::ArgumentCount {
                verb: self.verb.clone(),
                expected,
                found: self.args.len(),
            });
        }
        Ok(())
    }

    fn select(&self) -> Result<SelectQuery, ConfigurationError> {
        self.expect_args(3)?;
        Ok(SelectQuery {
            query: text_arg(&self.args[0]),
            filter: text_arg(&self.args[1]),
            limit: limit_arg(&self.args[2])?,
        })
    }

    fn map_reduce(&self) -> Result<MapReduceQuery, ConfigurationError> {
        self.expect_args(4)?;
        Ok(MapReduceQuery {
            criteria: text_arg(&self.args[0]),
            map: text_arg(&self.args[1]),
            reduce: text_arg(&self.args[2]),
            limit: limit_arg(&self.args[3])?,
        })
    }
}

/// Loose request parameters, as found in request files.
///
/// ```toml
/// mode = "mongo"
///
/// [[calls]]
/// verb = "select"
/// args = ["_id = #736 -> title", "@type : link", 1]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallParams>,
}

impl RequestParams {
    /// Load request parameters from a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        config::read_by_extension(path)
    }

    pub fn into_descriptor(self) -> Result<RequestDescriptor, ConfigurationError> {
        let mode: Mode = self
            .mode
            .as_deref()
            .ok_or(ConfigurationError::MissingMode)?
            .parse()?;

        match mode {
            Mode::Annotate => {
                let entity = self
                    .entity
                    .filter(|e| !e.is_empty())
                    .ok_or(ConfigurationError::MissingEntity)?;
                let processors = self
                    .processors
                    .iter()
                    .map(|p| p.parse::<Processor>())
                    .collect::<Result<Vec<_>, _>>()?;
                let format = match self.format.as_deref() {
                    Some(format) => format.parse()?,
                    None => OutputFormat::default(),
                };
                Ok(RequestDescriptor::Annotate {
                    entity,
                    processors,
                    format,
                })
            }
            Mode::Mongo => {
                let call = first_call(mode, &self.calls)?;
                match call.verb.as_str() {
                    "select" => Ok(RequestDescriptor::Mongo(MongoCall::Select(call.select()?))),
                    "mapred" => Ok(RequestDescriptor::Mongo(MongoCall::MapReduce(
                        call.map_reduce()?,
                    ))),
                    verb => Err(unknown_verb(mode, verb)),
                }
            }
            Mode::Elastic => {
                let call = first_call(mode, &self.calls)?;
                match call.verb.as_str() {
                    "select" => Ok(RequestDescriptor::Elastic(ElasticCall::Select(
                        call.select()?,
                    ))),
                    verb => Err(unknown_verb(mode, verb)),
                }
            }
        }
    }
}

fn first_call(mode: Mode, calls: &[CallParams]) -> Result<&CallParams, ConfigurationError> {
    let call = calls
        .first()
        .ok_or_else(|| ConfigurationError::MissingCall(mode.to_string()))?;
    if calls.len() > 1 {
        warn!(
            "{} request has {} calls; only the first is sent",
            mode,
            calls.len()
        );
    }
    Ok(call)
}

fn unknown_verb(mode: Mode, verb: &str) -> ConfigurationError {
    ConfigurationError::UnknownVerb {
        mode: mode.to_string(),
        verb: verb.to_string(),
    }
}

fn text_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn limit_arg(value: &Value) -> Result<u64, ConfigurationError> {
    let limit = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    limit.ok_or_else(|| ConfigurationError::InvalidLimit(text_arg(value)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(mode: &str, calls: Vec<CallParams>) -> RequestParams {
        RequestParams {
            mode: Some(mode.to_string()),
            calls,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_mode() {
        assert_eq!(
            RequestParams::default().into_descriptor(),
            Err(ConfigurationError::MissingMode)
        );
    }

    #[test]
    fn test_unknown_mode() {
        assert_eq!(
            params("solr", vec![]).into_descriptor(),
            Err(ConfigurationError::UnknownMode("solr".to_string()))
        );
    }

    #[test]
    fn test_annotate_params() {
        let request = RequestParams {
            mode: Some("annotate".to_string()),
            entity: Some("en:Albert_Einstein".to_string()),
            processors: vec!["extractors".to_string(), "Linkers".to_string()],
            format: Some("html".to_string()),
            calls: vec![],
        };
        assert_eq!(
            request.into_descriptor().unwrap(),
            RequestDescriptor::Annotate {
                entity: "en:Albert_Einstein".to_string(),
                processors: vec![Processor::Extractors, Processor::Linkers],
                format: OutputFormat::Html,
            }
        );
    }

    #[test]
    fn test_annotate_requires_entity() {
        let request = RequestParams {
            mode: Some("annotate".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.into_descriptor(),
            Err(ConfigurationError::MissingEntity)
        );
    }

    #[test]
    fn test_mongo_select_with_string_limit() {
        let request = params(
            "mongo",
            vec![CallParams::new(
                "select",
                vec![json!("_id = #736 -> title"), json!("@type : link"), json!("5")],
            )],
        );
        assert_eq!(
            request.into_descriptor().unwrap(),
            RequestDescriptor::Mongo(MongoCall::Select(SelectQuery::new(
                "_id = #736 -> title",
                "@type : link",
                5
            )))
        );
    }

    #[test]
    fn test_unknown_mongo_verb() {
        let request = params("mongo", vec![CallParams::new("aggregate", vec![])]);
        assert_eq!(
            request.into_descriptor(),
            Err(ConfigurationError::UnknownVerb {
                mode: "mongo".to_string(),
                verb: "aggregate".to_string(),
            })
        );
    }

    #[test]
    fn test_elastic_rejects_mapred() {
        let request = params(
            "elastic",
            vec![CallParams::new(
                "mapred",
                vec![json!("c"), json!("m"), json!("r"), json!(1)],
            )],
        );
        assert!(matches!(
            request.into_descriptor(),
            Err(ConfigurationError::UnknownVerb { .. })
        ));
    }

    #[test]
    fn test_missing_call_and_bad_arguments() {
        assert_eq!(
            params("elastic", vec![]).into_descriptor(),
            Err(ConfigurationError::MissingCall("elastic".to_string()))
        );
        assert_eq!(
            params("mongo", vec![CallParams::new("select", vec![json!("q")])]).into_descriptor(),
            Err(ConfigurationError::ArgumentCount {
                verb: "select".to_string(),
                expected: 3,
                found: 1,
            })
        );
        assert_eq!(
            params(
                "mongo",
                vec![CallParams::new(
                    "select",
                    vec![json!("q"), json!("f"), json!(-1)]
                )]
            )
            .into_descriptor(),
            Err(ConfigurationError::InvalidLimit("-1".to_string()))
        );
    }

    #[test]
    fn test_only_first_call_is_used() {
        let request = params(
            "elastic",
            vec![
                CallParams::new("select", vec![json!("first"), json!(""), json!(1)]),
                CallParams::new("select", vec![json!("second"), json!(""), json!(2)]),
            ],
        );
        assert_eq!(
            request.into_descriptor().unwrap(),
            RequestDescriptor::Elastic(ElasticCall::Select(SelectQuery::new("first", "", 1)))
        );
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapred.toml");
        std::fs::write(
            &path,
            r#"
mode = "mongo"

[[calls]]
verb = "mapred"
args = ["_id = #736", "function() { emit(this._id, 1); }", "function(k, v) { return Array.sum(v) }", 10]
"#,
        )
        .unwrap();

        let descriptor = RequestParams::from_path(&path)
            .unwrap()
            .into_descriptor()
            .unwrap();
        match descriptor {
            RequestDescriptor::Mongo(MongoCall::MapReduce(q)) => {
                assert_eq!(q.criteria, "_id = #736");
                assert_eq!(q.map, "function() { emit(this._id, 1); }");
                assert_eq!(q.limit, 10);
            }
            other => panic!("unexpected descriptor: {:?}", other),
        }
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotate.json");
        std::fs::write(
            &path,
            r#"{"mode": "annotate", "entity": "en:Rome", "processors": ["Structure"]}"#,
        )
        .unwrap();

        let params = RequestParams::from_path(&path).unwrap();
        assert_eq!(params.entity.as_deref(), Some("en:Rome"));
        assert!(params.into_descriptor().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = RequestParams::from_path(Path::new("/nonexistent/request.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.txt");
        std::fs::write(&path, r#"{"mode": "elastic"}"#).unwrap();
        assert!(matches!(
            RequestParams::from_path(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}

//! String-in, string-out loading boundary.
//!
//! Every call returns JSON text: `{"data": ...}` on success or
//! `{"error": {"kind", "message", "line", "column"}}` on failure, so callers
//! outside Rust only ever parse one shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{LoadError, Result};
use crate::json::documents_to_json;
use crate::stream::{load_all, load_one};

/// Error payload carried by a failed [`Response`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl From<&LoadError> for ErrorPayload {
    fn from(err: &LoadError) -> Self {
        let position = err.position();
        Self {
            kind: err.kind_name().to_string(),
            message: err.message(),
            line: position.map(|p| p.line),
            column: position.map(|p| p.column),
        }
    }
}

/// The boundary envelope, one of `{"data": ...}` or `{"error": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Response {
    #[serde(rename = "data")]
    Data(Value),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl Response {
    fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Response::Data(data),
            Err(err) => Response::Error(ErrorPayload::from(&err)),
        }
    }

    /// Parse envelope text produced by [`YamlStar::load_json`].
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!(
                r#"{{"error":{{"kind":"DeserializeError","message":{:?},"line":null,"column":null}}}}"#,
                err.to_string()
            )
        })
    }
}

/// YAML loader with an explicit configuration.
///
/// ```
/// use libyamlstar::YamlStar;
///
/// let ys = YamlStar::new();
/// assert_eq!(ys.load_json("a: 1"), r#"{"data":{"a":1}}"#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct YamlStar {
    config: Config,
}

impl YamlStar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the single document of `yaml` into `T`.
    pub fn load<T: DeserializeOwned>(&self, yaml: &str) -> Result<T> {
        self.trace_input("load", yaml);
        let value = load_one(yaml).and_then(|doc| doc.to_json());
        self.trace_result("load", &value);
        Ok(serde_json::from_value(value?)?)
    }

    /// Load every document of `yaml`, each into `T`.
    pub fn load_all<T: DeserializeOwned>(&self, yaml: &str) -> Result<Vec<T>> {
        self.trace_input("load_all", yaml);
        let value = load_all(yaml).and_then(|docs| documents_to_json(&docs));
        self.trace_result("load_all", &value);
        let items = match value? {
            Value::Array(items) => items,
            other => vec![other],
        };
        items
            .into_iter()
            .map(|item| Ok(serde_json::from_value(item)?))
            .collect()
    }

    /// Load the single document of `yaml` and return the JSON envelope.
    pub fn load_json(&self, yaml: &str) -> String {
        self.trace_input("load_json", yaml);
        let response = Response::from_result(load_one(yaml).and_then(|doc| doc.to_json()));
        let text = response.to_json();
        if self.config.debug {
            debug!(call = "load_json", response = %text, "boundary response");
        }
        text
    }

    /// Load all documents of `yaml` and return the JSON envelope.
    pub fn load_all_json(&self, yaml: &str) -> String {
        self.trace_input("load_all_json", yaml);
        let response =
            Response::from_result(load_all(yaml).and_then(|docs| documents_to_json(&docs)));
        let text = response.to_json();
        if self.config.debug {
            debug!(call = "load_all_json", response = %text, "boundary response");
        }
        text
    }

    pub fn version(&self) -> &'static str {
        crate::VERSION
    }

    fn trace_input(&self, call: &str, yaml: &str) {
        if self.config.debug {
            debug!(call, input = yaml, "boundary call");
        }
    }

    fn trace_result(&self, call: &str, result: &Result<Value>) {
        if !self.config.debug {
            return;
        }
        match result {
            Ok(value) => debug!(call, data = %value, "boundary result"),
            Err(err) => debug!(call, error = %err, kind = err.kind_name(), "boundary error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_json_success() {
        let ys = YamlStar::new();
        assert_eq!(ys.load_json("hello"), r#"{"data":"hello"}"#);
        assert_eq!(
            Response::from_json(&ys.load_json("a: [1, 2]")).unwrap(),
            Response::Data(json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn test_load_json_error_payload() {
        let ys = YamlStar::new();
        let response = Response::from_json(&ys.load_json("key: \"unclosed")).unwrap();
        match response {
            Response::Error(payload) => {
                assert_eq!(payload.kind, "LexError");
                assert_eq!(payload.line, Some(1));
                assert_eq!(payload.column, Some(6));
                assert_eq!(payload.message, "unterminated double-quoted scalar");
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_load_all_json() {
        let ys = YamlStar::new();
        assert_eq!(
            ys.load_all_json("--- 1\n--- two\n"),
            r#"{"data":[1,"two"]}"#
        );
        assert_eq!(ys.load_all_json(""), r#"{"data":[]}"#);
    }

    #[test]
    fn test_empty_stream_error_kind() {
        let ys = YamlStar::new();
        let response = Response::from_json(&ys.load_json("")).unwrap();
        assert!(matches!(
            response,
            Response::Error(ErrorPayload { ref kind, .. }) if kind == "EmptyOrMultipleDocumentsError"
        ));
    }

    #[test]
    fn test_typed_load() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Server {
            host: String,
            port: u16,
        }
        let ys = YamlStar::new();
        let server: Server = ys.load("host: localhost\nport: 8080").unwrap();
        assert_eq!(
            server,
            Server {
                host: "localhost".to_string(),
                port: 8080
            }
        );
        let err = ys.load::<Server>("host: localhost").unwrap_err();
        assert_eq!(err.kind_name(), "DeserializeError");
    }

    #[test]
    fn test_typed_load_all() {
        let ys = YamlStar::with_config(Config::default().with_debug(true));
        let docs: Vec<String> = ys.load_all("--- a\n--- b\n").unwrap();
        assert_eq!(docs, vec!["a", "b"]);
    }

    #[test]
    fn test_deeply_nested_input_returns_error_envelope() {
        let ys = YamlStar::new();
        let depth = 100_000;
        let yaml = format!("{}{}", "[".repeat(depth), "]".repeat(depth));

        let text = ys.load_json(&yaml);
        assert!(text.starts_with(r#"{"error":{"kind":"ProjectionError""#), "{}", text);
        match Response::from_json(&text).unwrap() {
            Response::Error(payload) => {
                assert_eq!(payload.line, Some(1));
                assert_eq!(payload.column, Some(crate::MAX_JSON_DEPTH + 1));
            }
            other => panic!("unexpected response {:?}", other),
        }

        let text = ys.load_all_json(&yaml);
        assert!(text.starts_with(r#"{"error":{"kind":"ProjectionError""#), "{}", text);
        let err = ys.load::<Value>(&yaml).unwrap_err();
        assert_eq!(err.kind_name(), "ProjectionError");
    }

    #[test]
    fn test_version() {
        let ys = YamlStar::new();
        assert_eq!(ys.version(), env!("CARGO_PKG_VERSION"));
        assert!(ys.version().contains('.'));
    }
}

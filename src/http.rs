//! Outbound HTTP for the importers
//!
//! Every importer talks to its provider through [`HttpFetch`]: one GET with
//! query parameters, answered with parsed JSON. [`HttpClient`] is the
//! blocking reqwest implementation used outside of tests.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{ImportError, ImportResult};

/// Longest error body kept in [`ImportError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// A single GET returning parsed JSON
pub trait HttpFetch {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> ImportResult<Value>;
}

impl<T: HttpFetch + ?Sized> HttpFetch for &T {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> ImportResult<Value> {
        (**self).get_json(url, query)
    }
}

/// Blocking HTTP client with a request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> ImportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(HttpClient { client })
    }
}

impl HttpFetch for HttpClient {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> ImportResult<Value> {
        // Parameter values stay out of the log, they may carry an API key
        let names: Vec<&str> = query.iter().map(|(name, _)| *name).collect();
        debug!("GET {} params={:?}", url, names);

        let response = self.client.get(url).query(query).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ImportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ImportError::InvalidJson {
            url: url.to_string(),
            source,
        })
    }
}

/// Decode a JSON value into a typed response shape
pub(crate) fn decode<T: DeserializeOwned>(endpoint: &'static str, value: Value) -> ImportResult<T> {
    serde_json::from_value(value).map_err(|e| ImportError::schema(endpoint, e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for importer unit tests

    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    impl Recorded {
        pub fn param(&self, name: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Replays queued responses in order and records every request
    #[derive(Default)]
    pub struct ScriptedHttp {
        responses: RefCell<VecDeque<Value>>,
        requests: RefCell<Vec<Recorded>>,
    }

    impl ScriptedHttp {
        pub fn new(responses: Vec<Value>) -> Self {
            ScriptedHttp {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.borrow().clone()
        }
    }

    impl HttpFetch for ScriptedHttp {
        fn get_json(&self, url: &str, query: &[(&str, String)]) -> ImportResult<Value> {
            self.requests.borrow_mut().push(Recorded {
                url: url.to_string(),
                query: query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ImportError::schema("scripted", "no response queued"))
        }
    }
}

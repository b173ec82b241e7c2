//! Label retrieval from the WikiData SPARQL query service
//!
//! Identifiers are labelled in batches: one query per partition part, each
//! asking for `rdfs:label` and `skos:altLabel` values in the requested
//! language. The service throttles aggressively, so requests are paced and
//! HTTP 429 answers back off and retry.

use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryConfig};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

/// Public WikiData SPARQL endpoint.
pub const WIKIDATA_QUERY_SERVICE_URL: &str = "https://query.wikidata.org/sparql";

/// Labels of one identifier, possibly empty when WikiData has none in the
/// requested language.
pub type LabelMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    id: SparqlValue,
    label: SparqlValue,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// The labelling query for a single identifier, indented `indent_level`
/// tabs for embedding into a surrounding query.
#[must_use]
pub fn labelling_query_for_identifier(identifier: &str, language: &str, indent_level: usize) -> String {
    let indent = "\t".repeat(indent_level);
    format!(
        "{indent}SELECT DISTINCT ?id ?label WHERE {{\n\
         {indent}\tBIND(\"{identifier}\" AS ?id) .\n\
         {indent}\t{{\n\
         {indent}\t\twd:{identifier} rdfs:label ?label .\n\
         {indent}\t}} UNION {{\n\
         {indent}\t\twd:{identifier} skos:altLabel ?label .\n\
         {indent}\t}}\n\
         {indent}\tFILTER(LANG(?label) = \"{language}\") .\n\
         {indent}}}\n"
    )
}

/// One labelling query covering every identifier of a partition part.
#[must_use]
pub fn labelling_query(identifiers: &BTreeSet<String>, language: &str) -> String {
    let mut query = String::from("SELECT ?id ?label WHERE {\n");
    for (index, identifier) in identifiers.iter().enumerate() {
        query.push_str("\t{\n");
        query.push_str(&labelling_query_for_identifier(identifier, language, 2));
        query.push_str("\t}\n");
        if index != identifiers.len() - 1 {
            query.push_str("\tUNION\n");
        }
    }
    query.push('}');
    query
}

/// Partition `identifiers` into parts of at most `part_size`. Every part
/// but the last has exactly `part_size` members; the last has at least one.
///
/// # Panics
///
/// Panics when `part_size` is zero.
#[must_use]
pub fn partitioned(identifiers: &BTreeSet<String>, part_size: usize) -> Vec<BTreeSet<String>> {
    assert!(part_size >= 1, "part size must be at least 1");
    let mut parts: Vec<BTreeSet<String>> = Vec::new();
    for (count, identifier) in identifiers.iter().enumerate() {
        if count % part_size == 0 {
            parts.push(BTreeSet::new());
        }
        parts
            .last_mut()
            .expect("a part was just begun")
            .insert(identifier.clone());
    }
    parts
}

/// Reduce the raw SPARQL bindings to an `identifier → [labels]` map.
/// Identifiers of the part that received no binding keep an empty list.
fn restructured_labels(part: &BTreeSet<String>, bindings: Vec<SparqlBinding>) -> LabelMap {
    let mut labels: LabelMap = part.iter().map(|id| (id.clone(), Vec::new())).collect();
    for binding in bindings {
        labels.entry(binding.id.value).or_default().push(binding.label.value);
    }
    labels
}

/// Rate-limited, retrying client for the label endpoint.
#[derive(Debug)]
pub struct LabelFetcher {
    client: reqwest::Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    retry: RetryConfig,
    endpoint: Url,
}

impl LabelFetcher {
    /// A fetcher against `endpoint` with default pacing: one query every
    /// three seconds, three retries.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidUrl`] on an unparsable endpoint,
    /// [`FetchError::Http`] when the HTTP client cannot be built.
    pub fn new(endpoint: &str, user_agent: &str) -> Result<Self, FetchError> {
        Self::with_config(
            endpoint,
            user_agent,
            Duration::from_secs(3),
            RetryConfig::default(),
            Duration::from_secs(60),
        )
    }

    /// A fetcher with explicit pacing, retry, and timeout settings.
    ///
    /// # Errors
    ///
    /// See [`LabelFetcher::new`].
    pub fn with_config(
        endpoint: &str,
        user_agent: &str,
        query_interval: Duration,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent.to_string())
            .build()?;
        let quota = Quota::with_period(query_interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            retry,
            endpoint,
        })
    }

    /// Fetch the labels for one partition part.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; recoverable ones have already been retried.
    pub async fn fetch_labels(
        &self,
        part: &BTreeSet<String>,
        language: &str,
    ) -> Result<LabelMap, FetchError> {
        let query = labelling_query(part, language);

        self.rate_limiter.until_ready().await;
        let response = with_retry_if(
            &self.retry,
            || self.request_once(&query),
            FetchError::is_recoverable,
        )
        .await?;

        Ok(restructured_labels(part, response.results.bindings))
    }

    async fn request_once(&self, query: &str) -> Result<SparqlResponse, FetchError> {
        let result = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("query", query)])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(FetchError::Timeout),
            Err(e) => return Err(FetchError::Http(e)),
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::TooManyRequests);
        }
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        response
            .json::<SparqlResponse>()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_single_identifier_query_shape() {
        let query = labelling_query_for_identifier("Q42", "en", 0);
        assert!(query.contains("BIND(\"Q42\" AS ?id)"));
        assert!(query.contains("wd:Q42 rdfs:label ?label"));
        assert!(query.contains("wd:Q42 skos:altLabel ?label"));
        assert!(query.contains("FILTER(LANG(?label) = \"en\")"));
    }

    #[test]
    fn test_combined_query_unions_all_but_last() {
        let query = labelling_query(&identifiers(&["P57", "Q42"]), "nl");
        assert_eq!(query.matches("\tUNION\n").count(), 1);
        assert!(query.starts_with("SELECT ?id ?label WHERE {"));
        assert!(query.ends_with('}'));
        assert!(query.contains("wd:P57"));
        assert!(query.contains("wd:Q42"));
    }

    #[test]
    fn test_partitioning_sizes() {
        let ids = identifiers(&["P1", "P2", "Q1", "Q2", "Q3"]);
        let parts = partitioned(&ids, 2);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 1);
        let total: usize = parts.iter().map(BTreeSet::len).sum();
        assert_eq!(total, ids.len());
    }

    #[test]
    fn test_restructure_keeps_unlabelled_identifiers() {
        let part = identifiers(&["Q1", "Q2"]);
        let bindings = vec![SparqlBinding {
            id: SparqlValue {
                value: "Q1".into(),
            },
            label: SparqlValue {
                value: "first".into(),
            },
        }];
        let labels = restructured_labels(&part, bindings);
        assert_eq!(labels["Q1"], vec!["first".to_string()]);
        assert!(labels["Q2"].is_empty());
    }
}

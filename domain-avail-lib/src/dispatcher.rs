//! Concurrent batch dispatch.
//!
//! A batch is validated as a whole first; nothing touches the network until
//! the request shape is known to be good. Individual bad names become
//! in-place error results. The remaining names are answered either by a
//! batch-capable provider (chunked to its per-call limit) or by fanning the
//! fallback resolver out with bounded concurrency. Whatever path answers,
//! the report lists results in request order.

use crate::config::MAX_BATCH_LIMIT;
use crate::error::DomainCheckError;
use crate::protocols::BatchProvider;
use crate::resolver::FallbackResolver;
use crate::types::{BatchReport, CheckResult};
use crate::utils::validate_domain;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default number of domains resolved at once.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// One validated batch entry waiting for an answer.
struct Pending {
    index: usize,
    input: String,
    lookup: String,
}

pub struct BatchDispatcher {
    resolver: FallbackResolver,
    batch_provider: Option<Arc<dyn BatchProvider>>,
    concurrency: usize,
    max_batch: usize,
}

impl BatchDispatcher {
    pub fn new(resolver: FallbackResolver) -> Self {
        Self {
            resolver,
            batch_provider: None,
            concurrency: DEFAULT_CONCURRENCY,
            max_batch: MAX_BATCH_LIMIT,
        }
    }

    /// Answer batches through `provider` before falling back per domain.
    pub fn with_batch_provider(mut self, provider: Arc<dyn BatchProvider>) -> Self {
        self.batch_provider = Some(provider);
        self
    }

    /// Bound the per-domain fan-out. Clamped to 1..=100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_BATCH_LIMIT);
        self
    }

    /// Largest accepted batch. Clamped to 1..=100.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.clamp(1, MAX_BATCH_LIMIT);
        self
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn resolver(&self) -> &FallbackResolver {
        &self.resolver
    }

    pub fn batch_provider_name(&self) -> Option<&str> {
        self.batch_provider.as_ref().map(|p| p.name())
    }

    /// Extract the domain list from an untyped request body field.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the value is not a list, is empty, holds more
    /// than the batch maximum, or contains a non-string entry.
    pub fn parse_request(&self, value: &serde_json::Value) -> Result<Vec<String>, DomainCheckError> {
        let entries = value
            .as_array()
            .ok_or_else(|| DomainCheckError::invalid_input("domains must be a list"))?;
        self.check_bounds(entries.len())?;

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    DomainCheckError::invalid_input(format!("domains[{}] is not a string", i))
                })
            })
            .collect()
    }

    /// Parse and dispatch an untyped domain list.
    pub async fn dispatch_value(
        &self,
        value: &serde_json::Value,
    ) -> Result<BatchReport, DomainCheckError> {
        let domains = self.parse_request(value)?;
        self.dispatch(&domains).await
    }

    /// Check every domain and assemble the report in input order.
    ///
    /// # Errors
    ///
    /// Only batch-shape problems fail the call. Per-domain failures are
    /// captured as `method = Error` results.
    pub async fn dispatch(&self, domains: &[String]) -> Result<BatchReport, DomainCheckError> {
        self.check_bounds(domains.len())?;
        let started = Instant::now();

        let mut results: Vec<Option<CheckResult>> = vec![None; domains.len()];
        let mut pending = Vec::with_capacity(domains.len());

        for (index, input) in domains.iter().enumerate() {
            match validate_domain(input) {
                Ok(lookup) => pending.push(Pending {
                    index,
                    input: input.clone(),
                    lookup,
                }),
                Err(err) => {
                    debug!(domain = %input, error = %err, "rejected batch entry");
                    results[index] = Some(CheckResult::failed(input.as_str(), err.to_string()));
                }
            }
        }

        let pending = match &self.batch_provider {
            Some(provider) => self.run_batch_calls(provider.as_ref(), pending, &mut results).await,
            None => pending,
        };

        let resolved: Vec<(usize, CheckResult)> = stream::iter(pending)
            .map(|entry| async move {
                let mut result = self.resolver.resolve(&entry.lookup).await;
                result.domain = entry.input;
                (entry.index, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (index, result) in resolved {
            results[index] = Some(result);
        }

        let results: Vec<CheckResult> = results
            .into_iter()
            .zip(domains)
            .map(|(slot, input)| {
                slot.unwrap_or_else(|| CheckResult::failed(input.as_str(), "no result produced"))
            })
            .collect();

        let report = BatchReport::from_results(results, started.elapsed().as_millis() as u64);
        info!(
            total = report.total_checked,
            available = report.available_count,
            unavailable = report.unavailable_count,
            errors = report.error_count(),
            duration_ms = report.duration_ms,
            "batch complete"
        );
        Ok(report)
    }

    /// Answer what the batch provider can; return the entries it could not.
    async fn run_batch_calls(
        &self,
        provider: &dyn BatchProvider,
        pending: Vec<Pending>,
        results: &mut [Option<CheckResult>],
    ) -> Vec<Pending> {
        let chunk_size = provider.max_batch_size().max(1);
        let mut leftover = Vec::new();
        let mut pending = pending.into_iter().peekable();

        while pending.peek().is_some() {
            let chunk: Vec<Pending> = pending.by_ref().take(chunk_size).collect();
            let names: Vec<String> = chunk.iter().map(|p| p.lookup.clone()).collect();

            let answers = match provider.check_batch(&names).await {
                Ok(answers) => answers,
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        count = names.len(),
                        error = %err,
                        "batch call failed, resolving chunk per domain"
                    );
                    leftover.extend(chunk);
                    continue;
                }
            };

            let by_name: HashMap<String, CheckResult> = answers
                .into_iter()
                .map(|r| (r.domain.to_lowercase(), r))
                .collect();

            for entry in chunk {
                // Duplicate names in one chunk share one answer
                match by_name.get(&entry.lookup).cloned() {
                    Some(mut result) => {
                        result.domain = entry.input;
                        results[entry.index] = Some(result);
                    }
                    None => {
                        debug!(domain = %entry.lookup, provider = provider.name(), "missing from batch reply");
                        leftover.push(entry);
                    }
                }
            }
        }

        leftover
    }

    fn check_bounds(&self, len: usize) -> Result<(), DomainCheckError> {
        if len == 0 {
            return Err(DomainCheckError::invalid_input("domains must not be empty"));
        }
        if len > self.max_batch {
            return Err(DomainCheckError::invalid_input(format!(
                "at most {} domains per batch, got {}",
                self.max_batch, len
            )));
        }
        Ok(())
    }
}

//! FetchOrchestrator
//!
//! One run goes through these stages, in order:
//!
//! 1. validate the configuration and build the [`RequestContext`]
//! 2. obtain a bearer token when the credentials ask for one
//! 3. fetch the API root document (fatal on failure)
//! 4. emit the site metadata record
//! 5. discover the fetch targets
//! 6. fetch every target, one after the other, expanding child collections
//!
//! Concurrency is confined to the pages of one target. A target whose first
//! page fails contributes nothing and the run moves on. Child collections are
//! followed as deep as the data goes; a URL already fetched under the same
//! target is not fetched again.

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::context::RequestContext;
use super::expansion::ExpansionTable;
use super::report::{HarvestSummary, TargetReport};
use super::{HarvestError, HarvestResult};
use crate::auth::authenticate;
use crate::config::HarvestConfig;
use crate::fetcher::diagnostics::format_failure;
use crate::fetcher::{
    BoundedRequestQueue, FetcherError, HttpTransport, PaginatedFetcher, Transport,
};
use crate::metrics;
use crate::routes::{discover_targets, DiscoveryOptions, RootDocument};
use crate::{FetchTarget, Record};

/// Type of the site metadata record, without the type prefix
pub const SITE_METADATA_TYPE: &str = "site_metadata";

/// Called after each discovered target (and its children) completes, with
/// the number of completed targets and the total
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &TargetReport) + Send + Sync>;

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Records in fetch order, site metadata first
    pub records: Vec<Record>,
    /// Totals and per-target reports
    pub summary: HarvestSummary,
}

/// Records and reports of one target and its children
#[derive(Default)]
struct TargetFetch {
    records: Vec<Record>,
    reports: Vec<TargetReport>,
}

/// Drives a harvest run
pub struct Harvester {
    config: HarvestConfig,
    transport: Option<Arc<dyn Transport>>,
    expansion: ExpansionTable,
    progress: Option<ProgressCallback>,
}

impl Harvester {
    /// Harvester over the shared HTTP client with the stock expansion table
    pub fn new(config: HarvestConfig) -> Self {
        let expansion = ExpansionTable::wordpress(&config.type_prefix);
        Self {
            config,
            transport: None,
            expansion,
            progress: None,
        }
    }

    /// Use `transport` instead of the shared HTTP client
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the child collection table
    pub fn with_expansion_table(mut self, expansion: ExpansionTable) -> Self {
        self.expansion = expansion;
        self
    }

    /// Report each completed target to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Run configuration
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            api_root: self.config.api_root(),
            included_routes: self.config.included_routes.clone(),
            excluded_routes: self.config.excluded_routes.clone(),
            type_prefix: self.config.type_prefix.clone(),
            use_acf: self.config.use_acf,
            acf_option_page_ids: self.config.acf_option_page_ids.clone(),
            hosting_wpcom: self.config.hosting_wpcom,
            refactored_entity_types: self.config.refactored_entity_types.clone(),
        }
    }

    fn print_banner(&self) {
        let config = &self.config;
        info!("=== wp-rest-harvester ===");
        info!("Site URL: {}", config.site_url());
        info!("Site hosted on wordpress.com: {}", config.hosting_wpcom);
        info!("Using ACF: {}", config.use_acf);
        for line in config.auth.describe() {
            info!("{line}");
        }
        info!("Verbose output: {}", config.verbose);
        info!("API root URL: {}", config.api_root());
    }

    /// Validate, authenticate and fetch the root document
    async fn prepare(&self) -> HarvestResult<(RequestContext, RootDocument)> {
        self.config.validate()?;
        if self.config.verbose {
            self.print_banner();
        }

        let transport = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(
                HttpTransport::shared().map_err(|e| HarvestError::Setup(e.reason))?,
            ),
        };

        let api_root = self.config.api_root();
        let base = RequestContext::new(transport, &self.config.auth)?;
        let token = authenticate(
            base.transport().as_ref(),
            &self.config.auth,
            self.config.hosting_wpcom,
            &api_root,
            base.headers(),
        )
        .await?;
        let context = base.with_bearer(token.as_deref())?;

        let response = context
            .transport()
            .get(&api_root, context.headers())
            .await
            .map_err(|e| {
                error!("Failed to fetch the API root document\n{}", format_failure(&e));
                HarvestError::RootDocument(e)
            })?;
        if response.body.get("routes").is_none() {
            return Err(HarvestError::InvalidRootDocument(format!(
                "{api_root} did not return a route index"
            )));
        }
        let document = RootDocument::from_value(response.body)
            .map_err(|e| HarvestError::InvalidRootDocument(e.to_string()))?;

        Ok((context, document))
    }

    /// Discover fetch targets without fetching them
    pub async fn discover(&self) -> HarvestResult<Vec<FetchTarget>> {
        let (_, document) = self.prepare().await?;
        Ok(discover_targets(&document, &self.discovery_options())?)
    }

    /// Run the whole harvest and return every record.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, a failed token exchange, or when the
    /// root document cannot be fetched. Target and page failures are
    /// reported in [`HarvestOutcome::summary`] instead.
    pub async fn run(&self) -> HarvestResult<HarvestOutcome> {
        let mut summary = HarvestSummary::start();
        let (context, document) = self.prepare().await?;

        let mut records = vec![self.site_metadata(&document)];
        summary.add_records(&records[0].type_name, 1);

        let targets = discover_targets(&document, &self.discovery_options())?;
        let fetcher = PaginatedFetcher::new(
            context.transport(),
            context.headers().clone(),
            self.config.per_page,
            BoundedRequestQueue::from_signed(self.config.concurrent_requests),
        );

        let total = targets.len();
        for (index, target) in targets.into_iter().enumerate() {
            let mut visited = HashSet::from([target.url.clone()]);
            let fetched = self.fetch_target(&fetcher, target, 0, &mut visited).await;
            records.extend(fetched.records);

            for report in fetched.reports {
                if report.depth == 0 {
                    if let Some(progress) = &self.progress {
                        progress(index + 1, total, &report);
                    }
                }
                summary.push(report);
            }
        }

        summary.finish();
        info!(
            records = summary.total_records(),
            targets = summary.targets,
            failed_targets = summary.failed_targets.len(),
            omitted_pages = summary.omitted_pages,
            "Harvest finished in {:.2}s",
            summary.elapsed().as_secs_f64()
        );

        Ok(HarvestOutcome { records, summary })
    }

    fn site_metadata(&self, document: &RootDocument) -> Record {
        let text = |value: &Option<String>| value.clone().map_or(Value::Null, Value::String);

        let mut fields = Map::new();
        fields.insert("name".to_string(), text(&document.name));
        fields.insert("description".to_string(), text(&document.description));
        fields.insert("url".to_string(), text(&document.url));
        fields.insert("home".to_string(), text(&document.home));

        Record::new(format!("{}{SITE_METADATA_TYPE}", self.config.type_prefix), fields)
    }

    /// Fetch one target, then its child collections depth-first.
    ///
    /// `visited` holds every URL fetched so far below the discovered target.
    fn fetch_target<'a>(
        &'a self,
        fetcher: &'a PaginatedFetcher,
        target: FetchTarget,
        depth: usize,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, TargetFetch> {
        async move {
            let mut out = TargetFetch::default();
            let started = Instant::now();

            let (records, omitted_pages, failed) = match fetcher.fetch_all(&target.url).await {
                Ok(fetch) => {
                    let records = into_records(&target, fetch.body.into_values());
                    (records, fetch.failed_pages.len(), false)
                }
                Err(e) => {
                    log_target_failure(&target, &e);
                    (Vec::new(), 0, true)
                }
            };

            let report = TargetReport {
                type_name: target.type_name.clone(),
                url: target.url.clone(),
                records: records.len(),
                elapsed: started.elapsed(),
                omitted_pages,
                failed,
                depth,
            };
            metrics::record_records_fetched(&report.type_name, report.records);
            metrics::record_target_duration(&report.type_name, report.elapsed);
            info!(
                type_name = %report.type_name,
                records = report.records,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Fetched {} records of {}",
                report.records,
                report.type_name
            );

            let children: Vec<FetchTarget> = if self.expansion.has_children(&target.type_name) {
                records.iter().flat_map(|r| self.expansion.children_of(r)).collect()
            } else {
                Vec::new()
            };

            out.records = records;
            out.reports.push(report);

            for child in children {
                if !visited.insert(child.url.clone()) {
                    warn!(
                        type_name = %child.type_name,
                        "Skipping {}: already fetched under {}",
                        child.url,
                        target.type_name
                    );
                    continue;
                }
                let fetched = self.fetch_target(fetcher, child, depth + 1, &mut *visited).await;
                out.records.extend(fetched.records);
                out.reports.extend(fetched.reports);
            }
            out
        }
        .boxed()
    }
}

/// Tag fetched values with the target's type; non-objects are dropped
fn into_records(target: &FetchTarget, values: Vec<Value>) -> Vec<Record> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match Record::from_value(&target.type_name, value) {
            Some(record) => {
                records.push(record.with_option_page_id(target.option_page_id.clone()))
            }
            None => warn!(
                type_name = %target.type_name,
                "Skipping an item of {} that is not a JSON object",
                target.url
            ),
        }
    }
    records
}

fn log_target_failure(target: &FetchTarget, err: &FetcherError) {
    match err {
        FetcherError::Http(http) => error!(
            type_name = %target.type_name,
            "Target failed, no records fetched\n{}",
            format_failure(http)
        ),
        other => error!(
            type_name = %target.type_name,
            "Target failed, no records fetched: {other}"
        ),
    }
}

//! Attempt scheduler - bounded dispatch of probes and credential exchanges.
//!
//! Probes go through `scanner::probe_all`. Credential attempts are paced by
//! the timing policy and then spawned onto a `JoinSet`. Both draw permits
//! from one semaphore owned by the scheduler, so batches running side by
//! side share a single ceiling and the dispatcher blocks once it is reached.

mod plan;
mod report;

pub use plan::{plan_exhaustive, plan_pairs_spray, plan_spray, AttackMode};
pub use report::{BatchSummary, RunStats, ScanReport};

use crate::auth::{AttemptRecord, CredentialExchange, FtpExchange, Protocol, SmtpExchange};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::scanner::{probe_all, ProbeResult, Prober, RateLimiter, TcpProber};
use crate::store::ResultStore;
use crate::timing::TimingPolicy;
use crate::types::{Credential, CredentialSource, Port, Target};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Dispatches probe and credential jobs for one engine instance.
pub struct AttemptScheduler {
    config: Arc<EngineConfig>,
    store: ResultStore,
    prober: Arc<dyn Prober>,
    exchanges: HashMap<Protocol, Arc<dyn CredentialExchange>>,
    timing: TimingPolicy,
    permits: Arc<Semaphore>,
    rate_limiter: Option<RateLimiter>,
    verbose: bool,
}

impl AttemptScheduler {
    /// Build a scheduler with the TCP prober and the FTP and SMTP exchanges.
    pub fn new(config: EngineConfig, store: ResultStore) -> EngineResult<Self> {
        config.validate()?;

        let prober: Arc<dyn Prober> = Arc::new(
            TcpProber::new(config.timeout(), config.grab_banner)
                .with_banner_timeout(config.banner_timeout()),
        );

        let mut exchanges: HashMap<Protocol, Arc<dyn CredentialExchange>> = HashMap::new();
        exchanges.insert(Protocol::Ftp, Arc::new(FtpExchange::new(config.timeout())));
        exchanges.insert(
            Protocol::Smtp,
            Arc::new(SmtpExchange::new(config.timeout()).with_helo(config.smtp_helo.clone())),
        );

        Ok(Self {
            timing: TimingPolicy::new(config.timing_mode, config.timing.clone()),
            permits: Arc::new(Semaphore::new(config.concurrency)),
            rate_limiter: RateLimiter::new(config.max_rate),
            config: Arc::new(config),
            store,
            prober,
            exchanges,
            verbose: false,
        })
    }

    /// Replace the prober.
    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    /// Register an exchange, replacing any existing one for its protocol.
    pub fn with_exchange(mut self, exchange: Arc<dyn CredentialExchange>) -> Self {
        self.exchanges.insert(exchange.protocol(), exchange);
        self
    }

    /// Show a progress bar for probe batches.
    pub fn with_progress(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn exchange(&self, protocol: Protocol) -> Option<Arc<dyn CredentialExchange>> {
        self.exchanges.get(&protocol).cloned()
    }

    /// Tag stored with each attempt, e.g. `spray/business-aware`.
    pub fn technique(&self) -> String {
        format!("{}/{}", self.config.attack_mode, self.timing.mode())
    }

    /// Build the attempt plan selected by the configured attack mode.
    ///
    /// Explicit pairs are tried as listed; lists are crossed.
    pub fn plan(&self, credentials: &CredentialSource) -> Vec<Credential> {
        let pairs = credentials.pairs();
        if !pairs.is_empty() {
            return match self.config.attack_mode {
                AttackMode::Exhaustive => pairs.to_vec(),
                AttackMode::Spray => plan_pairs_spray(pairs, self.config.spray_top_k),
            };
        }

        match self.config.attack_mode {
            AttackMode::Exhaustive => plan_exhaustive(credentials.users(), credentials.passwords()),
            AttackMode::Spray => plan_spray(
                credentials.users(),
                credentials.passwords(),
                self.config.spray_top_k,
            ),
        }
    }

    /// Run one credential plan against one endpoint.
    ///
    /// Each attempt waits out the timing delay and a concurrency permit
    /// before it is spawned; all attempts are joined before returning.
    /// Successful attempts are recorded as they complete.
    pub async fn run_attempts(
        &self,
        exchange: Arc<dyn CredentialExchange>,
        target: &Target,
        port: Port,
        plan: Vec<Credential>,
    ) -> BatchSummary {
        let addr = SocketAddr::new(target.ip, port.as_u16());
        let protocol = exchange.protocol();
        let technique = self.technique();
        debug!(%addr, %protocol, jobs = plan.len(), %technique, "credential batch");

        let mut jobs = JoinSet::new();
        let mut summary = BatchSummary::default();

        for credential in plan {
            tokio::time::sleep(self.timing.next_delay()).await;

            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let exchange = Arc::clone(&exchange);
            let store = self.store.clone();
            let target = target.clone();
            let technique = technique.clone();

            summary.dispatched += 1;
            jobs.spawn(async move {
                let outcome = exchange.attempt(addr, &credential).await;
                drop(permit);

                if let Some(ref rejection) = outcome.rejection {
                    debug!(%addr, %credential, %rejection, "attempt rejected");
                }
                let record = AttemptRecord::from_outcome(
                    protocol, target, port, credential, technique, outcome,
                );
                store.record_attempt(record)
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    warn!(error = %e, "attempt task failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            %addr,
            %protocol,
            dispatched = summary.dispatched,
            succeeded = summary.succeeded,
            "credential batch finished"
        );
        summary
    }

    /// Probe every port on every target; open ports are recorded.
    pub async fn run_probes(&self, targets: &[Target], ports: &[Port]) -> Vec<ProbeResult> {
        let jobs: Vec<(Target, Port)> = targets
            .iter()
            .flat_map(|t| ports.iter().map(move |&p| (t.clone(), p)))
            .collect();
        let total = jobs.len();
        info!(
            targets = targets.len(),
            ports = ports.len(),
            timeout_ms = self.prober.timeout().as_millis() as u64,
            "probe batch"
        );

        let progress = self.verbose.then(|| progress_bar(total as u64));

        let results = probe_all(
            Arc::clone(&self.prober),
            jobs,
            self.config.concurrency,
            Arc::clone(&self.permits),
            self.rate_limiter.clone(),
            progress.as_ref(),
        )
        .await;

        if let Some(pb) = progress {
            pb.finish_with_message("probes complete");
        }

        for result in &results {
            self.store.record_probe(result.clone());
        }
        results
    }

    /// Probe, then run credential plans against every open FTP or SMTP port.
    pub async fn run(
        &self,
        targets: &[Target],
        ports: &[Port],
        credentials: &CredentialSource,
    ) -> ScanReport {
        let report = ScanReport::new(self.technique());
        let already_found = self.store.credentials().len();
        let probes = self.run_probes(targets, ports).await;

        let mut attempts = BatchSummary::default();
        let mut found = Vec::new();
        if !credentials.is_empty() {
            for probe in probes
                .iter()
                .filter(|p| p.is_open() && p.supports_credential_exchange())
            {
                let Some(protocol) = probe.service().and_then(Protocol::for_service) else {
                    continue;
                };
                let Some(exchange) = self.exchange(protocol) else {
                    continue;
                };
                let batch = self
                    .run_attempts(exchange, probe.target(), probe.port(), self.plan(credentials))
                    .await;
                attempts.merge(batch);
            }
            found = self.store.credentials().split_off(already_found);
        }

        report.finalize(targets.len(), probes, attempts, found)
    }

    /// Run credential plans against known endpoints without probing first.
    pub async fn run_attack(
        &self,
        targets: &[Target],
        protocol: Protocol,
        port: Port,
        credentials: &CredentialSource,
    ) -> ScanReport {
        let report = ScanReport::new(self.technique());
        let already_found = self.store.credentials().len();
        let mut attempts = BatchSummary::default();

        if let Some(exchange) = self.exchange(protocol) {
            for target in targets {
                let batch = self
                    .run_attempts(Arc::clone(&exchange), target, port, self.plan(credentials))
                    .await;
                attempts.merge(batch);
            }
        }

        let found = self.store.credentials().split_off(already_found);
        report.finalize(targets.len(), Vec::new(), attempts, found)
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

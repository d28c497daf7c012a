//! Simulation engine adapter for offline/demo use and deterministic testing.
//!
//! Satisfies the same [`EngineAdapter`] contract as a real probe: presence
//! is drawn from a parameterized probability and, when present, position,
//! citation count, and observed URLs are derived randomly. The URL pool may
//! or may not include the tracked domain, which exercises the "present but
//! uncited" recommendation rule.
//!
//! ## Usage
//!
//! ```rust
//! use aevis_engines::SimulationAdapter;
//!
//! let adapter = SimulationAdapter::new("Gemini")
//!     .with_presence_rate(1.0)
//!     .with_seed(42);
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use aevis_core::{
    defaults, BrandContext, EngineAdapter, EngineAnswer, EngineId, Error, Keyword, Result,
};

/// Filler sites that pad the simulated URL pool.
const URL_POOL: [&str; 2] = ["othersite.example", "review-hub.example"];

#[derive(Debug, Clone)]
struct SimulationConfig {
    /// Probability that the brand is present in the simulated answer.
    presence_rate: f64,
    /// Probability that a present answer cites the tracked domain.
    domain_citation_rate: f64,
    /// Probability that a call fails outright (tests the retry path).
    failure_rate: f64,
    /// Artificial latency per call.
    latency: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            presence_rate: defaults::SIMULATION_PRESENCE_RATE,
            domain_citation_rate: 0.6,
            failure_rate: 0.0,
            latency: Duration::ZERO,
        }
    }
}

/// Simulated answer engine.
pub struct SimulationAdapter {
    id: EngineId,
    display_name: String,
    config: SimulationConfig,
    /// Seeded RNG for deterministic tests; falls back to `thread_rng`.
    rng: Option<Arc<Mutex<StdRng>>>,
    /// Remaining forced failures, consumed before any probability draw.
    forced_failures: AtomicU32,
}

impl SimulationAdapter {
    /// Create a simulation adapter for the named engine.
    pub fn new(engine: impl Into<String>) -> Self {
        let name = engine.into();
        Self {
            id: EngineId::new(name.clone()),
            display_name: name,
            config: SimulationConfig::default(),
            rng: None,
            forced_failures: AtomicU32::new(0),
        }
    }

    /// Set the presence probability (clamped to `[0, 1]`).
    pub fn with_presence_rate(mut self, rate: f64) -> Self {
        self.config.presence_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the probability that a present answer cites the tracked domain.
    pub fn with_domain_citation_rate(mut self, rate: f64) -> Self {
        self.config.domain_citation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the probability that a call fails outright.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.config.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Force the next `n` calls to fail, then behave normally.
    ///
    /// Exercises the orchestrator's retry-then-degrade handling without
    /// probabilistic flakiness.
    pub fn with_forced_failures(self, n: u32) -> Self {
        self.forced_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Set artificial per-call latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.config.latency = latency;
        self
    }

    /// Seed the adapter's RNG for deterministic draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))));
        self
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        keyword: &Keyword,
        brand: &BrandContext,
    ) -> EngineAnswer {
        let presence = rng.gen::<f64>() < self.config.presence_rate;
        if !presence {
            return EngineAnswer {
                presence: false,
                position: None,
                answer_snippet: format!(
                    "Simulated check for \"{}\" on {}...",
                    keyword.text, self.display_name
                ),
                citations_count: 0,
                observed_urls: Vec::new(),
            };
        }

        let cites_domain = rng.gen::<f64>() < self.config.domain_citation_rate;
        let mut observed_urls: Vec<String> = Vec::new();
        if cites_domain {
            observed_urls.push(brand.domain.clone());
        }
        observed_urls.push(URL_POOL[rng.gen_range(0..URL_POOL.len())].to_string());

        EngineAnswer {
            presence: true,
            position: Some(rng.gen_range(1..=3)),
            answer_snippet: format!(
                "Simulated check for \"{}\" on {}...",
                keyword.text, self.display_name
            ),
            citations_count: rng.gen_range(1..=5),
            observed_urls,
        }
    }

    fn should_fail(&self) -> bool {
        // Forced failures take precedence over probability draws so tests
        // can script exact outcomes.
        let mut remaining = self.forced_failures.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.forced_failures.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => remaining = actual,
            }
        }

        if self.config.failure_rate > 0.0 {
            let draw = match &self.rng {
                Some(rng) => rng.lock().unwrap().gen::<f64>(),
                None => rand::thread_rng().gen::<f64>(),
            };
            return draw < self.config.failure_rate;
        }
        false
    }
}

#[async_trait]
impl EngineAdapter for SimulationAdapter {
    fn engine(&self) -> &EngineId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn check(&self, keyword: &Keyword, brand: &BrandContext) -> Result<EngineAnswer> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        if self.should_fail() {
            return Err(Error::EngineAdapter(format!(
                "{}: simulated outage",
                self.display_name
            )));
        }

        let answer = match &self.rng {
            Some(rng) => {
                let mut rng = rng.lock().unwrap();
                self.sample(&mut *rng, keyword, brand)
            }
            None => self.sample(&mut rand::thread_rng(), keyword, brand),
        };
        Ok(answer)
    }
}

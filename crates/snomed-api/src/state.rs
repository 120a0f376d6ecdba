//! Application state management
//!
//! Author: hephaex@gmail.com

use snomed_core::{AppConfig, EntityExtractor};
use snomed_extractor::GeminiExtractor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Failed extraction counter
    pub failed_count: AtomicU64,
    /// Entity extractor (absent when no credential is configured)
    pub extractor: Option<Arc<dyn EntityExtractor>>,
}

impl AppState {
    /// Create application state, building the Gemini client from config
    pub fn new(config: AppConfig) -> Self {
        let extractor: Option<Arc<dyn EntityExtractor>> =
            match GeminiExtractor::from_config(&config.gemini) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "Entity extraction disabled");
                    None
                }
            };

        Self::build(config, extractor)
    }

    /// Create application state with an injected extractor
    pub fn with_extractor(config: AppConfig, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self::build(config, Some(extractor))
    }

    fn build(config: AppConfig, extractor: Option<Arc<dyn EntityExtractor>>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            extractor,
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Increment failed extraction counter
    pub fn increment_failures(&self) -> u64 {
        self.failed_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn get_failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.extractor.is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

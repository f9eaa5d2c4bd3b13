use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::config::AppConfig;
use crate::error::RelayError;
use crate::transport::{HttpTransport, PreparedVendor};

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub transport: HttpTransport,
    vendors: Vec<PreparedVendor>,
    vendor_index: FxHashMap<String, usize>,
    default_vendor: usize,
    request_ids: RequestIdGenerator,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, transport: HttpTransport) -> Self {
        let vendors: Vec<PreparedVendor> =
            config.vendors.iter().map(PreparedVendor::new).collect();
        let vendor_index = vendors
            .iter()
            .enumerate()
            .map(|(index, vendor)| (vendor.name().to_string(), index))
            .collect();
        let default_vendor = config.default_vendor_index();

        Self {
            config,
            transport,
            vendors,
            vendor_index,
            default_vendor,
            request_ids: RequestIdGenerator::new(),
        }
    }

    /// Resolve the relay target for a request: a named vendor, or the default.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidRequest`] when the named vendor is not
    /// configured.
    pub fn resolve_vendor(&self, name: Option<&str>) -> Result<&PreparedVendor, RelayError> {
        match name {
            None => self
                .vendors
                .get(self.default_vendor)
                .ok_or_else(|| RelayError::Config("no vendors configured".to_string())),
            Some(name) => self
                .vendor_index
                .get(name)
                .and_then(|&index| self.vendors.get(index))
                .ok_or_else(|| {
                    RelayError::InvalidRequest(format!("unknown vendor '{name}'"))
                }),
        }
    }

    #[must_use]
    pub fn vendors(&self) -> &[PreparedVendor] {
        &self.vendors
    }

    #[must_use]
    pub fn default_vendor_name(&self) -> &str {
        self.vendors
            .get(self.default_vendor)
            .map_or("<none>", PreparedVendor::name)
    }

    #[must_use]
    pub fn next_request_id(&self) -> uuid::Uuid {
        self.request_ids.next()
    }
}

struct RequestIdGenerator {
    seed: u128,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    #[must_use]
    fn new() -> Self {
        let seed_hi = u128::from(fastrand::u64(..));
        let seed_lo = u128::from(fastrand::u64(..));
        Self {
            seed: (seed_hi << 64) | seed_lo,
            counter: AtomicU64::new(1),
        }
    }

    #[must_use]
    fn next(&self) -> uuid::Uuid {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        uuid::Uuid::from_u128(self.seed ^ u128::from(seq))
    }
}

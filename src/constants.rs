//! Panel Constants
//!
//! Centralized defaults shared by the controllers and the configuration layer.

/// API prefix of the extension routes on the remote server
pub const DEFAULT_API_PREFIX: &str = "/lnbits_cloud_connect/api/v1";

/// Currency list endpoint (not under the extension prefix)
pub const CURRENCIES_PATH: &str = "/api/v1/currencies";

/// Currency that is always offered, before and regardless of the remote list
pub const BASE_CURRENCY: &str = "sat";

/// Default server address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Request header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Pagination defaults
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10;
pub const DEFAULT_PAGE: u32 = 1;

/// Background tunnel refresh period
pub const TUNNEL_POLL_INTERVAL_SECS: u64 = 30;

/// One-shot refresh after a connect request is accepted
pub const CONNECT_SETTLE_DELAY_MS: u64 = 2000;

/// Search debounce; zero keeps the immediate baseline behaviour
pub const SEARCH_DEBOUNCE_MS: u64 = 0;

/// Time a requested connect/disconnect may take before a warning is raised
pub const TRANSITION_TIMEOUT_SECS: u64 = 15;

/// Bounded notification history
pub const NOTIFICATION_LOG_CAPACITY: usize = 500;

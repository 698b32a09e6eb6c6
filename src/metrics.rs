use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, IntCounterVec, register_counter, register_gauge, register_int_counter_vec,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "athan_gateway_requests_total",
        "Intercepted requests by cache route",
        &["route"]
    )
    .unwrap();
    pub static ref CACHE_HITS: IntCounterVec = register_int_counter_vec!(
        "athan_gateway_cache_hits_total",
        "Cache hits by route",
        &["route"]
    )
    .unwrap();
    pub static ref CACHE_MISSES: IntCounterVec = register_int_counter_vec!(
        "athan_gateway_cache_misses_total",
        "Cache misses by route",
        &["route"]
    )
    .unwrap();
    pub static ref NETWORK_FAILURES: Counter =
        register_counter!("athan_gateway_network_failures_total", "Failed upstream fetches").unwrap();
    pub static ref SYNC_RUNS: IntCounterVec = register_int_counter_vec!(
        "athan_gateway_sync_runs_total",
        "Background sync runs by outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref NOTIFICATIONS_SHOWN: Counter =
        register_counter!("athan_gateway_notifications_shown_total", "Notifications presented").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("athan_gateway_cache_size", "Current number of cached entries").unwrap();
}

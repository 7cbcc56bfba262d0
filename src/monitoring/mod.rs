/*!
 * Monitoring
 * Tracing initialization for the watchdog
 */

mod tracer;

pub use tracer::{init_tracing, TRACE_JSON_ENV};

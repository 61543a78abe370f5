//! HTTP middleware stack.

pub mod client_ip;
pub mod cors;
pub mod rate_limit;
pub mod trace;

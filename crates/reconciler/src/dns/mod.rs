//! DNS publishers — PowerDNS, Azure DNS, and etcd-backed CoreDNS. Each is a
//! one-shot or periodic side effect invoked at startup (§6, §9).

pub mod azure;
pub mod coredns;
pub mod pdns;

//! Background services that feed the shared state.
//!
//! ARCHITECTURE
//! ============
//! Services own the write side of the telemetry store so route handlers can
//! stay read-only views and thin command adapters.

pub mod ingest;
pub mod simulate;

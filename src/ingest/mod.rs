//! Ingestion boundary.
//!
//! Everything that enters the canonical model passes through here:
//! user-imported CSV snapshots (`csv`) and remote service payloads
//! (`remote`), each validated before becoming `InstrumentPoint`s.

pub mod csv;
pub mod remote;

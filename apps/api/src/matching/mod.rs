// Deterministic matching engine: taxonomy → feature extraction → criteria → scoring.
// Everything here is pure and synchronous; no I/O, no logging, no shared state.

pub mod criteria;
pub mod features;
pub mod scorer;
pub mod taxonomy;

// Candidate assessment record and everything that produces or transforms one:
// normalization of untrusted records, the rule-side builder, the hybrid blend,
// deduplication and anonymization.
pub mod dedup;
pub mod hybrid;
pub mod model;
pub mod normalizer;
pub mod privacy;
pub mod rule;

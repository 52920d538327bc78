// =============================================================================
// Data Providers
// =============================================================================
//
// HTTP clients for the external data sources. All network failures and empty
// payloads are resolved here — either into valid, validated series or into an
// explicit error — before anything reaches the analysis pipeline.

pub mod eodhd;
pub mod fred;

// =============================================================================
// API Layer — REST endpoints and authentication
// =============================================================================

pub mod auth;
pub mod rest;

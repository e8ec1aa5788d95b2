// Trade valuation and deal construction. Re-exports the modules so the
// binary, integration tests and embedders share one public API.

pub mod import;
pub mod trade;
pub mod valuation;

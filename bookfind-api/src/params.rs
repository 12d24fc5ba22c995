//! Fixed request parameters for the catalog volumes endpoint.

/// Query issued automatically on first activation of the search page.
pub const BOOTSTRAP_QUERY: &str = "React";

/// Language restriction applied to every search.
pub const LANG_RESTRICT: &str = "en";

/// Single-batch result cap; the page shows one batch, no pagination.
pub const MAX_RESULTS: u32 = 16;

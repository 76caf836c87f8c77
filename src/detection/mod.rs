pub mod brand_impersonation;
pub mod content;
pub mod whitelist;

pub use brand_impersonation::{BrandEntry, BrandImpersonationDetector, BrandTable};
pub use content::ContentAnalyzer;
pub use whitelist::WhitelistMatcher;

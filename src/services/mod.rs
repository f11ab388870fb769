pub mod credential_resolver;
pub mod query_service;
pub mod reports;
pub mod result_normalizer;

pub use credential_resolver::{CredentialResolver, CONVENTIONAL_KEY_FILES};
pub use query_service::QueryService;
pub use reports::{
    DailyFeePoint, DailyFeesSummary, Report, ReportKind, ReportService, ReportSummary,
    TopAssetsSummary,
};
pub use result_normalizer::normalize;

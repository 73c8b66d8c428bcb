mod assembler;
mod normalize;

pub use assembler::{assemble_report, EligibilityReport, ReportLine, REPORT_TITLE};
pub use normalize::normalize_symbols;

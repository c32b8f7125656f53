//! Invoice line parsing and price recomputation.

mod parser;
pub mod pricing;

pub use parser::{LineParser, ParseOutcome, SkipReason, SkippedLine, parse, parse_number};
pub use pricing::{Priced, Pricing};

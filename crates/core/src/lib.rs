pub mod amounts;
pub mod document;
pub mod row;

pub use amounts::{format_amount, normalize, DecimalStyle, WithholdingAmounts};
pub use document::{DocumentModel, ParsedIdentity};
pub use row::{ConsolidatedRow, OutputConfig, HEADER};

pub mod batch;
pub mod classify;
pub mod nfe;
pub mod nfse;
pub mod report;
pub mod xml;

use thiserror::Error;

use reten_core::{ParsedIdentity, WithholdingAmounts};

pub use batch::{process_uploads, BatchOutcome, ProcessingError, Upload};
pub use classify::{classify, Classification, NFE_NS, NFSE_NS};
pub use report::{csv_bytes, write_csv};
pub use xml::{parse_document, Element, XmlError};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    Xml(#[from] XmlError),
    /// Parses fine but matches neither the NFe nor the ABRASF NFSe layout.
    #[error("document matches neither the NFe nor the NFSe layout")]
    Unrecognized,
    #[error("missing expected {0} structure")]
    MissingStructure(&'static str),
}

/// Run the single-document pipeline: parse once, classify, extract.
pub fn analyze_document(
    xml: &[u8],
) -> Result<(ParsedIdentity, WithholdingAmounts), ExtractError> {
    let root = parse_document(xml)?;
    match classify::classify(&root) {
        Classification::Nfe => nfe::extract_root(&root),
        Classification::Nfse => Ok(nfse::extract_root(&root)),
        Classification::Unknown => Err(ExtractError::Unrecognized),
    }
}

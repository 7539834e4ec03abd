use serde::Serialize;
use std::fmt;

/// The two fiscal-document families the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentModel {
    Nfe,
    Nfse,
}

impl fmt::Display for DocumentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentModel::Nfe => write!(f, "NFe"),
            DocumentModel::Nfse => write!(f, "NFSe"),
        }
    }
}

/// Identification fields pulled from one classified document.
///
/// Every field except `model` is optional: real-world issuers omit fields
/// freely, and absence is not an extraction error. `issued_at` keeps the
/// document's raw text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdentity {
    pub model: DocumentModel,
    /// NFe access key with its scheme prefix stripped; never set for NFSe.
    pub key: Option<String>,
    pub number: Option<String>,
    pub series: Option<String>,
    pub issued_at: Option<String>,
    pub issuer_tax_id: Option<String>,
    pub recipient_tax_id: Option<String>,
}

impl ParsedIdentity {
    /// The access key when present, otherwise the document number.
    pub fn key_or_number(&self) -> Option<&str> {
        self.key.as_deref().or(self.number.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_display() {
        assert_eq!(DocumentModel::Nfe.to_string(), "NFe");
        assert_eq!(DocumentModel::Nfse.to_string(), "NFSe");
    }

    #[test]
    fn key_wins_over_number() {
        let id = ParsedIdentity {
            model: DocumentModel::Nfe,
            key: Some("35170712345678000195550010000000021000000022".into()),
            number: Some("2".into()),
            series: None,
            issued_at: None,
            issuer_tax_id: None,
            recipient_tax_id: None,
        };
        assert_eq!(
            id.key_or_number(),
            Some("35170712345678000195550010000000021000000022")
        );
    }

    #[test]
    fn number_used_when_key_absent() {
        let id = ParsedIdentity {
            model: DocumentModel::Nfse,
            key: None,
            number: Some("1042".into()),
            series: None,
            issued_at: None,
            issuer_tax_id: None,
            recipient_tax_id: None,
        };
        assert_eq!(id.key_or_number(), Some("1042"));
    }
}

use serde::Serialize;

use crate::amounts::{format_amount, DecimalStyle, WithholdingAmounts};
use crate::document::ParsedIdentity;

/// Column order of the consolidated report. Fixed; the CSV writer and the
/// row accessor below must stay in sync with it.
pub const HEADER: [&str; 17] = [
    "file",
    "model",
    "key_or_number",
    "series",
    "issue_date",
    "issuer_tax_id",
    "recipient_tax_id",
    "PIS_withheld",
    "COFINS_withheld",
    "CSLL_withheld",
    "IRRF_withheld",
    "INSS_withheld",
    "ISS_withheld",
    "ICMS_ST_total",
    "has_federal_withholding",
    "has_iss_withheld",
    "has_any_withholding",
];

const YES: &str = "SIM";
const NO: &str = "NÃO";

/// Rendering choices for the consolidated report. Always passed explicitly —
/// the extraction core stays a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub decimal_style: DecimalStyle,
    pub delimiter: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        // PT-BR conventions of the source documents.
        Self {
            decimal_style: DecimalStyle::Comma,
            delimiter: b';',
        }
    }
}

/// One display-formatted report line: source file, identity fields and the
/// withholding amounts rendered as fixed two-decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedRow {
    pub file: String,
    pub model: String,
    pub key_or_number: Option<String>,
    pub series: Option<String>,
    pub issue_date: Option<String>,
    pub issuer_tax_id: Option<String>,
    pub recipient_tax_id: Option<String>,
    #[serde(rename = "PIS_withheld")]
    pub pis_withheld: String,
    #[serde(rename = "COFINS_withheld")]
    pub cofins_withheld: String,
    #[serde(rename = "CSLL_withheld")]
    pub csll_withheld: String,
    #[serde(rename = "IRRF_withheld")]
    pub irrf_withheld: String,
    #[serde(rename = "INSS_withheld")]
    pub inss_withheld: String,
    #[serde(rename = "ISS_withheld")]
    pub iss_withheld: String,
    #[serde(rename = "ICMS_ST_total")]
    pub icms_st_total: String,
    pub has_federal_withholding: String,
    pub has_iss_withheld: String,
    pub has_any_withholding: String,
}

fn yes_no(v: bool) -> String {
    if v { YES.into() } else { NO.into() }
}

impl ConsolidatedRow {
    /// Flatten an identity and its amounts into one report line.
    pub fn assemble(
        file: impl Into<String>,
        identity: &ParsedIdentity,
        amounts: &WithholdingAmounts,
        config: &OutputConfig,
    ) -> Self {
        let style = config.decimal_style;
        ConsolidatedRow {
            file: file.into(),
            model: identity.model.to_string(),
            key_or_number: identity.key_or_number().map(str::to_string),
            series: identity.series.clone(),
            issue_date: identity.issued_at.clone(),
            issuer_tax_id: identity.issuer_tax_id.clone(),
            recipient_tax_id: identity.recipient_tax_id.clone(),
            pis_withheld: format_amount(amounts.pis, style),
            cofins_withheld: format_amount(amounts.cofins, style),
            csll_withheld: format_amount(amounts.csll, style),
            irrf_withheld: format_amount(amounts.irrf, style),
            inss_withheld: format_amount(amounts.inss, style),
            iss_withheld: format_amount(amounts.iss, style),
            icms_st_total: format_amount(amounts.icms_st, style),
            has_federal_withholding: yes_no(amounts.has_federal_withholding()),
            has_iss_withheld: yes_no(amounts.has_iss_withheld()),
            has_any_withholding: yes_no(amounts.has_any_withholding()),
        }
    }

    /// Field values in `HEADER` order; absent identity fields render empty.
    pub fn record(&self) -> [&str; 17] {
        [
            &self.file,
            &self.model,
            self.key_or_number.as_deref().unwrap_or(""),
            self.series.as_deref().unwrap_or(""),
            self.issue_date.as_deref().unwrap_or(""),
            self.issuer_tax_id.as_deref().unwrap_or(""),
            self.recipient_tax_id.as_deref().unwrap_or(""),
            &self.pis_withheld,
            &self.cofins_withheld,
            &self.csll_withheld,
            &self.irrf_withheld,
            &self.inss_withheld,
            &self.iss_withheld,
            &self.icms_st_total,
            &self.has_federal_withholding,
            &self.has_iss_withheld,
            &self.has_any_withholding,
        ]
    }
}

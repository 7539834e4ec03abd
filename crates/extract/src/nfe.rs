use reten_core::{normalize, DocumentModel, ParsedIdentity, WithholdingAmounts};

use crate::classify::NFE_NS;
use crate::xml::{parse_document, Element};
use crate::ExtractError;

/// Width of the scheme prefix on the `infNFe` Id attribute ("NFe...").
const KEY_PREFIX_LEN: usize = 3;

/// Extract identity and withholding amounts from NFe bytes.
pub fn extract(xml: &[u8]) -> Result<(ParsedIdentity, WithholdingAmounts), ExtractError> {
    let root = parse_document(xml)?;
    extract_root(&root)
}

pub(crate) fn extract_root(
    root: &Element,
) -> Result<(ParsedIdentity, WithholdingAmounts), ExtractError> {
    let ns = Some(NFE_NS);

    // Canonical namespace first, bare local name second — same tolerance as
    // the classifier.
    let inf_nfe = root
        .descendant(ns, "infNFe")
        .or_else(|| root.descendant(None, "infNFe"))
        .ok_or(ExtractError::MissingStructure("infNFe"))?;

    let identity = ParsedIdentity {
        model: DocumentModel::Nfe,
        key: inf_nfe.attr("Id").and_then(strip_key_prefix),
        number: inf_nfe.path_text(ns, &["ide", "nNF"]).map(str::to_string),
        series: inf_nfe.path_text(ns, &["ide", "serie"]).map(str::to_string),
        issued_at: inf_nfe.path_text(ns, &["ide", "dhEmi"]).map(str::to_string),
        issuer_tax_id: inf_nfe.path_text(ns, &["emit", "CNPJ"]).map(str::to_string),
        recipient_tax_id: inf_nfe
            .path_text(ns, &["dest", "CNPJ"])
            .or_else(|| inf_nfe.path_text(ns, &["dest", "CPF"]))
            .map(str::to_string),
    };

    let total = inf_nfe.child(ns, "total");
    let lookup = |path: &[&str]| total.and_then(|t| t.path_text(ns, path));

    let amounts = WithholdingAmounts {
        pis: normalize(lookup(&["retTrib", "vRetPIS"])),
        cofins: normalize(lookup(&["retTrib", "vRetCOFINS"])),
        csll: normalize(lookup(&["retTrib", "vRetCSLL"])),
        irrf: normalize(lookup(&["retTrib", "vIRRF"])),
        inss: normalize(lookup(&["retTrib", "vRetPrev"])),
        iss: normalize(lookup(&["ISSQNtot", "vISSRet"])),
        icms_st: normalize(lookup(&["ICMSTot", "vST"])),
        iss_flag: false,
    };

    Ok((identity, amounts))
}

/// Strip the fixed-width scheme prefix from the access key. Values no longer
/// than the prefix yield no key at all, so row assembly falls back to the
/// document number.
fn strip_key_prefix(id: &str) -> Option<String> {
    id.get(KEY_PREFIX_LEN..)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

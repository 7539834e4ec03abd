use reten_core::{normalize, DocumentModel, ParsedIdentity, WithholdingAmounts};

use crate::classify::NFSE_NS;
use crate::xml::{parse_document, Element};
use crate::ExtractError;

/// Extract identity and withholding amounts from ABRASF NFSe bytes.
pub fn extract(xml: &[u8]) -> Result<(ParsedIdentity, WithholdingAmounts), ExtractError> {
    let root = parse_document(xml)?;
    Ok(extract_root(&root))
}

/// Infallible once the document is parsed: every field is optional and a
/// missing `Valores` block simply means all amounts are zero.
pub(crate) fn extract_root(root: &Element) -> (ParsedIdentity, WithholdingAmounts) {
    let ns = Some(NFSE_NS);

    // Schema variant tolerance: `Valores` nests under `Servico` in the
    // canonical layout but appears at other depths in municipal dialects.
    let valores = root
        .descendant_path(ns, &["Servico", "Valores"])
        .or_else(|| root.descendant(ns, "Valores"));
    let amount = |tag: &str| normalize(valores.and_then(|v| v.child(ns, tag)).and_then(Element::text));

    // The explicit marker and the amount are independent signals; a document
    // may flag withholding before the amount shows up, or vice versa.
    let iss_flag = root
        .descendant_path(ns, &["Servico", "IssRetido"])
        .or_else(|| root.descendant(ns, "IssRetido"))
        .and_then(Element::text)
        .is_some_and(|t| t == "1");

    let amounts = WithholdingAmounts {
        pis: amount("ValorPis"),
        cofins: amount("ValorCofins"),
        csll: amount("ValorCsll"),
        irrf: amount("ValorIr"),
        inss: amount("ValorInss"),
        iss: amount("ValorIss"),
        iss_flag,
        ..Default::default()
    };

    let identity = ParsedIdentity {
        model: DocumentModel::Nfse,
        key: None,
        number: root.descendant_text(ns, "Numero").map(str::to_string),
        series: None,
        issued_at: root.descendant_text(ns, "DataEmissao").map(str::to_string),
        issuer_tax_id: root
            .descendant_path_text(ns, &["Prestador", "CpfCnpj", "Cnpj"])
            .map(str::to_string),
        recipient_tax_id: root
            .descendant_path_text(ns, &["Tomador", "IdentificacaoTomador", "CpfCnpj", "Cnpj"])
            .map(str::to_string),
    };

    (identity, amounts)
}

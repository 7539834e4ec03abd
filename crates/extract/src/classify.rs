use crate::xml::Element;

/// Canonical NFe namespace.
pub const NFE_NS: &str = "http://www.portalfiscal.inf.br/nfe";
/// Canonical ABRASF NFSe namespace.
pub const NFSE_NS: &str = "http://www.abrasf.org.br/nfse.xsd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Nfe,
    Nfse,
    /// Neither layout recognized; callers must not attempt extraction.
    Unknown,
}

/// Decide which document family a parsed root belongs to.
///
/// The stages run in a fixed order: canonical NFe markers, canonical ABRASF
/// markers, then a bare-tag probe that ignores namespaces entirely. The
/// last stage is deliberate — municipal NFSe issuers deviate from the
/// canonical namespace declaration while keeping the element shape.
pub fn classify(root: &Element) -> Classification {
    if is_nfe(root) {
        return Classification::Nfe;
    }
    if is_nfse(root) {
        return Classification::Nfse;
    }
    if root.descendant(None, "infNFe").is_some() {
        return Classification::Nfe;
    }
    if root.descendant(None, "Servico").is_some() {
        return Classification::Nfse;
    }
    Classification::Unknown
}

fn is_nfe(root: &Element) -> bool {
    root.tag.ends_with("nfeProc")
        || root.tag.ends_with("NFe")
        || root
            .namespace
            .as_deref()
            .is_some_and(|ns| ns.contains("portalfiscal.inf.br/nfe"))
}

fn is_nfse(root: &Element) -> bool {
    if root
        .namespace
        .as_deref()
        .is_some_and(|ns| ns.contains("abrasf.org.br/nfse.xsd"))
    {
        return true;
    }
    let ns = Some(NFSE_NS);
    root.descendant(ns, "Servico").is_some()
        || root.descendant(ns, "InfNfse").is_some()
        || root.descendant(ns, "InfDeclaracaoPrestacaoServico").is_some()
}

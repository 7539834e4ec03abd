use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decimal separator used when rendering amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalStyle {
    /// PT-BR style: `1234,56`.
    #[default]
    Comma,
    /// US style: `1234.56`.
    Dot,
}

/// Normalize a textual amount into an exact decimal.
///
/// Accepts either `.` or `,` as the fractional separator. Absent, empty or
/// malformed input resolves to zero — withholding fields are frequently
/// missing from real documents and must not abort extraction.
pub fn normalize(raw: Option<&str>) -> Decimal {
    let Some(s) = raw else {
        return Decimal::ZERO;
    };
    let s = s.trim();
    if s.is_empty() {
        return Decimal::ZERO;
    }
    // Source documents carry no thousands grouping, so a plain substitution
    // is enough to cover both separator conventions.
    Decimal::from_str(&s.replace(',', ".")).unwrap_or(Decimal::ZERO)
}

/// Render an amount with exactly two decimal places and no thousands
/// separator.
pub fn format_amount(amount: Decimal, style: DecimalStyle) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let s = format!("{rounded:.2}");
    match style {
        DecimalStyle::Comma => s.replace('.', ","),
        DecimalStyle::Dot => s,
    }
}

/// Withholding amounts collected from a single fiscal document.
///
/// `icms_st` is only populated for NFe; `iss_flag` mirrors the NFSe
/// `IssRetido` marker and is always false for NFe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WithholdingAmounts {
    pub pis: Decimal,
    pub cofins: Decimal,
    pub csll: Decimal,
    pub irrf: Decimal,
    pub inss: Decimal,
    pub iss: Decimal,
    pub icms_st: Decimal,
    pub iss_flag: bool,
}

impl WithholdingAmounts {
    /// True iff any of the five federal amounts is positive.
    pub fn has_federal_withholding(&self) -> bool {
        [self.pis, self.cofins, self.csll, self.irrf, self.inss]
            .iter()
            .any(|v| *v > Decimal::ZERO)
    }

    /// True iff the ISS amount is positive or the document carries the
    /// explicit `IssRetido` marker. A document may flag withholding before
    /// the amount shows up, or vice versa; both signals are kept.
    pub fn has_iss_withheld(&self) -> bool {
        self.iss > Decimal::ZERO || self.iss_flag
    }

    pub fn has_any_withholding(&self) -> bool {
        self.has_federal_withholding() || self.has_iss_withheld()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── normalize ─────────────────────────────────────────────────────────────

    #[test]
    fn normalize_comma_and_dot_are_equivalent() {
        assert_eq!(normalize(Some("1234,56")), normalize(Some("1234.56")));
        assert_eq!(normalize(Some("1234,56")), dec("1234.56"));
    }

    #[test]
    fn normalize_absent_is_zero() {
        assert_eq!(normalize(None), Decimal::ZERO);
        assert_eq!(normalize(Some("")), Decimal::ZERO);
        assert_eq!(normalize(Some("   ")), Decimal::ZERO);
    }

    #[test]
    fn normalize_malformed_is_zero() {
        assert_eq!(normalize(Some("abc")), Decimal::ZERO);
        assert_eq!(normalize(Some("1.234,56")), Decimal::ZERO);
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(normalize(Some(" 10,00 ")), dec("10.00"));
    }

    #[test]
    fn normalize_whole_number() {
        assert_eq!(normalize(Some("10")), dec("10"));
    }

    // ── format_amount ─────────────────────────────────────────────────────────

    #[test]
    fn format_two_decimals() {
        assert_eq!(format_amount(dec("10"), DecimalStyle::Dot), "10.00");
        assert_eq!(format_amount(dec("10"), DecimalStyle::Comma), "10,00");
    }

    #[test]
    fn format_no_thousands_separator() {
        assert_eq!(format_amount(dec("1234567.8"), DecimalStyle::Dot), "1234567.80");
        assert_eq!(format_amount(dec("1234567.8"), DecimalStyle::Comma), "1234567,80");
    }

    #[test]
    fn format_rounds_to_two_places() {
        assert_eq!(format_amount(dec("0.005"), DecimalStyle::Dot), "0.01");
    }

    #[test]
    fn format_normalize_round_trip() {
        let original = normalize(Some("1234,56"));
        let rendered = format_amount(original, DecimalStyle::Comma);
        assert_eq!(normalize(Some(&rendered)), original);
    }

    // ── flags ─────────────────────────────────────────────────────────────────

    #[test]
    fn no_amounts_means_no_flags() {
        let w = WithholdingAmounts::default();
        assert!(!w.has_federal_withholding());
        assert!(!w.has_iss_withheld());
        assert!(!w.has_any_withholding());
    }

    #[test]
    fn single_federal_amount_sets_federal_flag() {
        let w = WithholdingAmounts {
            pis: dec("10.00"),
            ..Default::default()
        };
        assert!(w.has_federal_withholding());
        assert!(!w.has_iss_withheld());
        assert!(w.has_any_withholding());
    }

    #[test]
    fn iss_flag_dominates_absent_amount() {
        let w = WithholdingAmounts {
            iss_flag: true,
            ..Default::default()
        };
        assert_eq!(w.iss, Decimal::ZERO);
        assert!(w.has_iss_withheld());
        assert!(w.has_any_withholding());
        assert!(!w.has_federal_withholding());
    }

    #[test]
    fn iss_amount_alone_sets_iss_flag() {
        let w = WithholdingAmounts {
            iss: dec("5.00"),
            ..Default::default()
        };
        assert!(w.has_iss_withheld());
    }

    #[test]
    fn icms_st_does_not_count_as_withholding() {
        let w = WithholdingAmounts {
            icms_st: dec("99.99"),
            ..Default::default()
        };
        assert!(!w.has_any_withholding());
    }
}

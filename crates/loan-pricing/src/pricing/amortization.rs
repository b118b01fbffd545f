//! Reducing-balance annuity math shared by every lender.

/// Monthly rate from an annual percentage, e.g. `8.8` → `0.007333…`.
fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Largest principal an `emi` can service over `tenure_years` at the given rate.
///
/// `loan = emi × (1 − (1 + r)^−n) / r`. Non-positive tenure or EMI yields zero.
pub fn loan_from_emi(emi: f64, tenure_years: u32, annual_rate_percent: f64) -> f64 {
    if tenure_years == 0 || emi <= 0.0 {
        return 0.0;
    }

    let months = (tenure_years * 12) as i32;
    let r = monthly_rate(annual_rate_percent);
    if r <= 0.0 {
        return emi * months as f64;
    }

    emi * (1.0 - (1.0 + r).powi(-months)) / r
}

/// Installment that repays `principal` over `tenure_years`.
///
/// `emi = P × r × (1 + r)^n / ((1 + r)^n − 1)`.
pub fn emi_from_loan(principal: f64, tenure_years: u32, annual_rate_percent: f64) -> f64 {
    if tenure_years == 0 || principal <= 0.0 {
        return 0.0;
    }

    let months = (tenure_years * 12) as i32;
    let r = monthly_rate(annual_rate_percent);
    if r <= 0.0 {
        return principal / months as f64;
    }

    let factor = (1.0 + r).powi(months);
    principal * r * factor / (factor - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value() {
        // 1 lakh at 12% over one year repays at ~8,884.88 a month.
        let emi = emi_from_loan(100_000.0, 1, 12.0);
        assert!((emi - 8_884.88).abs() < 0.01);
        let loan = loan_from_emi(8_884.88, 1, 12.0);
        assert!((loan - 100_000.0).abs() < 1.0);
    }

    #[test]
    fn zero_tenure_yields_no_loan() {
        assert_eq!(loan_from_emi(25_000.0, 0, 8.8), 0.0);
        assert_eq!(emi_from_loan(1_000_000.0, 0, 8.8), 0.0);
    }

    #[test]
    fn zero_rate_is_linear() {
        assert_eq!(loan_from_emi(10_000.0, 10, 0.0), 1_200_000.0);
        assert_eq!(emi_from_loan(1_200_000.0, 10, 0.0), 10_000.0);
    }

    #[test]
    fn emi_survives_loan_round_trip() {
        for (emi, years, rate) in [
            (25_750.0, 29, 8.8),
            (59_050.0, 20, 9.35),
            (1_234.56, 5, 10.25),
            (180_000.0, 30, 7.5),
        ] {
            let loan = loan_from_emi(emi, years, rate);
            let back = emi_from_loan(loan, years, rate);
            let tolerance = 1e-6 * emi.max(1.0);
            assert!((back - emi).abs() < tolerance, "{emi} {years} {rate}");
        }
    }
}

//! Deal underwriting metrics computed from a reconciled valuation.
//!
//! Pure arithmetic over the aggregate value/rent figures and user-supplied
//! purchase terms. Percent-heavy and intentionally in f64: these are
//! screening metrics, not ledger entries.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User-supplied terms of a prospective deal.
#[derive(Debug, Clone, Deserialize)]
pub struct DealInputs {
    /// Purchase price, currency units.
    pub purchase: Decimal,
    /// Renovation budget, currency units.
    pub reno: Decimal,
    /// Intended hold period for the cash-flow projection, months.
    pub hold_months: u32,
}

/// Underwriting assumptions. All percentage fields are whole percents
/// (ltv 80 means 80%).
#[derive(Debug, Clone, Deserialize)]
pub struct UnderwritingSettings {
    pub ltv: f64,
    /// Annual interest rate on the financed portion.
    pub interest: f64,
    pub amortization_years: u32,
    pub vacancy: f64,
    pub maintenance: f64,
    pub management: f64,
    pub brokerage: f64,
    pub sales_closing: f64,
    pub acquisition: f64,
    /// Baseline days-to-exit before renovation scope extends it.
    pub hold_days_base: u32,
}

impl Default for UnderwritingSettings {
    fn default() -> Self {
        Self {
            ltv: 80.0,
            interest: 6.0,
            amortization_years: 30,
            vacancy: 5.0,
            maintenance: 5.0,
            management: 8.0,
            brokerage: 5.0,
            sales_closing: 2.0,
            acquisition: 1.0,
            hold_days_base: 60,
        }
    }
}

/// Screening metrics for one deal.
#[derive(Debug, Clone, Serialize)]
pub struct DealMetrics {
    pub net_profit: f64,
    /// Flip return on invested cash, percent.
    pub roi: f64,
    pub cap_rate: f64,
    /// Monthly cash flow after debt service and operating reserves.
    pub cash_flow: f64,
    pub cash_on_cash: f64,
    /// Per-month internal rate of return over the hold, percent.
    pub irr: f64,
    /// All-in cost basis.
    pub basis: f64,
}

/// Evaluate a deal against the reconciled value (`arv`) and rent figures.
pub fn evaluate(
    inputs: &DealInputs,
    settings: &UnderwritingSettings,
    arv: Decimal,
    rent: Option<Decimal>,
) -> DealMetrics {
    let purchase = inputs.purchase.to_f64().unwrap_or(0.0);
    let reno = inputs.reno.to_f64().unwrap_or(0.0);
    let arv = arv.to_f64().unwrap_or(0.0);
    let rent = rent.and_then(|r| r.to_f64()).unwrap_or(0.0);

    // Every $10k of renovation extends the exit timeline by a week.
    let hold_days = settings.hold_days_base as f64 + (reno / 10_000.0).floor() * 7.0;
    let hold_months = hold_days / 30.0;
    let monthly_carrying = (0.007 * purchase).max(500.0);
    let carrying = monthly_carrying * hold_months;

    let sale_costs = arv * (settings.brokerage + settings.sales_closing) / 100.0;
    let acquisition_costs = purchase * settings.acquisition / 100.0;
    let net_profit = arv - purchase - reno - carrying - sale_costs - acquisition_costs;

    let down = purchase * (1.0 - settings.ltv / 100.0);
    let total_invest = down + reno;
    let roi = if total_invest > 0.0 {
        net_profit / total_invest * 100.0
    } else {
        0.0
    };

    let operating_pct = settings.vacancy + settings.maintenance + settings.management;
    let noi = rent * 12.0 * (1.0 - operating_pct / 100.0);
    let cap_rate = if purchase > 0.0 {
        noi / purchase * 100.0
    } else {
        0.0
    };

    let mortgage_monthly = monthly_payment(
        purchase * settings.ltv / 100.0,
        settings.interest,
        settings.amortization_years,
    );
    let cash_flow = rent - mortgage_monthly - rent * operating_pct / 100.0;
    let cash_on_cash = if down > 0.0 {
        cash_flow * 12.0 / down * 100.0
    } else {
        0.0
    };

    let terminal = arv - down - carrying - sale_costs;
    let mut cashflows = Vec::with_capacity(inputs.hold_months as usize + 2);
    cashflows.push(-down - reno);
    cashflows.extend(std::iter::repeat(cash_flow).take(inputs.hold_months as usize));
    cashflows.push(terminal);

    DealMetrics {
        net_profit,
        roi,
        cap_rate,
        cash_flow,
        cash_on_cash,
        irr: irr(&cashflows) * 100.0,
        basis: purchase + reno + carrying + acquisition_costs,
    }
}

/// Standard amortized payment on `principal` at `annual_rate` percent.
fn monthly_payment(principal: f64, annual_rate: f64, amortization_years: u32) -> f64 {
    if amortization_years == 0 || principal <= 0.0 {
        return 0.0;
    }
    let n = f64::from(amortization_years * 12);
    let rate = annual_rate / 100.0 / 12.0;
    if rate == 0.0 {
        return principal / n;
    }
    principal * rate / (1.0 - (1.0 + rate).powf(-n))
}

/// Per-period internal rate of return by bisection; 0 when the cash flows
/// never change sign.
fn irr(cashflows: &[f64]) -> f64 {
    if cashflows.len() < 2 {
        return 0.0;
    }

    let npv = |rate: f64| -> f64 {
        cashflows
            .iter()
            .enumerate()
            .map(|(i, cf)| cf / (1.0 + rate).powi(i as i32))
            .sum()
    };

    let mut lo = -0.99;
    let mut hi = 10.0;
    let (npv_lo, npv_hi) = (npv(lo), npv(hi));
    if npv_lo.signum() == npv_hi.signum() {
        return 0.0;
    }

    for _ in 0..128 {
        let mid = (lo + hi) / 2.0;
        let value = npv(mid);
        if value.abs() < 1e-9 {
            return mid;
        }
        if value.signum() == npv_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() < tolerance
    }

    fn standard_deal() -> (DealInputs, UnderwritingSettings) {
        (
            DealInputs {
                purchase: dec!(200000),
                reno: dec!(20000),
                hold_months: 12,
            },
            UnderwritingSettings::default(),
        )
    }

    #[test]
    fn flip_metrics_match_hand_computation() {
        let (inputs, settings) = standard_deal();
        let metrics = evaluate(&inputs, &settings, dec!(300000), Some(dec!(1800)));

        // hold 60 + 2*7 = 74 days; carrying 1400/mo * 74/30 = 3453.33;
        // sale costs 21000; acquisition 2000
        assert!(close(metrics.net_profit, 53_546.67, 0.5));
        assert!(close(metrics.roi, 89.24, 0.05));
        assert!(close(metrics.basis, 225_453.33, 0.5));
    }

    #[test]
    fn rental_metrics_match_hand_computation() {
        let (inputs, settings) = standard_deal();
        let metrics = evaluate(&inputs, &settings, dec!(300000), Some(dec!(1800)));

        // NOI 21600 * 0.82 = 17712
        assert!(close(metrics.cap_rate, 8.856, 0.005));
        // 160k loan at 6%/30y amortizes to ~959.28/mo
        assert!(close(metrics.cash_flow, 516.72, 0.25));
        assert!(close(metrics.cash_on_cash, 15.50, 0.05));
        assert!(metrics.irr > 0.0);
    }

    #[test]
    fn carrying_cost_has_a_floor() {
        let settings = UnderwritingSettings::default();
        let inputs = DealInputs {
            purchase: dec!(50000),
            reno: dec!(0),
            hold_months: 6,
        };
        let metrics = evaluate(&inputs, &settings, dec!(80000), None);

        // 0.007 * 50000 = 350 is below the 500 floor; 60-day hold
        // carries 500 * 2 = 1000
        let expected_basis = 50_000.0 + 0.0 + 1_000.0 + 500.0;
        assert!(close(metrics.basis, expected_basis, 0.01));
    }

    #[test]
    fn no_rent_means_zero_rental_metrics() {
        let (inputs, settings) = standard_deal();
        let metrics = evaluate(&inputs, &settings, dec!(300000), None);

        assert_eq!(metrics.cap_rate, 0.0);
        assert!(metrics.cash_flow < 0.0); // debt service with no income
    }

    #[test]
    fn irr_is_zero_without_a_sign_change() {
        assert_eq!(irr(&[0.0, 100.0, 100.0]), 0.0);
        assert_eq!(irr(&[1000.0]), 0.0);
    }

    #[test]
    fn zero_amortization_means_no_debt_service() {
        let mut settings = UnderwritingSettings::default();
        settings.amortization_years = 0;
        let inputs = DealInputs {
            purchase: dec!(200000),
            reno: dec!(0),
            hold_months: 12,
        };
        let metrics = evaluate(&inputs, &settings, dec!(300000), Some(dec!(1800)));

        // cash flow is rent minus operating reserves only
        assert!(close(metrics.cash_flow, 1800.0 - 324.0, 0.01));
    }
}

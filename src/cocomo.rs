use crate::types::{CocomoParams, CostEstimate, TierParams};

/// COCOMO II estimate from a raw code-line count.
///
/// Pure and total: every non-negative line count produces an estimate. The
/// calibration table and salary come in through [`CocomoParams`] so callers
/// control them explicitly; nothing here reads global state.
pub fn estimate(code_lines: u64, params: &CocomoParams) -> CostEstimate {
    let kloc = code_lines as f64 / 1000.0;
    let tier = select_tier(kloc, &params.tiers);

    let effort = tier.a * kloc.powf(tier.b);
    let duration = tier.c * effort.powf(tier.d);
    let headcount = if duration > 0.0 { effort / duration } else { 0.0 };
    let productivity = if effort > 0.0 {
        code_lines as f64 / effort
    } else {
        0.0
    };

    CostEstimate {
        kloc,
        effort_person_months: effort,
        duration_months: duration,
        headcount,
        maintenance_headcount: headcount * params.maintenance_ratio,
        expansion_headcount: headcount * params.expansion_ratio,
        productivity,
        cost: effort * params.monthly_salary,
        complexity: tier.tier,
    }
}

/// First tier whose upper bound contains `kloc`. The last default tier is
/// unbounded, so the fallback only fires for a NaN input.
fn select_tier(kloc: f64, tiers: &[TierParams; 3]) -> &TierParams {
    tiers.iter().find(|t| kloc <= t.max_kloc).unwrap_or(&tiers[2])
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComplexityTier;

    #[test]
    fn test_tier_boundaries() {
        let params = CocomoParams::default();
        assert_eq!(
            select_tier(50.0, &params.tiers).tier,
            ComplexityTier::Low,
            "50 KLOC exactly should still be the low tier"
        );
        assert_eq!(
            select_tier(50.0001, &params.tiers).tier,
            ComplexityTier::Medium,
            "Anything past 50 KLOC should be the mid tier"
        );
        assert_eq!(
            select_tier(300.0, &params.tiers).tier,
            ComplexityTier::Medium,
            "300 KLOC exactly should still be the mid tier"
        );
        assert_eq!(
            select_tier(300.0001, &params.tiers).tier,
            ComplexityTier::High,
            "Anything past 300 KLOC should be the high tier"
        );
    }

    #[test]
    fn test_estimate_tier_selection_from_lines() {
        let params = CocomoParams::default();
        assert_eq!(estimate(50_000, &params).complexity, ComplexityTier::Low);
        assert_eq!(estimate(50_001, &params).complexity, ComplexityTier::Medium);
        assert_eq!(estimate(300_001, &params).complexity, ComplexityTier::High);
    }

    #[test]
    fn test_organic_ten_kloc() {
        let params = CocomoParams::default();
        let est = estimate(10_000, &params);

        // effort = 2.4 * 10^1.05
        assert!(
            (est.effort_person_months - 26.928).abs() < 0.01,
            "Expected ~26.93 person-months, got {:.3}",
            est.effort_person_months
        );
        assert!(
            (est.headcount - est.effort_person_months / est.duration_months).abs() < 1e-9,
            "Headcount must equal effort/duration"
        );
        assert!(
            (est.maintenance_headcount - est.headcount * 0.18).abs() < 1e-9,
            "Maintenance headcount must be 18% of headcount"
        );
        assert!(
            (est.expansion_headcount - est.headcount * 0.30).abs() < 1e-9,
            "Expansion headcount must be 30% of headcount"
        );
        assert!(
            (est.cost - est.effort_person_months * params.monthly_salary).abs() < 1e-6,
            "Cost must be effort times monthly salary"
        );
        assert!(
            (est.productivity - 10_000.0 / est.effort_person_months).abs() < 1e-9,
            "Productivity must be code lines per person-month of effort"
        );
    }

    #[test]
    fn test_zero_lines_is_all_zero() {
        let est = estimate(0, &CocomoParams::default());
        assert_eq!(est.kloc, 0.0);
        assert_eq!(est.effort_person_months, 0.0);
        assert_eq!(est.duration_months, 0.0);
        assert_eq!(est.headcount, 0.0, "Zero duration must not divide");
        assert_eq!(est.productivity, 0.0, "Zero effort must not divide");
        assert_eq!(est.cost, 0.0);
        assert_eq!(est.complexity, ComplexityTier::Low);
    }

    #[test]
    fn test_salary_scales_cost_only() {
        let base = estimate(10_000, &CocomoParams::default());
        let pricey = estimate(
            10_000,
            &CocomoParams {
                monthly_salary: 30_000.0,
                ..CocomoParams::default()
            },
        );
        assert!(
            (pricey.cost - base.cost * 2.0).abs() < 1e-6,
            "Doubling salary should double cost"
        );
        assert_eq!(
            pricey.effort_person_months, base.effort_person_months,
            "Salary must not affect effort"
        );
    }
}

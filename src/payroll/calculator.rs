//! Pure payroll math: maps a period aggregate and the active salary rule
//! set to a monetary breakdown. No side effects, deterministic, and
//! independent of component order.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::salary_component::{ComponentKind, SalaryComponent};

/// Views are rewarded per completed bucket of this many views.
pub const VIEW_BUCKET_SIZE: i64 = 1000;

/// Flat withholding applied once to the gross total. Policy constant, not
/// a salary component: promoting it to configuration would let an edit
/// change the meaning of already-generated ledger rows.
pub fn tax_rate() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

/// Per-author activity in one calendar month, derived from the article
/// store and never persisted.
#[derive(Debug, Clone)]
pub struct AuthorPeriodAggregate {
    pub author_id: i64,
    pub month: u32,
    pub year: i32,
    pub published_articles: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollBreakdown {
    pub articles_count: i64,
    /// Sum of `Fixed` components.
    pub base: Decimal,
    /// Sum of `PerArticle` contributions.
    pub article_bonus: Decimal,
    /// Sum of `PerViewBucket` contributions.
    pub view_bonus: Decimal,
    pub gross: Decimal,
    pub deductions: Decimal,
    pub total: Decimal,
}

pub fn compute(
    aggregate: &AuthorPeriodAggregate,
    components: &[SalaryComponent],
) -> PayrollBreakdown {
    let articles = Decimal::from(aggregate.published_articles);
    let buckets = Decimal::from(aggregate.total_views / VIEW_BUCKET_SIZE);

    let mut base = Decimal::ZERO;
    let mut article_bonus = Decimal::ZERO;
    let mut view_bonus = Decimal::ZERO;

    for component in components {
        match component.kind {
            ComponentKind::Fixed => base += component.value,
            ComponentKind::PerArticle => article_bonus += component.value * articles,
            // Contributions sum when several bucket components are
            // configured; each applies to the same completed buckets.
            ComponentKind::PerViewBucket => view_bonus += component.value * buckets,
        }
    }

    let gross = base + article_bonus + view_bonus;
    let deductions = gross * tax_rate();
    let total = gross - deductions;

    PayrollBreakdown {
        articles_count: aggregate.published_articles,
        base,
        article_bonus,
        view_bonus,
        gross,
        deductions,
        total,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn component(id: i64, kind: ComponentKind, value: &str) -> SalaryComponent {
        SalaryComponent {
            id,
            name: format!("component-{id}"),
            kind,
            value: dec(value),
            is_active: true,
        }
    }

    fn aggregate(published_articles: i64, total_views: i64) -> AuthorPeriodAggregate {
        AuthorPeriodAggregate {
            author_id: 1,
            month: 5,
            year: 2025,
            published_articles,
            total_views,
        }
    }

    fn default_components() -> Vec<SalaryComponent> {
        vec![
            component(1, ComponentKind::Fixed, "3000000"),
            component(2, ComponentKind::PerArticle, "50000"),
            component(3, ComponentKind::PerViewBucket, "10000"),
        ]
    }

    #[test]
    fn reference_scenario_three_articles_2500_views() {
        // 3 articles with views 500 + 800 + 1200 = 2500
        let breakdown = compute(&aggregate(3, 2500), &default_components());

        assert_eq!(breakdown.article_bonus, dec("150000"));
        assert_eq!(breakdown.view_bonus, dec("20000"));
        assert_eq!(breakdown.gross, dec("3170000"));
        assert_eq!(breakdown.deductions, dec("158500"));
        assert_eq!(breakdown.total, dec("3011500"));
    }

    #[test]
    fn idle_author_earns_fixed_components_only() {
        let breakdown = compute(&aggregate(0, 0), &default_components());

        assert_eq!(breakdown.gross, dec("3000000"));
        assert_eq!(breakdown.article_bonus, Decimal::ZERO);
        assert_eq!(breakdown.view_bonus, Decimal::ZERO);
        assert_eq!(breakdown.total, dec("2850000"));
    }

    #[test]
    fn tax_is_applied_exactly_once() {
        let breakdown = compute(&aggregate(3, 2500), &default_components());

        assert_eq!(breakdown.deductions, breakdown.gross * tax_rate());
        assert_eq!(breakdown.total, breakdown.gross - breakdown.deductions);
    }

    #[test]
    fn views_below_a_full_bucket_earn_nothing() {
        let breakdown = compute(&aggregate(1, 999), &default_components());
        assert_eq!(breakdown.view_bonus, Decimal::ZERO);

        let breakdown = compute(&aggregate(1, 1000), &default_components());
        assert_eq!(breakdown.view_bonus, dec("10000"));
    }

    // Pins the decision on the rule set's view-bucket semantics: several
    // PerViewBucket components accumulate instead of the last one winning.
    #[test]
    fn multiple_view_bucket_components_sum() {
        let components = vec![
            component(1, ComponentKind::PerViewBucket, "10000"),
            component(2, ComponentKind::PerViewBucket, "5000"),
        ];
        let breakdown = compute(&aggregate(0, 2500), &components);

        assert_eq!(breakdown.view_bonus, dec("30000"));
        assert_eq!(breakdown.gross, dec("30000"));
    }

    #[test]
    fn component_order_does_not_change_totals() {
        let mut reversed = default_components();
        reversed.reverse();

        let a = compute(&aggregate(7, 12345), &default_components());
        let b = compute(&aggregate(7, 12345), &reversed);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_rule_set_produces_zero_slip() {
        let breakdown = compute(&aggregate(10, 99999), &[]);
        assert_eq!(breakdown.gross, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::ZERO);
    }
}

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub nurse_earnings: Decimal,
    pub platform_fee: Decimal,
    pub total: Decimal,
}

/// Rounds to cents with banker's rounding so repeated rounding does not drift.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// The fee is charged on top of the nurse's earnings, not taken out of them.
pub fn split_payment(hours: Decimal, hourly_rate: Decimal, platform_fee_rate: Decimal) -> PaymentSplit {
    let nurse_earnings = round_money(hours * hourly_rate);
    let platform_fee = round_money(nurse_earnings * platform_fee_rate);
    PaymentSplit {
        nurse_earnings,
        platform_fee,
        total: nurse_earnings + platform_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_hours_at_fifty_with_fifteen_percent_fee() {
        let split = split_payment(Decimal::from(10), Decimal::from(50), Decimal::new(15, 2));
        assert_eq!(split.nurse_earnings.to_string(), "500.00");
        assert_eq!(split.platform_fee.to_string(), "75.00");
        assert_eq!(split.total.to_string(), "575.00");
    }

    #[test]
    fn midpoints_round_to_even() {
        assert_eq!(round_money(Decimal::new(125, 3)).to_string(), "0.12");
        assert_eq!(round_money(Decimal::new(135, 3)).to_string(), "0.14");
        assert_eq!(round_money(Decimal::new(-125, 3)).to_string(), "-0.12");
    }

    #[test]
    fn total_is_exact_sum_of_rounded_parts() {
        let hours = Decimal::from(7) / Decimal::from(3);
        let split = split_payment(hours, Decimal::new(3333, 2), Decimal::new(175, 3));
        assert_eq!(split.total, split.nurse_earnings + split.platform_fee);
        assert_eq!(split.nurse_earnings.to_string(), "77.77");
        assert_eq!(split.platform_fee.to_string(), "13.61");
    }

    #[test]
    fn zero_fee_leaves_earnings_untouched() {
        let split = split_payment(Decimal::new(75, 1), Decimal::new(4250, 2), Decimal::ZERO);
        assert_eq!(split.nurse_earnings.to_string(), "318.75");
        assert_eq!(split.platform_fee.to_string(), "0.00");
        assert_eq!(split.total.to_string(), "318.75");
    }
}

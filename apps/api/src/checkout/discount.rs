//! Discount code arithmetic and validity rules. Pure functions over the
//! stored code row; the handlers own the lookup.

use chrono::{DateTime, Utc};

use crate::models::discount::DiscountCodeRow;

/// Discount amount in cents for a percentage code. Rounds down so the
/// charged amount never undershoots.
pub fn apply_discount(amount_cents: i64, percent_off: i32) -> i64 {
    let percent = i64::from(percent_off).clamp(0, 100);
    amount_cents * percent / 100
}

/// Checks a code row against the purchase it is being applied to.
pub fn code_valid(row: &DiscountCodeRow, product: &str, now: DateTime<Utc>) -> Result<(), String> {
    if !row.active {
        return Err("code is no longer active".to_string());
    }
    if row.product != product {
        return Err(format!("code does not apply to product {product}"));
    }
    if let Some(expires_at) = row.expires_at {
        if expires_at <= now {
            return Err("code has expired".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn make_code(product: &str, percent_off: i32) -> DiscountCodeRow {
        DiscountCodeRow {
            id: Uuid::new_v4(),
            code: "WELCOME15".to_string(),
            product: product.to_string(),
            percent_off,
            bonus_credits: 3,
            active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_discount_rounds_down() {
        assert_eq!(apply_discount(999, 15), 149); // 149.85
        assert_eq!(apply_discount(1000, 15), 150);
        assert_eq!(apply_discount(1, 50), 0);
    }

    #[test]
    fn test_discount_bounds() {
        assert_eq!(apply_discount(1000, 0), 0);
        assert_eq!(apply_discount(1000, 100), 1000);
        // Out-of-range percentages clamp instead of overshooting.
        assert_eq!(apply_discount(1000, 150), 1000);
        assert_eq!(apply_discount(1000, -5), 0);
    }

    #[test]
    fn test_valid_code_passes() {
        let row = make_code("resume_credits", 15);
        assert!(code_valid(&row, "resume_credits", Utc::now()).is_ok());
    }

    #[test]
    fn test_inactive_code_rejected() {
        let mut row = make_code("resume_credits", 15);
        row.active = false;
        let err = code_valid(&row, "resume_credits", Utc::now()).unwrap_err();
        assert!(err.contains("active"));
    }

    #[test]
    fn test_wrong_product_rejected() {
        let row = make_code("resume_credits", 15);
        let err = code_valid(&row, "sop_credits", Utc::now()).unwrap_err();
        assert!(err.contains("sop_credits"));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut row = make_code("resume_credits", 15);

        row.expires_at = Some(now + Duration::hours(1));
        assert!(code_valid(&row, "resume_credits", now).is_ok());

        row.expires_at = Some(now);
        assert!(code_valid(&row, "resume_credits", now).is_err());

        row.expires_at = Some(now - Duration::hours(1));
        assert!(code_valid(&row, "resume_credits", now).is_err());
    }
}

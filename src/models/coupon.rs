use super::{default_true, new_id};
use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub name: String,
    pub discount: f64,
    pub usage_limit: i64,
    #[serde(default)]
    pub usage_count: i64,
    pub expiry_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a coupon cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    #[error("Coupon has expired")]
    Expired,

    #[error("Coupon usage limit exceeded")]
    UsageLimitExceeded,
}

impl From<Ineligible> for ApiError {
    fn from(reason: Ineligible) -> Self {
        ApiError::Rejected(reason.to_string())
    }
}

impl Coupon {
    /// Eligible iff `now <= expiry_date` and `usage_count < usage_limit`.
    /// Expiry is checked first, so an expired and exhausted coupon reports
    /// `Expired`.
    pub fn check_eligibility(&self, now: DateTime<Utc>) -> Result<(), Ineligible> {
        if now > self.expiry_date {
            return Err(Ineligible::Expired);
        }
        if self.usage_count >= self.usage_limit {
            return Err(Ineligible::UsageLimitExceeded);
        }
        Ok(())
    }

    /// Check eligibility and consume one use.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<(), Ineligible> {
        self.check_eligibility(now)?;
        self.usage_count += 1;
        Ok(())
    }

    pub fn create(input: CouponInput) -> Result<Self, ApiError> {
        let mut v = Violations::new();
        v.required("code", input.code.as_ref());
        v.required("name", input.name.as_ref());
        v.required("discount", input.discount.as_ref());
        v.required("usageLimit", input.usage_limit.as_ref());
        v.required("expiryDate", input.expiry_date.as_ref());
        input.check(&mut v);
        if let Some(limit) = input.usage_limit {
            check_counters(&mut v, input.usage_count.unwrap_or(0), limit);
        }
        v.into_result()?;
        let Some(expiry_date) = input.expiry_date else {
            return Err(ApiError::invalid("expiryDate", "is required"));
        };

        Ok(Self {
            id: new_id(),
            code: input.code.unwrap_or_default(),
            name: input.name.unwrap_or_default(),
            discount: input.discount.unwrap_or_default(),
            usage_limit: input.usage_limit.unwrap_or(1),
            usage_count: input.usage_count.unwrap_or(0),
            expiry_date,
            is_active: input.is_active.unwrap_or(true),
            created_at: Utc::now(),
        })
    }

    /// Validated against the merged counters, so an update cannot leave
    /// `usageCount` above `usageLimit`.
    pub fn apply(&mut self, input: CouponInput) -> Result<(), ApiError> {
        let mut v = Violations::new();
        input.check(&mut v);
        check_counters(
            &mut v,
            input.usage_count.unwrap_or(self.usage_count),
            input.usage_limit.unwrap_or(self.usage_limit),
        );
        v.into_result()?;

        if let Some(code) = input.code {
            self.code = code;
        }
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(discount) = input.discount {
            self.discount = discount;
        }
        if let Some(limit) = input.usage_limit {
            self.usage_limit = limit;
        }
        if let Some(count) = input.usage_count {
            self.usage_count = count;
        }
        if let Some(expiry) = input.expiry_date {
            self.expiry_date = expiry;
        }
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

impl Document for Coupon {
    const COLLECTION: &'static str = "coupons";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("code", self.code.clone())]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub discount: Option<f64>,
    pub usage_limit: Option<i64>,
    pub usage_count: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

fn check_counters(v: &mut Violations, count: i64, limit: i64) {
    if count > limit {
        v.push("usageCount", "must not exceed usageLimit");
    }
}

impl CouponInput {
    fn check(&self, v: &mut Violations) {
        v.not_blank("code", self.code.as_ref());
        v.not_blank("name", self.name.as_ref());
        v.range("discount", self.discount, 1.0, 100.0);
        v.at_least("usageLimit", self.usage_limit, 1);
        v.at_least("usageCount", self.usage_count, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(limit: i64, count: i64, expiry: DateTime<Utc>) -> Coupon {
        let mut coupon = Coupon::create(CouponInput {
            code: Some("TEST20".into()),
            name: Some("Test 20% Off".into()),
            discount: Some(20.0),
            usage_limit: Some(limit),
            expiry_date: Some(expiry),
            ..Default::default()
        })
        .unwrap();
        coupon.usage_count = count;
        coupon
    }

    #[test]
    fn eligible_before_expiry_with_uses_left() {
        let now = Utc::now();
        assert_eq!(coupon(2, 1, now + Duration::days(1)).check_eligibility(now), Ok(()));
    }

    #[test]
    fn eligible_at_exact_expiry_instant() {
        let now = Utc::now();
        assert_eq!(coupon(1, 0, now).check_eligibility(now), Ok(()));
    }

    #[test]
    fn exhausted_coupon_rejected_regardless_of_expiry() {
        let now = Utc::now();
        assert_eq!(
            coupon(1, 1, now + Duration::days(1)).check_eligibility(now),
            Err(Ineligible::UsageLimitExceeded)
        );
        assert!(coupon(1, 1, now - Duration::days(1)).check_eligibility(now).is_err());
    }

    #[test]
    fn expired_coupon_rejected() {
        let now = Utc::now();
        assert_eq!(
            coupon(5, 0, now - Duration::seconds(1)).check_eligibility(now),
            Err(Ineligible::Expired)
        );
    }

    #[test]
    fn expiry_reported_before_usage_limit() {
        let now = Utc::now();
        assert_eq!(
            coupon(1, 1, now - Duration::days(1)).check_eligibility(now),
            Err(Ineligible::Expired)
        );
    }

    #[test]
    fn redeem_increments_by_one_until_exhausted() {
        let now = Utc::now();
        let mut c = coupon(2, 0, now + Duration::days(1));
        c.redeem(now).unwrap();
        c.redeem(now).unwrap();
        assert_eq!(c.usage_count, 2);
        assert_eq!(c.redeem(now), Err(Ineligible::UsageLimitExceeded));
        assert_eq!(c.usage_count, 2);
    }

    #[test]
    fn create_rejects_count_above_limit() {
        let err = Coupon::create(CouponInput {
            code: Some("OVER".into()),
            name: Some("Over".into()),
            discount: Some(10.0),
            usage_limit: Some(1),
            usage_count: Some(5),
            expiry_date: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            ApiError::Validation(v) => assert_eq!(v[0].field, "usageCount"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_cannot_lower_limit_below_count() {
        let now = Utc::now();
        let mut c = coupon(3, 3, now + Duration::days(1));
        let err = c
            .apply(CouponInput {
                usage_limit: Some(1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v[0].field == "usageCount"));
        assert_eq!(c.usage_limit, 3);

        c.apply(CouponInput {
            usage_limit: Some(5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.usage_limit, 5);
    }

    #[test]
    fn create_enforces_bounds() {
        let err = Coupon::create(CouponInput {
            code: Some("BAD".into()),
            name: Some("Bad".into()),
            discount: Some(0.0),
            usage_limit: Some(0),
            expiry_date: Some(Utc::now()),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            ApiError::Validation(v) => {
                let fields: Vec<_> = v.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, ["discount", "usageLimit"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

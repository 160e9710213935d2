use botsignal_common::{AccountRecord, ActivityAggregates};

pub const FEATURE_DIM: usize = 10;

/// Dimension names, in vector order. Used for the persisted feature map on
/// each verdict.
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "account_age_days",
    "comment_karma",
    "link_karma",
    "karma_ratio",
    "posting_frequency",
    "avg_post_score",
    "post_comment_ratio",
    "is_verified",
    "has_verified_email",
    "is_premium",
];

pub type FeatureVector = [f64; FEATURE_DIM];

/// Project one account plus its activity rollup into the fixed ten-dimension
/// vector. Pure and total: negative numerics coerce to 0, zero denominators
/// follow the fallback rules below, nothing fails.
pub fn extract(account: &AccountRecord, aggregates: &ActivityAggregates) -> FeatureVector {
    let age_days = non_negative(account.account_age_days);
    let comment_karma = non_negative(account.comment_karma);
    let link_karma = non_negative(account.link_karma);
    let post_count = non_negative(aggregates.post_count);
    let comment_count = non_negative(aggregates.comment_count);
    let post_score_sum = aggregates.post_score_sum as f64;

    // comment share of total karma; 0 when the account has no karma at all
    let total_karma = comment_karma + link_karma;
    let karma_ratio = if total_karma > 0.0 {
        comment_karma / total_karma
    } else {
        0.0
    };

    // items per day of account life; a zero-day-old account divides by one
    let posting_frequency = (post_count + comment_count) / age_days.max(1.0);

    let avg_post_score = if post_count > 0.0 {
        post_score_sum / post_count
    } else {
        0.0
    };

    // falls back to the raw post count when there are no comments
    let post_comment_ratio = if comment_count > 0.0 {
        post_count / comment_count
    } else {
        post_count
    };

    [
        age_days,
        comment_karma,
        link_karma,
        karma_ratio,
        posting_frequency,
        avg_post_score,
        post_comment_ratio,
        flag(account.is_verified),
        flag(account.has_verified_email),
        flag(account.is_premium),
    ]
}

/// Named view of a feature vector, persisted with each verdict so the score
/// is explainable after the fact.
pub fn to_feature_map(vector: &FeatureVector) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, value) in FEATURE_NAMES.iter().zip(vector.iter()) {
        map.insert(
            name.to_string(),
            serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(map)
}

fn non_negative(value: i64) -> f64 {
    value.max(0) as f64
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(age_days: i64, comment_karma: i64, link_karma: i64) -> AccountRecord {
        AccountRecord {
            username: "tester".to_string(),
            account_age_days: age_days,
            comment_karma,
            link_karma,
            is_verified: false,
            has_verified_email: false,
            is_premium: false,
            account_created_at: Utc::now(),
        }
    }

    #[test]
    fn karma_ratio_is_zero_when_both_karma_fields_are_zero() {
        let v = extract(&account(100, 0, 0), &ActivityAggregates::default());
        assert_eq!(v[3], 0.0);
    }

    #[test]
    fn karma_ratio_is_comment_share_of_total() {
        let v = extract(&account(100, 30, 10), &ActivityAggregates::default());
        assert!((v[3] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn post_comment_ratio_falls_back_to_post_count_without_comments() {
        let aggregates = ActivityAggregates {
            post_count: 7,
            comment_count: 0,
            post_score_sum: 0,
        };
        let v = extract(&account(100, 10, 10), &aggregates);
        assert_eq!(v[6], 7.0);
    }

    #[test]
    fn negative_inputs_coerce_to_zero() {
        let aggregates = ActivityAggregates {
            post_count: -3,
            comment_count: -1,
            post_score_sum: 0,
        };
        let v = extract(&account(-10, -50, -2), &aggregates);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 0.0);
        assert_eq!(v[3], 0.0);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn posting_frequency_counts_posts_and_comments_per_day() {
        let aggregates = ActivityAggregates {
            post_count: 10,
            comment_count: 20,
            post_score_sum: 50,
        };
        let v = extract(&account(10, 100, 100), &aggregates);
        assert!((v[4] - 3.0).abs() < 1e-9);
        assert!((v[5] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn boolean_flags_map_to_unit_dimensions() {
        let mut acct = account(100, 10, 10);
        acct.is_verified = true;
        acct.has_verified_email = true;
        acct.is_premium = false;
        let v = extract(&acct, &ActivityAggregates::default());
        assert_eq!(v[7], 1.0);
        assert_eq!(v[8], 1.0);
        assert_eq!(v[9], 0.0);
    }

    #[test]
    fn feature_map_names_every_dimension() {
        let v = extract(&account(42, 5, 5), &ActivityAggregates::default());
        let map = to_feature_map(&v);
        let obj = map.as_object().unwrap();
        assert_eq!(obj.len(), FEATURE_DIM);
        assert_eq!(obj["account_age_days"], serde_json::json!(42.0));
    }
}

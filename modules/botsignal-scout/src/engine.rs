use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use botsignal_common::{AccountRecord, ActivityAggregates, BotVerdict};

use crate::anomaly;
use crate::features::{self, FeatureVector};

/// Detection method tag for the pure rule-table path.
pub const METHOD_RULE_BASED: &str = "rule_based";
/// Detection method tag when the population anomaly score is folded in.
pub const METHOD_RULE_ANOMALY: &str = "rule_based+anomaly";

/// Blend weights when a reference population is available. The rule table
/// stays the dominant term and remains reproducible standalone by scoring
/// with an empty population.
const RULE_WEIGHT: f64 = 0.7;
const ANOMALY_WEIGHT: f64 = 0.3;

/// Converts an account's profile and activity rollup into a bot verdict.
///
/// Two independent signal sources: a fixed additive rule table producing the
/// probability, and a distinct overlapping rule set producing human-readable
/// risk factors. Deterministic, no learned parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotProbabilityEngine;

impl BotProbabilityEngine {
    pub fn new() -> Self {
        Self
    }

    /// The additive rule table. Weights sum per triggered condition and
    /// clamp to 1.0.
    pub fn rule_score(features: &FeatureVector) -> f64 {
        let age_days = features[0];
        let comment_karma = features[1];
        let link_karma = features[2];
        let posting_frequency = features[4];
        let avg_post_score = features[5];
        let is_verified = features[7] > 0.0;
        let has_verified_email = features[8] > 0.0;

        let mut score: f64 = 0.0;

        if age_days < 7.0 {
            score += 0.30;
        } else if age_days < 30.0 {
            score += 0.20;
        } else if age_days < 90.0 {
            score += 0.10;
        }

        if comment_karma < 5.0 {
            score += 0.20;
        }
        if link_karma == 0.0 && comment_karma == 0.0 {
            score += 0.30;
        }
        if posting_frequency > 5.0 {
            score += 0.20;
        }
        if avg_post_score < 1.0 {
            score += 0.10;
        }
        if !has_verified_email {
            score += 0.10;
        }
        if !is_verified && age_days > 365.0 {
            score += 0.05;
        }

        score.min(1.0)
    }

    /// Human-readable corroboration labels. A distinct rule set from the
    /// probability table — the two overlap but do not coincide.
    pub fn risk_factors(features: &FeatureVector) -> Vec<String> {
        let age_days = features[0];
        let comment_karma = features[1];
        let link_karma = features[2];
        let karma_ratio = features[3];
        let posting_frequency = features[4];
        let has_verified_email = features[8] > 0.0;

        let mut factors = Vec::new();

        if age_days < 30.0 {
            factors.push("New account (under 30 days old)".to_string());
        }
        if age_days > 90.0 && comment_karma + link_karma < 50.0 {
            factors.push("Low karma for account age".to_string());
        }
        if posting_frequency > 10.0 {
            factors.push("Very high posting frequency".to_string());
        }
        if !has_verified_email && age_days > 7.0 {
            factors.push("Unverified email".to_string());
        }
        if comment_karma + link_karma > 0.0 && karma_ratio < 0.1 {
            factors.push("Link karma dominates karma ratio".to_string());
        }

        factors
    }

    /// Confidence reflects corroboration breadth, not probability
    /// calibration: 0.5 with no risk factors, else 0.7 + 0.1 per factor,
    /// capped at 1.0.
    pub fn confidence(risk_factor_count: usize) -> f64 {
        if risk_factor_count == 0 {
            0.5
        } else {
            (0.7 + 0.1 * risk_factor_count as f64).min(1.0)
        }
    }

    /// Score one account. With a non-empty reference population the anomaly
    /// score is folded in as a second weighted term; with an empty one the
    /// verdict is the pure rule table.
    pub fn score_account(
        &self,
        account: &AccountRecord,
        aggregates: &ActivityAggregates,
        population: &[FeatureVector],
    ) -> BotVerdict {
        let vector = features::extract(account, aggregates);
        let rules = Self::rule_score(&vector);

        let (bot_probability, detection_method) = if population.is_empty() {
            (rules, METHOD_RULE_BASED)
        } else {
            let anomaly = anomaly::score(population, &vector);
            (
                RULE_WEIGHT * rules + ANOMALY_WEIGHT * anomaly,
                METHOD_RULE_ANOMALY,
            )
        };

        let risk_factors = Self::risk_factors(&vector);
        let confidence_score = Self::confidence(risk_factors.len());

        debug!(
            username = account.username.as_str(),
            bot_probability,
            risk_factors = risk_factors.len(),
            "Account scored"
        );

        BotVerdict {
            username: account.username.clone(),
            bot_probability: bot_probability.clamp(0.0, 1.0),
            confidence_score,
            detection_method: detection_method.to_string(),
            features: features::to_feature_map(&vector),
            risk_factors,
            analysis_timestamp: Utc::now(),
        }
    }

    /// Score a batch of accounts independently. The batch's own feature
    /// vectors form the reference population. An account with no stored
    /// activity is scored with zeroed aggregates, never skipped.
    pub fn score_batch(
        &self,
        accounts: &[AccountRecord],
        aggregates: &HashMap<String, ActivityAggregates>,
    ) -> Vec<BotVerdict> {
        let zeroed = ActivityAggregates::default();

        let population: Vec<FeatureVector> = accounts
            .iter()
            .map(|account| {
                let agg = aggregates.get(&account.username).unwrap_or(&zeroed);
                features::extract(account, agg)
            })
            .collect();

        accounts
            .iter()
            .map(|account| {
                let agg = aggregates.get(&account.username).unwrap_or(&zeroed);
                self.score_account(account, agg, &population)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(age_days: i64, comment_karma: i64, link_karma: i64) -> AccountRecord {
        AccountRecord {
            username: "subject".to_string(),
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
    fn fresh_zero_karma_account_scores_full_probability() {
        // age<7: +0.3, zero karma: +0.3, comment_karma<5: +0.2,
        // avg_post_score<1: +0.1, unverified email: +0.1 — sums to 1.0 exactly.
        let acct = account(3, 0, 0);
        let verdict =
            BotProbabilityEngine::new().score_account(&acct, &ActivityAggregates::default(), &[]);
        assert_eq!(verdict.bot_probability, 1.0);
        assert_eq!(verdict.detection_method, METHOD_RULE_BASED);
    }

    #[test]
    fn zero_karma_always_scores_at_least_point_three() {
        for age in [0, 5, 50, 400] {
            let mut acct = account(age, 0, 0);
            acct.has_verified_email = true;
            acct.is_verified = true;
            let vector = features::extract(&acct, &ActivityAggregates::default());
            assert!(BotProbabilityEngine::rule_score(&vector) >= 0.3, "age {age}");
        }
    }

    #[test]
    fn age_weight_vanishes_at_ninety_days() {
        let base_agg = ActivityAggregates::default();
        let scores: Vec<f64> = [90, 120, 364]
            .iter()
            .map(|&age| {
                let vector = features::extract(&account(age, 100, 100), &base_agg);
                BotProbabilityEngine::rule_score(&vector)
            })
            .collect();
        assert_eq!(scores[0], scores[1]);
        assert_eq!(scores[1], scores[2]);
    }

    #[test]
    fn old_unverified_account_picks_up_small_weight() {
        let agg = ActivityAggregates::default();
        let at_365 = features::extract(&account(365, 100, 100), &agg);
        let past_365 = features::extract(&account(366, 100, 100), &agg);
        let delta = BotProbabilityEngine::rule_score(&past_365)
            - BotProbabilityEngine::rule_score(&at_365);
        assert!((delta - 0.05).abs() < 1e-9);
    }

    #[test]
    fn probability_is_bounded_for_hostile_inputs() {
        let engine = BotProbabilityEngine::new();
        let aggregates = ActivityAggregates {
            post_count: -100,
            comment_count: i64::MIN,
            post_score_sum: i64::MIN,
        };
        let verdict = engine.score_account(&account(i64::MIN, -1, -1), &aggregates, &[]);
        assert!((0.0..=1.0).contains(&verdict.bot_probability));
        assert!((0.0..=1.0).contains(&verdict.confidence_score));
    }

    #[test]
    fn confidence_follows_corroboration_breadth() {
        assert_eq!(BotProbabilityEngine::confidence(0), 0.5);
        assert!((BotProbabilityEngine::confidence(1) - 0.8).abs() < 1e-9);
        assert!((BotProbabilityEngine::confidence(2) - 0.9).abs() < 1e-9);
        assert_eq!(BotProbabilityEngine::confidence(3), 1.0);
        assert_eq!(BotProbabilityEngine::confidence(7), 1.0);
    }

    #[test]
    fn risk_factors_fire_in_declared_order() {
        let mut acct = account(10, 0, 0);
        acct.has_verified_email = false;
        let aggregates = ActivityAggregates {
            post_count: 200,
            comment_count: 0,
            post_score_sum: 200,
        };
        let vector = features::extract(&acct, &aggregates);
        let factors = BotProbabilityEngine::risk_factors(&vector);
        assert_eq!(
            factors,
            vec![
                "New account (under 30 days old)".to_string(),
                "Very high posting frequency".to_string(),
                "Unverified email".to_string(),
            ]
        );
    }

    #[test]
    fn link_heavy_karma_profile_is_flagged() {
        let acct = account(200, 5, 995);
        let vector = features::extract(&acct, &ActivityAggregates::default());
        let factors = BotProbabilityEngine::risk_factors(&vector);
        assert!(factors.contains(&"Link karma dominates karma ratio".to_string()));
    }

    #[test]
    fn batch_scores_accounts_without_aggregates() {
        let engine = BotProbabilityEngine::new();
        let accounts = vec![
            AccountRecord {
                username: "with_activity".to_string(),
                ..account(100, 500, 100)
            },
            AccountRecord {
                username: "silent".to_string(),
                ..account(2, 0, 0)
            },
        ];
        let mut aggregates = HashMap::new();
        aggregates.insert(
            "with_activity".to_string(),
            ActivityAggregates {
                post_count: 5,
                comment_count: 20,
                post_score_sum: 40,
            },
        );

        let verdicts = engine.score_batch(&accounts, &aggregates);
        assert_eq!(verdicts.len(), 2);
        let silent = verdicts.iter().find(|v| v.username == "silent").unwrap();
        assert!(silent.bot_probability > 0.0);
        assert_eq!(silent.detection_method, METHOD_RULE_ANOMALY);
    }

    #[test]
    fn population_folding_keeps_rule_term_dominant() {
        let engine = BotProbabilityEngine::new();
        let acct = account(3, 0, 0);
        let population = vec![
            features::extract(&account(1000, 5000, 2000), &ActivityAggregates::default()),
            features::extract(&account(800, 3000, 500), &ActivityAggregates::default()),
        ];
        let verdict = engine.score_account(&acct, &ActivityAggregates::default(), &population);
        assert_eq!(verdict.detection_method, METHOD_RULE_ANOMALY);
        // rule term alone contributes 0.7 here
        assert!(verdict.bot_probability >= 0.7);
        assert!(verdict.bot_probability <= 1.0);
    }
}

//! Rule metrics and thresholds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::mining::SUPPORT_EPSILON;

/// A directed association rule with its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Support of the antecedent alone
    pub antecedent_support: f64,
    /// Support of the consequent alone
    pub consequent_support: f64,
    /// Support of antecedent ∪ consequent
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `None` when confidence is 1 (conviction is unbounded)
    pub conviction: Option<f64>,
}

impl Rule {
    /// Score a rule from the three supports it depends on.
    ///
    /// Callers guarantee `antecedent_support` and `consequent_support` are positive.
    pub fn from_supports(
        antecedent: Itemset,
        consequent: Itemset,
        antecedent_support: f64,
        consequent_support: f64,
        support: f64,
    ) -> Self {
        let confidence = (support / antecedent_support).min(1.0);
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 - SUPPORT_EPSILON {
            None
        } else {
            Some((1.0 - consequent_support) / (1.0 - confidence))
        };

        Self {
            antecedent,
            consequent,
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift,
            leverage,
            conviction,
        }
    }

    pub fn metric(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction.unwrap_or(f64::INFINITY),
        }
    }
}

/// Metric a rule threshold is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    #[default]
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
}

impl RuleMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMetric::Support => "support",
            RuleMetric::Confidence => "confidence",
            RuleMetric::Lift => "lift",
            RuleMetric::Leverage => "leverage",
            RuleMetric::Conviction => "conviction",
        }
    }
}

impl fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleMetric {
    type Err = MiningError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "support" => Ok(Self::Support),
            "confidence" => Ok(Self::Confidence),
            "lift" => Ok(Self::Lift),
            "leverage" => Ok(Self::Leverage),
            "conviction" => Ok(Self::Conviction),
            other => Err(MiningError::InvalidParameter(format!(
                "unsupported rule metric `{other}` (expected support|confidence|lift|leverage|conviction)"
            ))),
        }
    }
}

/// Minimum value a rule must reach on `metric` to be kept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThreshold {
    pub metric: RuleMetric,
    pub min_threshold: f64,
}

impl RuleThreshold {
    pub fn new(metric: RuleMetric, min_threshold: f64) -> Self {
        Self { metric, min_threshold }
    }

    pub fn support(min_support: f64) -> Self {
        Self::new(RuleMetric::Support, min_support)
    }

    pub fn validate(&self) -> Result<(), MiningError> {
        if !self.min_threshold.is_finite() {
            return Err(MiningError::InvalidParameter(format!(
                "{} threshold must be finite, got {}",
                self.metric, self.min_threshold
            )));
        }

        match self.metric {
            RuleMetric::Support => crate::mining::validate_min_support(self.min_threshold),
            RuleMetric::Confidence if !(0.0..=1.0).contains(&self.min_threshold) => {
                Err(MiningError::InvalidParameter(format!(
                    "confidence threshold must be in [0, 1], got {}",
                    self.min_threshold
                )))
            }
            RuleMetric::Lift | RuleMetric::Conviction if self.min_threshold < 0.0 => {
                Err(MiningError::InvalidParameter(format!(
                    "{} threshold must not be negative, got {}",
                    self.metric, self.min_threshold
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn accepts(&self, rule: &Rule) -> bool {
        rule.metric(self.metric) + SUPPORT_EPSILON >= self.min_threshold
    }
}

impl Default for RuleThreshold {
    fn default() -> Self {
        Self::support(super::DEFAULT_MIN_THRESHOLD)
    }
}

use crate::error::FlamebornError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlamebornConfig {
    pub scoring: Option<ScoringConfig>,
    pub distribution: Option<DistributionConfig>,
    pub donation: Option<DonationConfig>,
    pub specializations: Option<SpecializationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub patients_weight: Option<f64>,
    pub critical_case_weight: Option<f64>,
    pub criticality_multiplier: Option<f64>,
    pub response_time_weight: Option<f64>,
    pub accessibility_weight: Option<f64>,
    pub specialization_weight: Option<f64>,
    pub recency_half_life_days: Option<f64>,
    pub staleness_days: Option<f64>,
    pub min_recency_factor: Option<f64>,
    pub min_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionConfig {
    pub equity_floor_percent: Option<f64>,
    pub share_precision: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationConfig {
    pub min_donation: Option<f64>,
    pub amount_decimals: Option<u32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecializationConfig {
    pub default_weight: Option<f64>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

/// Criticality weights keyed by lowercase specialization name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecializationCatalog {
    pub default_weight: f64,
    pub weights: BTreeMap<String, f64>,
}

impl Default for SpecializationCatalog {
    fn default() -> Self {
        let weights = [
            ("trauma", 3.0),
            ("emergency", 3.0),
            ("surgery", 2.5),
            ("maternal", 2.5),
            ("pediatrics", 2.0),
            ("general", 1.0),
            ("community", 1.0),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();
        Self {
            default_weight: 1.0,
            weights,
        }
    }
}

impl SpecializationCatalog {
    /// Highest criticality among the listed specializations, 0 when none are listed.
    pub fn criticality_of<S: AsRef<str>>(&self, specializations: &[S]) -> f64 {
        specializations
            .iter()
            .map(|name| {
                let key = name.as_ref().trim().to_lowercase();
                self.weights
                    .get(&key)
                    .copied()
                    .unwrap_or(self.default_weight)
            })
            .fold(0.0, f64::max)
    }
}

/// Scoring and distribution policy resolved from config, validated once and
/// passed explicitly to the scorer and distributor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringPolicy {
    pub patients_weight: f64,
    pub critical_case_weight: f64,
    pub criticality_multiplier: f64,
    pub response_time_weight: f64,
    pub accessibility_weight: f64,
    pub specialization_weight: f64,
    pub recency_half_life_days: f64,
    pub staleness_days: f64,
    pub min_recency_factor: f64,
    pub min_score: f64,
    pub equity_floor_percent: f64,
    pub share_precision: u32,
    pub specializations: SpecializationCatalog,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            patients_weight: 1.0,
            critical_case_weight: 2.0,
            criticality_multiplier: 1.5,
            response_time_weight: 10.0,
            accessibility_weight: 3.0,
            specialization_weight: 5.0,
            recency_half_life_days: 30.0,
            staleness_days: 180.0,
            min_recency_factor: 0.1,
            min_score: 1.0,
            equity_floor_percent: 2.0,
            share_precision: 2,
            specializations: SpecializationCatalog::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationSettings {
    pub min_donation: f64,
    pub amount_decimals: u32,
    pub currency: String,
}

impl Default for DonationSettings {
    fn default() -> Self {
        Self {
            min_donation: 0.01,
            amount_decimals: 6,
            currency: "BNB".to_string(),
        }
    }
}

pub const MAX_SHARE_PRECISION: u32 = 6;
pub const MAX_AMOUNT_DECIMALS: u32 = 18;

impl FlamebornConfig {
    pub fn scoring_policy(&self) -> ScoringPolicy {
        let defaults = ScoringPolicy::default();
        let mut policy = match &self.scoring {
            Some(scoring) => ScoringPolicy {
                patients_weight: scoring.patients_weight.unwrap_or(defaults.patients_weight),
                critical_case_weight: scoring
                    .critical_case_weight
                    .unwrap_or(defaults.critical_case_weight),
                criticality_multiplier: scoring
                    .criticality_multiplier
                    .unwrap_or(defaults.criticality_multiplier),
                response_time_weight: scoring
                    .response_time_weight
                    .unwrap_or(defaults.response_time_weight),
                accessibility_weight: scoring
                    .accessibility_weight
                    .unwrap_or(defaults.accessibility_weight),
                specialization_weight: scoring
                    .specialization_weight
                    .unwrap_or(defaults.specialization_weight),
                recency_half_life_days: scoring
                    .recency_half_life_days
                    .unwrap_or(defaults.recency_half_life_days),
                staleness_days: scoring.staleness_days.unwrap_or(defaults.staleness_days),
                min_recency_factor: scoring
                    .min_recency_factor
                    .unwrap_or(defaults.min_recency_factor),
                min_score: scoring.min_score.unwrap_or(defaults.min_score),
                ..defaults
            },
            None => defaults,
        };

        if let Some(distribution) = &self.distribution {
            if let Some(floor) = distribution.equity_floor_percent {
                policy.equity_floor_percent = floor;
            }
            if let Some(precision) = distribution.share_precision {
                policy.share_precision = precision;
            }
        }

        if let Some(specializations) = &self.specializations {
            if let Some(default_weight) = specializations.default_weight {
                policy.specializations.default_weight = default_weight;
            }
            for (name, weight) in &specializations.weights {
                policy
                    .specializations
                    .weights
                    .insert(name.trim().to_lowercase(), *weight);
            }
        }

        policy
    }

    pub fn donation_settings(&self) -> DonationSettings {
        let defaults = DonationSettings::default();
        match &self.donation {
            Some(donation) => DonationSettings {
                min_donation: donation.min_donation.unwrap_or(defaults.min_donation),
                amount_decimals: donation.amount_decimals.unwrap_or(defaults.amount_decimals),
                currency: donation.currency.clone().unwrap_or(defaults.currency),
            },
            None => defaults,
        }
    }

    pub fn validate(&self) -> Result<(), FlamebornError> {
        let policy = self.scoring_policy();

        for (key, weight) in [
            ("scoring.patients_weight", policy.patients_weight),
            ("scoring.critical_case_weight", policy.critical_case_weight),
            ("scoring.criticality_multiplier", policy.criticality_multiplier),
            ("scoring.response_time_weight", policy.response_time_weight),
            ("scoring.accessibility_weight", policy.accessibility_weight),
            ("scoring.specialization_weight", policy.specialization_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FlamebornError::ConfigInvalid(format!(
                    "{key} must be a finite, non-negative number (found {weight})"
                )));
            }
        }

        if !policy.recency_half_life_days.is_finite() || policy.recency_half_life_days <= 0.0 {
            return Err(FlamebornError::ConfigInvalid(
                "scoring.recency_half_life_days must be greater than 0".to_string(),
            ));
        }
        if !policy.staleness_days.is_finite() || policy.staleness_days <= 0.0 {
            return Err(FlamebornError::ConfigInvalid(
                "scoring.staleness_days must be greater than 0".to_string(),
            ));
        }
        if !(policy.min_recency_factor > 0.0 && policy.min_recency_factor <= 1.0) {
            return Err(FlamebornError::ConfigInvalid(
                "scoring.min_recency_factor must be in (0.0, 1.0]".to_string(),
            ));
        }
        if !policy.min_score.is_finite() || policy.min_score <= 0.0 {
            return Err(FlamebornError::ConfigInvalid(
                "scoring.min_score must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&policy.equity_floor_percent) {
            return Err(FlamebornError::ConfigInvalid(
                "distribution.equity_floor_percent must be between 0.0 and 100.0".to_string(),
            ));
        }
        if policy.share_precision > MAX_SHARE_PRECISION {
            return Err(FlamebornError::ConfigInvalid(format!(
                "distribution.share_precision must be at most {MAX_SHARE_PRECISION}"
            )));
        }

        let catalog = &policy.specializations;
        if !catalog.default_weight.is_finite() || catalog.default_weight < 0.0 {
            return Err(FlamebornError::ConfigInvalid(
                "specializations.default_weight must be a finite, non-negative number"
                    .to_string(),
            ));
        }
        let invalid = catalog
            .weights
            .iter()
            .filter(|(_, weight)| !weight.is_finite() || **weight < 0.0)
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();
        if !invalid.is_empty() {
            return Err(FlamebornError::ConfigInvalid(format!(
                "specializations.weights must be non-negative: {}",
                invalid.join(", ")
            )));
        }

        let donation = self.donation_settings();
        if !donation.min_donation.is_finite() || donation.min_donation < 0.0 {
            return Err(FlamebornError::ConfigInvalid(
                "donation.min_donation must be a finite, non-negative number".to_string(),
            ));
        }
        if donation.amount_decimals > MAX_AMOUNT_DECIMALS {
            return Err(FlamebornError::ConfigInvalid(format!(
                "donation.amount_decimals must be at most {MAX_AMOUNT_DECIMALS}"
            )));
        }
        if donation.currency.trim().is_empty() {
            return Err(FlamebornError::ConfigInvalid(
                "donation.currency cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let cfg: FlamebornConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.scoring_policy(), ScoringPolicy::default());
        assert_eq!(cfg.donation_settings(), DonationSettings::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[scoring]
patients_weight = 0.5
critical_case_weight = 4.0
recency_half_life_days = 14
min_score = 0.5

[distribution]
equity_floor_percent = 5.0
share_precision = 1

[donation]
min_donation = 0.1
currency = "CELO"

[specializations]
default_weight = 0.5

[specializations.weights]
Trauma = 4.0
dentistry = 1.2
"#;
        let cfg: FlamebornConfig = toml::from_str(toml_str).expect("full config should parse");
        let policy = cfg.scoring_policy();
        assert_eq!(policy.patients_weight, 0.5);
        assert_eq!(policy.critical_case_weight, 4.0);
        assert_eq!(policy.recency_half_life_days, 14.0);
        assert_eq!(policy.staleness_days, 180.0);
        assert_eq!(policy.equity_floor_percent, 5.0);
        assert_eq!(policy.share_precision, 1);
        assert_eq!(policy.specializations.weights.get("trauma"), Some(&4.0));
        assert_eq!(policy.specializations.weights.get("dentistry"), Some(&1.2));
        assert_eq!(policy.specializations.default_weight, 0.5);

        let donation = cfg.donation_settings();
        assert_eq!(donation.min_donation, 0.1);
        assert_eq!(donation.amount_decimals, 6);
        assert_eq!(donation.currency, "CELO");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn criticality_takes_highest_listed_specialization() {
        let catalog = SpecializationCatalog::default();
        assert_eq!(catalog.criticality_of(&["General", "trauma"]), 3.0);
        assert_eq!(catalog.criticality_of(&["unknown"]), 1.0);
        assert_eq!(catalog.criticality_of::<&str>(&[]), 0.0);
    }

    #[test]
    fn validate_rejects_negative_weight() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[scoring]
accessibility_weight = -1.0
"#,
        )
        .expect("config should parse");
        let err = cfg.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("scoring.accessibility_weight"));
    }

    #[test]
    fn validate_rejects_floor_out_of_range() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[distribution]
equity_floor_percent = 120.0
"#,
        )
        .expect("config should parse");
        let err = cfg.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("equity_floor_percent"));
    }

    #[test]
    fn validate_rejects_zero_half_life_and_min_score() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[scoring]
recency_half_life_days = 0
"#,
        )
        .expect("config should parse");
        assert!(cfg
            .validate()
            .expect_err("half life should be rejected")
            .to_string()
            .contains("recency_half_life_days"));

        let cfg: FlamebornConfig = toml::from_str(
            r#"
[scoring]
min_score = 0.0
"#,
        )
        .expect("config should parse");
        assert!(cfg
            .validate()
            .expect_err("min score should be rejected")
            .to_string()
            .contains("min_score"));
    }

    #[test]
    fn validate_rejects_min_recency_factor_outside_unit_interval() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[scoring]
min_recency_factor = 1.5
"#,
        )
        .expect("config should parse");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_specialization_weight() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[specializations.weights]
trauma = -2.0
"#,
        )
        .expect("config should parse");
        let err = cfg.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("trauma"));
    }

    #[test]
    fn validate_rejects_excessive_precision() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[distribution]
share_precision = 9

[donation]
amount_decimals = 4
"#,
        )
        .expect("config should parse");
        assert!(cfg
            .validate()
            .expect_err("precision should be rejected")
            .to_string()
            .contains("share_precision"));
    }

    #[test]
    fn validate_accepts_boundaries() {
        let cfg: FlamebornConfig = toml::from_str(
            r#"
[scoring]
patients_weight = 0.0
min_recency_factor = 1.0

[distribution]
equity_floor_percent = 0.0

[donation]
min_donation = 0.0
"#,
        )
        .expect("config should parse");
        assert!(cfg.validate().is_ok());
    }
}

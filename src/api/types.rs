use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Risk percentage at or above which a result is flagged
pub const HIGH_RISK_PERCENT: u8 = 55;

/// Response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prediction: String,

    /// Model confidence, 0-100
    pub confidence: f64,

    /// Probability of the at-risk class, 0-1
    #[serde(default)]
    pub risk_confidence: Option<f64>,

    /// Server path of the Grad-CAM heatmap image
    #[serde(default)]
    pub heatmap: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub ai_report: Option<AiReport>,

    #[serde(default)]
    pub file_name: Option<String>,
}

/// Generated clinical-style report; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiReport {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub treatment: Option<Vec<String>>,
    #[serde(default)]
    pub lifestyle: Option<Vec<String>>,
    #[serde(default)]
    pub prevention: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
    #[serde(default)]
    pub follow_up: Option<Vec<String>>,
}

impl AiReport {
    /// Non-empty list sections in display order.
    pub fn sections(&self) -> Vec<(&'static str, &[String])> {
        [
            ("Treatment", &self.treatment),
            ("Lifestyle", &self.lifestyle),
            ("Prevention", &self.prevention),
            ("Notes", &self.notes),
            ("Follow-up", &self.follow_up),
        ]
        .into_iter()
        .filter_map(|(title, items)| match items {
            Some(items) if !items.is_empty() => Some((title, items.as_slice())),
            _ => None,
        })
        .collect()
    }
}

impl AnalysisResult {
    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.prediction.trim().is_empty() {
            return Err(ApiError::InvalidResponse("empty prediction".to_string()));
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(ApiError::InvalidResponse(format!(
                "confidence {} outside 0-100",
                self.confidence
            )));
        }
        if let Some(risk) = self.risk_confidence {
            if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
                return Err(ApiError::InvalidResponse(format!(
                    "risk_confidence {} outside 0-1",
                    risk
                )));
            }
        }
        Ok(())
    }

    /// Risk as a whole percentage; 0 when the model gave none.
    pub fn risk_percent(&self) -> u8 {
        self.risk_confidence
            .map(|r| (r * 100.0).round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0)
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_percent() >= HIGH_RISK_PERCENT
    }

    pub fn is_healthy(&self) -> bool {
        self.prediction.to_lowercase().contains("healthy")
    }
}

/// Response of `GET /`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(json: serde_json::Value) -> AnalysisResult {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_minimal_payload() {
        let r = result(json!({"prediction": "Healthy", "confidence": 91.5}));
        assert!(r.validate().is_ok());
        assert_eq!(r.risk_percent(), 0);
        assert!(r.is_healthy());
        assert!(r.ai_report.is_none());
    }

    #[test]
    fn test_full_payload() {
        let r = result(json!({
            "prediction": "At Risk",
            "confidence": 87.0,
            "risk_confidence": 0.734,
            "heatmap": "/outputs/heatmap_1.png",
            "explanation": "Frontal theta elevated",
            "ai_report": {
                "severity": "Elevated pattern",
                "treatment": ["CBT"],
                "prevention": [],
                "follow_up": ["Visit in 4 weeks"]
            },
            "file_name": "s01.edf"
        }));
        assert!(r.validate().is_ok());
        assert_eq!(r.risk_percent(), 73);
        assert!(r.is_high_risk());
        assert!(!r.is_healthy());

        let report = r.ai_report.unwrap();
        let titles: Vec<&str> = report.sections().iter().map(|(t, _)| *t).collect();
        assert_eq!(titles, vec!["Treatment", "Follow-up"]);
    }

    #[test]
    fn test_null_optionals() {
        let r = result(json!({
            "prediction": "Healthy",
            "confidence": 50,
            "heatmap": null,
            "ai_report": {"severity": null}
        }));
        assert!(r.heatmap.is_none());
        assert!(r.ai_report.unwrap().sections().is_empty());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let r = result(json!({"prediction": "Healthy", "confidence": 140.0}));
        assert!(matches!(r.validate(), Err(ApiError::InvalidResponse(_))));

        let r = result(json!({"prediction": "Healthy", "confidence": 10, "risk_confidence": 1.5}));
        assert!(matches!(r.validate(), Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_risk_threshold() {
        let r = result(json!({"prediction": "At Risk", "confidence": 60, "risk_confidence": 0.545}));
        assert_eq!(r.risk_percent(), 55);
        assert!(r.is_high_risk());

        let r = result(json!({"prediction": "At Risk", "confidence": 60, "risk_confidence": 0.544}));
        assert!(!r.is_high_risk());
    }
}

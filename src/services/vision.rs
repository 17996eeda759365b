// SPDX-License-Identifier: MIT

//! Google Vision OCR client for step-count extraction.
//!
//! Sends the uploaded screenshot to the `images:annotate` REST endpoint
//! with TEXT_DETECTION and extracts a plausible step count from the
//! returned text. The integration is optional; when disabled, the
//! extract-steps endpoint reports 503 and users enter counts manually.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::MAX_STEP_COUNT;

/// Numbers below this are assumed to be something other than a day's steps
/// (times, percentages, dates).
const MIN_PLAUSIBLE_STEPS: u32 = 100;

/// Patterns tried in order of confidence: a number next to the word
/// "steps", then a standalone 4-6 digit figure.
static STEP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)([\d,.]{3,7})\s*steps?").unwrap(),
        Regex::new(r"(?i)steps?[:\s]*([\d,.]{3,7})").unwrap(),
        Regex::new(r"(?m)(\d{4,6})\s*$").unwrap(),
    ]
});

static ANY_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Result of an OCR extraction attempt.
#[derive(Debug)]
pub struct OcrResult {
    /// Extracted step count, if a plausible one was found
    pub step_count: Option<u32>,
    /// Rough confidence in the extraction
    pub confidence: f32,
    /// Full text detected in the image (returned to the user on failure)
    pub full_text: String,
}

/// Vision API client.
#[derive(Clone)]
pub struct VisionService {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl VisionService {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key,
        }
    }

    /// Disabled client for tests and deployments without OCR.
    pub fn new_disabled() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run text detection on an image and extract a step count.
    pub async fn extract_steps(&self, image_bytes: &[u8]) -> Result<OcrResult, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "OCR service is not available; enter the step count manually".to_string(),
            )
        })?;

        let body = serde_json::json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image_bytes) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let url = format!("{}?key={}", self.endpoint, api_key);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::VisionApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::VisionApi(format!(
                "annotate request failed with status {}",
                status
            )));
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| AppError::VisionApi(format!("invalid annotate response: {}", e)))?;

        let full_text = annotate
            .responses
            .into_iter()
            .next()
            .and_then(|r| r.text_annotations.into_iter().next())
            .map(|a| a.description)
            .unwrap_or_default();

        let step_count = extract_step_count(&full_text);

        Ok(OcrResult {
            step_count,
            confidence: if step_count.is_some() { 0.9 } else { 0.1 },
            full_text,
        })
    }
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Deserialize)]
struct AnnotateResult {
    /// First annotation holds the full detected text
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    description: String,
}

/// Heuristically extract a step count from OCR text.
///
/// Tries the step-specific patterns first, then falls back to the largest
/// number in the plausible range. Thousands separators are stripped.
pub fn extract_step_count(text: &str) -> Option<u32> {
    for pattern in STEP_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1) {
                if let Some(steps) = parse_steps(m.as_str()) {
                    return Some(steps);
                }
            }
        }
    }

    // Fallback: largest plausible number anywhere in the text
    ANY_NUMBER
        .find_iter(text)
        .filter_map(|m| parse_steps(m.as_str()))
        .max()
}

fn parse_steps(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let value: u32 = digits.parse().ok()?;
    (MIN_PLAUSIBLE_STEPS..=MAX_STEP_COUNT)
        .contains(&value)
        .then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_labeled_count() {
        assert_eq!(extract_step_count("12,345 steps"), Some(12345));
        assert_eq!(extract_step_count("Steps: 9876"), Some(9876));
        assert_eq!(extract_step_count("today you walked 10.482 Steps"), Some(10482));
    }

    #[test]
    fn test_extract_standalone_number() {
        assert_eq!(extract_step_count("Daily Activity\n14203\n"), Some(14203));
    }

    #[test]
    fn test_fallback_picks_largest_plausible() {
        // 3:45 PM and 85% should lose to the large count
        assert_eq!(extract_step_count("3:45 PM 85% 11502 kcal 320"), Some(11502));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(extract_step_count("42"), None);
        assert_eq!(extract_step_count("1234567890"), None);
        assert_eq!(extract_step_count(""), None);
    }

    #[test]
    fn test_disabled_service_reports_unavailable() {
        let service = VisionService::new_disabled();
        assert!(!service.is_available());
    }
}

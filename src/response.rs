//! Response interpretation
//!
//! A response has exactly two outcomes: HTTP 200 becomes a
//! [`RemoveBgResult`], every other status becomes [`RemoveBgError::Api`].

use crate::error::{ApiErrorBody, RemoveBgError, Result};
use crate::options::DetectedType;
use crate::services::ImageIoService;
use crate::transport::RawResponse;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const CREDITS_CHARGED_HEADER: &str = "x-credits-charged";
pub const DETECTED_TYPE_HEADER: &str = "x-type";
pub const WIDTH_HEADER: &str = "x-width";
pub const HEIGHT_HEADER: &str = "x-height";
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Rate-limit counters reported with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    /// Total rate limit in megapixel images
    pub limit: Option<u64>,
    /// Remaining rate limit for this minute
    pub remaining: Option<u64>,
    /// Unix timestamp when the rate limit resets
    pub reset: Option<u64>,
    /// Seconds until the rate limit resets (only sent once it is exceeded)
    pub retry_after: Option<u64>,
}

impl RateLimit {
    /// Strict parse: a present header that is not a number is an error
    fn from_headers(headers: &HeaderMap) -> Result<Self> {
        Ok(Self {
            limit: optional_header(headers, RATE_LIMIT_HEADER)?,
            remaining: optional_header(headers, RATE_LIMIT_REMAINING_HEADER)?,
            reset: optional_header(headers, RATE_LIMIT_RESET_HEADER)?,
            retry_after: optional_header(headers, RETRY_AFTER_HEADER)?,
        })
    }

    /// Lenient parse for error responses, where unparseable values become `None`
    pub(crate) fn from_headers_lenient(headers: &HeaderMap) -> Self {
        Self {
            limit: optional_header(headers, RATE_LIMIT_HEADER).ok().flatten(),
            remaining: optional_header(headers, RATE_LIMIT_REMAINING_HEADER)
                .ok()
                .flatten(),
            reset: optional_header(headers, RATE_LIMIT_RESET_HEADER).ok().flatten(),
            retry_after: optional_header(headers, RETRY_AFTER_HEADER).ok().flatten(),
        }
    }
}

/// Successful background removal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoveBgResult {
    /// Result image, base64 encoded
    pub base64img: String,
    /// Credits charged for this call (can be fractional, e.g. 0.25)
    pub credits_charged: f64,
    /// Detected foreground type, when reported
    pub detected_type: Option<DetectedType>,
    pub result_width: u32,
    pub result_height: u32,
    pub rate_limit: RateLimit,
}

impl RemoveBgResult {
    /// Decode the result image
    ///
    /// # Errors
    /// - `RemoveBgError::Decode` if `base64img` is not valid base64
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(&self.base64img)?)
    }

    /// Decode the result image and write it to `path`
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.decode_image()?;
        ImageIoService::write_output(path, &bytes).await
    }
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    data: SuccessData,
}

#[derive(Deserialize)]
struct SuccessData {
    result_b64: String,
}

/// Turn a raw response into a result or an API error
///
/// # Errors
/// - `RemoveBgError::Api` for any non-200 status
/// - `RemoveBgError::MalformedResponse` for a 200 without the image, without
///   a required header, or with a header that does not parse
pub fn interpret(response: RawResponse) -> Result<RemoveBgResult> {
    if response.status != 200 {
        return Err(RemoveBgError::Api {
            status: response.status,
            body: ApiErrorBody::parse(&response.body),
            rate_limit: RateLimit::from_headers_lenient(&response.headers),
        });
    }

    let envelope: SuccessEnvelope = serde_json::from_str(&response.body).map_err(|e| {
        RemoveBgError::malformed(format!("response body has no data.result_b64: {}", e))
    })?;

    let credits_charged: f64 = required_header(&response.headers, CREDITS_CHARGED_HEADER)?;
    if !credits_charged.is_finite() || credits_charged < 0.0 {
        return Err(RemoveBgError::malformed(format!(
            "header {} has invalid value {}",
            CREDITS_CHARGED_HEADER, credits_charged
        )));
    }

    let detected_type = header_str(&response.headers, DETECTED_TYPE_HEADER)?
        .filter(|value| !value.is_empty())
        .map(DetectedType::from);

    Ok(RemoveBgResult {
        base64img: envelope.data.result_b64,
        credits_charged,
        detected_type,
        result_width: required_header(&response.headers, WIDTH_HEADER)?,
        result_height: required_header(&response.headers, HEIGHT_HEADER)?,
        rate_limit: RateLimit::from_headers(&response.headers)?,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value.to_str().map(|text| Some(text.trim())).map_err(|_| {
            RemoveBgError::malformed(format!("header {} is not valid text", name))
        }),
    }
}

fn optional_header<T>(headers: &HeaderMap, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match header_str(headers, name)? {
        None => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(|e| {
            RemoveBgError::malformed(format!("header {} = '{}': {}", name, text, e))
        }),
    }
}

fn required_header<T>(headers: &HeaderMap, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_header(headers, name)?
        .ok_or_else(|| RemoveBgError::malformed(format!("missing header {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorDetail;
    use reqwest::header::{HeaderName, HeaderValue};

    fn response(status: u16, body: &str, headers: &[(&str, &str)]) -> RawResponse {
        let mut raw = RawResponse::new(status, body);
        for (name, value) in headers {
            raw.headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        raw
    }

    const OK_BODY: &str = r#"{"data":{"result_b64":"AAAA"}}"#;

    #[test]
    fn test_success_minimal_headers() {
        let raw = response(
            200,
            OK_BODY,
            &[("x-credits-charged", "1"), ("x-width", "400"), ("x-height", "600")],
        );
        let result = interpret(raw).unwrap();
        assert_eq!(
            result,
            RemoveBgResult {
                base64img: "AAAA".to_string(),
                credits_charged: 1.0,
                detected_type: None,
                result_width: 400,
                result_height: 600,
                rate_limit: RateLimit::default(),
            }
        );
    }

    #[test]
    fn test_success_all_headers_mixed_case() {
        let raw = response(
            200,
            OK_BODY,
            &[
                ("X-Credits-Charged", "0.25"),
                ("X-Type", "person"),
                ("X-Width", "625"),
                ("X-HEIGHT", "400"),
                ("X-RateLimit-Limit", "500"),
                ("X-RateLimit-Remaining", "499"),
                ("X-RateLimit-Reset", "1700000000"),
                ("Retry-After", "59"),
            ],
        );
        let result = interpret(raw).unwrap();
        assert!((result.credits_charged - 0.25).abs() < f64::EPSILON);
        assert_eq!(result.detected_type, Some(DetectedType::Person));
        assert_eq!(result.result_width, 625);
        assert_eq!(result.result_height, 400);
        assert_eq!(
            result.rate_limit,
            RateLimit {
                limit: Some(500),
                remaining: Some(499),
                reset: Some(1_700_000_000),
                retry_after: Some(59),
            }
        );
    }

    #[test]
    fn test_zero_is_not_absent() {
        let raw = response(
            200,
            OK_BODY,
            &[
                ("x-credits-charged", "0"),
                ("x-width", "1"),
                ("x-height", "1"),
                ("x-ratelimit-remaining", "0"),
            ],
        );
        let result = interpret(raw).unwrap();
        assert_eq!(result.credits_charged, 0.0);
        assert_eq!(result.rate_limit.remaining, Some(0));
        assert_eq!(result.rate_limit.limit, None);
    }

    #[test]
    fn test_unknown_detected_type_is_kept() {
        let raw = response(
            200,
            OK_BODY,
            &[
                ("x-credits-charged", "1"),
                ("x-width", "1"),
                ("x-height", "1"),
                ("x-type", "graphic"),
            ],
        );
        let result = interpret(raw).unwrap();
        assert_eq!(
            result.detected_type,
            Some(DetectedType::Unknown("graphic".to_string()))
        );
    }

    #[test]
    fn test_malformed_header_values() {
        for (name, value) in [
            ("x-width", "wide"),
            ("x-width", "-1"),
            ("x-credits-charged", "NaN"),
            ("x-credits-charged", "-1"),
            ("x-ratelimit-limit", "lots"),
        ] {
            let mut headers = vec![("x-credits-charged", "1"), ("x-width", "1"), ("x-height", "1")];
            headers.retain(|(existing, _)| *existing != name);
            headers.push((name, value));
            let err = interpret(response(200, OK_BODY, &headers)).unwrap_err();
            assert!(
                matches!(err, RemoveBgError::MalformedResponse { .. }),
                "{}={} should be rejected",
                name,
                value
            );
        }
    }

    #[test]
    fn test_missing_required_header() {
        let raw = response(200, OK_BODY, &[("x-credits-charged", "1"), ("x-width", "1")]);
        let err = interpret(raw).unwrap_err();
        assert!(err.to_string().contains("x-height"));
    }

    #[test]
    fn test_success_without_image() {
        let raw = response(
            200,
            r#"{"data":{}}"#,
            &[("x-credits-charged", "1"), ("x-width", "1"), ("x-height", "1")],
        );
        assert!(matches!(
            interpret(raw),
            Err(RemoveBgError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_structured_error() {
        let raw = response(
            400,
            r#"{"errors":[{"title":"Bad Request","detail":"Invalid size"}]}"#,
            &[],
        );
        let err = interpret(raw).unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.api_errors().unwrap(),
            &[ErrorDetail::new("Bad Request", "Invalid size")]
        );
    }

    #[test]
    fn test_raw_error_body_unchanged() {
        let body = r#"{"message": "upstream failure"}"#;
        let err = interpret(response(400, body, &[])).unwrap_err();
        match err {
            RemoveBgError::Api {
                body: ApiErrorBody::Raw(raw),
                ..
            } => assert_eq!(raw, body),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_non_200_success_codes_are_errors() {
        // Only 200 counts as success
        let raw = response(
            201,
            OK_BODY,
            &[("x-credits-charged", "1"), ("x-width", "1"), ("x-height", "1")],
        );
        assert!(interpret(raw).unwrap_err().is_api());
    }

    #[test]
    fn test_rate_limited_error_carries_retry_after() {
        let raw = response(
            429,
            r#"{"errors":[{"title":"Rate limit exceeded"}]}"#,
            &[("Retry-After", "30"), ("X-RateLimit-Remaining", "0"), ("X-RateLimit-Limit", "??")],
        );
        match interpret(raw).unwrap_err() {
            RemoveBgError::Api { rate_limit, .. } => {
                assert_eq!(rate_limit.retry_after, Some(30));
                assert_eq!(rate_limit.remaining, Some(0));
                assert_eq!(rate_limit.limit, None);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_image() {
        let result = RemoveBgResult {
            base64img: "AAAA".to_string(),
            credits_charged: 1.0,
            detected_type: None,
            result_width: 1,
            result_height: 1,
            rate_limit: RateLimit::default(),
        };
        assert_eq!(result.decode_image().unwrap(), vec![0u8, 0, 0]);

        let broken = RemoveBgResult {
            base64img: "not base64!".to_string(),
            ..result
        };
        assert!(matches!(broken.decode_image(), Err(RemoveBgError::Decode(_))));
    }
}

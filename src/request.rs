//! Outbound request construction
//!
//! All three input modes go through the same two steps: the caller's
//! [`ProcessingOptions`] are flattened into [`NormalizedApiParameters`]
//! (defaults applied, absent values dropped), then [`prepare`] turns the
//! parameters plus the [`ImageSource`] into a transport-agnostic
//! [`PreparedRequest`].

use crate::error::Result;
use crate::options::{ForegroundType, ProcessingOptions, Size};
use crate::services::ImageIoService;
use base64::Engine as _;
use std::path::PathBuf;

/// `size` sent when the caller leaves it unset
pub const DEFAULT_SIZE: Size = Size::Preview;

/// `type` sent when the caller leaves it unset
pub const DEFAULT_FOREGROUND_TYPE: ForegroundType = ForegroundType::Auto;

/// `crop` sent when the caller leaves it unset
pub const DEFAULT_CROP: bool = false;

/// Where the input image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Publicly reachable URL, fetched by the API (`image_url`)
    Url(String),
    /// Local file uploaded as multipart (`image_file`)
    File(PathBuf),
    /// Base64-encoded image sent inline (`image_file_b64`)
    Base64(String),
}

impl ImageSource {
    /// Base64-encode raw image bytes into a `Base64` source
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Base64(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Short name of the input mode, used in logs
    pub fn modality(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::File(_) => "file",
            Self::Base64(_) => "base64",
        }
    }
}

/// A single parameter value as it goes over the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
}

impl ParamValue {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Bool(flag) => write!(f, "{}", flag),
        }
    }
}

/// Flattened parameters actually sent to the API, in wire order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedApiParameters {
    entries: Vec<(String, ParamValue)>,
}

impl NormalizedApiParameters {
    /// Apply defaults and drop absent values
    pub fn from_options(options: &ProcessingOptions) -> Self {
        let mut params = Self::default();

        params.push_text(
            "size",
            Some(options.size.as_ref().unwrap_or(&DEFAULT_SIZE).as_str()),
        );
        params.push_text(
            "type",
            Some(
                options
                    .foreground_type
                    .as_ref()
                    .unwrap_or(&DEFAULT_FOREGROUND_TYPE)
                    .as_str(),
            ),
        );
        params.push_text("format", options.format.map(|format| format.as_str()));
        params.push_text("scale", options.scale.as_deref());
        params.push_text("position", options.position.as_deref());
        params
            .entries
            .push(("crop".to_string(), ParamValue::Bool(options.crop.unwrap_or(DEFAULT_CROP))));
        params.push_text("crop_margin", options.crop_margin.as_deref());
        params.push_text("roi", options.roi.as_deref());
        params.push_text("bg_color", options.bg_color.as_deref());
        params.push_text("bg_image_url", options.bg_image_url.as_deref());

        for (name, value) in &options.extra {
            params.push_text(name, Some(value));
        }

        params
    }

    fn push_text(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.entries
                .push((name.to_string(), ParamValue::Text(value.to_string())));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object with the parameters plus the image field
    pub fn to_json_body(&self, image_field: &str, image: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        for (name, value) in self.iter() {
            body.insert(name.to_string(), value.to_json());
        }
        body.insert(
            image_field.to_string(),
            serde_json::Value::String(image.to_string()),
        );
        serde_json::Value::Object(body)
    }

    /// Text form fields for a multipart body
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

/// Request body, independent of the HTTP client in use
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart {
        fields: Vec<(String, String)>,
        file_name: String,
        file_bytes: Vec<u8>,
    },
}

/// A fully built request, ready for a [`Transport`](crate::transport::Transport)
#[derive(Clone, PartialEq)]
pub struct PreparedRequest {
    pub api_key: String,
    pub body: RequestBody,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("api_key", &"<redacted>")
            .field("body", &self.body)
            .finish()
    }
}

/// Build the outbound request for one call
///
/// For `ImageSource::File` the whole file is read here, so a missing or
/// unreadable path fails before anything is sent.
pub async fn prepare(
    source: &ImageSource,
    params: &NormalizedApiParameters,
    api_key: &str,
) -> Result<PreparedRequest> {
    let body = match source {
        ImageSource::Url(url) => RequestBody::Json(params.to_json_body("image_url", url)),
        ImageSource::Base64(data) => {
            RequestBody::Json(params.to_json_body("image_file_b64", data))
        },
        ImageSource::File(path) => {
            let file_bytes = ImageIoService::read_input(path).await?;
            RequestBody::Multipart {
                fields: params.to_form_fields(),
                file_name: ImageIoService::upload_file_name(path),
                file_bytes,
            }
        },
    };

    Ok(PreparedRequest {
        api_key: api_key.to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoveBgError;
    use crate::options::OutputFormat;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());

        assert_eq!(params.get("size"), Some(&ParamValue::Text("preview".to_string())));
        assert_eq!(params.get("type"), Some(&ParamValue::Text("auto".to_string())));
        assert_eq!(params.get("crop"), Some(&ParamValue::Bool(false)));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_absent_parameters_omitted() {
        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());
        for name in [
            "format",
            "scale",
            "position",
            "crop_margin",
            "roi",
            "bg_color",
            "bg_image_url",
            "output_file",
        ] {
            assert!(!params.contains(name), "{} should be omitted", name);
        }

        let body = params.to_json_body("image_url", "https://example.com/a.jpg");
        assert_eq!(
            body,
            json!({
                "size": "preview",
                "type": "auto",
                "crop": false,
                "image_url": "https://example.com/a.jpg"
            })
        );
    }

    #[test]
    fn test_caller_values_passed_through() {
        let options = ProcessingOptions::builder()
            .size(Size::Full)
            .foreground_type(ForegroundType::Other("graphic".to_string()))
            .format(OutputFormat::Zip)
            .scale("80%")
            .position("center")
            .crop(true)
            .crop_margin("30px")
            .roi("10px 10px 200px 200px")
            .bg_image_url("https://example.com/bg.jpg")
            .param("channels", "alpha")
            .output_file("/tmp/never-sent.png")
            .build()
            .unwrap();

        let params = NormalizedApiParameters::from_options(&options);
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "size",
                "type",
                "format",
                "scale",
                "position",
                "crop",
                "crop_margin",
                "roi",
                "bg_image_url",
                "channels"
            ]
        );
        assert_eq!(params.get("type"), Some(&ParamValue::Text("graphic".to_string())));
        assert_eq!(params.get("crop"), Some(&ParamValue::Bool(true)));
        assert!(!params.contains("bg_color"));
    }

    #[test]
    fn test_empty_string_is_present_not_absent() {
        let options = ProcessingOptions::builder().scale("").build().unwrap();
        let params = NormalizedApiParameters::from_options(&options);
        assert_eq!(params.get("scale"), Some(&ParamValue::Text(String::new())));
    }

    #[test]
    fn test_form_fields_stringify_booleans() {
        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());
        assert_eq!(
            params.to_form_fields(),
            vec![
                ("size".to_string(), "preview".to_string()),
                ("type".to_string(), "auto".to_string()),
                ("crop".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_bytes_encodes_standard_base64() {
        assert_eq!(
            ImageSource::from_bytes(&[0xff, 0x00, 0x10]),
            ImageSource::Base64("/wAQ".to_string())
        );
        assert_eq!(ImageSource::from_bytes(&[]), ImageSource::Base64(String::new()));
    }

    #[tokio::test]
    async fn test_prepare_url_and_base64() {
        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());

        let request = prepare(&ImageSource::Url("https://x/y.png".to_string()), &params, "k")
            .await
            .unwrap();
        assert_eq!(request.api_key, "k");
        match request.body {
            RequestBody::Json(body) => {
                assert_eq!(body["image_url"], json!("https://x/y.png"));
                assert!(body.get("image_file_b64").is_none());
            },
            RequestBody::Multipart { .. } => panic!("expected JSON body"),
        }

        let request = prepare(&ImageSource::Base64("AAAA".to_string()), &params, "k")
            .await
            .unwrap();
        match request.body {
            RequestBody::Json(body) => {
                assert_eq!(body["image_file_b64"], json!("AAAA"));
                assert!(body.get("image_url").is_none());
            },
            RequestBody::Multipart { .. } => panic!("expected JSON body"),
        }
    }

    #[tokio::test]
    async fn test_prepare_file_reads_bytes() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"\xff\xd8\xff fake jpeg").unwrap();

        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());
        let source = ImageSource::File(file.path().to_path_buf());
        let request = prepare(&source, &params, "k").await.unwrap();

        match request.body {
            RequestBody::Multipart {
                fields,
                file_name,
                file_bytes,
            } => {
                assert_eq!(file_bytes, b"\xff\xd8\xff fake jpeg");
                assert!(file_name.ends_with(".jpg"));
                assert!(fields.contains(&("crop".to_string(), "false".to_string())));
            },
            RequestBody::Json(_) => panic!("expected multipart body"),
        }
    }

    #[tokio::test]
    async fn test_prepare_missing_file_is_local_error() {
        let params = NormalizedApiParameters::from_options(&ProcessingOptions::default());
        let source = ImageSource::File(PathBuf::from("/definitely/not/here.png"));
        let err = prepare(&source, &params, "k").await.unwrap_err();
        assert!(matches!(err, RemoveBgError::Io(_)));
        assert!(err.is_local());
    }

    #[test]
    fn test_prepared_request_debug_redacts_key() {
        let request = PreparedRequest {
            api_key: "secret-key".to_string(),
            body: RequestBody::Json(json!({})),
        };
        assert!(!format!("{:?}", request).contains("secret-key"));
    }
}

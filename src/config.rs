//! Drop zone options

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DropzoneError;
use crate::transfer::{BodyEncoding, TransferSettings};
use crate::validate::{AcceptList, Validator};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DropzoneConfig {
    /// Maximum number of records. Above 1 enables multiple selection.
    pub max_files: usize,
    /// Accept list, e.g. `"image/*,.pdf"`. `"*"` takes everything.
    pub accept: String,
    /// Upper bound in bytes, inclusive
    pub max_file_size: Option<u64>,
    /// Upload endpoint. Without one files are only validated and queued.
    pub url: Option<String>,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub with_credentials: bool,
    /// Send the raw file instead of a multipart form
    pub binary: bool,
    pub disabled: bool,
    pub drag_disabled: bool,
    pub show_file_list: bool,
    /// Whether accepted records may be removed by the user
    pub closable: bool,
}

impl Default for DropzoneConfig {
    fn default() -> Self {
        Self {
            max_files: 1,
            accept: "*".to_string(),
            max_file_size: None,
            url: None,
            method: "POST".to_string(),
            headers: BTreeMap::new(),
            with_credentials: false,
            binary: false,
            disabled: false,
            drag_disabled: false,
            show_file_list: true,
            closable: true,
        }
    }
}

impl DropzoneConfig {
    pub fn from_json(json: &str) -> Result<Self, DropzoneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_multiple(&self) -> bool {
        self.max_files > 1
    }

    pub fn validator(&self) -> Validator {
        Validator::new(AcceptList::parse(&self.accept), self.max_file_size)
    }

    /// Check every option. Called when a `Dropzone` is built.
    pub fn validate(&self) -> Result<(), DropzoneError> {
        if self.max_files == 0 {
            return Err(DropzoneError::InvalidConfig(
                "max_files must be at least 1".to_string(),
            ));
        }
        self.transfer_settings().map(|_| ())
    }

    /// Endpoint settings, or `None` when no URL is configured.
    pub fn transfer_settings(&self) -> Result<Option<TransferSettings>, DropzoneError> {
        let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(None);
        };

        Url::parse(url)
            .map_err(|e| DropzoneError::InvalidConfig(format!("Invalid url {}: {}", url, e)))?;

        let method = Method::from_bytes(self.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| DropzoneError::InvalidMethod(self.method.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| DropzoneError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| DropzoneError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(Some(TransferSettings {
            url: url.to_string(),
            method,
            headers,
            encoding: if self.binary {
                BodyEncoding::Binary
            } else {
                BodyEncoding::Multipart
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_single_intake_only() {
        let config = DropzoneConfig::default();
        assert!(!config.is_multiple());
        assert!(config.transfer_settings().unwrap().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = DropzoneConfig::from_json(
            r#"{
                "max_files": 3,
                "accept": "image/*",
                "url": "https://example.com/upload",
                "method": "put",
                "headers": { "X-Token": "abc" },
                "binary": true
            }"#,
        )
        .unwrap();

        assert!(config.is_multiple());
        assert!(config.closable);
        assert!(config.show_file_list);

        let settings = config.transfer_settings().unwrap().unwrap();
        assert_eq!(settings.method, Method::PUT);
        assert_eq!(settings.encoding, BodyEncoding::Binary);
        assert_eq!(settings.headers.get("x-token").unwrap(), "abc");
    }

    #[test]
    fn blank_url_means_no_transfer() {
        let config = DropzoneConfig {
            url: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.transfer_settings().unwrap().is_none());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let zero = DropzoneConfig {
            max_files: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(DropzoneError::InvalidConfig(_))));

        let bad_url = DropzoneConfig {
            url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(DropzoneError::InvalidConfig(_))));

        let bad_method = DropzoneConfig {
            url: Some("http://localhost/".to_string()),
            method: "GET POST".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_method.validate(), Err(DropzoneError::InvalidMethod(_))));

        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let bad_header = DropzoneConfig {
            url: Some("http://localhost/".to_string()),
            headers,
            ..Default::default()
        };
        assert!(matches!(
            bad_header.validate(),
            Err(DropzoneError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            DropzoneConfig::from_json("{ max_files: "),
            Err(DropzoneError::Parse(_))
        ));
    }
}

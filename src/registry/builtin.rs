//! Built-in transforms
//!
//! A small catalog so pipelines are runnable out of the box. Each transform
//! validates its options against its own schema before touching the input.

use crate::core::Options;
use crate::registry::schema::{option_bool, option_integer, option_text};
use crate::registry::{check_options, OptionSpec, Transform, TransformError, TransformRegistry};
use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Inputs above this size are hashed on the blocking pool
const BLOCKING_HASH_THRESHOLD: usize = 64 * 1024;

/// Unreserved characters (RFC 3986) stay as-is
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Register every built-in transform
pub fn register_all(registry: &mut TransformRegistry) {
    registry.register(Base64Encode);
    registry.register(Base64Decode);
    registry.register(JsonFormat);
    registry.register(JsonMinify);
    registry.register(Uppercase);
    registry.register(Lowercase);
    registry.register(Sha256Hash);
    registry.register(UrlEncode);
    registry.register(UrlDecode);
    registry.register(RegexReplace);
}

fn defaults(pairs: &[(&str, Value)]) -> Options {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encode;

#[async_trait]
impl Transform for Base64Encode {
    fn id(&self) -> &str {
        "base64-encode"
    }

    fn name(&self) -> &str {
        "Base64 Encode"
    }

    fn default_options(&self) -> Options {
        defaults(&[("urlSafe", json!(false))])
    }

    fn option_schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::boolean("urlSafe", "URL-safe alphabet")]
    }

    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError> {
        check_options(&self.option_schema(), options)?;
        let encoded = if option_bool(options, "urlSafe", false) {
            general_purpose::URL_SAFE.encode(input.as_bytes())
        } else {
            general_purpose::STANDARD.encode(input.as_bytes())
        };
        Ok(encoded)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decode;

#[async_trait]
impl Transform for Base64Decode {
    fn id(&self) -> &str {
        "base64-decode"
    }

    fn name(&self) -> &str {
        "Base64 Decode"
    }

    fn default_options(&self) -> Options {
        defaults(&[("urlSafe", json!(false))])
    }

    fn option_schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::boolean("urlSafe", "URL-safe alphabet")]
    }

    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError> {
        check_options(&self.option_schema(), options)?;
        let trimmed = input.trim();
        let decoded = if option_bool(options, "urlSafe", false) {
            general_purpose::URL_SAFE.decode(trimmed)
        } else {
            general_purpose::STANDARD.decode(trimmed)
        }
        .map_err(|e| TransformError::InvalidInput(format!("not valid base64: {}", e)))?;

        String::from_utf8(decoded)
            .map_err(|_| TransformError::InvalidInput("decoded bytes are not valid UTF-8".to_string()))
    }
}

fn parse_json(input: &str) -> Result<Value, TransformError> {
    serde_json::from_str(input).map_err(|e| TransformError::InvalidInput(format!("not valid JSON: {}", e)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

#[async_trait]
impl Transform for JsonFormat {
    fn id(&self) -> &str {
        "json-format"
    }

    fn name(&self) -> &str {
        "JSON Formatter"
    }

    fn default_options(&self) -> Options {
        defaults(&[("indent", json!(2))])
    }

    fn option_schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::integer("indent", "Indent width", 0, 8)]
    }

    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError> {
        check_options(&self.option_schema(), options)?;
        let value = parse_json(input)?;
        let indent = option_integer(options, "indent", 2) as usize;

        if indent == 0 {
            return serde_json::to_string(&value).map_err(|e| TransformError::Internal(e.to_string()));
        }

        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| TransformError::Internal(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TransformError::Internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMinify;

#[async_trait]
impl Transform for JsonMinify {
    fn id(&self) -> &str {
        "json-minify"
    }

    fn name(&self) -> &str {
        "JSON Minify"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        let value = parse_json(input)?;
        serde_json::to_string(&value).map_err(|e| TransformError::Internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

#[async_trait]
impl Transform for Uppercase {
    fn id(&self) -> &str {
        "uppercase"
    }

    fn name(&self) -> &str {
        "Uppercase"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        Ok(input.to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

#[async_trait]
impl Transform for Lowercase {
    fn id(&self) -> &str {
        "lowercase"
    }

    fn name(&self) -> &str {
        "Lowercase"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        Ok(input.to_lowercase())
    }
}

fn sha256_hex(input: &[u8], uppercase: bool) -> String {
    let digest = Sha256::digest(input);
    if uppercase {
        hex::encode_upper(digest)
    } else {
        hex::encode(digest)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hash;

#[async_trait]
impl Transform for Sha256Hash {
    fn id(&self) -> &str {
        "sha256"
    }

    fn name(&self) -> &str {
        "SHA-256 Hash"
    }

    fn default_options(&self) -> Options {
        defaults(&[("uppercase", json!(false))])
    }

    fn option_schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::boolean("uppercase", "Uppercase hex")]
    }

    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError> {
        check_options(&self.option_schema(), options)?;
        let uppercase = option_bool(options, "uppercase", false);

        if input.len() <= BLOCKING_HASH_THRESHOLD {
            return Ok(sha256_hex(input.as_bytes(), uppercase));
        }

        let bytes = input.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || sha256_hex(&bytes, uppercase))
            .await
            .map_err(|e| TransformError::Internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncode;

#[async_trait]
impl Transform for UrlEncode {
    fn id(&self) -> &str {
        "url-encode"
    }

    fn name(&self) -> &str {
        "URL Encode"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        Ok(utf8_percent_encode(input, URL_COMPONENT).to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlDecode;

#[async_trait]
impl Transform for UrlDecode {
    fn id(&self) -> &str {
        "url-decode"
    }

    fn name(&self) -> &str {
        "URL Decode"
    }

    async fn run(&self, input: &str, _options: &Options) -> Result<String, TransformError> {
        percent_decode_str(input)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|_| TransformError::InvalidInput("decoded bytes are not valid UTF-8".to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexReplace;

#[async_trait]
impl Transform for RegexReplace {
    fn id(&self) -> &str {
        "regex-replace"
    }

    fn name(&self) -> &str {
        "Regex Replace"
    }

    fn default_options(&self) -> Options {
        defaults(&[
            ("pattern", json!("")),
            ("replacement", json!("")),
            ("global", json!(true)),
        ])
    }

    fn option_schema(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::text("pattern", "Pattern"),
            OptionSpec::text("replacement", "Replacement"),
            OptionSpec::boolean("global", "Replace all matches"),
        ]
    }

    async fn run(&self, input: &str, options: &Options) -> Result<String, TransformError> {
        check_options(&self.option_schema(), options)?;
        let pattern = option_text(options, "pattern", "");
        if pattern.is_empty() {
            return Err(TransformError::invalid_option("pattern", "must not be empty"));
        }

        let regex = Regex::new(pattern).map_err(|e| TransformError::invalid_option("pattern", e.to_string()))?;
        let replacement = option_text(options, "replacement", "");

        let output = if option_bool(options, "global", true) {
            regex.replace_all(input, replacement)
        } else {
            regex.replace(input, replacement)
        };
        Ok(output.into_owned())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! S3 object storage client.
//!
//! The core treats storage as a small capability: `put`, `presign`, `head`.
//! Presigned URLs are computed locally with SigV4 query signing (only the
//! `host` header is signed; payloads are unsigned), object bytes move over
//! plain HTTPS via reqwest. Locators have the form `s3://{bucket}/{key}`
//! and are opaque to everything outside this module.

use crate::error::AppError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Presigned URLs are valid for one hour.
pub const PRESIGN_TTL_SECS: u64 = 3600;

/// S3 client.
#[derive(Clone)]
pub struct ObjectStore {
    http: reqwest::Client,
    bucket: String,
    region: String,
    access_key: String,
    secret_key: String,
    /// Offline mode for tests: deterministic URLs, no network.
    mock: bool,
}

impl ObjectStore {
    pub fn new(bucket: String, region: String, access_key: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket,
            region,
            access_key,
            secret_key,
            mock: false,
        }
    }

    /// Create a mock store for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            bucket: "mock-bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key: "mock".to_string(),
            secret_key: "mock".to_string(),
            mock: true,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Full locator for a key in the configured bucket.
    pub fn locator_for(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Split an `s3://bucket/key` locator.
    pub fn parse_locator(locator: &str) -> Result<(&str, &str), AppError> {
        let rest = locator
            .strip_prefix("s3://")
            .ok_or_else(|| AppError::BadRequest("Invalid storage locator format".to_string()))?;
        rest.split_once('/')
            .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
            .ok_or_else(|| AppError::BadRequest("Invalid storage locator format".to_string()))
    }

    /// Presign a request for a key in the configured bucket.
    pub fn presign(&self, method: &str, key: &str, expires_secs: u64) -> Result<String, AppError> {
        self.presign_in(method, &self.bucket, key, expires_secs)
    }

    /// Presign a GET for an existing locator (download URL).
    pub fn presign_get_locator(
        &self,
        locator: &str,
        expires_secs: u64,
    ) -> Result<String, AppError> {
        let (bucket, key) = Self::parse_locator(locator)?;
        self.presign_in("GET", bucket, key, expires_secs)
    }

    /// Byte size of a stored object, via a signed HEAD request.
    pub async fn head(&self, locator: &str) -> Result<i64, AppError> {
        if self.mock {
            return Ok(0);
        }

        let (bucket, key) = Self::parse_locator(locator)?;
        let url = self.presign_in("HEAD", bucket, key, 60)?;
        let response = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HEAD request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "HEAD returned status {}",
                response.status()
            )));
        }

        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::Storage("Missing Content-Length".to_string()))
    }

    /// Upload bytes to a key in the configured bucket.
    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        if self.mock {
            return Ok(());
        }

        let url = self.presign("PUT", key, 60)?;
        let response = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("PUT request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "PUT returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// SigV4 query-string presigning against a virtual-hosted bucket URL.
    fn presign_in(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        expires_secs: u64,
    ) -> Result<String, AppError> {
        let canonical_uri = format!("/{}", encode_key(key));

        if self.mock {
            return Ok(format!(
                "https://{}.s3.mock.local{}?X-Amz-Expires={}",
                bucket, canonical_uri, expires_secs
            ));
        }

        let host = format!("{}.s3.{}.amazonaws.com", bucket, self.region);
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", datestamp, self.region);
        let credential = format!("{}/{}", self.access_key, scope);

        // Already in canonical (sorted) order
        let params = [
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires_secs.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        let canonical_query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            method, canonical_uri, canonical_query, host
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            datestamp.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            host, canonical_uri, canonical_query, signature
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// URI-encode an object key, keeping `/` as the segment separator.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locator() {
        let (bucket, key) = ObjectStore::parse_locator(
            "s3://medkin-docs/documents/user_1/member_0/prescription/abc.pdf",
        )
        .unwrap();
        assert_eq!(bucket, "medkin-docs");
        assert_eq!(key, "documents/user_1/member_0/prescription/abc.pdf");
    }

    #[test]
    fn test_parse_locator_rejects_bad_input() {
        assert!(ObjectStore::parse_locator("http://bucket/key").is_err());
        assert!(ObjectStore::parse_locator("s3://bucket-only").is_err());
        assert!(ObjectStore::parse_locator("s3:///key").is_err());
    }

    #[test]
    fn test_presign_shape() {
        let store = ObjectStore::new(
            "docs".to_string(),
            "us-east-1".to_string(),
            "AKIDEXAMPLE".to_string(),
            "secret".to_string(),
        );
        let url = store
            .presign("PUT", "documents/user_1/member_0/other/x.pdf", 3600)
            .unwrap();

        assert!(url.starts_with("https://docs.s3.us-east-1.amazonaws.com/documents/"));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-SignedHeaders=host"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn test_encode_key_preserves_segments() {
        assert_eq!(encode_key("a/b c/d"), "a/b%20c/d");
    }

    #[test]
    fn test_mock_round_trip() {
        let store = ObjectStore::new_mock();
        let locator = store.locator_for("documents/user_1/member_0/other/x.pdf");
        assert!(locator.starts_with("s3://mock-bucket/"));
        let url = store.presign_get_locator(&locator, 3600).unwrap();
        assert!(url.contains("mock.local"));
    }
}

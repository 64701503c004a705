//! Test mock for the API client and JSON fixtures
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use url::Url;

use super::transport::MockTransport;
use crate::api::{ApiClientImpl, Endpoints};

pub type MockApi = ApiClientImpl<MockTransport>;

pub fn mock_api() -> (MockTransport, MockApi) {
    let transport = MockTransport::new();
    let endpoints = Endpoints {
        api_base: Url::parse("https://api.test/").unwrap(),
        oauth_token_url: Url::parse("https://auth.test/oauth/token").unwrap(),
        access_key: "access".to_string(),
        secret_key: "secret".to_string(),
        redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
    };
    (transport.clone(), ApiClientImpl::new(transport, endpoints))
}

pub fn test_data_path(file_name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data/")
        .join(file_name)
}

pub fn photo_json(id: &str, liked: bool) -> Value {
    json!({
        "id": id,
        "width": 3000,
        "height": 2000,
        "created_at": "2024-03-19T10:15:00Z",
        "description": format!("photo {id}"),
        "urls": {
            "thumb": format!("https://images.test/{id}?w=200"),
            "regular": format!("https://images.test/{id}?w=1080"),
            "full": format!("https://images.test/{id}"),
        },
        "liked_by_user": liked,
    })
}

/// A page with photos `P{n}` for every `n` in `range`, none liked.
pub fn page_json(range: RangeInclusive<u32>) -> Value {
    Value::Array(
        range
            .map(|n| photo_json(&format!("P{n}"), false))
            .collect(),
    )
}

pub fn like_json(id: &str, liked: bool) -> Value {
    json!({
        "photo": {
            "id": id,
            "liked_by_user": liked,
        }
    })
}

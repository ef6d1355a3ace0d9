use crate::errors::{AppError, AppResult};
use crate::worker::network::Response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Build descriptor served at the version path. Only `buildId` is
/// interpreted; anything else rides along to the page untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    #[serde(rename = "buildId")]
    pub build_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionDescriptor {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            extra: Map::new(),
        }
    }

    pub fn from_response(response: &Response) -> AppResult<Self> {
        if !response.is_success() {
            return Err(AppError::Network(format!(
                "version descriptor returned HTTP {}",
                response.status
            )));
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub fn to_response(&self) -> AppResult<Response> {
        Ok(Response::ok(serde_json::to_vec(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_survive_a_round_trip() {
        let body = br#"{"buildId":"abc123","deployedAt":"2025-01-20T10:00:00Z"}"#;
        let v = VersionDescriptor::from_response(&Response::ok(body.to_vec())).unwrap();
        assert_eq!(v.build_id, "abc123");
        assert_eq!(v.extra["deployedAt"], "2025-01-20T10:00:00Z");

        let back = VersionDescriptor::from_response(&v.to_response().unwrap()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn non_success_status_is_an_error() {
        let r = Response::ok("nope").with_status(404);
        assert!(VersionDescriptor::from_response(&r).is_err());
    }
}

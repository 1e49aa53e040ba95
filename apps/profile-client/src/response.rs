use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ClientError;

/// What came back from one submission: status, headers, raw body and a
/// best-effort JSON decode of the body.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
    json: Option<Value>,
}

impl Response {
    /// Decodes `body` as JSON if it can; a body that is not JSON only keeps its text.
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            headers,
            body,
            json,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Header names are stored lower-cased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn is_successful(&self) -> bool {
        is_successful(self.status)
    }

    /// The `detail` field of a JSON error body, or the raw body text.
    ///
    /// A string `detail` is returned verbatim. Any other `detail` value (the
    /// API sends a list of validation errors on 422) is returned as compact JSON.
    pub fn error_detail(&self) -> String {
        match self.json.as_ref().and_then(|j| j.get("detail")) {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => self.body.clone(),
        }
    }

    /// Decodes the body into a typed value.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let json = self.json.as_ref().ok_or(ClientError::NotJson {
            status: self.status,
        })?;
        Ok(T::deserialize(json)?)
    }
}

/// True iff `status` is in `[200, 300)`.
pub fn is_successful(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn response(status: u16, body: &str) -> Response {
        Response::new(status, BTreeMap::new(), body.to_string())
    }

    #[test]
    fn test_is_successful_range() {
        for status in 0..600u16 {
            assert_eq!(
                is_successful(status),
                (200..=299).contains(&status),
                "status {status}"
            );
        }
        assert!(response(204, "").is_successful());
        assert!(!response(422, "").is_successful());
    }

    #[test]
    fn test_json_decoded_when_valid() {
        let r = response(200, r#"{"result":"ok"}"#);
        assert_eq!(r.json(), Some(&json!({"result": "ok"})));
        assert_eq!(r.body(), r#"{"result":"ok"}"#);
    }

    #[test]
    fn test_invalid_json_keeps_raw_body() {
        let r = response(502, "<html>Bad Gateway</html>");
        assert!(r.json().is_none());
        assert_eq!(r.body(), "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_error_detail_string() {
        let r = response(422, r#"{"detail":"age required"}"#);
        assert_eq!(r.error_detail(), "age required");
    }

    #[test]
    fn test_error_detail_structured() {
        let r = response(
            422,
            r#"{"detail":[{"loc":["body","description"],"msg":"field required"}]}"#,
        );
        assert_eq!(
            r.error_detail(),
            r#"[{"loc":["body","description"],"msg":"field required"}]"#
        );
    }

    #[test]
    fn test_error_detail_falls_back_to_body() {
        assert_eq!(response(500, "Internal Server Error").error_detail(), "Internal Server Error");
        assert_eq!(
            response(400, r#"{"message":"bad"}"#).error_detail(),
            r#"{"message":"bad"}"#
        );
        // a top-level array has no `detail` key
        assert_eq!(response(400, "[1,2]").error_detail(), "[1,2]");
    }

    #[test]
    fn test_json_as() {
        #[derive(Deserialize)]
        struct Outcome {
            result: String,
        }
        let r = response(200, r#"{"result":"ok"}"#);
        assert_eq!(r.json_as::<Outcome>().unwrap().result, "ok");

        let r = response(200, "plain text");
        assert!(matches!(
            r.json_as::<Outcome>(),
            Err(ClientError::NotJson { status: 200 })
        ));

        let r = response(200, r#"{"other":1}"#);
        assert!(matches!(r.json_as::<Outcome>(), Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let r = Response::new(200, headers, "{}".to_string());
        assert_eq!(r.header("Content-Type"), Some("application/json"));
        assert_eq!(r.header("x-missing"), None);
    }
}

use serde_json::Value;

use crate::error::ProxyError;
use crate::prompt::PlaybookRequest;

/// Request validation utilities. All shape problems collapse into the same
/// fixed 400 response; the client never learns which field was missing.
pub struct RequestValidator;

impl RequestValidator {
    /// Parse a raw request body into a validated [`PlaybookRequest`].
    ///
    /// All five fields must be present and non-empty. The interest-count
    /// ceiling is a client-side soft limit and is not re-checked here.
    pub fn parse_playbook_request(body: &[u8]) -> Result<PlaybookRequest, ProxyError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| ProxyError::MissingFields)?;

        let destination = Self::require_string(&value, "destination")?;
        let duration = Self::require_string(&value, "duration")?;
        let budget = Self::require_string(&value, "budget")?;
        let work_situation = Self::require_string(&value, "workSituation")?;
        let interests = Self::require_string_array(&value, "interests")?;

        Ok(PlaybookRequest {
            destination,
            duration,
            budget,
            work_situation,
            interests,
        })
    }

    fn require_string(value: &Value, field: &str) -> Result<String, ProxyError> {
        value
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(ProxyError::MissingFields)
    }

    fn require_string_array(value: &Value, field: &str) -> Result<Vec<String>, ProxyError> {
        let items = value
            .get(field)
            .and_then(|v| v.as_array())
            .ok_or(ProxyError::MissingFields)?;

        let interests: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if interests.is_empty() {
            return Err(ProxyError::MissingFields);
        }
        Ok(interests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "destination": "Lisbon, Portugal",
            "duration": "4 weeks",
            "budget": "mid-range",
            "workSituation": "full-time remote",
            "interests": ["food", "coworking"]
        })
    }

    fn parse(value: Value) -> Result<PlaybookRequest, ProxyError> {
        RequestValidator::parse_playbook_request(&serde_json::to_vec(&value).unwrap())
    }

    #[test]
    fn test_valid_request() {
        let request = parse(valid_body()).unwrap();
        assert_eq!(request.destination, "Lisbon, Portugal");
        assert_eq!(request.work_situation, "full-time remote");
        assert_eq!(request.interests, vec!["food", "coworking"]);
    }

    #[test]
    fn test_each_missing_field_rejected() {
        for field in ["destination", "duration", "budget", "workSituation", "interests"] {
            let mut body = valid_body();
            body.as_object_mut().unwrap().remove(field);
            assert!(
                matches!(parse(body), Err(ProxyError::MissingFields)),
                "field {} should be required",
                field
            );
        }
    }

    #[test]
    fn test_empty_string_field_rejected() {
        let mut body = valid_body();
        body["destination"] = json!("   ");
        assert!(matches!(parse(body), Err(ProxyError::MissingFields)));
    }

    #[test]
    fn test_empty_interests_rejected() {
        let mut body = valid_body();
        body["interests"] = json!([]);
        assert!(matches!(parse(body), Err(ProxyError::MissingFields)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = RequestValidator::parse_playbook_request(b"not json");
        assert!(matches!(result, Err(ProxyError::MissingFields)));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut body = valid_body();
        body["interests"] = json!("food");
        assert!(matches!(parse(body), Err(ProxyError::MissingFields)));
    }
}

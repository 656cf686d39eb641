//! ARN parsing and account-id masking for printed output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Replacement written over masked account ids.
pub const MASK: &str = "XXXXXXXXXXXX";

// arn:<partition>:<service>:<region>:<account>:<resource>
static ARN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arn:([a-z0-9-]+):([a-z0-9-]+):([a-z0-9-]*):(\d{12}|):(.+)$").unwrap()
});
static ACCOUNT_IN_ARN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(arn:[a-z0-9-]+:[a-z0-9-]+:[a-z0-9-]*:)(\d{12})(:)").unwrap());

/// A parsed ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    pub fn parse(s: &str) -> Option<Self> {
        let caps = ARN_RE.captures(s)?;
        Some(Self {
            partition: caps[1].to_string(),
            service: caps[2].to_string(),
            region: caps[3].to_string(),
            account: caps[4].to_string(),
            resource: caps[5].to_string(),
        })
    }

    /// Resource type prefix, e.g. `predictor` in `predictor/my_predictor`.
    pub fn resource_type(&self) -> &str {
        self.resource.split('/').next().unwrap_or(&self.resource)
    }

    /// Last path segment of the resource, usually the user-chosen name.
    pub fn resource_name(&self) -> &str {
        self.resource.rsplit('/').next().unwrap_or(&self.resource)
    }

    /// Same ARN with the account id replaced by [`MASK`].
    pub fn masked(&self) -> String {
        let account = if self.account.is_empty() { "" } else { MASK };
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, account, self.resource
        )
    }
}

impl std::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

/// Mask every ARN account id appearing anywhere in `text`.
pub fn mask_accounts(text: &str) -> String {
    ACCOUNT_IN_ARN_RE
        .replace_all(text, format!("${{1}}{}${{3}}", MASK).as_str())
        .into_owned()
}

/// Mask account ids in every string inside a JSON value.
pub fn mask_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(mask_accounts(s)),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(mask_json).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), mask_json(v))).collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREDICTOR: &str = "arn:aws:forecast:us-east-1:123456789012:predictor/electricity_auto";

    #[test]
    fn test_parse_arn() {
        let arn = Arn::parse(PREDICTOR).unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "forecast");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.resource_type(), "predictor");
        assert_eq!(arn.resource_name(), "electricity_auto");
        assert_eq!(arn.to_string(), PREDICTOR);
    }

    #[test]
    fn test_parse_rejects_non_arn() {
        assert!(Arn::parse("predictor/electricity").is_none());
        assert!(Arn::parse("arn:aws:forecast:us-east-1:12345:predictor/p").is_none());
    }

    #[test]
    fn test_masked() {
        let arn = Arn::parse(PREDICTOR).unwrap();
        assert_eq!(
            arn.masked(),
            "arn:aws:forecast:us-east-1:XXXXXXXXXXXX:predictor/electricity_auto"
        );
    }

    #[test]
    fn test_mask_accounts_in_text() {
        let text = format!("Created {} and arn:aws:s3:::bucket/key", PREDICTOR);
        let masked = mask_accounts(&text);
        assert!(!masked.contains("123456789012"));
        assert!(masked.contains("XXXXXXXXXXXX:predictor/electricity_auto"));
        // S3 ARNs carry no account and stay untouched
        assert!(masked.contains("arn:aws:s3:::bucket/key"));
    }

    #[test]
    fn test_mask_json_nested() {
        let value = serde_json::json!({
            "PredictorArn": PREDICTOR,
            "MonitorInfo": {"MonitorArn": format!("{}/monitor", PREDICTOR)},
            "Count": 3,
        });
        let masked = mask_json(&value);
        assert!(!masked.to_string().contains("123456789012"));
        assert_eq!(masked["Count"], 3);
    }
}

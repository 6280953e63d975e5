use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "pricewatch.v1";

/// Run details attached to a result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub duration_ms: u64,
    /// HTTP attempts spent; absent when nothing was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl Meta {
    pub fn elapsed(started: Instant) -> Self {
        Meta { duration_ms: started.elapsed().as_millis() as u64, attempts: None }
    }

    pub fn with_attempts(self, attempts: u32) -> Self {
        Meta { attempts: Some(attempts), ..self }
    }
}

/// One per command on stdout: either a plan (dry run) or a result (`--apply`).
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    fn stamped(op: &'static str, apply: bool, meta: Option<Meta>) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply,
            plan: None,
            result: None,
            meta,
        }
    }

    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> serde_json::Result<Self> {
        let mut env = Envelope::stamped(op, false, meta);
        env.plan = Some(serde_json::to_value(plan)?);
        Ok(env)
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> serde_json::Result<Self> {
        let mut env = Envelope::stamped(op, true, meta);
        env.result = Some(serde_json::to_value(result)?);
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_envelope_has_no_result() {
        let env = Envelope::plan("product", &json!({"url": "https://item.jd.com/1.html"}), None).unwrap();
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
        assert_eq!(v["op"], "product");
        assert_eq!(v["apply"], false);
        assert_eq!(v["plan"]["url"], "https://item.jd.com/1.html");
        assert!(v.get("result").is_none());
        assert!(v.get("meta").is_none());
    }

    #[test]
    fn fetch_attempts_reported_in_meta() {
        let meta = Meta::elapsed(Instant::now()).with_attempts(3);
        let env = Envelope::result("extract", &json!({"outcome": "success"}), Some(meta)).unwrap();
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["apply"], true);
        assert_eq!(v["meta"]["attempts"], 3);
        assert!(v["meta"]["duration_ms"].is_u64());
    }

    #[test]
    fn attempts_omitted_when_nothing_fetched() {
        let env = Envelope::result("sweep", &json!({"checked": 0}), Some(Meta::elapsed(Instant::now()))).unwrap();
        let s = serde_json::to_string(&env).unwrap();
        assert!(s.contains("\"duration_ms\""));
        assert!(!s.contains("\"attempts\""));
    }
}

//! Conversion between job descriptors and the raw payloads stored on queues.
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::PayloadEncode;

/// Capability to serialize a job descriptor and its data into a raw queue payload.
pub trait PayloadBuilder: Send + Sync {
    /// Serialize the job descriptor and associated data into a payload string.
    fn create(&self, job: &str, data: Json) -> Result<String>;
}

/// Encode jobs as `{"job": <descriptor>, "data": <data>}` JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPayloadBuilder;

impl PayloadBuilder for JsonPayloadBuilder {
    fn create(&self, job: &str, data: Json) -> Result<String> {
        let payload = JobPayload {
            job: Some(job.to_string()),
            data,
        };
        let payload =
            serde_json::to_string(&payload).with_context(|| PayloadEncode(job.to_string()))?;
        Ok(payload)
    }
}

/// Structure of payloads created by the [`JsonPayloadBuilder`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JobPayload {
    /// Descriptor of the job to execute.
    #[serde(default)]
    pub job: Option<String>,

    /// Data associated with the job.
    #[serde(default)]
    pub data: Json,
}

//! Per-operation options for queue interactions.
use serde::Deserialize;
use serde::Serialize;

/// Options recognised when pushing raw payloads onto a queue.
///
/// Options left unset fall back to the defaults of the queue backend in use.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PushOptions {
    /// Time-to-live, in seconds, of the pushed message.
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl PushOptions {
    /// Request a specific time-to-live, in seconds, for the pushed message.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::PushOptions;

    #[test]
    fn decode_empty_options() {
        let options: PushOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PushOptions::default());
        assert_eq!(options.ttl, None);
    }

    #[test]
    fn decode_ttl() {
        let options: PushOptions = serde_json::from_str(r#"{"ttl": 3600}"#).unwrap();
        assert_eq!(options, PushOptions::default().with_ttl(3600));
    }
}

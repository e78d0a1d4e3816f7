//! Configuration for the Cloud Queues backend.
use serde::Deserialize;
use serde::Serialize;

/// Cloud Queues specific configuration for the job queue interface.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Identifier sent to the service with every request, a random UUID when not set.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Name of the queue used when operations don't name one.
    #[serde(default = "Conf::default_default_queue")]
    pub default_queue: String,

    /// Base URL of the Cloud Queues API, including the version path.
    pub endpoint: String,

    /// Project the queues belong to.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Timeouts applied to requests to the service.
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Authentication token for the service.
    #[serde(default)]
    pub token: Option<String>,
}

impl Conf {
    fn default_default_queue() -> String {
        String::from("default")
    }
}

/// Timeouts, in seconds, applied to requests to the service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Timeout for new connections to the service.
    #[serde(default = "Timeouts::default_connect_s")]
    pub connect_s: u64,

    /// Timeout for the full request/response cycle.
    #[serde(default = "Timeouts::default_request_s")]
    pub request_s: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect_s: Self::default_connect_s(),
            request_s: Self::default_request_s(),
        }
    }
}

impl Timeouts {
    fn default_connect_s() -> u64 {
        1
    }

    fn default_request_s() -> u64 {
        30
    }
}

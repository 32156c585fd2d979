//! Telemetry sink settings.
//!
//! Log events are shipped to a Seq server by the collector in front of the
//! process; the service only validates and advertises the endpoint. The
//! Prometheus exporter is started here when enabled.

use std::net::SocketAddr;
use url::Url;

use crate::config::TelemetryConfig;
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid Seq server url '{value}': {source}")]
    SeqUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),
}

/// Resolved telemetry endpoints.
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub seq_server_url: Url,
    pub metrics_address: Option<SocketAddr>,
}

impl TelemetrySettings {
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let seq_server_url =
            Url::parse(&config.seq_server_url).map_err(|source| TelemetryError::SeqUrl {
                value: config.seq_server_url.clone(),
                source,
            })?;

        let metrics_address = if config.metrics_enabled {
            let addr = config
                .metrics_address
                .parse()
                .map_err(|_| TelemetryError::MetricsAddress(config.metrics_address.clone()))?;
            Some(addr)
        } else {
            None
        };

        Ok(Self {
            service_name: config.service_name.clone(),
            seq_server_url,
            metrics_address,
        })
    }

    /// Start the exporter, if one is configured.
    pub fn install(&self) -> Result<(), TelemetryError> {
        tracing::info!(
            service = %self.service_name,
            seq = %self.seq_server_url,
            "Telemetry configured"
        );
        if let Some(addr) = self.metrics_address {
            metrics::init_metrics(addr)?;
        }
        Ok(())
    }
}

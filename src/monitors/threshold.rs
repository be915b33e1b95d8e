use crate::{EndpointMetric, config::ThresholdConfig};

/// The four connectivity readings a threshold can be set on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    HttpRoundTrip,
    Jitter,
    Latency,
    PacketLoss,
}

impl Reading {
    pub const ALL: [Reading; 4] = [
        Reading::HttpRoundTrip,
        Reading::Jitter,
        Reading::Latency,
        Reading::PacketLoss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Reading::HttpRoundTrip => "http_round_trip",
            Reading::Jitter => "jitter",
            Reading::Latency => "latency",
            Reading::PacketLoss => "packet_loss",
        }
    }

    fn value(&self, metric: &EndpointMetric) -> f64 {
        match self {
            Reading::HttpRoundTrip => metric.http_round_trip_ms,
            Reading::Jitter => metric.jitter_ms,
            Reading::Latency => metric.latency_ms,
            Reading::PacketLoss => metric.packet_loss_pct,
        }
    }

    fn limit(&self, config: &ThresholdConfig) -> f64 {
        match self {
            Reading::HttpRoundTrip => config.http_round_trip_max,
            Reading::Jitter => config.jitter_max,
            Reading::Latency => config.latency_max,
            Reading::PacketLoss => config.packet_loss_max,
        }
    }

    /// Strictly greater than the limit. Equal readings never breach.
    pub fn exceeds(&self, metric: &EndpointMetric, config: &ThresholdConfig) -> bool {
        self.value(metric) > self.limit(config)
    }
}

/// Returns true if any reading of `metric` strictly exceeds its threshold.
pub fn evaluate(metric: &EndpointMetric, config: &ThresholdConfig) -> bool {
    metric.http_round_trip_ms > config.http_round_trip_max
        || metric.jitter_ms > config.jitter_max
        || metric.latency_ms > config.latency_max
        || metric.packet_loss_pct > config.packet_loss_max
}

/// The readings of `metric` that exceed their thresholds, in fixed order.
pub fn breached_readings(metric: &EndpointMetric, config: &ThresholdConfig) -> Vec<Reading> {
    Reading::ALL
        .into_iter()
        .filter(|reading| reading.exceeds(metric, config))
        .collect()
}

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::info;

/// How an obfuscation request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    Unsupported,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Rejected => "rejected",
            Outcome::Unsupported => "unsupported",
            Outcome::Failed => "failed",
        }
    }
}

#[derive(Clone)]
pub struct ServiceMetrics {
    pub obfuscations_total: IntCounterVec,
    pub obfuscation_duration: HistogramVec,
    pub input_bytes: Histogram,
    registry: Registry,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let obfuscations_total = IntCounterVec::new(
            Opts::new(
                "codecloak_obfuscations_total",
                "Obfuscation requests by language and outcome",
            )
            .const_label("service", "codecloak-api"),
            &["language", "outcome"],
        )?;
        registry.register(Box::new(obfuscations_total.clone()))?;

        let obfuscation_duration = HistogramVec::new(
            HistogramOpts::new(
                "codecloak_obfuscation_duration_seconds",
                "Time spent obfuscating one request",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["language"],
        )?;
        registry.register(Box::new(obfuscation_duration.clone()))?;

        let input_bytes = Histogram::with_opts(
            HistogramOpts::new("codecloak_input_bytes", "Size of submitted source text")
                .buckets(prometheus::exponential_buckets(256.0, 4.0, 10)?),
        )?;
        registry.register(Box::new(input_bytes.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            obfuscations_total,
            obfuscation_duration,
            input_bytes,
            registry,
        })
    }

    pub fn record_obfuscation(
        &self,
        language: &str,
        outcome: Outcome,
        duration_seconds: f64,
        bytes: usize,
    ) {
        self.obfuscations_total
            .with_label_values(&[language, outcome.as_str()])
            .inc();
        self.input_bytes.observe(bytes as f64);
        if outcome != Outcome::Rejected {
            self.obfuscation_duration
                .with_label_values(&[language])
                .observe(duration_seconds);
        }

        info!(
            language,
            outcome = outcome.as_str(),
            duration_ms = duration_seconds * 1000.0,
            bytes,
            "Obfuscation request completed"
        );
    }

    pub fn render_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_labelled() {
        let metrics = ServiceMetrics::new().unwrap();
        metrics.record_obfuscation("c", Outcome::Success, 0.002, 120);
        metrics.record_obfuscation("c", Outcome::Success, 0.003, 80);
        metrics.record_obfuscation("unknown", Outcome::Unsupported, 0.0, 10);

        assert_eq!(
            metrics
                .obfuscations_total
                .with_label_values(&["c", "success"])
                .get(),
            2
        );
        let text = metrics.render_metrics().unwrap();
        assert!(text.contains("codecloak_obfuscations_total"));
        assert!(text.contains("outcome=\"unsupported\""));
        assert!(text.contains("codecloak_obfuscation_duration_seconds_bucket"));
    }
}

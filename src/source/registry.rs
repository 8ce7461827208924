use super::mock::{SimulatedConfig, SimulatedDetectorSource};
use super::tcp::TcpSource;
use super::traits::{split_address, FrameSource};
use crate::config::IngestConfig;
use crate::error::{PipelineError, Result};
use std::collections::HashMap;

type SourceFactory = Box<dyn Fn(&str) -> Result<Box<dyn FrameSource>> + Send + Sync>;

/// Resolves source addresses to `FrameSource` instances by scheme
pub struct SourceRegistry {
    factories: HashMap<String, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// `tcp` and `mock` with the default channel layout
    pub fn with_defaults() -> Self {
        Self::for_config(&IngestConfig::default())
    }

    /// `tcp` and `mock`, with simulated frames laid out on the channels
    /// the given config reads from.
    pub fn for_config(config: &IngestConfig) -> Self {
        let mut registry = Self::new();
        registry.register("tcp", |address| Ok(Box::new(TcpSource::new(address)?)));

        let base = SimulatedConfig {
            waveform: config.waveform.clone(),
            acquisition_id: config.acquisition_id.clone(),
            ..SimulatedConfig::default()
        };
        registry.register("mock", move |address| {
            let config = base.clone().with_address_options(address)?;
            Ok(Box::new(SimulatedDetectorSource::new(address, config)))
        });
        registry
    }

    pub fn register<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn(&str) -> Result<Box<dyn FrameSource>> + Send + Sync + 'static,
    {
        self.factories.insert(scheme.to_string(), Box::new(factory));
    }

    pub fn create(&self, address: &str) -> Result<Box<dyn FrameSource>> {
        let (scheme, _) = split_address(address)
            .ok_or_else(|| PipelineError::UnsupportedScheme(address.to_string()))?;
        let factory = self
            .factories
            .get(scheme)
            .ok_or_else(|| PipelineError::UnsupportedScheme(address.to_string()))?;
        factory(address)
    }

    pub fn list_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.factories.keys().cloned().collect();
        schemes.sort();
        schemes
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_register_tcp_and_mock() {
        let registry = SourceRegistry::with_defaults();
        assert_eq!(registry.list_schemes(), vec!["mock".to_string(), "tcp".to_string()]);
    }

    #[test]
    fn test_unknown_scheme() {
        let registry = SourceRegistry::with_defaults();
        assert!(matches!(
            registry.create("zmq://10.0.0.1:6666"),
            Err(PipelineError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            registry.create("no-scheme"),
            Err(PipelineError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_create_keeps_endpoint() {
        let registry = SourceRegistry::with_defaults();
        let source = registry.create("mock://test?frames=2").unwrap();
        assert_eq!(source.endpoint(), "mock://test?frames=2");
    }
}

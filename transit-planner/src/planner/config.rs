//! Search configuration for the journey planner.

/// Configuration parameters for journey search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of itineraries `find_multiple` returns.
    pub max_results: usize,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 3);
    }

    #[test]
    fn custom_config() {
        let config = SearchConfig::new(1);
        assert_eq!(config.max_results, 1);
    }
}

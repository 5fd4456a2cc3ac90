/*!
 * Title to PDF resolution.
 *
 * Providers are queried in a fixed order and the first one that finds the
 * paper wins. Provider failures do not stop the chain.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::parser::truncate_chars;
use crate::providers::{SearchProvider, SearchResult};

/// Fixed-order fallback over search providers
#[derive(Debug, Clone)]
pub struct Resolver {
    providers: Vec<Arc<dyn SearchProvider>>,
    /// Pause after each query to the primary provider
    request_delay: Duration,
}

impl Resolver {
    /// Create a resolver querying `providers` in order
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, request_delay: Duration) -> Self {
        Self {
            providers,
            request_delay,
        }
    }

    /// Names of the configured providers, in query order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a title. Returns the first result with `found == true`, or the
    /// last provider's negative result when nobody found the paper.
    pub async fn resolve(&self, title: &str) -> SearchResult {
        let mut last = SearchResult::not_found("none");

        for (index, provider) in self.providers.iter().enumerate() {
            if index > 0 {
                debug!("Trying {}...", provider.name());
            }

            let result = match provider.search(title).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        "{} search error for '{}': {}",
                        provider.name(),
                        truncate_chars(title, 50),
                        e
                    );
                    SearchResult::failed(provider.name(), &e)
                }
            };

            if index == 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            if result.found {
                return result;
            }
            last = result;
        }

        last
    }
}

//! Provider selection, weighted by advertised domain count.
//!
//! Domain lists are refreshed at selection time: a provider that advertises
//! more domains right now is assumed to have more capacity right now. The
//! weighting says nothing about delivery quality, only availability.
//!
//! # Example
//!
//! ```
//! use tempbox::select::weighted_index;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let idx = weighted_index(&[2, 3, 5], &mut rng).unwrap();
//! assert!(idx < 3);
//! ```

use crate::error::{Error, Result};
use crate::provider::{MailProvider, ProviderDescriptor};
use crate::retry::{domains_with_retry, RetryConfig};
use crate::config::SelectionMode;
use rand::Rng;
use tracing::{debug, instrument, warn};

/// Draws a provider index, weighted by domain count.
///
/// Provider `i` is chosen with probability `counts[i] / sum(counts)`.
/// Zero-weight entries are never chosen.
///
/// # Errors
///
/// Returns [`Error::NoDomainsAvailable`] when every count is zero.
pub fn weighted_index<R: Rng + ?Sized>(counts: &[usize], rng: &mut R) -> Result<usize> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Err(Error::NoDomainsAvailable);
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0;
    for (index, &count) in counts.iter().enumerate() {
        cumulative += count;
        if draw < cumulative {
            return Ok(index);
        }
    }

    unreachable!("draw is below the cumulative total")
}

/// A provider picked out of a [`ProviderPool`], together with the
/// descriptor that justified the pick.
pub struct Selected {
    /// The chosen provider, ready to create a mailbox.
    pub provider: Box<dyn MailProvider>,
    /// The provider's identity and domain list at selection time.
    pub descriptor: ProviderDescriptor,
}

impl std::fmt::Debug for Selected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selected")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// An owned set of provider candidates to select from.
pub struct ProviderPool {
    providers: Vec<Box<dyn MailProvider>>,
}

impl ProviderPool {
    /// Creates a pool from the given providers.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn MailProvider>>) -> Self {
        Self { providers }
    }

    /// Returns the number of providers in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the pool has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Refreshes and returns every provider's descriptor.
    ///
    /// A provider whose domain fetch keeps failing is reported with an
    /// empty domain list rather than failing the whole refresh, so that one
    /// flaky service cannot block selection among the rest.
    pub async fn descriptors(&mut self, retry: &RetryConfig) -> Vec<ProviderDescriptor> {
        let mut descriptors = Vec::with_capacity(self.providers.len());
        for provider in &mut self.providers {
            let domains = match domains_with_retry(provider.as_mut(), retry).await {
                Ok(domains) => domains,
                Err(error) => {
                    warn!(
                        provider = provider.name(),
                        %error,
                        "Domain refresh failed, treating provider as having no capacity"
                    );
                    Vec::new()
                }
            };
            descriptors.push(ProviderDescriptor {
                name: provider.name().to_string(),
                base_endpoint: provider.base_endpoint().to_string(),
                domains,
            });
        }
        descriptors
    }

    /// Selects a provider according to the given policy and consumes the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDomainsAvailable`] when the selected provider (or,
    /// in weighted mode, every provider) has no domains, and
    /// [`Error::UnknownProvider`] when a fixed name matches nothing in the
    /// pool.
    #[instrument(name = "ProviderPool::select", skip(self, rng), fields(mode = ?mode, pool_size = self.len()))]
    pub async fn select<R: Rng + ?Sized>(
        mut self,
        mode: &SelectionMode,
        retry: &RetryConfig,
        rng: &mut R,
    ) -> Result<Selected> {
        let index = match mode {
            SelectionMode::Fixed(name) => self
                .providers
                .iter()
                .position(|p| p.name() == name.as_str())
                .ok_or_else(|| Error::UnknownProvider { name: name.clone() })?,
            SelectionMode::Weighted => {
                let descriptors = self.descriptors(retry).await;
                let counts: Vec<usize> =
                    descriptors.iter().map(ProviderDescriptor::domain_count).collect();
                debug!(?counts, "Computed selection weights");
                weighted_index(&counts, rng)?
            }
        };

        let mut provider = self.providers.swap_remove(index);

        // Refresh the winner's domains so the descriptor reflects what
        // mailbox creation will actually draw from.
        let domains = domains_with_retry(provider.as_mut(), retry).await?;
        if domains.is_empty() {
            return Err(Error::NoDomainsAvailable);
        }

        let descriptor = ProviderDescriptor {
            name: provider.name().to_string(),
            base_endpoint: provider.base_endpoint().to_string(),
            domains,
        };

        debug!(
            provider = %descriptor.name,
            domain_count = descriptor.domain_count(),
            "Selected provider"
        );

        Ok(Selected {
            provider,
            descriptor,
        })
    }
}

impl std::fmt::Debug for ProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderPool")
            .field("providers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Mailbox, MailboxCredentials, Message};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_index_all_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = weighted_index(&[0, 0, 0], &mut rng);
        assert!(matches!(result, Err(Error::NoDomainsAvailable)));
    }

    #[test]
    fn test_weighted_index_skips_zero_weight() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            assert_eq!(weighted_index(&[0, 5, 0], &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_weighted_index_single_provider() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(weighted_index(&[1], &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_weighted_index_distribution() {
        // Counts [2, 3, 5] must yield probabilities 0.2 / 0.3 / 0.5.
        let mut rng = StdRng::seed_from_u64(1234);
        let counts = [2_usize, 3, 5];
        let trials = 20_000;

        let mut hits = [0_usize; 3];
        for _ in 0..trials {
            hits[weighted_index(&counts, &mut rng).unwrap()] += 1;
        }

        let expected = [0.2, 0.3, 0.5];
        for (i, &hit) in hits.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let observed = hit as f64 / trials as f64;
            assert!(
                (observed - expected[i]).abs() < 0.02,
                "provider {i}: observed {observed}, expected {}",
                expected[i]
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pool tests with scripted providers
    // ─────────────────────────────────────────────────────────────────────

    struct FakeProvider {
        name: &'static str,
        domains: Vec<String>,
    }

    #[async_trait]
    impl MailProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn base_endpoint(&self) -> &str {
            "https://fake.invalid/"
        }

        async fn list_domains(&mut self) -> crate::Result<Vec<String>> {
            Ok(self.domains.clone())
        }

        async fn create_mailbox(&mut self) -> crate::Result<Mailbox> {
            Ok(Mailbox {
                address: format!("test@{}", self.domains[0]),
                domain: self.domains[0].clone(),
                credentials: MailboxCredentials::None,
            })
        }

        async fn poll_messages(&mut self, _mailbox: &Mailbox) -> crate::Result<Vec<Message>> {
            Ok(Vec::new())
        }

        async fn delete_mailbox(&mut self, _mailbox: &Mailbox) -> crate::Result<()> {
            Ok(())
        }
    }

    fn pool() -> ProviderPool {
        ProviderPool::new(vec![
            Box::new(FakeProvider {
                name: "empty",
                domains: vec![],
            }),
            Box::new(FakeProvider {
                name: "busy",
                domains: vec!["a.com".into(), "b.com".into()],
            }),
        ])
    }

    #[tokio::test]
    async fn test_select_weighted_skips_empty_provider() {
        let mut rng = StdRng::seed_from_u64(9);
        let retry = RetryConfig::default();
        let selected = pool()
            .select(&SelectionMode::Weighted, &retry, &mut rng)
            .await
            .unwrap();
        assert_eq!(selected.descriptor.name, "busy");
        assert_eq!(selected.descriptor.domain_count(), 2);
    }

    #[tokio::test]
    async fn test_select_fixed_by_name() {
        let mut rng = StdRng::seed_from_u64(9);
        let retry = RetryConfig::default();
        let selected = pool()
            .select(&SelectionMode::Fixed("busy".into()), &retry, &mut rng)
            .await
            .unwrap();
        assert_eq!(selected.descriptor.name, "busy");
    }

    #[tokio::test]
    async fn test_select_fixed_unknown_name() {
        let mut rng = StdRng::seed_from_u64(9);
        let retry = RetryConfig::default();
        let result = pool()
            .select(&SelectionMode::Fixed("nope".into()), &retry, &mut rng)
            .await;
        assert!(matches!(result, Err(Error::UnknownProvider { .. })));
    }

    #[tokio::test]
    async fn test_select_fixed_empty_provider_fails() {
        let mut rng = StdRng::seed_from_u64(9);
        let retry = RetryConfig::default();
        let result = pool()
            .select(&SelectionMode::Fixed("empty".into()), &retry, &mut rng)
            .await;
        assert!(matches!(result, Err(Error::NoDomainsAvailable)));
    }

    #[tokio::test]
    async fn test_select_all_empty_pool() {
        let mut rng = StdRng::seed_from_u64(9);
        let retry = RetryConfig::default();
        let empty_pool = ProviderPool::new(vec![Box::new(FakeProvider {
            name: "empty",
            domains: vec![],
        })]);
        let result = empty_pool
            .select(&SelectionMode::Weighted, &retry, &mut rng)
            .await;
        assert!(matches!(result, Err(Error::NoDomainsAvailable)));
    }
}

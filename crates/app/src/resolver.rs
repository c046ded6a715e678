use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use metrics::counter;
use thiserror::Error;
use tracing::debug;

use tenant_polls_core::{split_domain_port, Domain};
use tenant_polls_storage::{DomainError, DomainRepository};

/// Key under which a resolved domain is memoised.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Id(i64),
    Host(String),
}

impl CacheKey {
    fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Host(_) => "host",
        }
    }
}

type DomainCache = HashMap<CacheKey, Arc<Domain>>;

/// Maps request hosts and domain ids to tenant records, memoising every hit.
///
/// Entries live until [`clear`](Self::clear) or
/// [`invalidate`](Self::invalidate) is called. Concurrent misses on the same
/// key may each query the store; the first stored value wins.
#[derive(Clone)]
pub struct DomainResolver {
    domains: DomainRepository,
    cache: Arc<RwLock<DomainCache>>,
}

impl DomainResolver {
    pub fn new(domains: DomainRepository) -> Self {
        Self {
            domains,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolves by id when one is given, otherwise by request host.
    pub async fn resolve(
        &self,
        host: Option<&str>,
        domain_id: Option<i64>,
    ) -> Result<Arc<Domain>, ResolveError> {
        match (domain_id, host) {
            (Some(id), _) => self.by_id(id).await,
            (None, Some(host)) => self.by_host(host).await,
            (None, None) => Err(ResolveError::NoLookupKey),
        }
    }

    pub async fn by_id(&self, id: i64) -> Result<Arc<Domain>, ResolveError> {
        let key = CacheKey::Id(id);
        if let Some(domain) = self.cached(&key) {
            return Ok(domain);
        }

        match self.domains.fetch_by_id(id).await {
            Ok(domain) => Ok(self.remember(key, domain)),
            Err(err) if err.is_not_found() => Err(ResolveError::NotFound {
                key: id.to_string(),
            }),
            Err(err) => Err(ResolveError::Storage(err)),
        }
    }

    /// Resolves a request host, retrying without the port on a clean miss.
    ///
    /// Only a not-found result triggers the retry; store failures propagate
    /// untouched. A successful retry is also remembered under the original
    /// host so the next request with the same port skips both lookups.
    pub async fn by_host(&self, host: &str) -> Result<Arc<Domain>, ResolveError> {
        match self.lookup_host(host).await {
            Err(ResolveError::NotFound { .. }) => {}
            other => return other,
        }

        let (domain, _port) = split_domain_port(host);
        if domain.is_empty() || domain.eq_ignore_ascii_case(host) {
            return Err(ResolveError::NotFound {
                key: host.to_string(),
            });
        }

        let resolved = self.lookup_host(&domain).await?;
        self.alias(CacheKey::Host(host.to_string()), &resolved);
        debug!(stage = "resolver", %host, domain = %resolved.domain, "resolved host without port");
        Ok(resolved)
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = cache.len();
        cache.clear();
        debug!(stage = "resolver", dropped, "domain cache cleared");
    }

    /// Drops every entry, id- or host-keyed, that points at `domain_id`.
    ///
    /// Best effort: a lookup that read the old row before the change
    /// committed may still store it afterwards, and that entry then lives
    /// until the next `clear` or `invalidate`.
    pub fn invalidate(&self, domain_id: i64) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.retain(|_, domain| domain.id != domain_id);
    }

    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn lookup_host(&self, host: &str) -> Result<Arc<Domain>, ResolveError> {
        let key = CacheKey::Host(host.to_string());
        if let Some(domain) = self.cached(&key) {
            return Ok(domain);
        }

        match self.domains.fetch_by_host(host).await {
            Ok(domain) => Ok(self.remember(key, domain)),
            Err(err) if err.is_not_found() => Err(ResolveError::NotFound {
                key: host.to_string(),
            }),
            Err(DomainError::MultipleMatches) => Err(ResolveError::Ambiguous {
                host: host.to_string(),
            }),
            Err(err) => Err(ResolveError::Storage(err)),
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Arc<Domain>> {
        let hit = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        match hit {
            Some(_) => counter!("domain_cache_hits_total", "kind" => key.kind()).increment(1),
            None => counter!("domain_cache_misses_total", "kind" => key.kind()).increment(1),
        }
        hit
    }

    fn remember(&self, key: CacheKey, domain: Domain) -> Arc<Domain> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.entry(key).or_insert_with(|| Arc::new(domain)).clone()
    }

    fn alias(&self, key: CacheKey, domain: &Arc<Domain>) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.entry(key).or_insert_with(|| Arc::clone(domain));
    }
}

/// Errors produced while resolving the current domain.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no domain matches {key}")]
    NotFound { key: String },
    #[error("host {host} matches more than one domain")]
    Ambiguous { host: String },
    #[error("neither a request host nor a domain id was supplied")]
    NoLookupKey,
    #[error("failed to load domain: {0}")]
    Storage(DomainError),
}

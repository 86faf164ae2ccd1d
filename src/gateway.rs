use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;

use crate::error::WeatherError;
use crate::fetcher::WeatherFetcher;
use crate::models::WeatherReading;
use crate::resolver::CoordinateResolver;

/// Source of "now" for cache freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall-clock time in the local zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Latest reading per city, keyed by the city string exactly as requested.
///
/// Entries are only ever overwritten; the map lives as long as the process.
#[derive(Debug, Default)]
pub struct WeatherCache {
    entries: RwLock<HashMap<String, WeatherReading>>,
}

impl WeatherCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored reading for `city_name`, fresh or not
    pub async fn get(&self, city_name: &str) -> Option<WeatherReading> {
        self.entries.read().await.get(city_name).cloned()
    }

    /// Stores `reading`, replacing any earlier one for the same city
    pub async fn insert(&self, city_name: String, reading: WeatherReading) {
        self.entries.write().await.insert(city_name, reading);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Checks the cache before going upstream, so each city costs at most one
/// provider call per TTL window.
pub struct WeatherGateway {
    resolver: Arc<dyn CoordinateResolver>,
    fetcher: Arc<dyn WeatherFetcher>,
    cache: WeatherCache,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherGateway {
    /// Creates a gateway that reads the system clock
    pub fn new(
        resolver: Arc<dyn CoordinateResolver>,
        fetcher: Arc<dyn WeatherFetcher>,
        cache: WeatherCache,
        ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            cache,
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for freshness checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cache backing this gateway
    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// Current weather for `city_name`, served from cache while fresh.
    ///
    /// The city string is used verbatim as the cache key. Errors are
    /// returned as-is and never cached.
    pub async fn get_weather(
        &self,
        city_name: Option<&str>,
    ) -> Result<WeatherReading, WeatherError> {
        let city_name = city_name
            .filter(|c| !c.is_empty())
            .ok_or(WeatherError::MissingParameter)?;

        if let Some(cached) = self.cache.get(city_name).await {
            if self.is_fresh(&cached) {
                tracing::debug!("Serving cached weather for {}", city_name);
                return Ok(cached);
            }
        }

        tracing::info!("Getting weather for city: {}", city_name);

        let entry = self.resolver.resolve(city_name).await?;
        let reading = self.fetcher.fetch(entry.latitude, entry.longitude).await?;

        self.cache.insert(city_name.to_string(), reading.clone()).await;
        Ok(reading)
    }

    fn is_fresh(&self, reading: &WeatherReading) -> bool {
        // A negative age (observation ahead of our clock) counts as fresh
        match (self.clock.now() - reading.observed_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::CoordinateEntry;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) const OBSERVED_AT: i64 = 1642742400;

    pub(crate) struct ManualClock(AtomicI64);

    impl ManualClock {
        pub(crate) fn at(epoch_secs: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(epoch_secs)))
        }

        pub(crate) fn advance(&self, secs: i64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Local> {
            Local.timestamp_opt(self.0.load(Ordering::SeqCst), 0).unwrap()
        }
    }

    /// Resolves every city to fixed coordinates, or fails with `fail_with`.
    #[derive(Default)]
    pub(crate) struct StubResolver {
        pub(crate) calls: AtomicUsize,
        pub(crate) fail_with: Mutex<Option<fn(String) -> WeatherError>>,
    }

    #[async_trait]
    impl CoordinateResolver for StubResolver {
        async fn resolve(&self, city_name: &str) -> Result<CoordinateEntry, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail_with = *self.fail_with.lock().unwrap();
            if let Some(make_err) = fail_with {
                return Err(make_err(city_name.to_string()));
            }
            Ok(CoordinateEntry {
                city_name: city_name.to_string(),
                latitude: 55.755826,
                longitude: 37.6173,
            })
        }
    }

    /// Returns a reading observed at `observed_at`, counting calls.
    pub(crate) struct StubFetcher {
        pub(crate) calls: AtomicUsize,
        pub(crate) observed_at: AtomicI64,
        pub(crate) fail: bool,
    }

    impl StubFetcher {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                observed_at: AtomicI64::new(OBSERVED_AT),
                fail: false,
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl WeatherFetcher for StubFetcher {
        async fn fetch(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<WeatherReading, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WeatherError::WeatherFetch("connection refused".to_string()));
            }
            Ok(WeatherReading {
                temperature: 2,
                pressure: 752,
                wind_speed: 3,
                observed_at: Local
                    .timestamp_opt(self.observed_at.load(Ordering::SeqCst), 0)
                    .unwrap(),
            })
        }
    }

    fn gateway(
        resolver: &Arc<StubResolver>,
        fetcher: &Arc<StubFetcher>,
        clock: &Arc<ManualClock>,
        ttl_secs: u64,
    ) -> WeatherGateway {
        WeatherGateway::new(
            resolver.clone(),
            fetcher.clone(),
            WeatherCache::new(),
            Duration::from_secs(ttl_secs),
        )
        .with_clock(clock.clone())
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT + 5);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        let first = gateway.get_weather(Some("Москва")).await.unwrap();
        let second = gateway.get_weather(Some("Москва")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl_elapses() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        gateway.get_weather(Some("Moscow")).await.unwrap();
        clock.advance(599);
        gateway.get_weather(Some("Moscow")).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        clock.advance(1);
        fetcher.observed_at.store(OBSERVED_AT + 600, Ordering::SeqCst);
        let refreshed = gateway.get_weather(Some("Moscow")).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.observed_at, clock.now());
    }

    #[tokio::test]
    async fn test_cache_key_is_case_sensitive() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        gateway.get_weather(Some("Moscow")).await.unwrap();
        gateway.get_weather(Some("moscow")).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(gateway.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_city_never_goes_upstream() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        for city in [None, Some("")] {
            let err = gateway.get_weather(city).await.unwrap_err();
            assert!(matches!(err, WeatherError::MissingParameter));
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_city_string_is_used_verbatim() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        gateway.get_weather(Some(" Moscow ")).await.unwrap();
        gateway.get_weather(Some("Moscow")).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(gateway.cache().len().await, 2);
        assert!(gateway.cache().get(" Moscow ").await.is_some());

        // Whitespace is not empty, so it goes to the resolver like any other name
        gateway.get_weather(Some("   ")).await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_resolver_errors_propagate_without_fetch_or_cache() {
        let resolver = Arc::new(StubResolver::default());
        *resolver.fail_with.lock().unwrap() = Some(WeatherError::CityNotFound);
        let fetcher = Arc::new(StubFetcher::new());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        let err = gateway.get_weather(Some("Atlantis")).await.unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound(name) if name == "Atlantis"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(gateway.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_errors_are_not_cached() {
        let resolver = Arc::new(StubResolver::default());
        let fetcher = Arc::new(StubFetcher::failing());
        let clock = ManualClock::at(OBSERVED_AT);
        let gateway = gateway(&resolver, &fetcher, &clock, 600);

        for _ in 0..2 {
            let err = gateway.get_weather(Some("Moscow")).await.unwrap_err();
            assert!(matches!(err, WeatherError::WeatherFetch(_)));
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(gateway.cache().is_empty().await);
    }
}

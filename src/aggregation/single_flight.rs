use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Mutex, MutexGuard}
};
use tracing::debug;

/// Deduplicates concurrent work by key: the first caller starts the work and
/// every caller that arrives while it runs awaits the same result.
///
/// The entry is dropped as soon as the work settles, success or failure, so a
/// later call starts afresh. Callers cache the result themselves.
pub struct FlightRegistry<K, V: Clone> {
    flights: Mutex<HashMap<K, Shared<BoxFuture<'static, V>>>>
}

impl<K, V> FlightRegistry<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + Send + Sync + 'static
{
    pub fn new() -> FlightRegistry<K, V> {
        FlightRegistry {
            flights: Mutex::new(HashMap::new())
        }
    }

    fn flights(&self) -> MutexGuard<'_, HashMap<K, Shared<BoxFuture<'static, V>>>> {
        self.flights.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Joins the flight for `key`, starting it with `start` if none is airborne.
    pub async fn run<F, Fut>(&self, key: K, start: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static
    {
        let flight = {
            let mut flights = self.flights();
            match flights.get(&key) {
                Some(flight) => {
                    debug!("Joining in-flight work for {:?}", key);
                    flight.clone()
                }
                None => {
                    let flight = start().boxed().shared();
                    flights.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        let value = flight.clone().await;

        let mut flights = self.flights();
        if flights.get(&key).is_some_and(|current| current.ptr_eq(&flight)) {
            flights.remove(&key);
        }

        value
    }

    pub fn in_flight(&self) -> usize {
        self.flights().len()
    }
}

impl<K, V> Default for FlightRegistry<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + Send + Sync + 'static
{
    fn default() -> Self {
        FlightRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::aggregation::single_flight::FlightRegistry;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    };

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let registry: FlightRegistry<i32, usize> = FlightRegistry::new();
        let starts = Arc::new(AtomicUsize::new(0));

        let call = || {
            let starts = starts.clone();
            registry.run(2021, move || async move {
                tokio::task::yield_now().await;
                starts.fetch_add(1, Ordering::SeqCst) + 100
            })
        };

        let (a, b, c) = tokio::join!(call(), call(), call());

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!((a, b, c), (100, 100, 100));
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_settled_flight_is_not_reused() {
        let registry: FlightRegistry<&'static str, Result<u32, String>> = FlightRegistry::new();

        let failed = registry.run("teams", || async { Err("feed down".to_string()) }).await;
        assert!(failed.is_err());

        let retried = registry.run("teams", || async { Ok(30) }).await;
        assert_eq!(retried, Ok(30));
        assert_eq!(registry.in_flight(), 0);
    }
}

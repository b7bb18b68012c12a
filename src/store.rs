use redis::{Client, Commands, Connection};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::customer::Customer;
use crate::error::{AppError, AppResult};
use crate::order::Order;
use crate::restaurant::Restaurant;

/// A persisted entity kind. `KIND` namespaces its keys in the backend.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn id(&self) -> u64;
}

/// Raw JSON document storage, one namespace per record kind.
pub trait Backend: Send + Sync {
    fn next_id(&self, kind: &str) -> AppResult<u64>;
    fn load(&self, kind: &str, id: u64) -> AppResult<Option<String>>;
    fn load_all(&self, kind: &str) -> AppResult<Vec<String>>;
    fn put(&self, kind: &str, id: u64, json: String) -> AppResult<()>;
    fn remove(&self, kind: &str, id: u64) -> AppResult<bool>;
}

/// Redis layout per kind: `{kind}:{id}` holds the JSON document,
/// `{kind}:ids` the set of live ids and `{kind}:next_id` the id counter.
pub struct RedisBackend {
    client: Client,
}

impl RedisBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Gets a connection from the Redis client.
    pub fn get_connection(&self) -> AppResult<Connection> {
        Ok(self.client.get_connection()?)
    }

    fn key(kind: &str, id: u64) -> String {
        format!("{kind}:{id}")
    }

    fn index(kind: &str) -> String {
        format!("{kind}:ids")
    }
}

impl Backend for RedisBackend {
    fn next_id(&self, kind: &str) -> AppResult<u64> {
        let mut conn = self.get_connection()?;
        Ok(conn.incr(format!("{kind}:next_id"), 1)?)
    }

    fn load(&self, kind: &str, id: u64) -> AppResult<Option<String>> {
        let mut conn = self.get_connection()?;
        Ok(conn.get(Self::key(kind, id))?)
    }

    fn load_all(&self, kind: &str) -> AppResult<Vec<String>> {
        let mut conn = self.get_connection()?;
        let mut ids: Vec<u64> = conn.smembers(Self::index(kind))?;
        ids.sort_unstable();

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let json: Option<String> = conn.get(Self::key(kind, id))?;
            documents.extend(json);
        }
        Ok(documents)
    }

    fn put(&self, kind: &str, id: u64, json: String) -> AppResult<()> {
        let mut conn = self.get_connection()?;
        redis::pipe()
            .atomic()
            .set(Self::key(kind, id), json)
            .ignore()
            .sadd(Self::index(kind), id)
            .ignore()
            .query::<()>(&mut conn)?;
        Ok(())
    }

    fn remove(&self, kind: &str, id: u64) -> AppResult<bool> {
        let mut conn = self.get_connection()?;
        let (deleted, _): (u64, u64) = redis::pipe()
            .atomic()
            .del(Self::key(kind, id))
            .srem(Self::index(kind), id)
            .query(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[derive(Default)]
struct Namespace {
    last_id: u64,
    documents: BTreeMap<u64, String>,
}

/// In-process backend, used for local runs and tests.
#[derive(Default)]
pub struct MemoryBackend {
    namespaces: Mutex<HashMap<String, Namespace>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, Namespace>>> {
        self.namespaces
            .lock()
            .map_err(|_| AppError::StoreError("memory store lock poisoned".to_string()))
    }
}

impl Backend for MemoryBackend {
    fn next_id(&self, kind: &str) -> AppResult<u64> {
        let mut namespaces = self.lock()?;
        let namespace = namespaces.entry(kind.to_string()).or_default();
        namespace.last_id += 1;
        Ok(namespace.last_id)
    }

    fn load(&self, kind: &str, id: u64) -> AppResult<Option<String>> {
        let namespaces = self.lock()?;
        Ok(namespaces
            .get(kind)
            .and_then(|ns| ns.documents.get(&id).cloned()))
    }

    fn load_all(&self, kind: &str) -> AppResult<Vec<String>> {
        let namespaces = self.lock()?;
        Ok(namespaces
            .get(kind)
            .map(|ns| ns.documents.values().cloned().collect())
            .unwrap_or_default())
    }

    fn put(&self, kind: &str, id: u64, json: String) -> AppResult<()> {
        let mut namespaces = self.lock()?;
        namespaces
            .entry(kind.to_string())
            .or_default()
            .documents
            .insert(id, json);
        Ok(())
    }

    fn remove(&self, kind: &str, id: u64) -> AppResult<bool> {
        let mut namespaces = self.lock()?;
        Ok(namespaces
            .get_mut(kind)
            .and_then(|ns| ns.documents.remove(&id))
            .is_some())
    }
}

/// Typed access to customers, restaurants and orders over a [`Backend`].
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    /// Creates a store over the given backend.
    ///
    /// # Arguments
    /// * `backend` - Document storage shared by every clone of the store
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Creates a Redis-backed store.
    ///
    /// # Arguments
    /// * `client` - Redis client
    pub fn redis(client: Client) -> Self {
        Self::new(Arc::new(RedisBackend::new(client)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Reserves the next id for records of kind `T`.
    ///
    /// # Returns
    /// * `AppResult<u64>` - A fresh id, never handed out before for `T`
    pub fn next_id<T: Record>(&self) -> AppResult<u64> {
        self.backend.next_id(T::KIND)
    }

    /// Retrieves a record by ID.
    ///
    /// # Arguments
    /// * `id` - The ID of the record to retrieve
    ///
    /// # Returns
    /// * `AppResult<Option<T>>` - The record, or `None` for unknown ids
    pub fn get<T: Record>(&self, id: u64) -> AppResult<Option<T>> {
        match self.backend.load(T::KIND, id)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Like [`Store::get`], failing with `NotFound` for unknown ids.
    pub fn fetch<T: Record>(&self, id: u64) -> AppResult<T> {
        self.get(id)?
            .ok_or_else(|| AppError::not_found(T::KIND, id))
    }

    /// Lists every record of kind `T` in ascending id order.
    pub fn list<T: Record>(&self) -> AppResult<Vec<T>> {
        self.backend
            .load_all(T::KIND)?
            .iter()
            .map(|json| serde_json::from_str(json).map_err(AppError::from))
            .collect()
    }

    /// Saves a record, replacing any stored record with the same id.
    ///
    /// # Arguments
    /// * `record` - The record to persist
    ///
    /// # Returns
    /// * `AppResult<()>` - Success if saved
    pub fn save<T: Record>(&self, record: &T) -> AppResult<()> {
        let json = serde_json::to_string(record)?;
        self.backend.put(T::KIND, record.id(), json)
    }

    /// Deletes a single record, without touching records that refer to it.
    ///
    /// # Returns
    /// * `AppResult<bool>` - Whether a record was removed
    pub fn delete<T: Record>(&self, id: u64) -> AppResult<bool> {
        self.backend.remove(T::KIND, id)
    }

    /// Deletes a customer together with its orders and memberships.
    ///
    /// Dependents go first and the customer record last, so a failure
    /// partway leaves the customer in place and the delete can be retried.
    ///
    /// # Arguments
    /// * `id` - The ID of the customer to delete
    ///
    /// # Returns
    /// * `AppResult<bool>` - `false` if no such customer exists
    pub fn delete_customer(&self, id: u64) -> AppResult<bool> {
        if self.get::<Customer>(id)?.is_none() {
            return Ok(false);
        }

        for order in self.list::<Order>()?.iter().filter(|o| o.cliente == id) {
            self.delete::<Order>(order.id)?;
            debug!(order_id = order.id, customer_id = id, "cascaded order delete");
        }
        for mut restaurant in self.list::<Restaurant>()? {
            if restaurant.is_member(id) {
                restaurant.data.clientes.retain(|member| *member != id);
                self.save(&restaurant)?;
            }
        }
        self.delete::<Customer>(id)
    }

    /// Deletes a restaurant together with its orders.
    ///
    /// # Arguments
    /// * `id` - The ID of the restaurant to delete
    ///
    /// # Returns
    /// * `AppResult<bool>` - `false` if no such restaurant exists
    pub fn delete_restaurant(&self, id: u64) -> AppResult<bool> {
        if self.get::<Restaurant>(id)?.is_none() {
            return Ok(false);
        }

        for order in self.list::<Order>()?.iter().filter(|o| o.restaurante == id) {
            self.delete::<Order>(order.id)?;
            debug!(order_id = order.id, restaurant_id = id, "cascaded order delete");
        }
        self.delete::<Restaurant>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::CustomerData;
    use crate::order::OrderStatus;
    use crate::restaurant::RestaurantData;
    use chrono::{NaiveTime, Utc};

    fn customer(store: &Store, email: &str) -> Customer {
        let customer = Customer {
            id: store.next_id::<Customer>().unwrap(),
            data: CustomerData {
                nombre: "Ana".to_string(),
                email: email.to_string(),
                telefono: "+5351234567".to_string(),
                edad: 30,
            },
        };
        store.save(&customer).unwrap();
        customer
    }

    fn restaurant(store: &Store, clientes: Vec<u64>) -> Restaurant {
        let restaurant = Restaurant {
            id: store.next_id::<Restaurant>().unwrap(),
            created_at: Utc::now(),
            data: RestaurantData {
                nombre: "El Aljibe".to_string(),
                direccion: "Miramar".to_string(),
                capacidad: 5,
                clientes,
                opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            },
        };
        store.save(&restaurant).unwrap();
        restaurant
    }

    fn order(store: &Store, cliente: u64, restaurante: u64) -> Order {
        let order = Order {
            id: store.next_id::<Order>().unwrap(),
            descripcion: "Pollo asado".to_string(),
            estado: OrderStatus::Pending,
            cliente,
            restaurante,
        };
        store.save(&order).unwrap();
        order
    }

    #[test]
    fn ids_are_sequential_per_kind() {
        let store = Store::memory();
        assert_eq!(store.next_id::<Customer>().unwrap(), 1);
        assert_eq!(store.next_id::<Customer>().unwrap(), 2);
        assert_eq!(store.next_id::<Order>().unwrap(), 1);
    }

    #[test]
    fn saves_gets_and_lists_in_id_order() {
        let store = Store::memory();
        let b = customer(&store, "b@example.com");
        let a = customer(&store, "a@example.com");

        assert_eq!(store.get::<Customer>(b.id).unwrap(), Some(b.clone()));
        let listed = store.list::<Customer>().unwrap();
        assert_eq!(listed, vec![b, a]);
    }

    #[test]
    fn fetch_reports_not_found() {
        let store = Store::memory();
        let err = store.fetch::<Restaurant>(42).unwrap_err();
        assert!(matches!(err, AppError::NotFound { kind: "restaurant", id: 42 }));
    }

    #[test]
    fn delete_is_false_for_unknown_id() {
        let store = Store::memory();
        assert!(!store.delete::<Order>(1).unwrap());
        assert!(!store.delete_customer(1).unwrap());
        assert!(!store.delete_restaurant(1).unwrap());
    }

    #[test]
    fn deleting_customer_cascades_orders_and_memberships() {
        let store = Store::memory();
        let ana = customer(&store, "ana@example.com");
        let luis = customer(&store, "luis@example.com");
        let r = restaurant(&store, vec![ana.id, luis.id]);
        let ana_order = order(&store, ana.id, r.id);
        let luis_order = order(&store, luis.id, r.id);

        assert!(store.delete_customer(ana.id).unwrap());

        assert_eq!(store.get::<Order>(ana_order.id).unwrap(), None);
        assert!(store.get::<Order>(luis_order.id).unwrap().is_some());
        let r = store.fetch::<Restaurant>(r.id).unwrap();
        assert_eq!(r.data.clientes, vec![luis.id]);
    }

    /// Memory backend whose customer removals always fail.
    struct FailingCustomerRemoval(MemoryBackend);

    impl Backend for FailingCustomerRemoval {
        fn next_id(&self, kind: &str) -> AppResult<u64> {
            self.0.next_id(kind)
        }

        fn load(&self, kind: &str, id: u64) -> AppResult<Option<String>> {
            self.0.load(kind, id)
        }

        fn load_all(&self, kind: &str) -> AppResult<Vec<String>> {
            self.0.load_all(kind)
        }

        fn put(&self, kind: &str, id: u64, json: String) -> AppResult<()> {
            self.0.put(kind, id, json)
        }

        fn remove(&self, kind: &str, id: u64) -> AppResult<bool> {
            if kind == Customer::KIND {
                return Err(AppError::StoreError("backend unavailable".to_string()));
            }
            self.0.remove(kind, id)
        }
    }

    #[test]
    fn failed_customer_delete_leaves_no_orphans() {
        let store = Store::new(Arc::new(FailingCustomerRemoval(MemoryBackend::new())));
        let ana = customer(&store, "ana@example.com");
        let r = restaurant(&store, vec![ana.id]);
        let placed = order(&store, ana.id, r.id);

        assert!(store.delete_customer(ana.id).is_err());

        assert!(store.get::<Customer>(ana.id).unwrap().is_some());
        assert_eq!(store.get::<Order>(placed.id).unwrap(), None);
        assert!(!store.fetch::<Restaurant>(r.id).unwrap().is_member(ana.id));
    }

    #[test]
    fn deleting_restaurant_cascades_its_orders() {
        let store = Store::memory();
        let ana = customer(&store, "ana@example.com");
        let first = restaurant(&store, vec![ana.id]);
        let second = restaurant(&store, vec![ana.id]);
        let gone = order(&store, ana.id, first.id);
        let kept = order(&store, ana.id, second.id);

        assert!(store.delete_restaurant(first.id).unwrap());

        assert_eq!(store.get::<Order>(gone.id).unwrap(), None);
        assert_eq!(store.get::<Order>(kept.id).unwrap(), Some(kept));
        assert!(store.get::<Customer>(ana.id).unwrap().is_some());
    }
}

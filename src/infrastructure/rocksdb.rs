use crate::domain::cart::ShoppingCart;
use crate::domain::order::{BrandOrder, Order};
use crate::domain::payment::{Payment, VerificationState};
use crate::domain::ports::{CartStore, ClaimOutcome, OrderStore, PaymentStore, UserStore};
use crate::domain::user::User;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Column Family for users.
pub const CF_USERS: &str = "users";
/// Column Family for shopping carts.
pub const CF_CARTS: &str = "carts";
/// Column Family for payments, keyed by transaction id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for orders, keyed by order uuid.
pub const CF_ORDERS: &str = "orders";
/// Column Family for brand-order links, keyed by `<order uuid>:<brand id>`.
pub const CF_BRAND_ORDERS: &str = "brand_orders";

/// Persistent store backed by RocksDB, implementing every store port over
/// one database.
///
/// Records are stored as JSON per Column Family. The confirmed-order commit
/// goes through a single `WriteBatch`, and read-modify-write operations
/// (verification claims, the sent toggle) serialize through `write_lock` so
/// two replays against the same database cannot interleave.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn store_err(err: impl std::fmt::Display) -> Error {
    Error::Store(err.to_string())
}

impl RocksDbStore {
    /// Opens or creates the database at `path`, ensuring all column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_USERS, CF_CARTS, CF_PAYMENTS, CF_ORDERS, CF_BRAND_ORDERS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(store_err)?;
        let store = Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        };
        store.recover_in_flight_claims()?;
        Ok(store)
    }

    /// A claim never outlives the process that took it. A payment still
    /// marked in flight at open time is a crash leftover and goes back to
    /// `Pending` so the next callback delivery can settle it.
    fn recover_in_flight_claims(&self) -> Result<()> {
        let payments: Vec<Payment> = self.read_all(CF_PAYMENTS)?;
        for mut payment in payments {
            if payment.verification == VerificationState::InFlight {
                payment.verification = VerificationState::Pending;
                tracing::warn!(
                    transaction_id = %payment.transaction_id,
                    "recovered interrupted verification claim"
                );
                self.put(CF_PAYMENTS, payment.transaction_id.as_bytes(), &payment)?;
            }
        }
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Store(format!("column family {name} not found")))
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(store_err)?;
        self.db.put_cf(&cf, key, bytes).map_err(store_err)
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key).map_err(store_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(store_err)?)),
            None => Ok(None),
        }
    }

    fn read_all<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for entry in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, bytes) = entry.map_err(store_err)?;
            values.push(serde_json::from_slice(&bytes).map_err(store_err)?);
        }
        Ok(values)
    }

    fn brand_order_key(order_id: Uuid, brand_id: i32) -> Vec<u8> {
        format!("{order_id}:{brand_id:010}").into_bytes()
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn store(&self, user: User) -> Result<()> {
        self.put(CF_USERS, user.username.as_bytes(), &user)
    }

    async fn get(&self, username: &str) -> Result<Option<User>> {
        self.read(CF_USERS, username.as_bytes())
    }
}

#[async_trait]
impl CartStore for RocksDbStore {
    async fn store(&self, cart: ShoppingCart) -> Result<()> {
        self.put(CF_CARTS, &cart.id.to_be_bytes(), &cart)
    }

    async fn get(&self, cart_id: i32) -> Result<Option<ShoppingCart>> {
        self.read(CF_CARTS, &cart_id.to_be_bytes())
    }
}

#[async_trait]
impl PaymentStore for RocksDbStore {
    async fn insert_new(&self, payment: Payment) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(store_err)?;
        let existing: Option<Payment> = self.read(CF_PAYMENTS, payment.transaction_id.as_bytes())?;
        if existing.is_some() {
            return Err(Error::ArgumentInvalid(format!(
                "transaction {} already recorded",
                payment.transaction_id
            )));
        }
        self.put(CF_PAYMENTS, payment.transaction_id.as_bytes(), &payment)
    }

    async fn store(&self, payment: Payment) -> Result<()> {
        self.put(CF_PAYMENTS, payment.transaction_id.as_bytes(), &payment)
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, transaction_id.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.read_all(CF_PAYMENTS)?;
        payments.sort_by_key(|payment| payment.date_issued);
        Ok(payments)
    }

    async fn claim_verification(&self, transaction_id: &str) -> Result<ClaimOutcome> {
        let _guard = self.write_lock.lock().map_err(store_err)?;
        let mut payment: Payment = self
            .read(CF_PAYMENTS, transaction_id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("payment {transaction_id}")))?;

        match payment.verification {
            VerificationState::Pending => {
                payment.verification = VerificationState::InFlight;
                self.put(CF_PAYMENTS, transaction_id.as_bytes(), &payment)?;
                Ok(ClaimOutcome::Claimed)
            }
            VerificationState::InFlight => Ok(ClaimOutcome::InFlight),
            VerificationState::Settled => Ok(ClaimOutcome::AlreadySettled {
                successful: payment.successful.unwrap_or(false),
            }),
        }
    }

    async fn release_claim(&self, transaction_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(store_err)?;
        let mut payment: Payment = self
            .read(CF_PAYMENTS, transaction_id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("payment {transaction_id}")))?;
        if payment.verification == VerificationState::InFlight {
            payment.verification = VerificationState::Pending;
            self.put(CF_PAYMENTS, transaction_id.as_bytes(), &payment)?;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDbStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        self.read(CF_ORDERS, order_id.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.read_all(CF_ORDERS)?;
        orders.sort_by_key(|order| order.date_issued);
        Ok(orders)
    }

    async fn brand_orders(&self, order_id: Uuid) -> Result<Vec<BrandOrder>> {
        let cf = self.cf(CF_BRAND_ORDERS)?;
        let prefix = format!("{order_id}:").into_bytes();
        let mut rows = Vec::new();
        for entry in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, bytes) = entry.map_err(store_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            rows.push(serde_json::from_slice(&bytes).map_err(store_err)?);
        }
        Ok(rows)
    }

    async fn commit_confirmed(
        &self,
        payment: Payment,
        order: Order,
        brand_orders: Vec<BrandOrder>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(store_err)?;
        let mut batch = WriteBatch::default();

        let payments_cf = self.cf(CF_PAYMENTS)?;
        batch.put_cf(
            &payments_cf,
            payment.transaction_id.as_bytes(),
            serde_json::to_vec(&payment).map_err(store_err)?,
        );

        let orders_cf = self.cf(CF_ORDERS)?;
        batch.put_cf(
            &orders_cf,
            order.id.as_bytes(),
            serde_json::to_vec(&order).map_err(store_err)?,
        );

        let brand_orders_cf = self.cf(CF_BRAND_ORDERS)?;
        for brand_order in &brand_orders {
            batch.put_cf(
                &brand_orders_cf,
                Self::brand_order_key(brand_order.order_id, brand_order.brand_id),
                serde_json::to_vec(brand_order).map_err(store_err)?,
            );
        }

        self.db.write(batch).map_err(store_err)
    }

    async fn mark_sent(&self, order_id: Uuid) -> Result<(Order, bool)> {
        let _guard = self.write_lock.lock().map_err(store_err)?;
        let mut order: Order = self
            .read(CF_ORDERS, order_id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;
        let transitioned = order.mark_sent();
        if transitioned {
            self.put(CF_ORDERS, order_id.as_bytes(), &order)?;
        }
        Ok((order, transitioned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use chrono::Utc;
    use tempfile::tempdir;

    fn payment(transaction_id: &str) -> Payment {
        Payment::new(
            transaction_id.into(),
            "X1".into(),
            Amount::new(1_000).unwrap(),
            "https://pay/T1".into(),
            Some(7),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_payment_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");

        {
            let store = RocksDbStore::open(&path).unwrap();
            PaymentStore::store(&store, payment("T1")).await.unwrap();
        }

        let store = RocksDbStore::open(&path).unwrap();
        let found = PaymentStore::get(&store, "T1").await.unwrap().unwrap();
        assert_eq!(found.order_id, "X1");
    }

    #[tokio::test]
    async fn test_insert_new_rejects_duplicate_transaction_id() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path().join("db")).unwrap();

        store.insert_new(payment("T1")).await.unwrap();
        let dup = store.insert_new(payment("T1")).await;
        assert!(matches!(dup, Err(Error::ArgumentInvalid(_))));
    }

    #[tokio::test]
    async fn test_interrupted_claim_is_recovered_on_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");

        {
            let store = RocksDbStore::open(&path).unwrap();
            PaymentStore::store(&store, payment("T1")).await.unwrap();
            assert_eq!(
                store.claim_verification("T1").await.unwrap(),
                ClaimOutcome::Claimed
            );
            // Dropped here with the claim still in flight, as a crash
            // mid-verification would leave it.
        }

        let store = RocksDbStore::open(&path).unwrap();
        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::Claimed
        );
    }

    #[tokio::test]
    async fn test_claim_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path().join("db")).unwrap();
        PaymentStore::store(&store, payment("T1")).await.unwrap();

        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::Claimed
        );
        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::InFlight
        );
        store.release_claim("T1").await.unwrap();
        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::Claimed
        );
    }

    #[tokio::test]
    async fn test_commit_confirmed_batch() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path().join("db")).unwrap();

        let mut p = payment("T1");
        p.settle(true, Utc::now());
        let order = Order::place("T1".into(), 7, Utc::now());
        let order_id = order.id;
        let fan_out = vec![
            BrandOrder {
                brand_id: 10,
                order_id,
            },
            BrandOrder {
                brand_id: 20,
                order_id,
            },
        ];

        store.commit_confirmed(p, order, fan_out).await.unwrap();

        assert!(OrderStore::get(&store, order_id).await.unwrap().is_some());
        assert_eq!(store.brand_orders(order_id).await.unwrap().len(), 2);
        let stored = PaymentStore::get(&store, "T1").await.unwrap().unwrap();
        assert_eq!(stored.successful, Some(true));
    }
}

//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `occupancy` - Per-(listing, date) committed headcount
//!   (key: big-endian day number || listing_id, so retention purges walk a
//!   contiguous prefix of old dates)
//! - `reservations` - Reservation rows (key: reservation_id, UUIDv7 so
//!   iteration order is creation order)
//! - `payment_orders` - Gateway charge records (key: order_id)
//! - `indices` - Secondary indices for fast lookups

use crate::{
    availability::date_span,
    error::{Error, Result},
    types::{CustomerId, ListingId, OccupancyRecord, PaymentOrder, Reservation},
    Config,
};
use chrono::{Datelike, NaiveDate};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode,
    Options, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_OCCUPANCY: &str = "occupancy";
const CF_RESERVATIONS: &str = "reservations";
const CF_PAYMENT_ORDERS: &str = "payment_orders";
const CF_INDICES: &str = "indices";

/// Index key prefixes within `indices`
const IDX_CUSTOMER: u8 = b'c';
const IDX_LISTING: u8 = b'l';

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_OCCUPANCY, Self::cf_options_occupancy()),
            ColumnFamilyDescriptor::new(CF_RESERVATIONS, Self::cf_options_reservations()),
            ColumnFamilyDescriptor::new(CF_PAYMENT_ORDERS, Self::cf_options_payment_orders()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_occupancy() -> Options {
        let mut opts = Options::default();
        // Hot point lookups, frequent overwrites
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_reservations() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_payment_orders() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Key helpers

    /// Occupancy key: 4-byte big-endian day number || 16-byte listing id.
    /// Date-first ordering makes `purge_occupancy_before` a prefix walk.
    fn occupancy_key(listing_id: &ListingId, date: NaiveDate) -> [u8; 20] {
        let mut key = [0u8; 20];
        key[..4].copy_from_slice(&(date.num_days_from_ce() as u32).to_be_bytes());
        key[4..].copy_from_slice(listing_id.as_bytes());
        key
    }

    fn day_number(key: &[u8]) -> Option<u32> {
        let bytes: [u8; 4] = key.get(..4)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    fn index_key_customer(customer_id: &CustomerId, reservation_id: Uuid) -> Vec<u8> {
        let mut key = vec![IDX_CUSTOMER];
        key.extend_from_slice(customer_id.as_bytes());
        key.extend_from_slice(reservation_id.as_bytes());
        key
    }

    fn index_key_listing(listing_id: &ListingId, reservation_id: Uuid) -> Vec<u8> {
        let mut key = vec![IDX_LISTING];
        key.extend_from_slice(listing_id.as_bytes());
        key.extend_from_slice(reservation_id.as_bytes());
        key
    }

    // Occupancy operations

    /// Get occupancy record for a (listing, date), if any
    pub fn get_occupancy(
        &self,
        listing_id: &ListingId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyRecord>> {
        let cf = self.cf_handle(CF_OCCUPANCY)?;
        let key = Self::occupancy_key(listing_id, date);

        match self.db.get_cf(&cf, key)? {
            Some(value) => {
                let record: OccupancyRecord = bincode::deserialize(&value)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Committed headcount for a (listing, date); 0 when no record exists
    pub fn reserved_count(&self, listing_id: &ListingId, date: NaiveDate) -> Result<u32> {
        Ok(self
            .get_occupancy(listing_id, date)?
            .map(|r| r.reserved_count)
            .unwrap_or(0))
    }

    /// Delete all occupancy records with `date` strictly before the cutoff.
    ///
    /// Returns the number of records deleted. Used only by the retention
    /// sweeper; running it twice in a row is a no-op on the second run.
    pub fn purge_occupancy_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let cf = self.cf_handle(CF_OCCUPANCY)?;
        let cutoff_day = cutoff.num_days_from_ce() as u32;

        let mut batch = WriteBatch::default();
        let mut count = 0u64;

        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (key, _) = item?;
            match Self::day_number(&key) {
                // Keys are date-ordered: the first non-matching key ends the walk
                Some(day) if day < cutoff_day => {
                    batch.delete_cf(&cf, key);
                    count += 1;
                }
                _ => break,
            }
        }

        if count > 0 {
            self.db.write(batch)?;
        }

        tracing::debug!(cutoff = %cutoff, purged = count, "Occupancy purge complete");

        Ok(count)
    }

    // Reservation operations

    /// Put reservation with secondary indices (atomic)
    pub fn put_reservation_atomic(&self, reservation: &Reservation) -> Result<()> {
        let cf_reservations = self.cf_handle(CF_RESERVATIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut batch = WriteBatch::default();
        Self::batch_put_reservation(&mut batch, &cf_reservations, &cf_indices, reservation)?;

        self.db.write(batch)?;
        Ok(())
    }

    fn batch_put_reservation(
        batch: &mut WriteBatch,
        cf_reservations: &Arc<BoundColumnFamily<'_>>,
        cf_indices: &Arc<BoundColumnFamily<'_>>,
        reservation: &Reservation,
    ) -> Result<()> {
        let value = bincode::serialize(reservation)?;
        batch.put_cf(cf_reservations, reservation.id.as_bytes(), &value);

        let idx_customer = Self::index_key_customer(&reservation.customer_id, reservation.id);
        batch.put_cf(cf_indices, &idx_customer, []);

        let idx_listing = Self::index_key_listing(&reservation.listing_id, reservation.id);
        batch.put_cf(cf_indices, &idx_listing, []);

        Ok(())
    }

    /// Get reservation by ID
    pub fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation> {
        let cf = self.cf_handle(CF_RESERVATIONS)?;

        let value = self
            .db
            .get_cf(&cf, reservation_id.as_bytes())?
            .ok_or_else(|| Error::ReservationNotFound(reservation_id.to_string()))?;

        let reservation: Reservation = bincode::deserialize(&value)?;
        Ok(reservation)
    }

    /// Delete reservation and its index entries (atomic)
    pub fn delete_reservation_atomic(&self, reservation: &Reservation) -> Result<()> {
        let cf_reservations = self.cf_handle(CF_RESERVATIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_reservations, reservation.id.as_bytes());
        batch.delete_cf(
            &cf_indices,
            Self::index_key_customer(&reservation.customer_id, reservation.id),
        );
        batch.delete_cf(
            &cf_indices,
            Self::index_key_listing(&reservation.listing_id, reservation.id),
        );

        self.db.write(batch)?;

        tracing::debug!(reservation_id = %reservation.id, "Reservation deleted");

        Ok(())
    }

    /// Scan reservations in creation order, returning one page and the
    /// total row count
    pub fn scan_reservations(&self, offset: usize, limit: usize) -> Result<(Vec<Reservation>, u64)> {
        let cf = self.cf_handle(CF_RESERVATIONS)?;

        let mut items = Vec::new();
        let mut total = 0u64;

        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (_, value) = item?;
            if (total as usize) >= offset && items.len() < limit {
                let reservation: Reservation = bincode::deserialize(&value)?;
                items.push(reservation);
            }
            total += 1;
        }

        Ok((items, total))
    }

    /// Get all reservations of a customer (via index)
    pub fn reservations_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Reservation>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut prefix = vec![IDX_CUSTOMER];
        prefix.extend_from_slice(customer_id.as_bytes());

        let mut reservations = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_indices,
            IteratorMode::From(prefix.as_slice(), Direction::Forward),
        );

        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            // Extract reservation_id from key (bytes 17..33)
            if key.len() == 33 {
                let id_bytes: [u8; 16] = key[17..33]
                    .try_into()
                    .map_err(|_| Error::Storage("Corrupt customer index key".to_string()))?;
                reservations.push(self.get_reservation(Uuid::from_bytes(id_bytes))?);
            }
        }

        Ok(reservations)
    }

    // Payment order operations

    /// Put payment order
    pub fn put_payment_order(&self, order: &PaymentOrder) -> Result<()> {
        let cf = self.cf_handle(CF_PAYMENT_ORDERS)?;
        let value = bincode::serialize(order)?;

        self.db.put_cf(&cf, order.id.as_bytes(), &value)?;

        tracing::debug!(
            order_id = %order.id,
            reservation_id = %order.reservation_id,
            transaction_id = %order.transaction_id,
            "Payment order recorded"
        );

        Ok(())
    }

    /// Get payment order by ID
    pub fn get_payment_order(&self, order_id: Uuid) -> Result<PaymentOrder> {
        let cf = self.cf_handle(CF_PAYMENT_ORDERS)?;

        let value = self
            .db
            .get_cf(&cf, order_id.as_bytes())?
            .ok_or_else(|| Error::PaymentOrderNotFound(order_id.to_string()))?;

        let order: PaymentOrder = bincode::deserialize(&value)?;
        Ok(order)
    }

    // Confirmation commit (atomic)

    /// Commit a confirmed reservation: every per-date occupancy increment
    /// plus the reservation row, in one write batch.
    ///
    /// The caller has already validated availability; the capacity
    /// invariant is re-checked here and a violation fails with
    /// `CapacityExceeded`, never clamped.
    pub fn commit_confirmation(
        &self,
        reservation: &Reservation,
        daily_capacity: u32,
    ) -> Result<()> {
        let cf_occupancy = self.cf_handle(CF_OCCUPANCY)?;
        let cf_reservations = self.cf_handle(CF_RESERVATIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut batch = WriteBatch::default();

        for date in date_span(reservation.start_date, reservation.end_date) {
            let reserved = self.reserved_count(&reservation.listing_id, date)?;

            if reserved + reservation.headcount > daily_capacity {
                tracing::error!(
                    listing_id = %reservation.listing_id,
                    date = %date,
                    reserved,
                    requested = reservation.headcount,
                    daily_capacity,
                    "Occupancy increment would exceed capacity; aborting commit"
                );
                return Err(Error::CapacityExceeded {
                    listing_id: reservation.listing_id,
                    date,
                    reserved,
                    requested: reservation.headcount,
                    daily_capacity,
                });
            }

            let record = OccupancyRecord {
                listing_id: reservation.listing_id,
                date,
                reserved_count: reserved + reservation.headcount,
            };
            let value = bincode::serialize(&record)?;
            batch.put_cf(
                &cf_occupancy,
                Self::occupancy_key(&reservation.listing_id, date),
                &value,
            );
        }

        Self::batch_put_reservation(&mut batch, &cf_reservations, &cf_indices, reservation)?;

        self.db.write(batch)?;

        tracing::debug!(
            reservation_id = %reservation.id,
            listing_id = %reservation.listing_id,
            headcount = reservation.headcount,
            "Confirmation committed"
        );

        Ok(())
    }

    // Statistics

    /// Get storage statistics (approximate, fast)
    pub fn get_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            occupancy_records: self.approximate_count(CF_OCCUPANCY)?,
            reservations: self.approximate_count(CF_RESERVATIONS)?,
            payment_orders: self.approximate_count(CF_PAYMENT_ORDERS)?,
        })
    }

    fn approximate_count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf_handle(cf_name)?;
        let prop = self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate occupancy row count
    pub occupancy_records: u64,
    /// Approximate reservation row count
    pub reservations: u64,
    /// Approximate payment order row count
    pub payment_orders: u64,
}

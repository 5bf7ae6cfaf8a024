//! Main record generator.

use crate::generators::numeric::{generate_amount, generate_int_range};
use crate::generators::text::{generate_address, generate_email, generate_random_string};
use crate::generators::timestamp::generate_random_date;
use crate::generators::uuid::generate_uuid_v4;
use crate::generators::{pick, GeneratorError};
use bench_core::{
    Browser, BusinessRecord, Device, PaymentMethod, RecordMetadata, Status, SyntheticRecord,
    TrafficSource,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Historical window transaction dates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TransactionWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, GeneratorError> {
        if start > end {
            return Err(GeneratorError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

impl Default for TransactionWindow {
    /// 2020-01-01 until now.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let end = Utc::now().naive_utc().max(start);
        Self { start, end }
    }
}

/// Produces synthetic records without shared mutable state.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    /// Base seed; `None` draws every record from fresh entropy
    seed: Option<u64>,
    window: TransactionWindow,
}

impl RecordGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            window: TransactionWindow::default(),
        }
    }

    pub fn with_window(mut self, window: TransactionWindow) -> Self {
        self.window = window;
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// RNG dedicated to record `index`.
    ///
    /// Combining the base seed with the index lets any record be produced
    /// independently of the others while staying deterministic.
    pub fn rng_for(&self, index: u64) -> StdRng {
        match self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed.wrapping_add(index.wrapping_mul(0x9E3779B97F4A7C15)))
            }
            None => StdRng::from_entropy(),
        }
    }

    /// Generate record number `index`.
    pub fn record_at(&self, index: u64) -> SyntheticRecord {
        let mut rng = self.rng_for(index);
        self.generate(&mut rng)
    }

    /// Generate business row number `index`, assigned to a uniformly chosen partition.
    pub fn business_record_at(&self, index: u64, partitions: &[String]) -> Option<BusinessRecord> {
        if partitions.is_empty() {
            return None;
        }
        let mut rng = self.rng_for(index);
        let record = self.generate(&mut rng);
        let partition = &partitions[rng.gen_range(0..partitions.len())];
        Some(BusinessRecord::from_record(record, partition.clone()))
    }

    /// Generate one record from the given RNG.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SyntheticRecord {
        let id = generate_uuid_v4(rng);
        let user_id = generate_int_range(rng, 1, 1_000_000);
        let product_id = generate_int_range(rng, 1, 50_000);
        // The window was validated on construction.
        let transaction_date =
            generate_random_date(rng, self.window.start, self.window.end).unwrap_or(self.window.start);
        let amount = generate_amount(rng, 100, 100_000);
        let status = pick(rng, &Status::ALL);
        let payment_method = pick(rng, &PaymentMethod::ALL);
        let customer_name = generate_random_string(rng, 15);
        let email = generate_email(rng);
        let shipping_address = generate_address(rng);
        let metadata = RecordMetadata {
            device: pick(rng, &Device::ALL),
            browser: pick(rng, &Browser::ALL),
            source: pick(rng, &TrafficSource::ALL),
        };

        SyntheticRecord {
            id,
            user_id,
            product_id,
            transaction_date,
            amount,
            status,
            payment_method,
            customer_name,
            email,
            shipping_address,
            metadata,
        }
    }
}

//! Test doubles for the external collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::catalogue::CatalogueStore;
use crate::chat::{DialogueResolver, InMemoryConversationStore};
use crate::embedder::{Embedder, EmbedderError};
use crate::store::{OrderRecord, OrderStore, ProductSource, RawTable, StoreError};

pub const PAYMENT_BASE_URL: &str = "https://pay.test";
pub const UPI_ID: &str = "shop@upi";

/// Deterministic embedder: a 16-bin byte histogram. Similar texts get
/// similar vectors, identical texts identical ones, no model download.
#[derive(Default)]
pub struct MockEmbedder {
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

fn vectorize(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 16];
    for b in text
        .to_lowercase()
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric())
    {
        v[(b as usize) % 16] += 1.0;
    }
    v
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vectorize(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vectorize(t)).collect())
    }
}

/// In-memory product table with load/write-back counters.
pub struct MockProductSource {
    headers: Vec<String>,
    rows: Mutex<Vec<Vec<String>>>,
    pub loads: AtomicUsize,
    pub write_backs: Mutex<Vec<(usize, String, String)>>,
}

impl MockProductSource {
    pub fn new(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Self {
        Self {
            headers: headers.into_iter().map(String::from).collect(),
            rows: Mutex::new(
                rows.into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            ),
            loads: AtomicUsize::new(0),
            write_backs: Mutex::new(Vec::new()),
        }
    }
}

impl ProductSource for Arc<MockProductSource> {
    fn load(&self) -> Result<RawTable, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(RawTable::new(
            self.headers.clone(),
            self.rows.lock().unwrap().clone(),
        ))
    }

    fn write_back(&self, row: usize, column: &str, value: &str) -> Result<(), StoreError> {
        let col = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;

        let mut rows = self.rows.lock().unwrap();
        rows[row][col] = value.to_string();

        self.write_backs
            .lock()
            .unwrap()
            .push((row, column.to_string(), value.to_string()));
        Ok(())
    }
}

/// In-memory order log with failure injection.
#[derive(Default)]
pub struct MockOrderStore {
    pub records: Mutex<Vec<OrderRecord>>,
    pub fail: AtomicBool,
}

impl MockOrderStore {
    fn check_fail(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Io(std::io::Error::other("injected failure")))
        } else {
            Ok(())
        }
    }
}

impl OrderStore for MockOrderStore {
    fn append(&self, record: &OrderRecord) -> Result<(), StoreError> {
        self.check_fail()?;
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn find_and_update_status(
        &self,
        phone: &str,
        sku_id: &str,
        new_status: &str,
    ) -> Result<bool, StoreError> {
        self.check_fail()?;
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.phone == phone && r.sku_id == sku_id)
        {
            Some(record) => {
                record.status = new_status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Standard catalogue row in `REQUIRED_COLUMNS` order.
#[allow(clippy::too_many_arguments)]
pub fn catalogue_row<'a>(
    id: &'a str,
    sku: &'a str,
    name: &'a str,
    brand: &'a str,
    scheme: &'a str,
    size_text: &'a str,
    dim_a: &'a str,
    dim_b: &'a str,
    price_unit: &'a str,
    price: &'a str,
) -> Vec<&'a str> {
    vec![
        id, sku, name, brand, scheme, size_text, dim_a, dim_b, "mm", price_unit, price,
    ]
}

pub fn catalogue_headers() -> Vec<&'static str> {
    crate::catalogue::REQUIRED_COLUMNS.to_vec()
}

/// A small but realistic catalogue: two elbows differing only in size,
/// a bend, and a teflon tape.
pub fn sample_rows() -> Vec<Vec<&'static str>> {
    vec![
        catalogue_row(
            "a1", "ELB-110", "Elbow", "Acme", "OD", "110 mm", "110", "", "PCS", "45",
        ),
        catalogue_row(
            "a2", "ELB-50", "Elbow", "Acme", "OD", "50 mm", "50", "", "PCS", "25",
        ),
        catalogue_row(
            "b1", "BND-75", "Bend", "Acme", "OD", "75 mm", "75", "", "PCS", "30",
        ),
        catalogue_row(
            "t1", "TAPE-12", "Teflon Tape", "SealPro", "CS", "12 mm", "12", "", "ROLL", "10",
        ),
    ]
}

/// Everything a resolver test needs, with handles kept for assertions.
pub struct Fixture {
    pub resolver: DialogueResolver,
    pub catalogue: Arc<CatalogueStore>,
    pub source: Arc<MockProductSource>,
    pub embedder: Arc<MockEmbedder>,
    pub orders: Arc<MockOrderStore>,
    pub conversations: Arc<InMemoryConversationStore>,
}

pub fn fixture_with_rows(rows: Vec<Vec<&str>>) -> Fixture {
    let source = Arc::new(MockProductSource::new(catalogue_headers(), rows));
    let embedder = Arc::new(MockEmbedder::default());
    let catalogue = Arc::new(CatalogueStore::new(
        Box::new(source.clone()),
        embedder.clone(),
    ));
    let orders = Arc::new(MockOrderStore::default());
    let conversations = Arc::new(InMemoryConversationStore::new(0));

    let resolver = DialogueResolver::new(
        catalogue.clone(),
        orders.clone(),
        conversations.clone(),
        PAYMENT_BASE_URL,
        UPI_ID,
        3,
    );

    Fixture {
        resolver,
        catalogue,
        source,
        embedder,
        orders,
        conversations,
    }
}

pub fn fixture() -> Fixture {
    fixture_with_rows(sample_rows())
}

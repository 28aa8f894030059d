use super::*;
use anyhow::anyhow;

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("storage disabled"))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<()> {
        Err(anyhow!("quota exceeded"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(anyhow!("storage disabled"))
    }
}

#[tokio::test]
async fn counts_round_trip_through_the_store() {
    let store = MemoryStore::new();
    let adapter = PersistenceAdapter::new(Arc::new(store.clone()));

    assert!(adapter.save_counts("k", &[3, 0, 8, 1], CountsShape::Array).await);
    assert_eq!(adapter.load_counts("k", 4).await, vec![3, 0, 8, 1]);
    assert_eq!(
        store.entries().await.get("k").map(String::as_str),
        Some("[3,0,8,1]")
    );
}

#[tokio::test]
async fn read_failures_surface_as_absent() {
    let adapter = PersistenceAdapter::new(Arc::new(FailingStore));
    assert_eq!(adapter.load("k").await, None);
    assert_eq!(adapter.load_counts("k", 2).await, vec![0, 0]);
    assert_eq!(adapter.load_theme("k:theme").await, None);
    assert!(!adapter.load_flag("k:extras").await);
}

#[tokio::test]
async fn write_failures_are_reported_not_propagated() {
    let adapter = PersistenceAdapter::new(Arc::new(FailingStore));
    assert!(!adapter.save_counts("k", &[1], CountsShape::Scalar).await);
    assert!(!adapter.save_flag("k:extras", false).await);
}

#[tokio::test]
async fn theme_accepts_only_literal_values() {
    let store = MemoryStore::new();
    let adapter = PersistenceAdapter::new(Arc::new(store.clone()));

    adapter.save_theme("t", Theme::Dark).await;
    assert_eq!(adapter.load_theme("t").await, Some(Theme::Dark));

    store.put("t", "Dark").await.expect("put");
    assert_eq!(adapter.load_theme("t").await, None);
}

#[tokio::test]
async fn cleared_flag_removes_the_key() {
    let store = MemoryStore::new();
    let adapter = PersistenceAdapter::new(Arc::new(store.clone()));

    adapter.save_flag("x", true).await;
    assert_eq!(store.entries().await.get("x").map(String::as_str), Some("1"));
    assert!(adapter.load_flag("x").await);

    adapter.save_flag("x", false).await;
    assert!(!store.entries().await.contains_key("x"));
    assert!(!adapter.load_flag("x").await);
}

#[test]
fn storage_keys_derive_from_the_counts_key() {
    let keys = StorageKeys::derive("koyaku-counter:v1");
    assert_eq!(keys.counts, "koyaku-counter:v1");
    assert_eq!(keys.theme, "koyaku-counter:v1:theme");
    assert_eq!(keys.extras, "koyaku-counter:v1:extras");
}

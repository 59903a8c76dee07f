//! Key-value store capability.
//!
//! The original console kept template and activity lists in global
//! browser storage. Here that state sits behind an explicit injected
//! capability: an in-memory implementation is the testing default and a
//! file-backed one ships in the infrastructure crate.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// An abstract key-value store for small console-local documents.
///
/// Values are JSON documents; typed access is the caller's concern via
/// serde. Implementations must tolerate unknown keys (`get` returns
/// `None`, `remove` is a no-op).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes the value stored under `key`, if any.
    async fn remove(&self, key: &str) -> Result<()>;
}

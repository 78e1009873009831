use std::{future::Future, io::ErrorKind, ops::Deref, path::PathBuf};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Interface for abstracting durable key to string storage. Every value is small and written
/// whole, so the contract is a plain get/set with last write winning.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        self.deref().get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send {
        self.deref().set(key, value)
    }
}

/// The main realization of [KeyValueStore]. Keeps one file per key inside the application state
/// directory. Files are advisory-locked because the cli and the reminder daemon can touch the
/// same state concurrently.
pub struct FileKvStore {
    state_dir: PathBuf,
}

impl FileKvStore {
    pub fn new(state_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&state_dir)?;

        Ok(Self { state_dir })
    }

    async fn read_value(&self, path: PathBuf) -> Result<String, std::io::Error> {
        debug!("Reading {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        Self::read_with_file(file).await
    }

    async fn read_with_file(mut file: File) -> Result<String, std::io::Error> {
        let mut value = String::new();
        let read = file.read_to_string(&mut value).await;
        file.unlock_async().await?;
        read?;
        Ok(value)
    }

    async fn write_value(&self, path: PathBuf, value: String) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::write_with_file(&mut file, value).await;
        file.unlock_async().await?;
        result
    }

    async fn write_with_file(file: &mut File, value: String) -> Result<()> {
        file.set_len(0).await?;
        file.write_all(value.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.state_dir.join(key);
        match self.read_value(path).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)?,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.state_dir.join(key);
        self.write_value(path, value).await
    }
}

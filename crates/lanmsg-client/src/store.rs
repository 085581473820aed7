//! File access for sending and receiving transfers.
//!
//! The session never touches the filesystem directly; it goes through a
//! [`FileStore`], so tests and embedders can substitute their own.

use std::future::Future;
use std::io::SeekFrom;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// One piece of a file being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Bytes,
    /// The end of the file was reached while reading this chunk.
    pub eof: bool,
}

/// Opens, reads and writes the files behind transfers.
pub trait FileStore: Send + Sync + 'static {
    /// A file opened for sending.
    type Reader: Send + 'static;
    /// A file opened for receiving.
    type Writer: Send + 'static;

    fn open_read(&self, path: &Path) -> impl Future<Output = std::io::Result<Self::Reader>> + Send;

    /// Reads up to `max_len` bytes. A chunk shorter than `max_len` is the
    /// last one and has `eof` set.
    fn read_chunk(
        &self,
        reader: &mut Self::Reader,
        max_len: usize,
    ) -> impl Future<Output = std::io::Result<Chunk>> + Send;

    /// Creates (or truncates) the file a transfer is saved to.
    fn create(&self, path: &Path) -> impl Future<Output = std::io::Result<Self::Writer>> + Send;

    fn write_at(
        &self,
        writer: &mut Self::Writer,
        offset: u64,
        data: &[u8],
    ) -> impl Future<Output = std::io::Result<()>> + Send;

    /// Flushes and closes a received file.
    fn close(&self, writer: Self::Writer) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// A [`FileStore`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    type Reader = File;
    type Writer = File;

    async fn open_read(&self, path: &Path) -> std::io::Result<File> {
        File::open(path).await
    }

    async fn read_chunk(&self, reader: &mut File, max_len: usize) -> std::io::Result<Chunk> {
        let mut buf = BytesMut::with_capacity(max_len);
        while buf.len() < max_len {
            let remaining = max_len - buf.len();
            let n = (&mut *reader).take(remaining as u64).read_buf(&mut buf).await?;
            if n == 0 {
                return Ok(Chunk {
                    data: buf.freeze(),
                    eof: true,
                });
            }
        }
        Ok(Chunk {
            data: buf.freeze(),
            eof: false,
        })
    }

    async fn create(&self, path: &Path) -> std::io::Result<File> {
        File::create(path).await
    }

    async fn write_at(&self, writer: &mut File, offset: u64, data: &[u8]) -> std::io::Result<()> {
        writer.seek(SeekFrom::Start(offset)).await?;
        writer.write_all(data).await
    }

    async fn close(&self, mut writer: File) -> std::io::Result<()> {
        writer.flush().await?;
        writer.sync_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_chunk_splits_and_flags_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.txt");
        tokio::fs::write(&path, b"abcdefghij").await.unwrap();

        let store = DiskStore;
        let mut reader = store.open_read(&path).await.unwrap();

        let first = store.read_chunk(&mut reader, 4).await.unwrap();
        assert_eq!(&first.data[..], b"abcd");
        assert!(!first.eof);
        let second = store.read_chunk(&mut reader, 4).await.unwrap();
        assert_eq!(&second.data[..], b"efgh");
        let last = store.read_chunk(&mut reader, 4).await.unwrap();
        assert_eq!(&last.data[..], b"ij");
        assert!(last.eof);
    }

    #[tokio::test]
    async fn test_read_chunk_exact_multiple_ends_with_empty_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("even.bin");
        tokio::fs::write(&path, [7u8; 8]).await.unwrap();

        let store = DiskStore;
        let mut reader = store.open_read(&path).await.unwrap();
        assert!(!store.read_chunk(&mut reader, 8).await.unwrap().eof);

        let tail = store.read_chunk(&mut reader, 8).await.unwrap();
        assert!(tail.data.is_empty());
        assert!(tail.eof);
    }

    #[tokio::test]
    async fn test_write_at_places_data_at_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("received.txt");

        let store = DiskStore;
        let mut writer = store.create(&path).await.unwrap();
        store.write_at(&mut writer, 6, b"world").await.unwrap();
        store.write_at(&mut writer, 0, b"hello ").await.unwrap();
        store.close(writer).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_open_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiskStore
            .open_read(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunked upload client.
//!
//! Three phases: initiate, idempotent chunk PUTs, checksum finalize.
//! Connection errors retry per chunk with 1 s/2 s/4 s backoff; auth,
//! upload-not-found, and chunk-rejected errors abort the whole upload.
//! Cancellation is checked between chunks and tears the session down
//! best-effort.

use std::sync::Arc;
use std::time::Duration;

use ap_core::Guid;
use ap_wire::{InitiateUploadRequest, InitiateUploadResponse, UploadType};
use sha2::{Digest, Sha256};

use crate::client::{ClientError, ServerApi};
use crate::poll::CancelFlag;

/// Results JSON larger than this goes through chunked upload.
pub const INLINE_JSON_THRESHOLD: usize = 1024 * 1024;

/// Default chunk size requested at initiate.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Retries per chunk.
pub const MAX_CHUNK_RETRIES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload cancelled")]
    Cancelled,
    #[error("chunk {index} failed after {attempts} attempts: {source}")]
    ChunkExhausted { index: u32, attempts: u32, source: ClientError },
    #[error("{0}")]
    Api(#[from] ClientError),
}

/// A finished upload, ready to reference from job completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub upload_id: String,
    pub content_size: u64,
    /// Lowercase hex SHA-256 of the full content.
    pub checksum: String,
}

/// Splits large artifacts into chunks and drives the upload protocol.
pub struct ChunkedUploader<A: ServerApi> {
    api: Arc<A>,
    chunk_size: u64,
    max_retries: u32,
    initial_backoff: Duration,
}

impl<A: ServerApi> ChunkedUploader<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: MAX_CHUNK_RETRIES,
            initial_backoff: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Upload one artifact for a job.
    pub async fn upload(
        &self,
        job: &Guid,
        upload_type: UploadType,
        content: &[u8],
        cancel: &CancelFlag,
    ) -> Result<UploadOutcome, UploadError> {
        // The checksum is computed once up front; finalize submits it and
        // the server re-derives its own from the stored chunks.
        let checksum = hex::encode(Sha256::digest(content));

        let session: InitiateUploadResponse = self
            .api
            .initiate_upload(
                job,
                &InitiateUploadRequest {
                    upload_type,
                    expected_size: content.len() as u64,
                    chunk_size: self.chunk_size,
                },
            )
            .await?;
        tracing::debug!(
            "upload {} started: {} bytes in {} chunk(s)",
            session.upload_id,
            content.len(),
            session.total_chunks
        );

        // The server may have rounded the chunk size; always use its value.
        let chunk_size = session.chunk_size as usize;
        for (index, chunk) in content.chunks(chunk_size.max(1)).enumerate() {
            if cancel.is_set() {
                self.abort(&session.upload_id).await;
                return Err(UploadError::Cancelled);
            }
            self.put_chunk_with_retry(&session.upload_id, index as u32, chunk).await?;
        }

        if cancel.is_set() {
            self.abort(&session.upload_id).await;
            return Err(UploadError::Cancelled);
        }
        self.api.finalize_upload(&session.upload_id, &checksum).await?;

        Ok(UploadOutcome {
            upload_id: session.upload_id,
            content_size: content.len() as u64,
            checksum,
        })
    }

    async fn put_chunk_with_retry(
        &self,
        upload_id: &str,
        index: u32,
        chunk: &[u8],
    ) -> Result<(), UploadError> {
        let mut attempt = 0;
        loop {
            match self.api.put_chunk(upload_id, index, chunk.to_vec()).await {
                // `received: false` (or 409) means the server already has
                // this chunk; that is success.
                Ok(_) => return Ok(()),
                Err(err) if err.is_recoverable() => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(UploadError::ChunkExhausted {
                            index,
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let backoff = self.initial_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        "chunk {index} attempt {attempt} failed, retrying in {backoff:?}: {err}"
                    );
                    tokio::time::sleep(backoff).await;
                }
                // Auth, not-found, and rejected chunks are terminal.
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Best-effort session teardown; the server expires leftovers anyway.
    async fn abort(&self, upload_id: &str) {
        if let Err(err) = self.api.cancel_upload(upload_id).await {
            tracing::debug!("upload cancel ignored: {err}");
        }
    }
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;

//! HTTP transport for the upload endpoint
//!
//! `POST /upload` sends the file as the `file` field of a multipart form while
//! reporting progress; `DELETE /upload` asks the server to drop a file by name.

use crate::model::error::{TransferError, TransferResult};
use crate::model::file_handle::FileHandle;
use bytes::Bytes;
use color_eyre::eyre;
use futures::future::BoxFuture;
use futures::Stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Serialize;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::Instrument;
use url::Url;

/// Size of the body chunks handed to the HTTP client
const CHUNK_SIZE: usize = 64 * 1024;
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Receives upload progress as a percentage
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Transport used by the uploader; abstracted so the session logic can be
/// exercised without a server.
#[cfg_attr(test, mockall::automock)]
pub trait UploadTransport: Send + Sync {
    /// Send `file` to the endpoint, calling `on_progress` as bytes go out
    fn upload(&self, file: FileHandle, on_progress: ProgressFn) -> BoxFuture<'static, TransferResult>;

    /// Ask the endpoint to forget `filename`
    fn delete(&self, filename: String) -> BoxFuture<'static, TransferResult>;
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    filename: String,
}

struct ProgressTracker {
    bytes_sent: u64,
    content_length: u64,
    last_reported: Option<u8>,
    on_progress: ProgressFn,
}

impl ProgressTracker {
    fn track(&mut self, len: u64) {
        self.bytes_sent += len;
        if self.content_length == 0 {
            return;
        }
        // round(sent * 100 / total)
        let percent = ((self.bytes_sent * 100 + self.content_length / 2) / self.content_length).min(100) as u8;
        if self.last_reported != Some(percent) {
            self.last_reported = Some(percent);
            (self.on_progress)(percent);
        }
    }
}

/// Body stream that reports every chunk polled by the HTTP client
#[pin_project::pin_project]
pub struct ProgressStream<S> {
    #[pin]
    inner: S,
    progress_tracker: ProgressTracker,
}

impl<S> ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, io::Error>>,
{
    pub fn new(inner: S, content_length: u64, on_progress: ProgressFn) -> Self {
        ProgressStream {
            inner,
            progress_tracker: ProgressTracker {
                bytes_sent: 0,
                content_length,
                last_reported: None,
                on_progress,
            },
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, io::Error>>,
{
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(data))) => {
                this.progress_tracker.track(data.len() as u64);
                Poll::Ready(Some(Ok(data)))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn chunked(data: Bytes) -> impl Stream<Item = Result<Bytes, io::Error>> {
    let chunks: Vec<Result<Bytes, io::Error>> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
        .collect();
    futures::stream::iter(chunks)
}

/// Talks to the upload endpoint through reqwest
#[derive(Clone)]
pub struct HttpUploadClient {
    client: Client,
    upload_url: Url,
}

impl HttpUploadClient {
    /// No request timeout is set; a hung transfer stays in progress
    pub fn new(upload_url: Url) -> eyre::Result<Self> {
        let client = Client::builder().build()?;
        Ok(HttpUploadClient { client, upload_url })
    }
}

impl UploadTransport for HttpUploadClient {
    fn upload(&self, file: FileHandle, on_progress: ProgressFn) -> BoxFuture<'static, TransferResult> {
        let client = self.client.clone();
        let url = self.upload_url.clone();
        let span = tracing::info_span!("upload", file = %file.name);

        Box::pin(
            async move {
                let data = Bytes::from(tokio::fs::read(&file.path).await?);
                let content_length = data.len() as u64;
                tracing::debug!("Sending {} bytes to {}", content_length, url);

                let body = ProgressStream::new(chunked(data), content_length, on_progress);
                let media_type = if file.media_type.is_empty() {
                    FALLBACK_MEDIA_TYPE
                } else {
                    file.media_type.as_str()
                };
                let part = Part::stream_with_length(Body::wrap_stream(body), content_length)
                    .file_name(file.name.clone())
                    .mime_str(media_type)?;
                let form = Form::new().part("file", part);

                client
                    .post(url)
                    .multipart(form)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<(), TransferError>(())
            }
            .instrument(span),
        )
    }

    fn delete(&self, filename: String) -> BoxFuture<'static, TransferResult> {
        let client = self.client.clone();
        let url = self.upload_url.clone();

        Box::pin(async move {
            client
                .delete(url)
                .json(&DeleteRequest { filename })
                .send()
                .await?
                .error_for_status()?;
            Ok::<(), TransferError>(())
        })
    }
}

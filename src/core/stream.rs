//! Streaming response bodies
//!
//! Adapts a reqwest body stream to `AsyncRead` so it can be copied straight
//! into a file without buffering the whole image.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::TryStreamExt;
use tokio::io::{AsyncRead, ReadBuf};

/// Body of an HTTP response, readable as a byte stream
pub struct BodyStream {
    inner: Box<dyn AsyncRead + Send + Unpin>,
}

impl AsyncRead for BodyStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Creates a BodyStream from an HTTP response
pub fn create_http_stream(response: reqwest::Response) -> BodyStream {
    let stream = tokio_util::io::StreamReader::new(
        response.bytes_stream().map_err(std::io::Error::other),
    );
    BodyStream {
        inner: Box::new(stream),
    }
}

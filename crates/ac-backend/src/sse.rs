//! Line decoder for the chunked event stream.
//!
//! Splits a byte stream into complete text lines. A line boundary may fall
//! anywhere across chunk reads, so a trailing partial line is held and
//! prefixed to the next chunk's decoded text.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream wrapper that yields complete lines from a byte stream.
///
/// `\r\n` endings are normalized by stripping the trailing `\r`. When the
/// source ends, any bytes after the last newline are discarded: the producer
/// always newline-terminates the terminal record, so an unterminated tail is
/// never a meaningful event.
pub struct LineStream<S> {
    inner: S,
    line_buf: String,
    pending: Vec<String>,
}

impl<S> LineStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            line_buf: String::new(),
            pending: Vec::new(),
        }
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<String, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        // Drain lines completed by a previous chunk first
        if !this.pending.is_empty() {
            return Poll::Ready(Some(Ok(this.pending.remove(0))));
        }

        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let chunk = String::from_utf8_lossy(&bytes);
                    for c in chunk.chars() {
                        if c == '\n' {
                            let mut line = std::mem::take(&mut this.line_buf);
                            if line.ends_with('\r') {
                                line.pop();
                            }
                            this.pending.push(line);
                        } else {
                            this.line_buf.push(c);
                        }
                    }

                    if !this.pending.is_empty() {
                        return Poll::Ready(Some(Ok(this.pending.remove(0))));
                    }
                    // No complete line yet, keep polling for more data
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    if !this.line_buf.is_empty() {
                        tracing::debug!(
                            len = this.line_buf.len(),
                            "discarding unterminated trailing line at end of stream"
                        );
                        this.line_buf.clear();
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

/// Create a line stream from a byte stream.
pub fn decode_lines<S, E>(stream: S) -> LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    LineStream::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn bytes_stream(
        chunks: Vec<&'static str>,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        futures::stream::iter(chunks.into_iter().map(|s| Ok(Bytes::from(s))))
    }

    async fn collect_lines(chunks: Vec<&'static str>) -> Vec<String> {
        decode_lines(bytes_stream(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn single_line() {
        let lines = collect_lines(vec!["hello\n"]).await;
        assert_eq!(lines, vec!["hello"]);
    }

    #[tokio::test]
    async fn multiple_lines_in_one_chunk() {
        let lines = collect_lines(vec!["one\ntwo\nthree\n"]).await;
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn line_split_across_chunks() {
        let lines = collect_lines(vec!["data: hel", "lo wor", "ld\n"]).await;
        assert_eq!(lines, vec!["data: hello world"]);
    }

    #[tokio::test]
    async fn newline_split_from_content() {
        let lines = collect_lines(vec!["first", "\nsecond\n"]).await;
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn crlf_is_normalized() {
        let lines = collect_lines(vec!["hello\r\nworld\r\n"]).await;
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn blank_lines_are_preserved() {
        let lines = collect_lines(vec!["one\n\ntwo\n"]).await;
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[tokio::test]
    async fn trailing_partial_line_is_discarded() {
        let lines = collect_lines(vec!["complete\n", "partial with no newline"]).await;
        assert_eq!(lines, vec!["complete"]);
    }

    #[tokio::test]
    async fn empty_source_yields_nothing() {
        let lines = collect_lines(vec![]).await;
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn source_error_is_propagated() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from("ok\n")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom")),
        ]);
        let mut lines = decode_lines(stream);

        assert_eq!(lines.next().await.unwrap().unwrap(), "ok");
        assert!(lines.next().await.unwrap().is_err());
    }
}

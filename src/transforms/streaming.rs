//! Response stream transformations.
//!
//! `stream_strip_oc_prefix` rewrites the upstream body as it arrives: each
//! chunk is decoded, stripped of `oc_` tool-name prefixes and re-emitted
//! without waiting for the end of the stream.
//!
//! A small tail is carried between chunks so a `"name": "oc_...` split across
//! two network chunks is still rewritten.

use async_stream::stream;
use bytes::Bytes;
use futures_util::Stream;

use super::decoder::Utf8Decoder;
use super::tool_names::strip_prefixed_names;

/// Strip the `oc_` prefix from tool names in an upstream body stream.
///
/// Chunks are emitted in upstream order, one output chunk per input chunk
/// (empty outputs are skipped while a partial match is held back). An upstream
/// error ends the stream with an error instead of a truncated body.
pub fn stream_strip_oc_prefix<E>(
    body: impl Stream<Item = Result<Bytes, E>> + Send + 'static,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send
where
    E: std::error::Error + Send + Sync + 'static,
{
    use futures_util::StreamExt;

    stream! {
        let mut body = std::pin::pin!(body);
        let mut decoder = Utf8Decoder::new();
        let mut carry = String::new();

        while let Some(chunk_result) = body.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Upstream stream failed mid-response: {e}");
                    yield Err(std::io::Error::other(e));
                    return;
                }
            };

            carry.push_str(&decoder.decode(&chunk));
            let (output, consumed) = strip_prefixed_names(&carry, false);
            carry.drain(..consumed);

            if !output.is_empty() {
                yield Ok(Bytes::from(output));
            }
        }

        // Flush whatever is still held back
        carry.push_str(&decoder.finish());
        if !carry.is_empty() {
            let (output, _) = strip_prefixed_names(&carry, true);
            yield Ok(Bytes::from(output));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};
    use std::io;

    async fn run(chunks: &[&'static [u8]]) -> Vec<Bytes> {
        let chunks: Vec<Result<Bytes, io::Error>> =
            chunks.iter().map(|&c| Ok(Bytes::from_static(c))).collect();
        stream_strip_oc_prefix(stream::iter(chunks))
            .map(|r| r.expect("stream should not fail"))
            .collect()
            .await
    }

    fn concat(chunks: &[Bytes]) -> String {
        let bytes: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rewrites_single_chunk() {
        let out = run(&[
            br#"data: {"type":"content_block_start","content_block":{"type":"tool_use","name": "oc_foo"}}"#,
        ])
        .await;
        assert_eq!(
            concat(&out),
            r#"data: {"type":"content_block_start","content_block":{"type":"tool_use","name": "foo"}}"#
        );
    }

    #[tokio::test]
    async fn test_rewrites_across_chunk_boundary() {
        let out = run(&[br#"{"name": "oc_"#, br#"foo"}"#]).await;
        assert_eq!(concat(&out), r#"{"name": "foo"}"#);
    }

    #[tokio::test]
    async fn test_rewrites_pattern_split_everywhere() {
        let full = br#"event: x\ndata: {"id":"t1","name" :  "oc_read_file","input":{}}\n\n"#;
        let expected = r#"event: x\ndata: {"id":"t1","name" :  "read_file","input":{}}\n\n"#;
        for split in 1..full.len() {
            let (a, b) = full.split_at(split);
            let out = run(&[a, b]).await;
            assert_eq!(concat(&out), expected, "split at {split}");
        }
    }

    #[tokio::test]
    async fn test_emits_each_chunk_without_waiting() {
        let out = run(&[b"first ", b"second ", b"third"]).await;
        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"first "),
                Bytes::from_static(b"second "),
                Bytes::from_static(b"third"),
            ]
        );
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let text = r#"{"name": "oc_détail", "text": "日本"}"#.as_bytes();
        // Split inside the `é` and inside `日`
        let e_pos = text.iter().position(|&b| b == 0xc3).unwrap();
        let ja_pos = text.iter().position(|&b| b == 0xe6).unwrap();
        let out = run(&[
            &text[..e_pos + 1],
            &text[e_pos + 1..ja_pos + 2],
            &text[ja_pos + 2..],
        ])
        .await;
        for chunk in &out {
            assert!(std::str::from_utf8(chunk).is_ok());
        }
        assert_eq!(concat(&out), r#"{"name": "détail", "text": "日本"}"#);
    }

    #[tokio::test]
    async fn test_flushes_held_tail_at_end() {
        let out = run(&[br#"{"name": "oc_unterminated"#]).await;
        assert_eq!(concat(&out), r#"{"name": "oc_unterminated"#);
    }

    #[tokio::test]
    async fn test_invalid_utf8_replaced() {
        let out = run(&[b"ok\xff", br#" "name":"oc_x""#]).await;
        assert_eq!(concat(&out), "ok\u{FFFD} \"name\":\"x\"");
    }

    #[tokio::test]
    async fn test_upstream_error_terminates_stream() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"partial ")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"never seen")),
        ]);
        let results: Vec<_> = stream_strip_oc_prefix(input).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &Bytes::from_static(b"partial "));
        assert!(results[1].is_err());
    }
}

// Chunked JSON streaming utilities
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Create a chunked streaming response: one length-prefixed JSON document per item
pub fn chunked_json_stream<S, T>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let byte_stream = stream.then(move |msg| serialize_chunk(msg, compress));

    // Chunks are compressed individually, so no Content-Encoding header here
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson-chunked")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a chunk: 4-byte big-endian length, then payload
pub async fn serialize_chunk<T: Serialize>(msg: T, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&msg).map_err(std::io::Error::other)?;

    let payload = if compress {
        let mut encoder = BrotliEncoder::new(std::io::Cursor::new(json));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::BrotliDecoder;
    use serde_json::json;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_plain_chunk_is_length_prefixed() {
        let msg = json!({"status": "loading"});
        let chunk = serialize_chunk(msg.clone(), false).await.unwrap();

        let len = u32::from_be_bytes(chunk[..4].try_into().unwrap()) as usize;
        assert_eq!(len, chunk.len() - 4);
        let decoded: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[tokio::test]
    async fn test_compressed_chunk_decodes() {
        let msg = json!({"dataSets": [{"itemId": "hr", "values": [{"x": 1, "y": 70.0}]}]});
        let chunk = serialize_chunk(msg.clone(), true).await.unwrap();

        let len = u32::from_be_bytes(chunk[..4].try_into().unwrap()) as usize;
        assert_eq!(len, chunk.len() - 4);

        let mut decoder = BrotliDecoder::new(&chunk[4..]);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await.unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, msg);
    }

    #[tokio::test]
    async fn test_stream_accepts_items_that_are_not_sync() {
        // Cell is Send but not Sync
        let items = futures::stream::iter(vec![Cell::new(1u32), Cell::new(2u32)]);
        let response = chunked_json_stream(items, false).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"\x00\x00\x00\x011\x00\x00\x00\x012");
    }
}

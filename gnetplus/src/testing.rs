//! Test doubles for the channel layer

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::BytesMut;
use gnetplus_core::{DecodeResult, Frame, FrameCodec};
use gnetplus_transport::{Channel, Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio::time::Instant;

mockall::mock! {
    pub Link {}

    #[async_trait]
    impl Channel for Link {
        async fn open(&mut self) -> Result<()>;
        async fn close(&mut self) -> Result<()>;
        fn is_open(&self) -> bool;
        async fn write(&mut self, data: &[u8]) -> Result<usize>;
        async fn read(&mut self, max_bytes: usize, deadline: Instant) -> Result<BytesMut>;
        fn describe(&self) -> String;
    }
}

/// Mock whose reads replay `script` in order, then time out forever
pub fn scripted(script: Vec<Result<Vec<u8>>>) -> MockLink {
    let mut script: VecDeque<_> = script.into();
    let mut link = MockLink::new();

    link.expect_read().returning(move |_, _| match script.pop_front() {
        Some(step) => step.map(|bytes| BytesMut::from(&bytes[..])),
        None => Err(Error::ReadTimeout),
    });
    link.expect_is_open().return_const(true);
    link.expect_describe().return_const("mock".to_string());

    link
}

/// Encode a frame in the stock dialect
pub fn frame_bytes(address: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    FrameCodec::gnetplus()
        .encode(address, command, payload)
        .unwrap()
        .to_vec()
}

/// Simulated reader on the far end of a duplex pipe
///
/// Decodes each request and writes back whatever `respond` returns.
pub fn spawn_reader<F>(mut far: DuplexStream, mut respond: F) -> JoinHandle<()>
where
    F: FnMut(&Frame) -> Vec<u8> + Send + 'static,
{
    tokio::spawn(async move {
        let codec = FrameCodec::gnetplus();
        let mut pending = Vec::new();
        let mut chunk = [0u8; 256];

        loop {
            let n = match far.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            pending.extend_from_slice(&chunk[..n]);

            loop {
                match codec.decode(&pending) {
                    DecodeResult::Frame { frame, consumed } => {
                        pending.drain(..consumed);
                        let reply = respond(&frame);
                        if !reply.is_empty() && far.write_all(&reply).await.is_err() {
                            return;
                        }
                    }
                    DecodeResult::Corrupt { discard, .. } => {
                        pending.drain(..discard);
                    }
                    DecodeResult::Incomplete => break,
                }
            }
        }
    })
}

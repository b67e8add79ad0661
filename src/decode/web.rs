//! Browser decoding on the page's task queue.
//!
//! Each job runs as a `spawn_local` future: presets are fetched with
//! `gloo-net`, uploads are read through `Blob::arrayBuffer()`. Finished
//! outcomes land in a thread-local queue that the frame tick drains.

use std::cell::RefCell;
use std::sync::Arc;

use wasm_bindgen_futures::JsFuture;

use super::{DecodeBackend, DecodeInput, DecodeJob, DecodeOutcome, decode_bytes, finish};
use crate::error::{Result, ViewerError};
use crate::ingest::FileHandle;
use crate::panorama::ImageSource;

thread_local! {
    static FINISHED: RefCell<Vec<DecodeOutcome>> = const { RefCell::new(Vec::new()) };
}

/// Decode backend for wasm32.
#[derive(Debug, Default)]
pub struct LocalDecoder;

impl LocalDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DecodeBackend for LocalDecoder {
    fn submit(&mut self, job: DecodeJob) {
        log::debug!("Spawning decode task {}", job.ticket.value());
        wasm_bindgen_futures::spawn_local(async move {
            let result = match read(&job.input, &job.label).await {
                Ok(bytes) => decode_bytes(&job.label, bytes, job.max_dimension),
                Err(e) => Err(e),
            };
            let outcome = finish(job, result);
            FINISHED.with(|finished| finished.borrow_mut().push(outcome));
        });
    }

    fn poll(&mut self) -> Vec<DecodeOutcome> {
        FINISHED.with(|finished| std::mem::take(&mut *finished.borrow_mut()))
    }
}

async fn read(input: &DecodeInput, label: &str) -> Result<Arc<[u8]>> {
    match input {
        DecodeInput::Source(ImageSource::Embedded(bytes))
        | DecodeInput::File(FileHandle::Bytes(bytes)) => Ok(bytes.clone()),
        DecodeInput::Source(ImageSource::Path(url)) => fetch(url, label).await,
        DecodeInput::File(FileHandle::Web(file)) => {
            let buffer = JsFuture::from(file.array_buffer())
                .await
                .map_err(|e| ViewerError::decode(label, format!("{:?}", e)))?;
            Ok(Arc::from(js_sys::Uint8Array::new(&buffer).to_vec()))
        }
    }
}

async fn fetch(url: &str, label: &str) -> Result<Arc<[u8]>> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| ViewerError::decode(label, e))?;
    if !response.ok() {
        return Err(ViewerError::decode(
            label,
            format!("HTTP {} for {}", response.status(), url),
        ));
    }
    let bytes = response
        .binary()
        .await
        .map_err(|e| ViewerError::decode(label, e))?;
    Ok(Arc::from(bytes))
}

//! Shared fakes for uploader tests

use crate::uploader::chunk::ChunkStream;
use crate::uploader::error::UploadResult;
use crate::uploader::transport::{AuthProvider, TransportResponse, UploadTransport};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use streetview_api::api::PublishApi;
use streetview_api::error::{ApiError, ApiResult};
use streetview_api::models::publish::{
    CreatePhotoRequest, CreatePhotoSequenceRequest, InputType, Photo, PhotoId, PhotoSequence,
    UploadRef,
};

/// A recorded transport exchange, body fully drained
#[derive(Debug, Clone)]
pub(crate) struct RecordedExchange {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Transport fake that records exchanges and replays scripted responses.
/// When the script runs dry it answers 200 with no headers.
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    exchanges: Mutex<Vec<RecordedExchange>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, status: u16, headers: &[(&str, &str)]) {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(
                HeaderName::from_str(name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        self.responses.lock().unwrap().push_back(TransportResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: header_map,
        });
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.lock().unwrap().len()
    }

    pub fn exchange(&self, index: usize) -> RecordedExchange {
        self.exchanges.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl UploadTransport for FakeTransport {
    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Option<ChunkStream>,
    ) -> UploadResult<TransportResponse> {
        let body = match body {
            Some(mut stream) => {
                let mut data = Vec::new();
                while let Some(chunk) = stream.next().await {
                    data.extend_from_slice(&chunk?);
                }
                Some(data)
            }
            None => None,
        };

        self.exchanges.lock().unwrap().push(RecordedExchange {
            url: url.to_string(),
            headers,
            body,
        });

        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransportResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
            }))
    }
}

/// Auth fake: issues `test-token` until refreshed, `refreshed-token` after
pub(crate) struct FakeAuth {
    refreshes: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self {
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn current_token(&self) -> String {
        if self.refresh_count() > 0 {
            "refreshed-token".to_string()
        } else {
            "test-token".to_string()
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn bearer_token(&self) -> UploadResult<String> {
        Ok(self.current_token())
    }

    async fn refresh_token(&self) -> UploadResult<String> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(self.current_token())
    }
}

/// Publish-service fake for coordinator tests; also acts as the auth
/// provider the way the real client does
pub(crate) struct FakeService {
    pub photo_starts: AtomicUsize,
    pub sequence_starts: AtomicUsize,
    pub photo_requests: Mutex<Vec<CreatePhotoRequest>>,
    pub sequence_requests: Mutex<Vec<CreatePhotoSequenceRequest>>,
    pub fail_photo_start: bool,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            photo_starts: AtomicUsize::new(0),
            sequence_starts: AtomicUsize::new(0),
            photo_requests: Mutex::new(Vec::new()),
            sequence_requests: Mutex::new(Vec::new()),
            fail_photo_start: false,
        }
    }
}

#[async_trait]
impl PublishApi for FakeService {
    async fn start_photo_upload(&self) -> ApiResult<UploadRef> {
        if self.fail_photo_start {
            return Err(ApiError::Api {
                code: 403,
                status: "PERMISSION_DENIED".to_string(),
                message: "nope".to_string(),
            });
        }
        self.photo_starts.fetch_add(1, Ordering::SeqCst);
        Ok(UploadRef {
            upload_url: "https://upload.example/photo".to_string(),
        })
    }

    async fn start_photo_sequence_upload(&self) -> ApiResult<UploadRef> {
        self.sequence_starts.fetch_add(1, Ordering::SeqCst);
        Ok(UploadRef {
            upload_url: "https://upload.example/sequence".to_string(),
        })
    }

    async fn create_photo(&self, request: &CreatePhotoRequest) -> ApiResult<Photo> {
        self.photo_requests.lock().unwrap().push(request.clone());
        Ok(Photo {
            photo_id: PhotoId {
                id: "photo-1".to_string(),
            },
            share_link: None,
        })
    }

    async fn create_photo_sequence(
        &self,
        request: &CreatePhotoSequenceRequest,
        _input_type: InputType,
    ) -> ApiResult<PhotoSequence> {
        self.sequence_requests.lock().unwrap().push(request.clone());
        Ok(PhotoSequence {
            name: "photoSequences/seq-1".to_string(),
            done: false,
        })
    }
}

#[async_trait]
impl AuthProvider for FakeService {
    async fn bearer_token(&self) -> UploadResult<String> {
        Ok("test-token".to_string())
    }

    async fn refresh_token(&self) -> UploadResult<String> {
        Ok("refreshed-token".to_string())
    }
}

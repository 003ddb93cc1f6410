use crate::client::Client;
use crate::error::ApiResult;
use crate::models::publish::*;
use async_trait::async_trait;

/// Street View Publish API methods
#[async_trait]
pub trait PublishApi {
    /// Request an upload URL for a single photo
    async fn start_photo_upload(&self) -> ApiResult<UploadRef>;

    /// Request an upload URL for a photo sequence (video)
    async fn start_photo_sequence_upload(&self) -> ApiResult<UploadRef>;

    /// Create the photo metadata record after the bytes are uploaded
    async fn create_photo(&self, request: &CreatePhotoRequest) -> ApiResult<Photo>;

    /// Create the photo sequence record after the bytes are uploaded
    async fn create_photo_sequence(
        &self,
        request: &CreatePhotoSequenceRequest,
        input_type: InputType,
    ) -> ApiResult<PhotoSequence>;
}

#[async_trait]
impl PublishApi for Client {
    async fn start_photo_upload(&self) -> ApiResult<UploadRef> {
        self.post("/photo:startUpload", &serde_json::json!({})).await
    }

    async fn start_photo_sequence_upload(&self) -> ApiResult<UploadRef> {
        self.post("/photoSequence:startUpload", &serde_json::json!({}))
            .await
    }

    async fn create_photo(&self, request: &CreatePhotoRequest) -> ApiResult<Photo> {
        self.post("/photo", request).await
    }

    async fn create_photo_sequence(
        &self,
        request: &CreatePhotoSequenceRequest,
        input_type: InputType,
    ) -> ApiResult<PhotoSequence> {
        self.post(
            &format!("/photoSequence?inputType={}", input_type.as_str()),
            request,
        )
        .await
    }
}

use serde::{Deserialize, Serialize};

/// Opaque reference to a service-issued upload URL. The client stores and
/// replays it; the URL's structure is never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRef {
    pub upload_url: String,
}

/// A place to associate with an uploaded photo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub place_id: String,
}

/// Request body for photo creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoRequest {
    pub upload_reference: UploadRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places: Option<Place>,
}

/// Identifier of a created photo
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoId {
    pub id: String,
}

/// Photo resource as returned by the create call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub photo_id: PhotoId,
    #[serde(default)]
    pub share_link: Option<String>,
}

/// Request body for photo sequence creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotoSequenceRequest {
    pub upload_reference: UploadRef,
}

/// Photo sequence creation response (a long-running operation; only the
/// resource name is consumed here)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSequence {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Input type accepted by the photo sequence create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Video,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Video => "VIDEO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_photo_request_skips_missing_place() {
        let request = CreatePhotoRequest {
            upload_reference: UploadRef {
                upload_url: "https://upload.example/u1".to_string(),
            },
            places: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"uploadReference": {"uploadUrl": "https://upload.example/u1"}})
        );
    }

    #[test]
    fn create_photo_request_embeds_place_id() {
        let request = CreatePhotoRequest {
            upload_reference: UploadRef {
                upload_url: "https://upload.example/u1".to_string(),
            },
            places: Some(Place {
                place_id: "ChIJj61dQgK6j4AR4GeTYWZsKWw".to_string(),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["places"]["placeId"],
            "ChIJj61dQgK6j4AR4GeTYWZsKWw"
        );
    }

    #[test]
    fn photo_sequence_parses_operation_name() {
        let body = r#"{"name": "photoSequences/abc123", "done": false}"#;
        let sequence: PhotoSequence = serde_json::from_str(body).unwrap();
        assert_eq!(sequence.name, "photoSequences/abc123");
        assert!(!sequence.done);
    }
}

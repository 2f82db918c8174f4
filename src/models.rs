use serde::{Deserialize, Serialize};

/// fixed acknowledgment returned after every part of an upload finished
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded with success!";

/// name of the websocket event carrying upload progress
pub const PROGRESS_EVENT: &str = "file-uploaded";

/// name of the websocket event sent once a connection is registered
pub const CONNECTED_EVENT: &str = "connected";

// one row of the `GET /` listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub size: String,
    pub last_modified: String,
    pub owner: String,
    pub file: String,
}

// response for the upload endpoint
#[derive(Serialize, Deserialize, Debug)]
pub struct UploadResponse {
    pub result: String,
}

impl UploadResponse {
    pub fn success() -> Self {
        Self {
            result: UPLOAD_SUCCESS_MESSAGE.to_string(),
        }
    }
}

// generic error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// query string of `POST /?sessionId=<id>`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub session_id: Option<String>,
}

// progress of one file, as sent to the client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub processed_already: u64,
    pub filename: String,
}

// payload of the connected event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub session_id: String,
}

/// a named event frame on the realtime channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected(ConnectedPayload),
    #[serde(rename = "file-uploaded")]
    Progress(ProgressPayload),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => CONNECTED_EVENT,
            ServerEvent::Progress(_) => PROGRESS_EVENT,
        }
    }
}

// bytes written for one part of a finished upload
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PartSummary {
    pub filename: String,
    pub bytes: u64,
}

// result of a fully joined upload session
#[derive(Serialize, Debug, Clone, Default)]
pub struct UploadSummary {
    pub files: Vec<PartSummary>,
}

impl UploadSummary {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

//! Line protocol spoken on stdin/stdout
//!
//! Each input line is one JSON [`Command`], tagged by `"cmd"`. Each command
//! produces exactly one [`Response`] line.

use docsign_core::coords::SurfaceSize;
use docsign_core::SurfaceOrigin;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Notice;

/// Page geometry used to report placed boxes in PDF space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub surface: SurfaceSize,
    /// `[x, y, width, height]` of the page in PDF points
    pub media_box: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Login {
        username: String,
        password: String,
    },
    Logout,
    UploadDocument {
        name: String,
        #[serde(default)]
        mime: Option<String>,
    },
    /// Either raw PNG bytes (base64) or a reference to an already-stored image
    UploadSignature {
        #[serde(default)]
        png_base64: Option<String>,
        #[serde(default)]
        reference: Option<String>,
    },
    OpenSigner,
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        origin: SurfaceOrigin,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        origin: SurfaceOrigin,
    },
    PointerUp,
    PointerLeave,
    ToggleDrawing,
    Sign,
    Export,
    Reset,
    Frame {
        #[serde(default)]
        page: Option<PageGeometry>,
    },
    Step,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notices: Vec<Notice>,
}

impl Response {
    pub fn success(result: Value, notices: Vec<Notice>) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            notices,
        }
    }

    pub fn failure(error: impl ToString, notices: Vec<Notice>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.to_string()),
            notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_pointer_without_origin() {
        let cmd: Command = serde_json::from_str(r#"{"cmd":"pointer_down","x":5,"y":7}"#).unwrap();
        assert_eq!(
            cmd,
            Command::PointerDown {
                x: 5.0,
                y: 7.0,
                origin: SurfaceOrigin::default(),
            }
        );
    }

    #[test]
    fn test_parse_frame_with_page() {
        let cmd: Command = serde_json::from_value(json!({
            "cmd": "frame",
            "page": {
                "surface": {"width": 612.0, "height": 792.0},
                "media_box": [0.0, 0.0, 612.0, 792.0]
            }
        }))
        .unwrap();
        assert!(matches!(cmd, Command::Frame { page: Some(_) }));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"cmd":"shred"}"#).is_err());
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let line = serde_json::to_string(&Response::success(json!({"step": "sign_document"}), vec![]))
            .unwrap();
        assert_eq!(line, r#"{"ok":true,"result":{"step":"sign_document"},"notices":[]}"#);

        let line = serde_json::to_string(&Response::failure("Not logged in", vec![])).unwrap();
        assert_eq!(line, r#"{"ok":false,"error":"Not logged in","notices":[]}"#);
    }
}

//! Command dispatch and the JSON-lines loop
//!
//! IMPORTANT: stdout carries protocol responses only. All logging goes to
//! stderr.

use std::sync::Arc;

use base64::Engine;
use docsign_core::coords::{region_to_pdf_rect, PdfRect};
use docsign_core::{
    AssetError, AssetUploader, Authenticator, DocsignConfig, DocumentAsset, Point, SignatureAsset,
    SigningBackend, SimulatedSigningBackend, SimulatedUploader, StaticAuthenticator,
    UploadProgress, Workspace,
};
use serde_json::{json, Value};
use shared_types::Notice;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;

use crate::error::DriverError;
use crate::protocol::{Command, Response};

/// Holds the collaborators and, while someone is logged in, their workspace
pub struct Driver {
    config: DocsignConfig,
    authenticator: Arc<dyn Authenticator>,
    uploader: Arc<dyn AssetUploader>,
    backend: Arc<dyn SigningBackend>,
    workspace: Option<Workspace>,
    /// Notices raised outside a workspace (failed login, logout)
    pending: Vec<Notice>,
}

impl Driver {
    pub fn new(
        config: DocsignConfig,
        authenticator: Arc<dyn Authenticator>,
        uploader: Arc<dyn AssetUploader>,
        backend: Arc<dyn SigningBackend>,
    ) -> Self {
        Self {
            config,
            authenticator,
            uploader,
            backend,
            workspace: None,
            pending: Vec::new(),
        }
    }

    /// Simulated uploads and signing, credentials from the config
    pub fn from_config(config: DocsignConfig) -> Self {
        let authenticator = Arc::new(StaticAuthenticator::from_config(&config.auth));
        let uploader = Arc::new(SimulatedUploader::from_config(&config.upload));
        let backend = Arc::new(SimulatedSigningBackend::from_config(&config.signing));
        Self::new(config, authenticator, uploader, backend)
    }

    pub fn is_logged_in(&self) -> bool {
        self.workspace.is_some()
    }

    /// Parse and handle one input line; blank lines produce no response
    pub async fn handle_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Command>(line) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed command line");
                Response::failure(DriverError::InvalidCommand(e.to_string()), Vec::new())
            }
        };
        Some(response)
    }

    pub async fn handle(&mut self, command: Command) -> Response {
        let outcome = self.dispatch(command).await;

        let mut notices = std::mem::take(&mut self.pending);
        if let Some(ws) = self.workspace.as_mut() {
            notices.extend(ws.drain_notices());
        }

        match outcome {
            Ok(result) => Response::success(result, notices),
            Err(e) => {
                tracing::debug!(error = %e, "Command failed");
                Response::failure(e, notices)
            }
        }
    }

    fn workspace_mut(&mut self) -> Result<&mut Workspace, DriverError> {
        self.workspace.as_mut().ok_or(DriverError::NotLoggedIn)
    }

    async fn dispatch(&mut self, command: Command) -> Result<Value, DriverError> {
        match command {
            Command::Login { username, password } => self.login(&username, &password).await,
            Command::Logout => self.logout(),
            Command::Step => {
                let ws = self.workspace_mut()?;
                Ok(json!({ "step": ws.next_step() }))
            }
            Command::UploadDocument { name, mime } => {
                if !self.is_logged_in() {
                    return Err(DriverError::NotLoggedIn);
                }
                let document = match DocumentAsset::from_upload(&name, mime.as_deref()) {
                    Ok(document) => document,
                    Err(e) => {
                        if matches!(e, AssetError::UnsupportedDocumentType(_)) {
                            self.pending.push(Notice::critical(
                                "Invalid file type",
                                "Please upload a PDF or Word document",
                            ));
                        }
                        return Err(e.into());
                    }
                };
                let ws = self.workspace_mut()?;
                ws.upload_document(document, Some(progress_reporter("document")))
                    .await?;
                Ok(json!({ "document": ws.document(), "step": ws.next_step() }))
            }
            Command::UploadSignature {
                png_base64,
                reference,
            } => {
                if !self.is_logged_in() {
                    return Err(DriverError::NotLoggedIn);
                }
                let signature = match decode_signature(png_base64, reference) {
                    Ok(signature) => signature,
                    Err(e) => {
                        if matches!(
                            e,
                            DriverError::InvalidImageData(_)
                                | DriverError::Asset(AssetError::InvalidSignatureImage(_))
                        ) {
                            self.pending.push(Notice::critical(
                                "Invalid file type",
                                "Please upload a PNG image for your signature",
                            ));
                        }
                        return Err(e);
                    }
                };
                let ws = self.workspace_mut()?;
                ws.upload_signature(signature, Some(progress_reporter("signature")))
                    .await?;
                Ok(json!({ "step": ws.next_step() }))
            }
            Command::OpenSigner => {
                let ws = self.workspace_mut()?;
                let signer = ws.open_signer().await?;
                Ok(serde_json::to_value(signer.frame().await)?)
            }
            Command::PointerDown { x, y, origin } => {
                let ws = self.workspace_mut()?;
                let accepted = ws.start_gesture(Point::new(x, y), origin).await;
                Ok(json!({ "accepted": accepted }))
            }
            Command::PointerMove { x, y, origin } => {
                let ws = self.workspace_mut()?;
                let draft = ws.update_gesture(Point::new(x, y), origin).await;
                Ok(json!({ "draft": draft }))
            }
            Command::PointerUp | Command::PointerLeave => {
                let ws = self.workspace_mut()?;
                let placed = ws.end_gesture().await;
                Ok(json!({ "placed": placed }))
            }
            Command::ToggleDrawing => {
                let ws = self.workspace_mut()?;
                let drawing_mode = ws.toggle_drawing_mode().await?;
                Ok(json!({ "drawing_mode": drawing_mode }))
            }
            Command::Sign => {
                let ws = self.workspace_mut()?;
                let receipt = ws.request_sign().await?;
                Ok(serde_json::to_value(receipt)?)
            }
            Command::Export => {
                let ws = self.workspace_mut()?;
                let artifact = ws.request_export().await?;
                Ok(json!({
                    "file_name": artifact.file_name,
                    "media_type": artifact.media_type,
                    "data_url": artifact.data_url(),
                }))
            }
            Command::Reset => {
                let ws = self.workspace_mut()?;
                ws.reset_session().await?;
                Ok(json!({ "step": ws.next_step() }))
            }
            Command::Frame { page } => {
                let ws = self.workspace_mut()?;
                let Some(frame) = ws.frame().await else {
                    return Ok(json!({ "frame": null }));
                };

                let pdf_rects: Option<Vec<PdfRect>> = page.map(|page| {
                    frame
                        .regions
                        .iter()
                        .map(|view| region_to_pdf_rect(&view.region, page.surface, page.media_box))
                        .collect()
                });
                Ok(json!({ "frame": frame, "pdf_rects": pdf_rects }))
            }
        }
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<Value, DriverError> {
        if let Some(ws) = &self.workspace {
            return Err(DriverError::AlreadyLoggedIn(
                ws.auth_session().username.clone(),
            ));
        }

        let session = match self.authenticator.authenticate(username, password).await {
            Ok(session) => session,
            Err(e) => {
                self.pending
                    .push(Notice::critical("Authentication failed", &e.to_string()));
                return Err(e.into());
            }
        };

        let ws = Workspace::new(
            session,
            self.config.clone(),
            Arc::clone(&self.uploader),
            Arc::clone(&self.backend),
        );
        let result = json!({
            "username": ws.auth_session().username,
            "token": ws.auth_session().token,
            "step": ws.next_step(),
        });
        self.workspace = Some(ws);
        Ok(result)
    }

    fn logout(&mut self) -> Result<Value, DriverError> {
        let mut ws = self.workspace.take().ok_or(DriverError::NotLoggedIn)?;
        self.pending.extend(ws.drain_notices());

        let chain = ws.logout();
        Ok(json!({
            "events": chain.events.len(),
            "verified": chain.verify().is_ok(),
            "log": chain.summary(),
        }))
    }

    /// Close any open workspace at end of input
    pub fn shutdown(&mut self) {
        if let Some(ws) = self.workspace.take() {
            let chain = ws.logout();
            tracing::info!(events = chain.events.len(), "Workspace closed at end of input");
        }
    }
}

fn decode_signature(
    png_base64: Option<String>,
    reference: Option<String>,
) -> Result<SignatureAsset, DriverError> {
    match (png_base64, reference) {
        (Some(encoded), _) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| DriverError::InvalidImageData(e.to_string()))?;
            Ok(SignatureAsset::from_png(&bytes)?)
        }
        (None, Some(reference)) => Ok(SignatureAsset::from_reference(&reference)?),
        (None, None) => Err(DriverError::InvalidCommand(
            "upload_signature needs png_base64 or reference".to_string(),
        )),
    }
}

/// Log upload progress until the uploader drops its sender
fn progress_reporter(upload: &'static str) -> watch::Sender<UploadProgress> {
    let (tx, mut rx) = watch::channel(UploadProgress::default());
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let UploadProgress(percent) = *rx.borrow_and_update();
            tracing::debug!(upload, percent, "Upload progress");
        }
    });
    tx
}

/// Read commands from `reader` until EOF, writing one response line per command
pub async fn run<R, W>(driver: &mut Driver, reader: R, mut writer: W) -> Result<(), DriverError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let Some(response) = driver.handle_line(&line).await else {
            continue;
        };

        let mut body = serde_json::to_string(&response)?;
        body.push('\n');
        writer.write_all(body.as_bytes()).await?;
        writer.flush().await?;
    }

    tracing::info!("EOF reached, shutting down");
    driver.shutdown();
    Ok(())
}

pub async fn run_stdio(config: DocsignConfig) -> Result<(), DriverError> {
    tracing::info!("Starting stdio driver");
    let mut driver = Driver::from_config(config);
    run(
        &mut driver,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsign_core::config::AuthConfig;
    use pretty_assertions::assert_eq;

    fn driver() -> Driver {
        let mut config = DocsignConfig::default();
        config.auth = AuthConfig {
            username: Some("demo".to_string()),
            password: Some("demo-password".to_string()),
        };
        Driver::from_config(config)
    }

    async fn send(driver: &mut Driver, line: &str) -> Response {
        driver.handle_line(line).await.unwrap()
    }

    #[tokio::test]
    async fn test_commands_need_login() {
        let mut driver = driver();
        let response = send(&mut driver, r#"{"cmd":"step"}"#).await;
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("Not logged in"));
    }

    #[tokio::test]
    async fn test_failed_login_notifies() {
        let mut driver = driver();
        let response = send(
            &mut driver,
            r#"{"cmd":"login","username":"demo","password":"nope"}"#,
        )
        .await;
        assert!(!response.ok);
        assert_eq!(response.notices[0].title, "Authentication failed");
        assert!(!driver.is_logged_in());
    }

    #[tokio::test]
    async fn test_blank_and_malformed_lines() {
        let mut driver = driver();
        assert!(driver.handle_line("   ").await.is_none());

        let response = send(&mut driver, "{not json").await;
        assert!(!response.ok);
        assert!(response.error.unwrap().starts_with("Invalid command"));
    }

    #[tokio::test]
    async fn test_double_login_is_rejected() {
        let mut driver = driver();
        let login = r#"{"cmd":"login","username":"demo","password":"demo-password"}"#;
        assert!(send(&mut driver, login).await.ok);

        let response = send(&mut driver, login).await;
        assert_eq!(response.error.as_deref(), Some("Already logged in as demo"));
    }

    #[tokio::test]
    async fn test_signature_needs_a_source() {
        let mut driver = driver();
        send(
            &mut driver,
            r#"{"cmd":"login","username":"demo","password":"demo-password"}"#,
        )
        .await;

        let response = send(&mut driver, r#"{"cmd":"upload_signature"}"#).await;
        assert!(!response.ok);

        let response = send(
            &mut driver,
            r#"{"cmd":"upload_signature","png_base64":"%%%"}"#,
        )
        .await;
        assert!(response
            .error
            .unwrap()
            .contains("png_base64 is not valid base64"));
        assert_eq!(response.notices[0].title, "Invalid file type");
    }

    #[tokio::test]
    async fn test_invalid_file_types_notify() {
        let mut driver = driver();
        send(
            &mut driver,
            r#"{"cmd":"login","username":"demo","password":"demo-password"}"#,
        )
        .await;

        let response = send(
            &mut driver,
            r#"{"cmd":"upload_document","name":"photo.png","mime":"image/png"}"#,
        )
        .await;
        assert!(!response.ok);
        assert_eq!(
            response.error.as_deref(),
            Some("Unsupported document type: image/png")
        );
        assert_eq!(response.notices.len(), 1);
        assert_eq!(response.notices[0].title, "Invalid file type");
        assert_eq!(
            response.notices[0].description,
            "Please upload a PDF or Word document"
        );

        // a GIF header is valid base64 but not a PNG
        let response = send(
            &mut driver,
            r#"{"cmd":"upload_signature","png_base64":"R0lGODlh"}"#,
        )
        .await;
        assert!(!response.ok);
        assert_eq!(response.notices[0].title, "Invalid file type");
        assert_eq!(
            response.notices[0].description,
            "Please upload a PNG image for your signature"
        );

        let step = send(&mut driver, r#"{"cmd":"step"}"#).await;
        assert_eq!(step.result.unwrap()["step"], "upload_document");
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_returns_verified_log() {
        let mut driver = driver();
        send(
            &mut driver,
            r#"{"cmd":"login","username":"demo","password":"demo-password"}"#,
        )
        .await;
        send(
            &mut driver,
            r#"{"cmd":"upload_document","name":"contract.pdf"}"#,
        )
        .await;

        let response = send(&mut driver, r#"{"cmd":"logout"}"#).await;
        assert!(response.ok);
        let result = response.result.unwrap();
        assert_eq!(result["events"], 3);
        assert_eq!(result["verified"], true);
        assert!(!driver.is_logged_in());
    }
}

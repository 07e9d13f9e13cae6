/// Session engine: owns the state machine for the upload-and-analyze flow.
///
/// Exactly one analysis is in flight from the user's point of view. Each
/// request carries a monotonically increasing token; a response whose token
/// no longer matches the current `Analyzing` state belongs to a superseded
/// request (the user picked a newer file) and is dropped instead of
/// overwriting fresher state.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::types::AnalysisResponse;
use crate::config::OverlayConfig;
use crate::errors::LeafLensError;
use crate::overlay::mapper::{map_abnormalities_with_label_height, DisplayRect};
use crate::session::history::SessionHistory;
use crate::session::state::{SessionEvent, SessionState};
use crate::upload::ImageUpload;

pub struct SessionEngine {
    state: SessionState,
    event_rx: mpsc::Receiver<SessionEvent>,
    /// Cloned into spawned provider tasks so resolutions come back through
    /// the same channel as user events.
    event_tx: mpsc::Sender<SessionEvent>,
    notify_tx: broadcast::Sender<SessionState>,
    provider: Arc<dyn AnalysisProvider>,
    history: SessionHistory,
    /// Last issued request token. Strictly increasing within a session.
    next_token: u64,
    /// Latest accepted upload, shared with the in-flight provider task.
    upload: Option<Arc<ImageUpload>>,
    /// Latest container measurement; None until the first layout pass.
    container: Option<(f64, f64)>,
    label_height: f64,
}

impl SessionEngine {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        overlay: &OverlayConfig,
    ) -> (
        Self,
        mpsc::Sender<SessionEvent>,
        broadcast::Receiver<SessionState>,
    ) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (notify_tx, notify_rx) = broadcast::channel(32);
        let engine = Self {
            state: SessionState::Idle,
            event_rx,
            event_tx: event_tx.clone(),
            notify_tx,
            provider,
            history: SessionHistory::new(),
            next_token: 0,
            upload: None,
            container: None,
            label_height: overlay.label_height_px,
        };
        (engine, event_tx, notify_rx)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn upload(&self) -> Option<&ImageUpload> {
        self.upload.as_deref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.notify_tx.subscribe()
    }

    /// Process events until the channel closes or Shutdown arrives.
    pub async fn run_loop(&mut self) {
        while let Some(event) = self.event_rx.recv().await {
            if !self.handle(event).await {
                break;
            }
        }
        tracing::info!("session engine stopped");
    }

    /// Drive the loop until the session reaches Success or Failed. Used by
    /// embedders that submit one upload and read the outcome.
    pub async fn run_until_terminal(&mut self) -> SessionState {
        while !self.state.is_terminal() {
            let Some(event) = self.event_rx.recv().await else {
                break;
            };
            if !self.handle(event).await {
                break;
            }
        }
        self.state.clone()
    }

    /// Returns false when the engine should stop.
    async fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::FileSelected { file_name, bytes } => {
                self.on_file_selected(file_name, bytes).await;
            }
            SessionEvent::AnalysisResolved { token, response } => {
                self.on_resolved(token, response);
            }
            SessionEvent::AnalysisRejected { token, error } => {
                self.on_rejected(token, error);
            }
            SessionEvent::ContainerResized { width, height } => {
                tracing::debug!(width, height, "container measured");
                self.container = Some((width, height));
            }
            SessionEvent::Reset => {
                tracing::info!("session reset");
                self.upload = None;
                self.set_state(SessionState::Idle);
            }
            SessionEvent::Shutdown => return false,
        }
        true
    }

    async fn on_file_selected(&mut self, file_name: String, bytes: Vec<u8>) {
        self.set_state(SessionState::Uploading {
            file_name: file_name.clone(),
        });

        let upload = match ImageUpload::from_bytes(file_name.clone(), bytes) {
            Ok(upload) => Arc::new(upload),
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "upload rejected");
                self.fail(e);
                return;
            }
        };
        self.upload = Some(upload.clone());

        self.next_token += 1;
        let token = self.next_token;
        self.set_state(SessionState::Analyzing {
            token,
            file_name: file_name.clone(),
        });
        tracing::info!(file = %file_name, token, provider = self.provider.name(), "analysis started");

        let provider = self.provider.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match provider.analyze(&upload).await {
                Ok(response) => SessionEvent::AnalysisResolved {
                    token,
                    response: Box::new(response),
                },
                Err(error) => SessionEvent::AnalysisRejected { token, error },
            };
            if events.send(event).await.is_err() {
                tracing::debug!(token, "session gone before analysis finished");
            }
        });
    }

    fn on_resolved(&mut self, token: u64, response: Box<AnalysisResponse>) {
        if !self.is_current(token) {
            tracing::debug!(token, "stale analysis response dropped");
            return;
        }
        if let Some(upload) = &self.upload {
            self.history.record(upload.file_name(), &response);
        }
        tracing::info!(
            token,
            status = %response.plant_analysis.status,
            abnormalities = response.abnormalities().len(),
            "analysis complete"
        );
        self.set_state(SessionState::Success { token, response });
    }

    fn on_rejected(&mut self, token: u64, error: LeafLensError) {
        if !self.is_current(token) {
            tracing::debug!(token, error = %error, "stale analysis failure dropped");
            return;
        }
        tracing::warn!(token, error = %error, "analysis failed");
        self.fail(error);
    }

    fn is_current(&self, token: u64) -> bool {
        matches!(self.state, SessionState::Analyzing { token: current, .. } if current == token)
    }

    fn fail(&mut self, error: LeafLensError) {
        self.set_state(SessionState::Failed {
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        // No subscribers is fine; the state is also readable via state().
        let _ = self.notify_tx.send(self.state.clone());
    }

    /// Overlay boxes for the current result under the latest container
    /// measurement. Recomputed on every call, never cached across resizes.
    pub fn overlay_rects(&self) -> Vec<DisplayRect> {
        let (SessionState::Success { response, .. }, Some((width, height))) =
            (&self.state, self.container)
        else {
            return Vec::new();
        };
        map_abnormalities_with_label_height(response, width, height, self.label_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::providers::mock::MockAnalysisProvider;
    use crate::analysis::types::{Abnormality, HealthStatus, PlantAnalysis, SourceRect};
    use crate::config::MockConfig;
    use crate::errors::ErrorKind;

    fn engine() -> (
        SessionEngine,
        mpsc::Sender<SessionEvent>,
        broadcast::Receiver<SessionState>,
    ) {
        let provider = Arc::new(MockAnalysisProvider::new(MockConfig {
            delay_ms: 0,
            healthy_bias: 0.0,
        }));
        SessionEngine::new(provider, &OverlayConfig::default())
    }

    fn png_bytes(seed: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(40, 30, image::Rgba([seed, 100, 50, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn unhealthy_response() -> Box<AnalysisResponse> {
        Box::new(AnalysisResponse {
            plant_analysis: PlantAnalysis {
                status: HealthStatus::Unhealthy,
                details: "Dark spots on leaves, potential early blight.".into(),
                recommendations: Some("Remove affected leaves.".into()),
                abnormalities: vec![Abnormality {
                    kind: "Early Blight".into(),
                    description: "lesion".into(),
                    coordinates: SourceRect {
                        x: 75.0,
                        y: 110.0,
                        width: 40.0,
                        height: 35.0,
                    },
                    confidence_score_abnormality: 0.9,
                }],
                ..Default::default()
            },
            confidence_score: 0.85,
            processing_time_ms: 250,
            image_width: 400,
            image_height: 300,
        })
    }

    #[tokio::test]
    async fn test_end_to_end_mock_analysis() {
        let (mut engine, events, _states) = engine();
        events
            .send(SessionEvent::FileSelected {
                file_name: "leaf.png".into(),
                bytes: png_bytes(1),
            })
            .await
            .unwrap();

        let state = engine.run_until_terminal().await;
        assert!(matches!(state, SessionState::Success { token: 1, .. }));
        assert_eq!(engine.history().len(), 1);
        assert!(engine.upload().is_some());
    }

    #[tokio::test]
    async fn test_unsupported_file_fails_before_any_request() {
        let (mut engine, _events, _states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "notes.txt".into(),
                bytes: b"plain text".to_vec(),
            })
            .await;

        let SessionState::Failed { kind, .. } = engine.state() else {
            panic!("expected Failed, got {:?}", engine.state());
        };
        assert_eq!(*kind, ErrorKind::UnsupportedFileType);
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (mut engine, _events, _states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "first.png".into(),
                bytes: png_bytes(1),
            })
            .await;
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "second.png".into(),
                bytes: png_bytes(2),
            })
            .await;
        assert!(matches!(
            engine.state(),
            SessionState::Analyzing { token: 2, .. }
        ));

        // The first request resolving late must not overwrite the newer one.
        engine
            .handle(SessionEvent::AnalysisResolved {
                token: 1,
                response: unhealthy_response(),
            })
            .await;
        assert!(matches!(
            engine.state(),
            SessionState::Analyzing { token: 2, .. }
        ));
        assert!(engine.history().is_empty());

        engine
            .handle(SessionEvent::AnalysisResolved {
                token: 2,
                response: unhealthy_response(),
            })
            .await;
        assert!(matches!(
            engine.state(),
            SessionState::Success { token: 2, .. }
        ));
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let (mut engine, _events, _states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "first.png".into(),
                bytes: png_bytes(1),
            })
            .await;
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "second.png".into(),
                bytes: png_bytes(2),
            })
            .await;
        engine
            .handle(SessionEvent::AnalysisRejected {
                token: 1,
                error: LeafLensError::Provider("old request blew up".into()),
            })
            .await;
        assert!(matches!(
            engine.state(),
            SessionState::Analyzing { token: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let (mut engine, _events, _states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "notes.txt".into(),
                bytes: b"nope".to_vec(),
            })
            .await;
        assert!(matches!(engine.state(), SessionState::Failed { .. }));

        engine.handle(SessionEvent::Reset).await;
        assert!(matches!(engine.state(), SessionState::Idle));
        assert!(engine.upload().is_none());
    }

    #[tokio::test]
    async fn test_overlay_rects_need_container_measurement() {
        let (mut engine, _events, _states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "leaf.png".into(),
                bytes: png_bytes(1),
            })
            .await;
        engine
            .handle(SessionEvent::AnalysisResolved {
                token: 1,
                response: unhealthy_response(),
            })
            .await;

        // Success without a measured container: fail closed, no boxes.
        assert!(engine.overlay_rects().is_empty());

        engine
            .handle(SessionEvent::ContainerResized {
                width: 800.0,
                height: 600.0,
            })
            .await;
        let rects = engine.overlay_rects();
        assert_eq!(rects.len(), 1);
        assert!((rects[0].left - 150.0).abs() < 1e-9);
        assert!((rects[0].top - 220.0).abs() < 1e-9);

        // A later measurement wins; rects are recomputed, not cached.
        engine
            .handle(SessionEvent::ContainerResized {
                width: 800.0,
                height: 800.0,
            })
            .await;
        let rects = engine.overlay_rects();
        assert!((rects[0].top - 320.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_state_changes_are_broadcast() {
        let (mut engine, _events, mut states) = engine();
        engine
            .handle(SessionEvent::FileSelected {
                file_name: "leaf.png".into(),
                bytes: png_bytes(1),
            })
            .await;

        let first = states.recv().await.unwrap();
        assert!(matches!(first, SessionState::Uploading { .. }));
        let second = states.recv().await.unwrap();
        assert!(matches!(second, SessionState::Analyzing { token: 1, .. }));
    }
}

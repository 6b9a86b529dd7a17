//! Verification and certificate generation
//!
//! [`CertificateService::verify_and_generate_certificate`] is the request
//! boundary: every error raised below it is logged and folded into a
//! [`CertificateResponse`] here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::{AssetStore, CertificateAssets, RosterCache};
use crate::errors::{CertificateError, CertificateResult, RenderError};
use crate::layout::{CertificateLayout, plan_layout};
use crate::models::{CertificateResponse, RosterRecord, VerificationInput};
use crate::rendering::RenderBackend;

pub struct CertificateService {
    roster: Arc<RosterCache>,
    renderer: Arc<dyn RenderBackend>,
    assets: AssetStore,
    layout: CertificateLayout,
}

impl CertificateService {
    pub fn new(
        roster: Arc<RosterCache>,
        renderer: Arc<dyn RenderBackend>,
        assets: AssetStore,
        layout: CertificateLayout,
    ) -> Self {
        Self {
            roster,
            renderer,
            assets,
            layout,
        }
    }

    pub fn roster(&self) -> &Arc<RosterCache> {
        &self.roster
    }

    pub fn layout(&self) -> &CertificateLayout {
        &self.layout
    }

    /// Find the roster record for a claimed (participant, team) pair
    ///
    /// Input is validated before the roster is touched.
    pub async fn verify(&self, input: &VerificationInput) -> CertificateResult<RosterRecord> {
        input.validate()?;

        let snapshot = self.roster.get().await?;
        snapshot
            .find(&input.participant_name, &input.team_name)
            .cloned()
            .ok_or(CertificateError::NotFound)
    }

    /// Render the certificate document for a verified record
    pub async fn generate(&self, record: &RosterRecord) -> CertificateResult<Vec<u8>> {
        let assets = self.assets.load().await?;
        let renderer = Arc::clone(&self.renderer);
        let layout = self.layout.clone();
        let record = record.clone();

        let document = tokio::task::spawn_blocking(move || {
            render_certificate(renderer.as_ref(), &layout, &record, &assets)
        })
        .await
        .map_err(|e| RenderError::TaskFailed {
            message: e.to_string(),
        })??;

        Ok(document)
    }

    /// Verify the input and, on a match, return the base64 certificate
    ///
    /// Never fails; every error becomes a `success: false` response.
    pub async fn verify_and_generate_certificate(
        &self,
        input: VerificationInput,
    ) -> CertificateResponse {
        let started = Instant::now();

        match self.verify_and_generate(&input).await {
            Ok(document) => {
                info!(
                    bytes = document.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Certificate generated"
                );
                CertificateResponse::success(STANDARD.encode(document))
            }
            Err(e) if e.is_rejection() => {
                info!("Certificate request rejected: {}", e);
                CertificateResponse::from(&e)
            }
            Err(e) => {
                error!("Certificate generation failed: {}", e);
                CertificateResponse::from(&e)
            }
        }
    }

    async fn verify_and_generate(&self, input: &VerificationInput) -> CertificateResult<Vec<u8>> {
        let record = self.verify(input).await?;
        debug!(
            participant = %record.participant_name,
            team = %record.team_name,
            "Roster match found"
        );
        self.generate(&record).await
    }
}

/// Lay out and draw every element of `layout` for `record`
///
/// Blocking; runs on the blocking pool when called from
/// [`CertificateService::generate`].
pub fn render_certificate(
    renderer: &dyn RenderBackend,
    layout: &CertificateLayout,
    record: &RosterRecord,
    assets: &CertificateAssets,
) -> CertificateResult<Vec<u8>> {
    let mut canvas = renderer.open(&assets.template, &assets.font)?;
    let placed = plan_layout(layout, record, canvas.as_ref())?;

    for text in &placed {
        canvas.draw_text(&text.text, text.x, text.y, text.font_size as f32, text.color)?;
    }

    Ok(canvas.finish()?)
}

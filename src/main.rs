use leaflens::analysis::registry::ProviderRegistry;
use leaflens::errors::LeafLensResult;
use leaflens::overlay::annotator;
use leaflens::report;
use leaflens::session::engine::SessionEngine;
use leaflens::session::state::{SessionEvent, SessionState};

#[tokio::main]
async fn main() -> LeafLensResult<()> {
    leaflens::init_tracing();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let mut args = std::env::args().skip(1);
    let Some(image_path) = args.next() else {
        eprintln!("usage: leaflens <plant-photo.jpg|.png> [overlay-out.png]");
        std::process::exit(2);
    };
    let overlay_out = args.next();

    let config = leaflens::load_config_or_default();
    let registry = ProviderRegistry::from_config(&config);
    let provider = registry.get_active()?;
    tracing::info!(provider = provider.name(), "analysis provider selected");

    let (mut engine, events, _states) = SessionEngine::new(provider, &config.overlay);

    let bytes = tokio::fs::read(&image_path).await?;
    events
        .send(SessionEvent::ContainerResized {
            width: config.display.container_width,
            height: config.display.container_height,
        })
        .await
        .ok();
    events
        .send(SessionEvent::FileSelected {
            file_name: image_path.clone(),
            bytes,
        })
        .await
        .ok();

    match engine.run_until_terminal().await {
        SessionState::Success { response, .. } => {
            println!("{}", report::render_report(&response));

            let rects = engine.overlay_rects();
            if !rects.is_empty() {
                tracing::debug!(boxes = rects.len(), "abnormality overlay mapped");
            }

            if let (Some(out), Some(upload)) = (overlay_out, engine.upload()) {
                match annotator::render_overlay(
                    upload,
                    &response,
                    config.display.container_width as u32,
                    config.display.container_height as u32,
                    config.overlay.label_height_px,
                )? {
                    Some(png) => {
                        tokio::fs::write(&out, png).await?;
                        println!("\nOverlay written to {out}");
                    }
                    None => {
                        tracing::warn!("overlay skipped: payload carried no image dimensions");
                    }
                }
            }
        }
        SessionState::Failed { kind, message } => {
            eprintln!("Analysis failed ({kind:?}): {message}");
            eprintln!("Try again with a JPG or PNG photo of your plant.");
            std::process::exit(1);
        }
        other => {
            tracing::warn!(state = ?other, "session ended without a result");
        }
    }

    Ok(())
}

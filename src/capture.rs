use std::time::Duration;
use tracing::{debug, info};

use crate::errors::CaptureError;
use crate::navigator::ViewerNavigator;
use crate::output::{Progress, ensure_directory, resolve_output_directory, save_frame};
use crate::types::{CaptureState, CaptureTarget, SessionOutcome};
use crate::wait::WaitPolicy;

/// Drives a navigator from the first frame to the last, writing each frame
/// as `{prefix}{index:03}{ext}` into the target directory.
pub struct CaptureSession<'a> {
    wait: &'a dyn WaitPolicy,
    step_delay: Duration,
}

impl<'a> CaptureSession<'a> {
    pub fn new(wait: &'a dyn WaitPolicy, step_delay: Duration) -> Self {
        Self { wait, step_delay }
    }

    /// Capture a whole book.
    ///
    /// Returns `Aborted` without touching the filesystem when the page count
    /// cannot be discovered. Only a directory that cannot be created is
    /// returned as an error that should end the process.
    pub async fn run(
        &self,
        target: &CaptureTarget,
        navigator: &mut dyn ViewerNavigator,
    ) -> Result<SessionOutcome, CaptureError> {
        let directory = resolve_output_directory(&target.output_directory.to_string_lossy());

        navigator.prepare().await?;
        let side = navigator.resolve_binding_side().await?;
        debug!("Binding side resolved to {:?}", side);
        navigator.rewind().await?;

        let Some(count) = navigator.discover_page_count().await? else {
            return Ok(SessionOutcome::Aborted("page count unavailable".to_string()));
        };
        info!(
            "{} declared pages, {} frames to capture",
            count.total, count.display
        );

        ensure_directory(&directory)?;
        let trimmer = navigator.trimmer();
        let progress = Progress::new(count.display);
        let mut state = CaptureState::new(count.display);
        let mut saved = 0;

        while !state.is_complete() {
            let index = state.current_index;
            progress.update(index + 1);

            if navigator.is_terminal().await? {
                println!();
                println!("Last page.");
                return Ok(SessionOutcome::Success {
                    directory,
                    saved,
                    stopped_early: true,
                });
            }

            match navigator.capture(index).await {
                Ok(frame) => {
                    navigator.advance().await?;
                    let frame = match trimmer {
                        Some(trimmer) => trimmer.trim(&frame),
                        None => frame,
                    };
                    let path = directory.join(target.frame_name(index));
                    save_frame(frame, &path, target.image_format)?;
                    saved += 1;
                }
                Err(e @ CaptureError::FrameFetchFailed { .. }) => {
                    println!();
                    println!("{}", e);
                    navigator.advance().await?;
                }
                Err(e) => return Err(e),
            }

            self.wait.pause(self.step_delay).await;
            state.current_index += 1;
        }

        progress.finish();
        Ok(SessionOutcome::Success {
            directory,
            saved,
            stopped_early: false,
        })
    }
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;

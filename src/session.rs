//! Caller-owned session state for one interaction loop

use crate::client::GrokClient;
use crate::error::{Error, Result};
use crate::upload::ImageUpload;

/// State carried across one user's interaction: the last uploaded image and
/// the last analysis text. Both slots are overwritten, never cleared, and
/// belong to whoever drives the loop.
#[derive(Default)]
pub struct Session {
    uploaded: Option<ImageUpload>,
    last_result: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new upload. A stale result stays in place until the next
    /// analysis overwrites it.
    pub fn upload(&mut self, image: ImageUpload) {
        self.uploaded = Some(image);
    }

    pub fn uploaded(&self) -> Option<&ImageUpload> {
        self.uploaded.as_ref()
    }

    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    /// Analyze the current upload and store the returned text. Fails before
    /// any network activity when nothing has been uploaded; a failed request
    /// leaves the previous result in place.
    pub async fn analyze(&mut self, client: &GrokClient) -> Result<String> {
        let image = self.uploaded.as_ref().ok_or(Error::NoImage)?;
        let result = client.analyze_image(image, None).await?;
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Ask for the five-year-old explanation of the stored result. Fails
    /// before any network activity when no analysis has run yet. The
    /// simplified text is returned for display, not stored.
    pub async fn simplify(&self, client: &GrokClient) -> Result<String> {
        let result = self.last_result.as_deref().ok_or(Error::NoResult)?;
        client.simplify(result).await
    }
}

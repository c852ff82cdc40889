//! One editing session over a project's images.
//!
//! The session owns an [`Editor`] for the current image and writes it back
//! through [`Persistence`] before moving to another image.

use super::editor::Editor;
use crate::config::ViewConfig;
use crate::error::ResourceError;
use crate::persistence::{ImageId, ImageMeta, Persistence};
use rand::Rng;

pub struct AnnotationSession<P> {
    persistence: P,
    project_id: String,
    images: Vec<ImageMeta>,
    current_index: usize,
    view_config: ViewConfig,
    editor: Editor,
}

impl<P: Persistence> AnnotationSession<P> {
    /// List the project's images and load the first one. An empty project
    /// yields a session with no current image.
    pub async fn open(
        persistence: P,
        project_id: &str,
        view_config: ViewConfig,
    ) -> Result<Self, ResourceError> {
        let images = persistence.list_project_images(project_id).await?;
        let mut session = Self {
            persistence,
            project_id: project_id.to_string(),
            images,
            current_index: 0,
            editor: Editor::default().with_view_config(&view_config),
            view_config,
        };
        if !session.images.is_empty() {
            session.load(0).await?;
        }
        Ok(session)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn images(&self) -> &[ImageMeta] {
        &self.images
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_image(&self) -> Option<&ImageMeta> {
        self.images.get(self.current_index)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Save the current image's annotations.
    pub async fn flush(&self) -> Result<(), ResourceError> {
        let Some(image) = self.current_image() else {
            return Ok(());
        };
        self.persistence
            .save_annotations(image.id, self.editor.annotations())
            .await?;
        log::debug!(
            "Saved {} annotations for image {}",
            self.editor.annotations().len(),
            image.id
        );
        Ok(())
    }

    async fn load(&mut self, index: usize) -> Result<(), ResourceError> {
        let image_id: ImageId = self.images[index].id;
        let annotations = self.persistence.load_annotations(image_id).await?;
        log::info!(
            "Loaded image {}/{} ({} annotations)",
            index + 1,
            self.images.len(),
            annotations.len()
        );
        self.current_index = index;
        self.editor = Editor::new(annotations).with_view_config(&self.view_config);
        Ok(())
    }

    /// Flush, then load the image at `index`. Out-of-range indices are
    /// clamped to the last image. Returns the index now current.
    pub async fn goto(&mut self, index: usize) -> Result<usize, ResourceError> {
        if self.images.is_empty() {
            return Ok(0);
        }
        let index = index.min(self.images.len() - 1);
        self.flush().await?;
        self.load(index).await?;
        Ok(index)
    }

    pub async fn next(&mut self) -> Result<usize, ResourceError> {
        self.goto(self.current_index + 1).await
    }

    pub async fn prev(&mut self) -> Result<usize, ResourceError> {
        self.goto(self.current_index.saturating_sub(1)).await
    }

    pub async fn first(&mut self) -> Result<usize, ResourceError> {
        self.goto(0).await
    }

    pub async fn last(&mut self) -> Result<usize, ResourceError> {
        self.goto(self.images.len().saturating_sub(1)).await
    }

    /// Jump to a uniformly chosen image.
    pub async fn random_with<R: Rng>(&mut self, rng: &mut R) -> Result<usize, ResourceError> {
        if self.images.is_empty() {
            return Ok(0);
        }
        let idx = rng.gen_range(0..self.images.len());
        self.goto(idx).await
    }

    pub async fn random(&mut self) -> Result<usize, ResourceError> {
        let mut rng = rand::thread_rng();
        self.random_with(&mut rng).await
    }

    /// Flush and hand back the persistence layer.
    pub async fn close(self) -> Result<P, ResourceError> {
        self.flush().await?;
        Ok(self.persistence)
    }
}

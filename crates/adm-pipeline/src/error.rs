//! Pipeline-level error taxonomy (spec §7): wraps the lower-layer
//! `AdmModelError`/`RenderError` and adds the pipeline's own overload
//! detection.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] adm_model::AdmModelError),

    #[error(transparent)]
    Render(#[from] adm_render::RenderError),

    #[error("layout error: {0}")]
    Layout(#[from] adm_model::LayoutError),

    #[error(transparent)]
    Io(#[from] adm_io::IoError),

    #[error("sample peak {peak:.3} exceeds full scale after rendering block at sample {sample}")]
    Overload { sample: u64, peak: f64 },

    #[error("no programme found in the ADM document")]
    NoProgramme,
}

pub type PipelineResult<T> = Result<T, PipelineError>;

//! Error type for one step of the controller loop.
//!
//! Backend, display and input variants are recoverable from the loop's point of
//! view: the step is abandoned, the error goes to the failure log and the next
//! key is read.  `Layout` and `NoSpeakers` only occur at startup.

use thiserror::Error;

use crate::backend::BackendError;
use crate::display::DisplayError;
use crate::keys::InputError;
use crate::render::LayoutError;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("display: {0}")]
    Display(#[from] DisplayError),

    #[error("input: {0}")]
    Input(#[from] InputError),

    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("the backend reports no speakers")]
    NoSpeakers,
}

pub type UiResult<T> = Result<T, UiError>;

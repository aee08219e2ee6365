//! Captive landing page and administration interface.

mod controller;
pub mod pages;
pub mod routes;

pub use controller::{
    AdminController,
    PAGE_SIZE,
    PortalContext,
    SubmissionError,
    SubmissionErrorKind,
    parse_submission,
};

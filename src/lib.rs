//! Bounding-box labelling of pre-rendered video frames.
//!
//! The library holds everything that does not need a window: the per-frame
//! [`store::AnnotationStore`], the drag gesture in [`interaction`], frame
//! sources and background loading. [`app::LabelerApp`] ties them to egui.

pub mod annotation;
pub mod app;
pub mod config;
pub mod fetch;
pub mod interaction;
pub mod overlay;
pub mod session;
pub mod source;
pub mod storage;
pub mod store;

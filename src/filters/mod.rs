//! Stencil and element-wise stages of the edge pipeline.
//!
//! Every stage ships in two forms with the same signature shape:
//!
//! | Stage | Optimized | Reference |
//! |-------|-----------|-----------|
//! | Padding | [`core::pad`] | [`core::pad_reference`] |
//! | Smoothing | [`blur::smooth`] | [`blur::smooth_reference`] |
//! | Gradient | [`gradient::gradient`] | [`gradient::gradient_reference`] |
//! | Suppression | [`suppression::suppress`] | [`suppression::suppress_reference`] |
//! | Classification | [`threshold::classify`] | [`threshold::classify_reference`] |
//!
//! ## Architecture
//!
//! - **Zero padding** - samples outside a field read as 0 in every stage
//! - **Row parallel** - optimized stages hand each output row to one rayon task
//! - **Lane batches** - within a row, [`lanes::LANES`] samples are processed
//!   together and the remainder falls back to the scalar formula
//! - **Any size** - no stage requires power-of-two or lane-aligned dimensions

pub mod lanes;
pub mod core;
pub mod blur;
pub mod gradient;
pub mod suppression;
pub mod threshold;

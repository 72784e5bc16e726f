#![forbid(unsafe_code)]

//! Core: swipe-to-commit interaction engine for list rows.
//!
//! # Role
//! `swipe-core` turns a per-row stream of pointer samples into a bounded
//! horizontal offset, decides at release whether the gesture commits to a
//! destructive action, animates the settle with spring physics, and fires the
//! row's commit callback at most once.
//!
//! # Primary responsibilities
//! - **GestureTracker**: clamps live offsets to `[min_offset, 0]`.
//! - **CommitPolicy**: pure distance/fling verdict at release.
//! - **SettleAnimator**: spring-driven settle with cancellable handles.
//! - **RowController**: the per-row state machine and commit guard.
//! - **RowRegistry**: controllers keyed by row identity.
//!
//! # How it fits
//! The host's input layer feeds [`controller::RowController`] events, its
//! frame clock calls `tick`, and its renderer reads [`state::RowSnapshot`]
//! values. Nothing here renders, hit-tests, or performs I/O.

pub mod animation;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod observable;
pub mod policy;
pub mod registry;
pub mod sample;
pub mod state;
pub mod tracker;

pub use animation::{SettleHandle, SettleStatus};
pub use config::{SpringParams, SwipeConfig};
pub use controller::{CommitCallback, EventOutcome, IgnoreReason, RowController};
pub use error::{ConfigError, Result, SwipeError};
pub use observable::{Observable, Subscription, Versioned};
pub use policy::{CommitPolicy, Verdict};
pub use registry::RowRegistry;
pub use sample::GestureSample;
pub use state::{Phase, RowInteractionState, RowSnapshot};

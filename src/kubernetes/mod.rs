// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client utilities shared by the installer stages.

pub mod poll;

pub use poll::{poll_until, retry_on_conflict};

use crate::constants::OPERATOR_NAME;
use kube::api::PostParams;

/// Write parameters identifying olmctl as the field manager
pub fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

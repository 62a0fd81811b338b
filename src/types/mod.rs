// SPDX-License-Identifier: Apache-2.0

//! Request types and OLM resource definitions.

pub mod install_mode;
pub mod olm;

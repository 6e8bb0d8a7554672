// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-kind ensure/delete/info primitives over the OpenStack client.
//!
//! Every function here follows the ensure pattern: a finder call first,
//! returning the existing entity when present, creating it otherwise. The
//! same CR applied twice therefore produces the same remote state exactly
//! once. Teardown helpers log and continue on individual failures so that
//! the rest of a deletion can proceed.
//!
//! Registry bookkeeping is the reconcilers' job; these modules only talk to
//! OpenStack.

pub mod domain;
pub mod federation;
pub mod flavor;
pub mod image;
pub mod network;
pub mod project;
pub mod provider_network;
pub mod quota;
pub mod role_binding;
pub mod security_group;

// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! liftsync: workout session sync core.
//!
//! Backend changes arrive as [`ops::Modification`]s and are applied atomically to a
//! [`model::SessionTree`] whose nodes carry client-stable handles from the
//! [`identity::IdentityMap`]. The [`coordinator::SessionCoordinator`] serializes mutations,
//! keeps focus consistent and fronts the suggestion engine with a fingerprinted
//! [`cache::SuggestionCache`].

pub mod cache;
pub mod collab;
pub mod coordinator;
pub mod focus;
pub mod identity;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod store;

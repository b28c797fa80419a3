// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! Exposes the coordinator's client operations as tools. Handles travel as `ex-<n>` and
//! `set-<n>` strings.

mod server;
mod types;

pub use server::LiftsyncMcp;

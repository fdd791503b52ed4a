// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over a [`Database`](crate::Database).

pub mod history;
pub mod queue;

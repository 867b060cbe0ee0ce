// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for replaying mixed legitimate and spam traffic through the
//! submission gate.

pub mod generators;
pub mod metrics;
pub mod traffic;

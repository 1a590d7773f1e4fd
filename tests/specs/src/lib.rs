// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario tests exercising the testable properties of spec §8 against
//! the `tramuntana` crate's public API. See `tests/scenarios.rs`.

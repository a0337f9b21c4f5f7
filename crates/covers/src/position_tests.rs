// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use yare::parameterized;

use super::*;

#[parameterized(
    mid_line = { Position::new(4, 9), Position::new(4, 8) },
    second_column = { Position::new(4, 2), Position::new(4, 1) },
    first_column = { Position::new(4, 1), Position::new(3, u32::MAX) },
)]
fn predecessor_steps_back_one_column(pos: Position, expected: Position) {
    assert_eq!(pos.predecessor(), expected);
    assert!(pos.predecessor() < pos);
}

#[test]
fn positions_order_by_line_then_column() {
    assert!(Position::new(1, 80) < Position::new(2, 1));
    assert!(Position::new(2, 1) < Position::new(2, 5));
}

#[test]
fn location_displays_as_file_line_column() {
    let loc = Location::new("src/lib.rs", 12, 5);
    assert_eq!(loc.to_string(), "src/lib.rs:12:5");
    assert_eq!(loc.line(), 12);
    assert_eq!(loc.column(), 5);
}

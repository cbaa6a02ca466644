// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared status-line printing for CLI commands.

use crate::color;

/// `  ok  <name>  <detail>` / ` fail  <name>  <detail>`
pub fn status_line(ok: bool, name: &str, detail: &str) {
    let tag = if ok { color::ok("  ok ") } else { color::err(" fail") };
    println!("{tag}  {name:<12} {detail}");
}

/// Trailing `N passed, M failed` summary; returns overall success.
pub fn summary(passed: usize, failed: usize) -> bool {
    if failed == 0 {
        println!("\n{}", color::ok(&format!("{passed} check(s) passed")));
        true
    } else {
        println!(
            "\n{}",
            color::err(&format!("{passed} passed, {failed} failed"))
        );
        false
    }
}

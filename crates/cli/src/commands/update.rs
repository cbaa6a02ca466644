// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ap update` — report whether a newer agent release exists.

use std::path::Path;

use ap_core::SystemClock;

use crate::color;
use crate::exit_error::ExitError;

pub async fn run(home: &Path) -> Result<(), ExitError> {
    let (_config, client) = super::client_for(home)?;

    let check = ap_agent::update::check(
        &client,
        home,
        env!("CARGO_PKG_VERSION"),
        &SystemClock,
    )
    .await?;

    let source = if check.from_cache { " (cached)" } else { "" };
    if check.update_available {
        println!(
            "{} update available: {} -> {}{source}",
            color::warn("!!"),
            check.current,
            check.latest
        );
    } else {
        println!("{} agent is current ({}){source}", color::ok("ok"), check.current);
    }
    Ok(())
}

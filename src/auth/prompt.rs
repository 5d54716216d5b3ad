//! Interactive prompt for the device flow.
//!
//! Shows the one-time user code and verification URL, then waits for Enter
//! or cooperative cancellation, whichever comes first. The prompt runs as a
//! sibling of the polling engine and must never crash it: internal failures
//! are logged and swallowed.

use std::future::Future;
use std::io::IsTerminal;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::device_code::DeviceAuthorization;
use super::error::AuthError;

/// The device flow needs a human at a terminal.
pub fn ensure_interactive() -> Result<(), AuthError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(AuthError::NotInteractive)
    }
}

/// Display the user code, wait for Enter or cancellation, then open the
/// system browser at most once. Never returns an error to the caller.
pub async fn prompt_and_open(authorization: DeviceAuthorization, cancel: CancellationToken) {
    println!();
    println!("🔗 Visit: {}", authorization.verification_uri);
    println!("📋 Enter code: {}", authorization.user_code);
    println!("⏳ Waiting for authorization... (press Enter to open your browser)");

    let target = authorization
        .verification_uri_complete
        .as_deref()
        .unwrap_or(&authorization.verification_uri)
        .to_string();

    wait_then_open(cancel, wait_for_enter(), &target, |uri| {
        if let Err(err) = opener::open(uri) {
            // Best-effort convenience; authorization continues without it.
            warn!(error = %err, "could not open browser");
            println!("Please open {uri} manually.");
        }
    })
    .await;
}

/// Race the acknowledgment against cancellation. First writer wins: if
/// cancellation settles first the user already completed the flow by other
/// means, so the browser is not opened; otherwise it opens exactly once.
async fn wait_then_open<A, O>(cancel: CancellationToken, ack: A, uri: &str, open: O)
where
    A: Future<Output = ()>,
    O: FnOnce(&str),
{
    tokio::select! {
        () = cancel.cancelled() => {}
        () = ack => open(uri),
    }
}

async fn wait_for_enter() {
    let mut line = String::new();
    if let Err(err) = BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
        warn!(error = %err, "could not read terminal input");
        // Nothing to wait on; let cancellation end the race.
        std::future::pending::<()>().await;
    }
}

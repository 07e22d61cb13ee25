//! HTML rendering of the ledger

use crate::ledger::LedgerSnapshot;
use std::fmt::Write;

pub const BANNER: &str = "<h1>Welcome to the ipbeacon collector page!</h1><br/>";

/// Render the status page
///
/// Layout: banner, current address, newest-first history lines of
/// `address \t time`, then the request method echoed verbatim.
pub fn render(snapshot: &LedgerSnapshot, method: &str) -> String {
    let mut page = String::with_capacity(256 + snapshot.history.len() * 48);

    page.push_str(BANNER);
    // Writing into a String cannot fail
    let _ = write!(
        page,
        "your current gateway ip: <strong>{}</strong> <br/><br/>",
        snapshot.current
    );
    page.push_str("ip update list:<br/>");
    for line in &snapshot.history {
        let _ = write!(page, "{} \t {} <br/>", line.address, line.observed_at);
    }
    page.push_str(method);

    page
}

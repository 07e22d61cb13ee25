//! HTTP surface of the collector
//!
//! One route, `/`. POST records the caller's address, every method gets
//! the rendered ledger back. Anything else is a 404.

use super::page;
use crate::ledger::Ledger;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

pub const NOT_FOUND_BODY: &str = "404 page not found";

/// Build the collector router around a shared ledger
pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/", any(index))
        .fallback(not_found)
        .with_state(ledger)
}

/// Address recorded for a peer: the IP without its port
///
/// IPv4-mapped IPv6 peers (dual-stack listeners) are reported as plain IPv4.
pub fn peer_address(peer: SocketAddr) -> String {
    match peer.ip() {
        IpAddr::V6(v6) => v6.to_canonical().to_string(),
        ip => ip.to_string(),
    }
}

/// Apply one request to the ledger and render the response page
pub fn handle(ledger: &Ledger, method: &Method, peer: SocketAddr) -> String {
    if *method == Method::POST {
        let address = peer_address(peer);
        if ledger.append(&address) {
            log::info!("Address changed: {}", address);
        } else {
            log::debug!("Address unchanged: {}", address);
        }
    }

    page::render(&ledger.snapshot(), method.as_str())
}

async fn index(
    State(ledger): State<Arc<Ledger>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
) -> Response {
    let body = handle(&ledger, &method, peer);
    ([(header::CONTENT_TYPE, "text/html")], body).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SEED_ADDRESS;
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV6};

    fn peer(ip: [u8; 4], port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::from(ip), port))
    }

    #[test]
    fn test_peer_address_strips_port() {
        assert_eq!(peer_address(peer([10, 0, 0, 5], 5555)), "10.0.0.5");
    }

    #[test]
    fn test_peer_address_unmaps_ipv4() {
        let mapped = Ipv4Addr::new(192, 168, 1, 20).to_ipv6_mapped();
        let addr = SocketAddr::V6(SocketAddrV6::new(mapped, 40000, 0, 0));

        assert_eq!(peer_address(addr), "192.168.1.20");
    }

    #[test]
    fn test_peer_address_ipv6() {
        let addr = SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 40000, 0, 0));

        assert_eq!(peer_address(addr), "::1");
    }

    #[test]
    fn test_post_scenario() {
        let ledger = Ledger::new(SEED_ADDRESS);

        handle(&ledger, &Method::POST, peer([10, 0, 0, 5], 5555));
        let history: Vec<String> = ledger.history().into_iter().map(|l| l.address).collect();
        assert_eq!(history, vec!["10.0.0.5", "127.0.0.1"]);

        handle(&ledger, &Method::POST, peer([10, 0, 0, 5], 6000));
        assert_eq!(ledger.len(), 2);

        handle(&ledger, &Method::POST, peer([10, 0, 0, 9], 5555));
        assert_eq!(ledger.len(), 3);

        let page = handle(&ledger, &Method::GET, peer([10, 0, 0, 1], 1234));
        assert_eq!(ledger.len(), 3);
        assert!(page.contains("<strong>10.0.0.9</strong>"));
        let first_line = page.split("ip update list:<br/>").nth(1).unwrap();
        assert!(first_line.starts_with("10.0.0.9 \t"));
        assert!(page.ends_with("GET"));
    }

    #[test]
    fn test_non_post_methods_only_read() {
        let ledger = Ledger::new(SEED_ADDRESS);

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::HEAD] {
            let page = handle(&ledger, &method, peer([10, 0, 0, 5], 5555));
            assert!(page.ends_with(method.as_str()));
        }

        assert_eq!(ledger.current_address(), SEED_ADDRESS);
    }
}

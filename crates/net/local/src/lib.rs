//! Address inspection utilities for libp2p multiaddrs.
//!
//! Used by protocols that need to reason about where a peer can be reached:
//! extracting the IP carried by a multiaddr and classifying whether that IP is
//! publicly routable.

mod scope;

pub use scope::{
    AddressScope, classify_ip, classify_multiaddr, extract_ip, is_private_ip, is_public_ip,
};

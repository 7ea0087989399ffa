//! Cross-crate scenario tests.
//!
//! Everything here drives a real `Session` over a mock transport: outbound
//! stanzas land in a channel the test reads, inbound stanzas are fed through
//! the same receive loop production code uses. No crate-internal APIs are
//! touched, only the public surface.

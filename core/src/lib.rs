// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Jade hardware wallet core
//!
//! This provides a common [Engine][engine::Engine] implementing the Jade
//! device RPC protocol, independent of transport and wallet backend.
//!
//! Each connection (serial, BLE) owns an [Engine][engine::Engine], fed raw
//! bytes from the transport and returning [RpcResponse][proto::RpcResponse]s
//! to be framed and written back. Engines share a single
//! [SessionLock][engine::SessionLock] tracking which [Source][engine::Source]
//! (if any) holds the unlocked keychain, and a [Driver][engine::Driver]
//! providing wallet and platform support.
//!
//! See [jade_proto] for message and wire encodings.
//!
//! ## Operations
//!
//! Requests are validated, resolved against the method registry and
//! checked for sequencing before parameters are parsed into
//! [Event][engine::Event]s and applied via
//! [`Engine::update`][engine::Engine::update].
//!
//! ### Authentication
//!
//! 1. Issue `auth_user` (or `debug_handshake`) to fetch an HTTP instruction
//!    for the PIN server `start_handshake` endpoint
//! 2. Issue `handshake_init` with the server `ske` and `sig`, returning an
//!    HTTP instruction carrying the encrypted PIN request
//! 3. Issue `handshake_complete` with the server `encrypted_key` and `hmac`,
//!    unlocking the keychain for the calling source
//!
//! ### Signing a transaction
//!
//! 1. Issue `sign_tx` (or `sign_liquid_tx` with trusted commitments) to
//!    declare the transaction and input count
//! 2. Issue one `tx_input` per input, the final input returning the list
//!    of input signatures
//!
//! ### Firmware update
//!
//! 1. Issue `ota` with the firmware and compressed sizes
//! 2. Stream `ota_data` chunks until the compressed size is reached
//! 3. Issue `ota_complete` to finalise the update
//!

pub use jade_proto::{self as proto};

pub mod config;
pub use config::Config;

pub mod engine;

pub mod helpers;

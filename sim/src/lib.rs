// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Simulated Jade device
//!
//! This provides a software [Driver][jade_core::engine::Driver]
//! ([SoftDriver]) and a [Simulator] exposing the device engine over TCP
//! (one listener per transport source) or in-process duplex streams, for
//! use from the `jade-sim` CLI or rust tests.

mod driver;
pub use driver::*;

mod server;
pub use server::*;

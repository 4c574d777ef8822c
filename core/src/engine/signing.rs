// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Staged transaction signing
//!
//! `sign_tx` / `sign_liquid_tx` declare a transaction, followed by one
//! `tx_input` per declared input. Trusted commitments are structurally
//! validated at declaration, then verified against device-derived values
//! once the final input is received, prior to signing.

use rand_core::CryptoRngCore;

use jade_proto::{txn::TxLayout, ByteBuf, Network};

use super::{Driver, Engine, Error, Exchange, Keychain, Output, State};

/// Signing progress
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct SigningState {
    pub num_inputs: usize,
    pub received: usize,
}

/// Validated trusted commitment for a blinded output
#[derive(Clone, PartialEq, Debug)]
pub struct Commitment {
    pub asset_id: [u8; 32],
    pub value: u64,
    pub asset_generator: [u8; 33],
    pub value_commitment: [u8; 33],
    pub blinding_key: [u8; 33],
    pub hmac: [u8; 32],
    pub abf: Option<[u8; 32]>,
    pub vbf: Option<[u8; 32]>,
}

/// Transaction input, as provided by `tx_input`
#[derive(Clone, PartialEq, Debug)]
pub struct TxInput {
    pub is_witness: bool,
    /// Previous transaction (bitcoin non-witness inputs)
    pub input_tx: Option<Vec<u8>>,
    /// Signing path, inputs without a path are not signed
    pub path: Option<Vec<u32>>,
    /// Input value (bitcoin witness inputs)
    pub satoshi: Option<u64>,
    pub script: Vec<u8>,
    /// Input value commitment (liquid witness inputs)
    pub value_commitment: Option<[u8; 33]>,
}

/// Declared transaction, as provided to [Driver::sign_input][super::Driver::sign_input]
#[derive(Clone, PartialEq, Debug)]
pub struct TxContext {
    pub network: Network,
    pub txn: Vec<u8>,
    pub layout: TxLayout,
    /// Change path per output, where provided
    pub change: Option<Vec<Option<Vec<u32>>>>,
}

/// Signing context, held for the duration of a signing exchange
#[derive(Clone, Debug)]
pub(crate) struct SignContext {
    pub tx: TxContext,
    pub commitments: Vec<Option<Commitment>>,
    pub inputs: Vec<TxInput>,
}

impl SignContext {
    pub fn new(tx: TxContext, commitments: Vec<Option<Commitment>>) -> Self {
        let inputs = Vec::with_capacity(tx.layout.num_inputs);
        Self {
            tx,
            commitments,
            inputs,
        }
    }

    pub fn state(&self) -> SigningState {
        SigningState {
            num_inputs: self.tx.layout.num_inputs,
            received: self.inputs.len(),
        }
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Declare a transaction, replacing any pending signing exchange
    pub(crate) fn sign_begin(
        &mut self,
        tx: TxContext,
        commitments: Vec<Option<Commitment>>,
    ) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!(
            "sign {} ({} inputs, {} outputs)",
            tx.network,
            tx.layout.num_inputs,
            tx.layout.num_outputs
        );

        let ctx = SignContext::new(tx, commitments);
        self.state = State::Signing(ctx.state());
        self.exchange = Exchange::Signing(ctx);

        Ok(Output::Bool(true))
    }

    /// Accept a transaction input, signing once all inputs are received
    pub(crate) fn sign_input(&mut self, input: &TxInput) -> Result<Output, Error> {
        let ctx = match &mut self.exchange {
            Exchange::Signing(c) => c,
            _ => return Err(Error::UnexpectedMethod),
        };

        ctx.inputs.push(input.clone());
        self.state = State::Signing(ctx.state());

        if ctx.inputs.len() < ctx.tx.layout.num_inputs {
            return Ok(Output::Bool(true));
        }

        // Final input, complete the exchange
        let ctx = match core::mem::take(&mut self.exchange) {
            Exchange::Signing(c) => c,
            _ => return Err(Error::UnexpectedMethod),
        };
        self.state = State::Idle;

        let (drv, source) = (&self.drv, self.source);
        self.lock
            .with_keychain(source, |k| sign_all(drv, k, &ctx))?
            .map(Output::Signatures)
    }
}

fn sign_all<DRV: Driver>(
    drv: &DRV,
    k: &Keychain,
    ctx: &SignContext,
) -> Result<Vec<ByteBuf>, Error> {
    let hash_prevouts = &ctx.tx.layout.hash_prevouts;

    // Verify deferred trusted commitments
    for (i, c) in ctx.commitments.iter().enumerate() {
        if let Some(c) = c {
            drv.verify_commitment(k, hash_prevouts, i as u32, c)
                .map_err(|_e| {
                    #[cfg(feature = "log")]
                    log::warn!("commitment {} verification failed: {}", i, _e);

                    Error::BadParams(
                        "Failed to verify trusted commitments from commitments data",
                    )
                })?;
        }
    }

    // Sign inputs with paths
    ctx.inputs
        .iter()
        .enumerate()
        .map(|(i, input)| match input.path {
            Some(_) => drv.sign_input(k, &ctx.tx, i, input).map(ByteBuf::from),
            None => Ok(ByteBuf::new()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Known-answer wallet tests (xpubs, single-sig addresses)

use anyhow::anyhow;
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use jade::{params::ReceiveAddress, DeviceHandle};

use crate::vectors::{
    SINGLE_SIG_ADDR_VECTORS, TEST_MNEMONIC, TEST_SEED_SINGLE_SIG, XPUB_VECTORS,
};

pub async fn test<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    xpubs(d).await?;
    single_sig_addresses(d).await?;

    d.logout().await?;

    Ok(())
}

/// Check xpubs for the test mnemonic
pub async fn xpubs<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    info!("check {} xpub vectors", XPUB_VECTORS.len());

    for (path, network, expected) in XPUB_VECTORS {
        // Reload the wallet, vectors span network classes
        d.set_mnemonic(TEST_MNEMONIC, None).await?;

        let xpub = d.get_xpub(*network, path).await?;
        debug!("{} {:?}: {}", network, path, xpub);

        if xpub != *expected {
            return Err(anyhow!(
                "xpub mismatch for {} {:?} (expected: {}, actual: {})",
                network,
                path,
                expected,
                xpub
            ));
        }
    }

    Ok(())
}

/// Check single-sig addresses for the single-sig test seed
pub async fn single_sig_addresses<T>(d: &DeviceHandle<T>) -> anyhow::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    info!("check {} address vectors", SINGLE_SIG_ADDR_VECTORS.len());

    let seed = hex::decode(TEST_SEED_SINGLE_SIG)?;

    for (network, variant, path, expected) in SINGLE_SIG_ADDR_VECTORS {
        d.set_seed(&seed).await?;

        let addr = ReceiveAddress::SingleSig {
            network: *network,
            variant: variant.to_string(),
            path: path.to_vec(),
        };
        let a = d.get_receive_address(&addr).await?;

        if a != *expected {
            return Err(anyhow!(
                "address mismatch for {} {} {:?} (expected: {}, actual: {})",
                network,
                variant,
                path,
                expected,
                a
            ));
        }
    }

    Ok(())
}

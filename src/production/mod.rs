//! Production implementations of traits

mod keyring_vault;
mod reqwest_transport;

pub use keyring_vault::KeyringVault;
pub use reqwest_transport::ReqwestTransport;

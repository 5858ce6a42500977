pub mod app_config;
pub mod config;
pub mod qr_codes;
pub mod qr_image;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use qr_codes::{
    default_form, destination_url, scan_url, validate_qr_code, Destination, QrCodeForm,
    ValidQrCode, ValidationErrors,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("unrecognized product variant ID: {0}")]
    UnrecognizedVariantId(String),

    #[error("failed to encode QR code: {0}")]
    QrEncoding(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

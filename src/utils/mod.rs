// Utility modules for the funnel data layer

pub mod data_error;
pub mod password;
pub mod reset_token;
pub mod validation;

pub use data_error::{DataError, DataResult};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use reset_token::{generate_reset_token, hash_token, token_matches, ResetTokenInfo};
pub use validation::{
    trim_and_validate_field, trim_optional_field, HOSTNAME_REGEX, LINKING_ID_REGEX, SLUG_REGEX,
};

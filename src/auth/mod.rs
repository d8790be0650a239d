mod signature;

pub use signature::{MAX_TIMESTAMP_AGE_SECS, SIGNATURE_SCHEME, sign_payload, verify_signature};

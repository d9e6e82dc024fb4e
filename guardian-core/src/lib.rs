pub mod review;
pub mod signature;

pub use review::{assemble_comment, create_user_prompt, get_system_prompt, MAX_DIFF_CHARS};
pub use signature::{
    compute_signature, format_signature_header, verify_signature, SignatureError,
};

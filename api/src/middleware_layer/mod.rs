pub mod json_extractor;
pub mod session_id;

pub mod delimited;
pub mod progress_utils;
pub mod test_utils;

pub mod clock;
pub mod jwt;
pub mod password;

pub use clock::{Clock, SystemClock};
pub use jwt::{encode_access_token, encode_token_pair, TokenPair};
pub use password::{hash_password, verify_password};

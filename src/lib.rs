//! Single-shot JSON signup submission over reqwest, with an in-memory mock
//! transport for fully deterministic tests.

#![allow(dead_code)]

pub mod adapter;
pub mod mock;
pub mod signup;

pub use adapter::{
    Client, HttpTransport, JsonBytes, PostError, PostErrorKind, PostFuture, PostRequest,
    PostResponse, PostResult, PostTransport,
};
pub use mock::{MockBehavior, MockPlan, MockResponse, MockSnapshot, MockTransport};
pub use signup::{Contact, DEFAULT_SIGNUP_URL, SignupPayload, send_signup};

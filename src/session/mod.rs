pub mod controller;

pub use controller::{
    Lifecycle, SessionController, SessionEvent, CHAT_FAILURE_APOLOGY, SUMMARY_FAILURE_NOTICE,
};

pub mod client;
pub mod codes;
pub mod compose;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod intake;
pub mod oplog;
pub mod outcome;
pub mod rules;
pub mod sanitize;
pub mod server;
pub mod transport;


pub use client::FormValidator;
pub use config::Config;
pub use controller::SubmissionController;
pub use error::{AbuseSignal, PipelineError};
pub use form::FormKind;
pub use intake::IntakeHandler;
pub use outcome::{Outcome, Resolution};
pub use server::Server;
pub use transport::{DryRunTransport, MailTransport, SendmailTransport};

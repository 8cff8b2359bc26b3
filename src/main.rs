// Entrypoint: post the canned enrollment to the local signup endpoint once
// and log the parsed JSON reply. A failed round trip or a non-JSON reply
// propagates out of `main` and exits non-zero.

use env_logger::{Builder, Env, Target};
use log::info;
use signup_client::{Client, DEFAULT_SIGNUP_URL, SignupPayload, send_signup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Replies go to stdout; RUST_LOG still controls verbosity.
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let client = Client::new();
    let reply = send_signup(&client, DEFAULT_SIGNUP_URL, &SignupPayload::test_user()).await?;
    info!("{}", sonic_rs::to_string(&reply)?);
    Ok(())
}

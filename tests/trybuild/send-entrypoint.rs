use signup_client::{Client, SignupPayload};

fn main() {
    let client = Client::new();
    let _reply = client
        .send("http://127.0.0.1:8080/signup", &SignupPayload::test_user())
        .expect("submission result");
}

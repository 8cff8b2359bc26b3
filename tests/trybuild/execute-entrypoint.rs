use signup_client::{Client, PostRequest, PostResponse, PostResult};

fn main() {
    let client = Client::new();
    let _response: PostResult<PostResponse> = client.execute(PostRequest::default());
}
